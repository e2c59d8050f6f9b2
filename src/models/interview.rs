use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

pub const MIN_DURATION_MINUTES: i32 = 15;
pub const MAX_DURATION_MINUTES: i32 = 480;
pub const DEFAULT_DURATION_MINUTES: i32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "interview_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    Rescheduled,
}

impl InterviewStatus {
    /// Allowed status transitions. RESCHEDULED only exists transiently: the
    /// scheduling engine writes it and immediately transitions back to
    /// SCHEDULED within the same transaction.
    pub fn can_transition(from: InterviewStatus, to: InterviewStatus) -> bool {
        use InterviewStatus::*;
        matches!(
            (from, to),
            (Scheduled, InProgress)
                | (Scheduled, Completed)
                | (Scheduled, Cancelled)
                | (Scheduled, Rescheduled)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
                | (Rescheduled, Scheduled)
        )
    }

    /// Terminal interviews no longer occupy the interviewer's calendar.
    pub fn is_terminal(self) -> bool {
        matches!(self, InterviewStatus::Completed | InterviewStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InterviewStatus::Scheduled => "SCHEDULED",
            InterviewStatus::InProgress => "IN_PROGRESS",
            InterviewStatus::Completed => "COMPLETED",
            InterviewStatus::Cancelled => "CANCELLED",
            InterviewStatus::Rescheduled => "RESCHEDULED",
        }
    }

    pub const ALL: [InterviewStatus; 5] = [
        InterviewStatus::Scheduled,
        InterviewStatus::InProgress,
        InterviewStatus::Completed,
        InterviewStatus::Cancelled,
        InterviewStatus::Rescheduled,
    ];
}

impl fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "interview_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewType {
    Technical,
    Hr,
    Managerial,
    CulturalFit,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub interviewer_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub current_status: InterviewStatus,
    pub interview_type: InterviewType,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Half-open interval overlap: `[s1, s1+d1)` and `[s2, s2+d2)` overlap iff
/// `s1 < s2+d2 && s1+d1 > s2`. Back-to-back slots do not overlap.
pub fn overlaps(
    start_a: DateTime<Utc>,
    duration_a: i32,
    start_b: DateTime<Utc>,
    duration_b: i32,
) -> bool {
    let end_a = start_a + Duration::minutes(duration_a as i64);
    let end_b = start_b + Duration::minutes(duration_b as i64);
    start_a < end_b && end_a > start_b
}

#[cfg(test)]
mod tests {
    use super::InterviewStatus::{self, *};
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_table_is_closed() {
        let allowed = [
            (Scheduled, InProgress),
            (Scheduled, Completed),
            (Scheduled, Cancelled),
            (Scheduled, Rescheduled),
            (InProgress, Completed),
            (InProgress, Cancelled),
            (Rescheduled, Scheduled),
        ];

        for from in InterviewStatus::ALL {
            for to in InterviewStatus::ALL {
                assert_eq!(
                    InterviewStatus::can_transition(from, to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn completed_and_cancelled_are_terminal() {
        for status in [Completed, Cancelled] {
            assert!(status.is_terminal());
            for to in InterviewStatus::ALL {
                assert!(!InterviewStatus::can_transition(status, to));
            }
        }
        assert!(!Scheduled.is_terminal());
        assert!(!InProgress.is_terminal());
        assert!(!Rescheduled.is_terminal());
    }

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    #[test]
    fn adjacent_intervals_do_not_overlap() {
        // [0, 60) then [60, 120): back-to-back is allowed.
        assert!(!overlaps(at(0), 60, at(60), 60));
        assert!(!overlaps(at(60), 60, at(0), 60));
    }

    #[test]
    fn half_open_overlap_is_symmetric_across_offsets() {
        // Sweep a second 60-minute slot across a fixed [0, 60) slot. The two
        // overlap exactly when the offset is in (-60, 60), regardless of
        // argument order.
        for offset in -120..=120 {
            let expected = offset > -60 && offset < 60;
            assert_eq!(
                overlaps(at(0), 60, at(offset), 60),
                expected,
                "offset {offset}"
            );
            assert_eq!(
                overlaps(at(offset), 60, at(0), 60),
                expected,
                "offset {offset} (swapped)"
            );
        }
    }

    #[test]
    fn containment_and_unequal_durations_overlap() {
        // [0, 480) fully contains [60, 90).
        assert!(overlaps(at(0), 480, at(60), 30));
        assert!(overlaps(at(60), 30, at(0), 480));
        // [0, 15) against [14, 74): one minute shared.
        assert!(overlaps(at(0), 15, at(14), 60));
        // [0, 15) against [15, 75): adjacent.
        assert!(!overlaps(at(0), 15, at(15), 60));
    }
}
