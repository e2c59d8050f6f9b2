use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// A candidate's position in the six-stage hiring pipeline.
///
/// `current_stage` on the row is denormalized for dashboard queries; the
/// full journey lives in `candidate_stage_history`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "candidate_stage", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateStage {
    Applied,
    Screening,
    InterviewScheduled,
    InterviewCompleted,
    Hired,
    Rejected,
}

impl CandidateStage {
    /// The allowed-transition table. Every transition not listed here is
    /// illegal; HIRED and REJECTED are terminal.
    pub fn can_transition(from: CandidateStage, to: CandidateStage) -> bool {
        use CandidateStage::*;
        matches!(
            (from, to),
            (Applied, Screening)
                | (Applied, Rejected)
                | (Screening, InterviewScheduled)
                | (Screening, Rejected)
                | (InterviewScheduled, InterviewCompleted)
                | (InterviewScheduled, Rejected)
                | (InterviewCompleted, Hired)
                | (InterviewCompleted, Rejected)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CandidateStage::Hired | CandidateStage::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CandidateStage::Applied => "APPLIED",
            CandidateStage::Screening => "SCREENING",
            CandidateStage::InterviewScheduled => "INTERVIEW_SCHEDULED",
            CandidateStage::InterviewCompleted => "INTERVIEW_COMPLETED",
            CandidateStage::Hired => "HIRED",
            CandidateStage::Rejected => "REJECTED",
        }
    }

    pub const ALL: [CandidateStage; 6] = [
        CandidateStage::Applied,
        CandidateStage::Screening,
        CandidateStage::InterviewScheduled,
        CandidateStage::InterviewCompleted,
        CandidateStage::Hired,
        CandidateStage::Rejected,
    ];
}

impl fmt::Display for CandidateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub resume_path: Option<String>,
    pub current_stage: CandidateStage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::CandidateStage::{self, *};

    #[test]
    fn transition_table_is_closed() {
        let allowed = [
            (Applied, Screening),
            (Applied, Rejected),
            (Screening, InterviewScheduled),
            (Screening, Rejected),
            (InterviewScheduled, InterviewCompleted),
            (InterviewScheduled, Rejected),
            (InterviewCompleted, Hired),
            (InterviewCompleted, Rejected),
        ];

        for from in CandidateStage::ALL {
            for to in CandidateStage::ALL {
                let expected = allowed.contains(&(from, to));
                assert_eq!(
                    CandidateStage::can_transition(from, to),
                    expected,
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn terminal_stages_have_no_outgoing_transitions() {
        for terminal in [Hired, Rejected] {
            assert!(terminal.is_terminal());
            for to in CandidateStage::ALL {
                assert!(!CandidateStage::can_transition(terminal, to));
            }
        }
        assert!(!Applied.is_terminal());
    }

    #[test]
    fn replaying_a_recorded_path_reproduces_the_final_stage() {
        // The happy path: every adjacent pair must be a legal transition and
        // replaying it lands on HIRED.
        let path = [
            Applied,
            Screening,
            InterviewScheduled,
            InterviewCompleted,
            Hired,
        ];
        let mut current = path[0];
        for &next in &path[1..] {
            assert!(CandidateStage::can_transition(current, next));
            current = next;
        }
        assert_eq!(current, Hired);
    }
}
