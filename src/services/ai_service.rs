use crate::error::{Error, Result};
use crate::models::feedback::Recommendation;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The model only sees the first 4,000 characters of a resume.
pub const MAX_RESUME_PROMPT_CHARS: usize = 4000;

const DEFAULT_JOB_DESCRIPTION: &str = "General software engineering position";

const TECH_KEYWORDS: &[&str] = &[
    "java",
    "python",
    "javascript",
    "react",
    "spring",
    "sql",
    "aws",
    "docker",
    "kubernetes",
    "git",
    "api",
    "microservices",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub skills_matched: String,
    pub experience_years: f64,
    pub education_level: String,
    pub cultural_fit: String,
    pub match_score: i32,
    pub analysis_text: String,
    pub recommendation: Recommendation,
}

/// Chat client for the external model plus the parser for its free-form
/// response. Analysis never fails outward: an unreachable model or an
/// unparseable response falls back to the keyword heuristic, so every
/// screening produces a result.
#[derive(Clone)]
pub struct AiService {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl AiService {
    pub fn new(base_url: String, model: String, timeout_secs: u64, client: Client) -> Self {
        Self {
            client,
            base_url,
            model,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn analyze_resume(
        &self,
        resume_text: &str,
        job_description: Option<&str>,
    ) -> AiAnalysis {
        let prompt = build_prompt(resume_text, job_description);
        debug!(prompt_len = prompt.len(), model = %self.model, "sending resume analysis prompt");

        match self.chat(&prompt).await {
            Ok(response) => match parse_response(&response) {
                Ok(analysis) => {
                    info!(match_score = analysis.match_score, "AI analysis complete");
                    analysis
                }
                Err(e) => {
                    warn!(error = %e, "failed to parse AI response, using fallback analysis");
                    fallback_analysis(resume_text)
                }
            },
            Err(e) => {
                warn!(error = %e, "LLM call failed, using fallback analysis");
                fallback_analysis(resume_text)
            }
        }
    }

    async fn chat(&self, prompt: &str) -> Result<String> {
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "stream": false,
        });

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::ExternalService {
                service: "llm".to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::ExternalService {
                service: "llm".to_string(),
                message: format!("LLM API error {}: {}", status, text),
            });
        }

        let body: JsonValue = response.json().await.map_err(|e| Error::ExternalService {
            service: "llm".to_string(),
            message: e.to_string(),
        })?;

        body.get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| Error::ExternalService {
                service: "llm".to_string(),
                message: "Invalid LLM response format".to_string(),
            })
    }
}

pub fn build_prompt(resume_text: &str, job_description: Option<&str>) -> String {
    let resume = if resume_text.chars().count() > MAX_RESUME_PROMPT_CHARS {
        let truncated: String = resume_text.chars().take(MAX_RESUME_PROMPT_CHARS).collect();
        format!("{}...", truncated)
    } else {
        resume_text.to_string()
    };

    format!(
        r#"You are an expert HR recruiter analyzing a candidate's resume.

RESUME CONTENT:
{resume}

JOB REQUIREMENTS:
{job}

Please analyze this resume and provide a structured response in the following format:

SKILLS:
List the technical skills found (one per line, format: "Skill - Proficiency Level - Years")

EXPERIENCE:
Total years of professional experience (just a number)

EDUCATION:
Highest education level and field (one line)

CULTURAL_FIT:
Rate teamwork, leadership, and communication (High/Medium/Low for each)

MATCH_SCORE:
Overall match score from 0-100 (just the number)

ANALYSIS:
Brief summary (2-3 sentences) explaining the match score and key strengths/weaknesses.

RECOMMENDATION:
One of: STRONG_HIRE, HIRE, MAYBE, NO_HIRE

Be concise and format your response EXACTLY as shown above with the section headers."#,
        resume = resume,
        job = job_description.unwrap_or(DEFAULT_JOB_DESCRIPTION),
    )
}

/// Splits the response at the literal section markers. Any missing marker or
/// an unparseable MATCH_SCORE fails the whole parse, which sends the caller
/// to the fallback analyzer.
pub fn parse_response(response: &str) -> Result<AiAnalysis> {
    let skills = section(response, "SKILLS:", Some("EXPERIENCE:"))?;
    let experience = section(response, "EXPERIENCE:", Some("EDUCATION:"))?;
    let education = section(response, "EDUCATION:", Some("CULTURAL_FIT:"))?;
    let cultural_fit = section(response, "CULTURAL_FIT:", Some("MATCH_SCORE:"))?;
    let score = section(response, "MATCH_SCORE:", Some("ANALYSIS:"))?;
    let analysis = section(response, "ANALYSIS:", Some("RECOMMENDATION:"))?;
    let recommendation = section(response, "RECOMMENDATION:", None)?;

    let match_score = first_integer(&score)
        .ok_or_else(|| Error::Internal("No numeric MATCH_SCORE in AI response".to_string()))?
        .clamp(0, 100);

    Ok(AiAnalysis {
        skills_matched: if skills.is_empty() {
            "Skills analysis pending manual review.".to_string()
        } else {
            skills
        },
        experience_years: first_number(&experience).unwrap_or(0.0),
        education_level: education,
        cultural_fit,
        match_score,
        analysis_text: if analysis.is_empty() {
            "AI analysis completed successfully.".to_string()
        } else {
            analysis
        },
        recommendation: parse_recommendation(&recommendation),
    })
}

fn section(text: &str, start_marker: &str, end_marker: Option<&str>) -> Result<String> {
    let start = text
        .find(start_marker)
        .ok_or_else(|| Error::Internal(format!("Missing {} section in AI response", start_marker)))?
        + start_marker.len();
    let rest = &text[start..];
    let end = end_marker
        .and_then(|marker| rest.find(marker))
        .unwrap_or(rest.len());
    Ok(rest[..end].trim().to_string())
}

/// First decimal number in the text, e.g. "about 4.5 years" -> 4.5.
fn first_number(text: &str) -> Option<f64> {
    let start = text.char_indices().find(|(_, c)| c.is_ascii_digit())?.0;
    let mut end = start;
    let mut seen_dot = false;
    for (i, c) in text[start..].char_indices() {
        if c.is_ascii_digit() {
            end = start + i + c.len_utf8();
        } else if c == '.' && !seen_dot {
            seen_dot = true;
            end = start + i + c.len_utf8();
        } else {
            break;
        }
    }
    text[start..end].trim_end_matches('.').parse().ok()
}

fn first_integer(text: &str) -> Option<i32> {
    let start = text.char_indices().find(|(_, c)| c.is_ascii_digit())?.0;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Substring containment in priority order, so "NO_HIRE" never reads as
/// "HIRE". Defaults to MAYBE.
fn parse_recommendation(text: &str) -> Recommendation {
    let upper = text.to_uppercase();
    if upper.contains("STRONG_HIRE") || upper.contains("STRONG HIRE") {
        Recommendation::StrongHire
    } else if upper.contains("NO_HIRE") || upper.contains("REJECT") {
        Recommendation::NoHire
    } else if upper.contains("MAYBE") {
        Recommendation::Maybe
    } else if upper.contains("HIRE") {
        Recommendation::Hire
    } else {
        Recommendation::Maybe
    }
}

/// Deterministic keyword heuristic used when the model is unavailable or
/// its response cannot be parsed.
pub fn fallback_analysis(resume_text: &str) -> AiAnalysis {
    let lower = resume_text.to_lowercase();

    let mut skills = String::new();
    let mut skill_count = 0;
    for keyword in TECH_KEYWORDS {
        if lower.contains(keyword) {
            skill_count += 1;
            skills.push_str(keyword);
            skills.push_str(" - Mentioned\n");
        }
    }

    let experience_years = if lower.contains("senior") || lower.contains("lead") {
        5.0
    } else if lower.contains("junior") || lower.contains("intern") {
        1.0
    } else {
        3.0
    };

    let education_level = if lower.contains("master") || lower.contains("phd") {
        "Master's degree or higher"
    } else if lower.contains("bachelor") || lower.contains("b.tech") || lower.contains("b.e") {
        "Bachelor's degree"
    } else {
        "Education information not clearly specified"
    };

    let match_score = 40 + (skill_count * 5).min(30);

    AiAnalysis {
        skills_matched: skills,
        experience_years,
        education_level: education_level.to_string(),
        cultural_fit: "Teamwork: Medium, Leadership: Medium, Communication: Medium".to_string(),
        match_score,
        analysis_text: format!(
            "Basic analysis completed. Found {} relevant technical skills. \
             Resume shows {} years of experience. Further manual review recommended.",
            skill_count, experience_years
        ),
        recommendation: if match_score >= 70 {
            Recommendation::Hire
        } else {
            Recommendation::Maybe
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_the_section_skeleton() {
        let prompt = build_prompt("resume body", Some("Java Developer"));
        for marker in [
            "SKILLS:",
            "EXPERIENCE:",
            "EDUCATION:",
            "CULTURAL_FIT:",
            "MATCH_SCORE:",
            "ANALYSIS:",
            "RECOMMENDATION:",
        ] {
            assert!(prompt.contains(marker), "missing {marker}");
        }
        assert!(prompt.contains("Java Developer"));
        assert!(prompt.contains("resume body"));
    }

    #[test]
    fn prompt_defaults_the_job_description_and_truncates() {
        let prompt = build_prompt(&"x".repeat(6000), None);
        assert!(prompt.contains("General software engineering position"));
        assert!(prompt.contains(&format!("{}...", "x".repeat(MAX_RESUME_PROMPT_CHARS))));
        assert!(!prompt.contains(&"x".repeat(MAX_RESUME_PROMPT_CHARS + 1)));
    }

    const SAMPLE: &str = "Some preamble.\n\
        SKILLS:\nJava - Advanced - 5\nDocker - Intermediate - 2\n\
        EXPERIENCE:\naround 4.5 years\n\
        EDUCATION:\nMaster of Science in CS\n\
        CULTURAL_FIT:\nTeamwork: High, Leadership: Medium, Communication: High\n\
        MATCH_SCORE:\n85\n\
        ANALYSIS:\nStrong backend profile.\n\
        RECOMMENDATION:\nHIRE\n";

    #[test]
    fn parses_a_well_formed_response() {
        let analysis = parse_response(SAMPLE).unwrap();
        assert!(analysis.skills_matched.contains("Java - Advanced - 5"));
        assert_eq!(analysis.experience_years, 4.5);
        assert_eq!(analysis.education_level, "Master of Science in CS");
        assert_eq!(analysis.match_score, 85);
        assert_eq!(analysis.analysis_text, "Strong backend profile.");
        assert_eq!(analysis.recommendation, Recommendation::Hire);
    }

    #[test]
    fn match_score_is_clamped_to_0_100() {
        let response = SAMPLE.replace("85", "250");
        assert_eq!(parse_response(&response).unwrap().match_score, 100);
    }

    #[test]
    fn missing_marker_fails_the_parse() {
        let response = SAMPLE.replace("MATCH_SCORE:", "SCORE:");
        assert!(parse_response(&response).is_err());
        assert!(parse_response("free-form text with no sections").is_err());
    }

    #[test]
    fn missing_experience_number_defaults_to_zero() {
        let response = SAMPLE.replace("around 4.5 years", "unclear");
        assert_eq!(parse_response(&response).unwrap().experience_years, 0.0);
    }

    #[test]
    fn recommendation_priority_never_misreads_no_hire() {
        assert_eq!(
            parse_recommendation("definitely a STRONG_HIRE"),
            Recommendation::StrongHire
        );
        assert_eq!(parse_recommendation("NO_HIRE"), Recommendation::NoHire);
        assert_eq!(parse_recommendation("REJECT"), Recommendation::NoHire);
        assert_eq!(parse_recommendation("MAYBE"), Recommendation::Maybe);
        assert_eq!(parse_recommendation("HIRE"), Recommendation::Hire);
        assert_eq!(parse_recommendation("no idea"), Recommendation::Maybe);
    }

    #[test]
    fn fallback_matches_the_keyword_arithmetic() {
        // Three keywords plus "senior": 40 + 3*5 = 55, below the HIRE bar.
        let analysis = fallback_analysis("Senior engineer: spring, docker, kubernetes.");
        assert_eq!(analysis.match_score, 55);
        assert_eq!(analysis.experience_years, 5.0);
        assert_eq!(analysis.recommendation, Recommendation::Maybe);
        assert_eq!(
            analysis.cultural_fit,
            "Teamwork: Medium, Leadership: Medium, Communication: Medium"
        );
    }

    #[test]
    fn fallback_skill_bonus_caps_at_30() {
        let all = TECH_KEYWORDS.join(" ");
        let analysis = fallback_analysis(&all);
        assert_eq!(analysis.match_score, 70);
        assert_eq!(analysis.recommendation, Recommendation::Hire);
    }

    #[test]
    fn fallback_education_and_seniority_bands() {
        let junior = fallback_analysis("intern with a bachelor degree");
        assert_eq!(junior.experience_years, 1.0);
        assert_eq!(junior.education_level, "Bachelor's degree");

        let masters = fallback_analysis("PhD researcher");
        assert_eq!(masters.experience_years, 3.0);
        assert_eq!(masters.education_level, "Master's degree or higher");

        let unknown = fallback_analysis("no schooling mentioned");
        assert_eq!(
            unknown.education_level,
            "Education information not clearly specified"
        );
    }
}
