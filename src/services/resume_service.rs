use crate::config::get_config;
use crate::error::{Error, Result};
use bytes::Bytes;
use std::path::Path;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

pub const MIN_RESUME_CHARS: usize = 100;

/// A resume must mention at least one of these to count as real content.
const CONTENT_TOKENS: &[&str] = &[
    "email",
    "@",
    "experience",
    "work",
    "project",
    "education",
    "degree",
    "university",
];

/// Stores resume blobs on the local filesystem and turns them back into
/// text for the screening pipeline. PDF goes through `pdftotext`, DOCX
/// through a headless LibreOffice conversion; legacy `.doc` is rejected.
#[derive(Clone, Default)]
pub struct ResumeService;

impl ResumeService {
    pub fn new() -> Self {
        Self
    }

    pub async fn save_resume(&self, filename: &str, data: &Bytes) -> Result<String> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => {
                if !data.starts_with(b"%PDF") {
                    return Err(Error::Validation("Invalid PDF file content".to_string()));
                }
            }
            "docx" | "txt" => {}
            "doc" => {
                return Err(Error::Validation(
                    "Legacy .doc format not supported. Please use .docx or .pdf".to_string(),
                ))
            }
            other => {
                return Err(Error::Validation(format!(
                    "Unsupported resume format: .{}",
                    other
                )))
            }
        }

        let upload_dir = &get_config().uploads_resume_dir;
        fs::create_dir_all(upload_dir).await?;

        let file_path = format!("{}/{}.{}", upload_dir, Uuid::new_v4(), ext);
        fs::write(&file_path, data).await?;

        debug!(path = %file_path, bytes = data.len(), "resume stored");
        Ok(file_path)
    }

    pub async fn extract_text(&self, file_path: &str) -> Result<String> {
        let path = Path::new(file_path);
        if !path.exists() {
            return Err(Error::Validation(format!(
                "Resume file not found: {}",
                file_path
            )));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let raw = match ext.as_str() {
            "pdf" => self.extract_from_pdf(file_path).await?,
            "docx" => self.extract_from_docx(file_path).await?,
            "txt" => fs::read_to_string(file_path).await?,
            "doc" => {
                return Err(Error::Validation(
                    "Legacy .doc format not supported. Please use .docx or .pdf".to_string(),
                ))
            }
            other => {
                return Err(Error::Validation(format!(
                    "Unsupported resume format: .{}",
                    other
                )))
            }
        };

        Ok(clean_text(&raw))
    }

    async fn extract_from_pdf(&self, file_path: &str) -> Result<String> {
        let output = Command::new("pdftotext")
            .arg("-layout")
            .arg(file_path)
            .arg("-")
            .output()
            .await
            .map_err(|e| Error::Internal(format!("Failed to run pdftotext: {}", e)))?;

        if !output.status.success() {
            warn!(path = %file_path, stderr = %String::from_utf8_lossy(&output.stderr), "pdftotext failed");
            return Err(Error::Internal("Failed to parse resume file".to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn extract_from_docx(&self, file_path: &str) -> Result<String> {
        let temp_dir = format!("/tmp/resume_txt_{}", Uuid::new_v4());
        fs::create_dir_all(&temp_dir).await?;

        let output = Command::new("libreoffice")
            .arg("--headless")
            .arg("--norestore")
            .arg("--convert-to")
            .arg("txt:Text")
            .arg("--outdir")
            .arg(&temp_dir)
            .arg(file_path)
            .output()
            .await;

        let result = match output {
            Ok(out) if out.status.success() => {
                let mut text = None;
                let mut entries = fs::read_dir(&temp_dir).await?;
                while let Some(entry) = entries.next_entry().await? {
                    if entry.path().extension().and_then(|e| e.to_str()) == Some("txt") {
                        text = Some(fs::read_to_string(entry.path()).await?);
                        break;
                    }
                }
                text.ok_or_else(|| {
                    Error::Internal("LibreOffice produced no text output".to_string())
                })
            }
            Ok(out) => {
                warn!(path = %file_path, stderr = %String::from_utf8_lossy(&out.stderr), "libreoffice conversion failed");
                Err(Error::Internal("Failed to parse resume file".to_string()))
            }
            Err(e) => Err(Error::Internal(format!("Failed to run libreoffice: {}", e))),
        };

        let _ = fs::remove_dir_all(&temp_dir).await;
        result
    }

    /// Content gate for the screening pipeline: at least 100 characters and
    /// one of the expected resume tokens.
    pub fn has_valid_content(&self, resume_text: &str) -> bool {
        let trimmed = resume_text.trim();
        if trimmed.len() < MIN_RESUME_CHARS {
            return false;
        }

        let lower = trimmed.to_lowercase();
        CONTENT_TOKENS.iter().any(|token| lower.contains(token))
    }
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_resumes_fail_the_content_gate() {
        let service = ResumeService::new();
        assert!(!service.has_valid_content(""));
        assert!(!service.has_valid_content("experience"));
    }

    #[test]
    fn long_text_without_resume_tokens_fails() {
        let service = ResumeService::new();
        let noise = "lorem ipsum dolor sit amet ".repeat(10);
        assert!(!service.has_valid_content(&noise));
    }

    #[test]
    fn any_single_token_passes_with_enough_text() {
        let service = ResumeService::new();
        let padding = "x".repeat(MIN_RESUME_CHARS);
        for token in ["email", "@", "Experience", "WORK", "degree", "university"] {
            let text = format!("{} {}", padding, token);
            assert!(service.has_valid_content(&text), "token {token}");
        }
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(clean_text("a\n\n  b\tc"), "a b c");
    }
}
