//! Text extraction seam for receipt uploads
//!
//! OCR is an external service. Its failures never reach the parser:
//! [`extract_text_or_empty`] degrades every error to an empty string,
//! which the parser turns into an empty result.

use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Error, Result};

/// Turns an uploaded buffer into UTF-8 text
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, data: &[u8], mime: &str) -> Result<String>;
}

/// Text uploads only; the buffer is decoded as (lossy) UTF-8
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, data: &[u8], mime: &str) -> Result<String> {
        if !mime.starts_with("text/") {
            return Err(Error::Ocr(format!("unsupported content type {}", mime)));
        }
        Ok(String::from_utf8_lossy(data).into_owned())
    }
}

/// Shells out to the `tesseract` binary for images; text uploads are
/// decoded directly
#[derive(Debug, Clone)]
pub struct TesseractExtractor {
    binary: String,
    languages: String,
    timeout: Duration,
}

impl Default for TesseractExtractor {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            languages: "eng+ind".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl TesseractExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(self, binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            ..self
        }
    }

    pub fn with_languages(self, languages: impl Into<String>) -> Self {
        Self {
            languages: languages.into(),
            ..self
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }
}

#[async_trait]
impl TextExtractor for TesseractExtractor {
    async fn extract(&self, data: &[u8], mime: &str) -> Result<String> {
        if mime.starts_with("text/") {
            return PlainTextExtractor.extract(data, mime).await;
        }
        if !mime.starts_with("image/") {
            return Err(Error::Ocr(format!("unsupported content type {}", mime)));
        }

        let mut image = tempfile::NamedTempFile::new()?;
        image.write_all(data)?;
        image.flush()?;

        let output = Command::new(&self.binary)
            .arg(image.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| Error::Ocr(format!("tesseract timed out after {:?}", self.timeout)))?
            .map_err(|e| Error::Ocr(format!("failed to run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Extract text, logging and swallowing any failure
pub async fn extract_text_or_empty(extractor: &dyn TextExtractor, data: &[u8], mime: &str) -> String {
    match extractor.extract(data, mime).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, mime = %mime, "Text extraction failed, continuing with empty text");
            String::new()
        }
    }
}
