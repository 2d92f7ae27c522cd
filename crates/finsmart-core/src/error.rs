//! Error types for finsmart

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("{backend} returned {status}: {body}")]
    Backend {
        backend: &'static str,
        status: u16,
        body: String,
    },

    #[error("AI request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Batch item {index}: goal allocations total {allocated} exceed amount {amount}")]
    AllocationExceedsAmount {
        index: usize,
        allocated: i64,
        amount: i64,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
