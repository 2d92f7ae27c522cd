//! Receipt parsing command

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use finsmart_core::{
    extract_text_or_empty, MemoryStore, ParseResult, PlainTextExtractor, TesseractExtractor,
    TextExtractor, TransactionParser,
};
use tracing::info;

use super::{ai_client, load_rules, open_store, print_json, today_or};

/// Content type from the file extension
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("tiff") | Some("tif") => "image/tiff",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => "text/plain",
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn run_parse(
    config: Option<&Path>,
    file: &Path,
    data: Option<&Path>,
    user: &str,
    ocr: bool,
    today: Option<NaiveDate>,
    no_ai: bool,
) -> Result<ParseResult> {
    let rules = load_rules(config)?;
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let mime = mime_for(file);

    let extractor: Box<dyn TextExtractor> = if ocr {
        Box::new(TesseractExtractor::new())
    } else {
        Box::new(PlainTextExtractor)
    };
    let text = extract_text_or_empty(extractor.as_ref(), &bytes, mime).await;

    let store = match data {
        Some(path) => open_store(path)?,
        None => MemoryStore::new(),
    };

    let parser = TransactionParser::new(&rules)?.with_ai(ai_client(no_ai));
    let result = parser
        .parse_transactions_on(&store, &text, user, today_or(today))
        .await;

    info!(
        file = %file.display(),
        candidates = result.transactions.len(),
        fallback = result.used_fallback(),
        "Receipt parsed"
    );
    Ok(result)
}

#[allow(clippy::too_many_arguments)]
pub async fn cmd_parse(
    config: Option<&Path>,
    file: &Path,
    data: Option<&Path>,
    user: &str,
    ocr: bool,
    today: Option<NaiveDate>,
    no_ai: bool,
) -> Result<()> {
    let result = run_parse(config, file, data, user, ocr, today, no_ai).await?;
    print_json(&result)
}
