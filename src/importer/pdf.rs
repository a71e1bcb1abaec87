//! PDF-to-text extraction. The extractor is a black box; parsers only
//! ever see the flattened text lines.

use std::path::Path;

use crate::error::{KopilkaError, Result};

pub fn extract_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path)
        .map_err(|e| KopilkaError::SourceUnavailable(format!("{}: {e}", path.display())))?;
    let text = pdf_extract::extract_text_from_mem(&bytes)
        .map_err(|e| KopilkaError::Pdf(e.to_string()))?;
    Ok(text.lines().map(|l| l.trim_end().to_string()).collect())
}
