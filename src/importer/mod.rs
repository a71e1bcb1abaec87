//! Bank statement import: format detection, per-bank parsers and the
//! shared import pipeline.
//!
//! One pipeline drives every format; bank-specific behavior is injected
//! through the [`StatementFormat`] strategy object. Parsers work on plain
//! text lines regardless of whether the source was a PDF, a CSV or a
//! spreadsheet.

pub mod alfabank;
pub mod cursor;
pub mod detect;
#[cfg(feature = "excel")]
pub mod excel;
pub mod generic_csv;
pub mod ozon;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod pipeline;
pub mod sberbank;
pub mod tinkoff;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::categorizer::Categorizer;
use crate::db::TransactionStore;
use crate::error::{KopilkaError, Result};
use crate::models::ParsedTransaction;
use cursor::LineCursor;
use detect::FileFormat;

/// Event stream consumed by whoever started the import (the CLI, a UI).
#[derive(Debug, Clone, PartialEq)]
pub enum ImportEvent {
    /// Informational; emitted any number of times, `current` is monotonic
    /// within one run.
    Progress {
        current: u32,
        total: u32,
        message: String,
    },
    /// Terminal; exactly one per completed run.
    Success {
        imported: usize,
        skipped: usize,
        message: Option<String>,
    },
    /// Terminal; mutually exclusive with `Success`.
    Error { message: String },
}

pub trait ProgressSink {
    fn emit(&mut self, event: ImportEvent);
}

impl<F: FnMut(ImportEvent)> ProgressSink for F {
    fn emit(&mut self, event: ImportEvent) {
        self(event)
    }
}

/// Shared cancellation flag; cloning hands out another handle to the
/// same flag.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Outcome of probing a document prefix against one bank's signature.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid,
    Mismatch,
    /// Branding matched but the document is a different kind of export
    /// (e.g. a funds-movement summary instead of a transaction ledger).
    WrongSubtype(String),
}

/// Outcome of feeding one line to a parser. Multi-line formats return
/// `Pending` while a record is being assembled; `Rejected` means the line
/// looked like data but could not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Parsed(ParsedTransaction),
    Pending,
    Rejected,
}

/// Per-bank strategy plugged into the shared pipeline. A strategy object
/// is single-run: multi-line formats keep a single-slot accumulator
/// between `parse_line` calls.
pub trait StatementFormat {
    fn source_name(&self) -> &'static str;
    fn source_color(&self) -> &'static str;

    /// Probe a bounded prefix. The pipeline marks the cursor before the
    /// call and rewinds afterwards, so implementations may read freely.
    fn validate(&self, cursor: &mut LineCursor) -> ValidationOutcome;

    /// Advance past banner/title/column-header lines, leaving the cursor
    /// exactly at the first data line. Takes `&mut self` because some
    /// formats learn their column layout from the header row.
    fn skip_headers(&mut self, cursor: &mut LineCursor);

    /// Footer/total/page-break noise. Conservative: a false positive
    /// silently drops real data, a false negative only wastes a parse.
    fn should_skip_line(&self, line: &str) -> bool;

    fn parse_line(&mut self, line: &str) -> LineOutcome;
}

/// Final accounting for one run. Parse skips and persistence failures are
/// tracked separately and never conflated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    pub imported: usize,
    pub parse_skipped: usize,
    pub persist_failed: usize,
    pub cancelled: bool,
}

impl ImportSummary {
    pub fn message(&self) -> Option<String> {
        let mut parts = Vec::new();
        if self.persist_failed > 0 {
            parts.push(format!("{} could not be saved", self.persist_failed));
        }
        if self.cancelled {
            parts.push("import cancelled before completion".to_string());
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }
}

/// Single entry point for the UI layer: resolves the file, picks a bank
/// pipeline and guarantees exactly one terminal event per call.
pub struct Importer<'a> {
    store: &'a dyn TransactionStore,
    categorizer: &'a dyn Categorizer,
    cancel: CancelToken,
}

impl<'a> Importer<'a> {
    pub fn new(store: &'a dyn TransactionStore, categorizer: &'a dyn Categorizer) -> Self {
        Self {
            store,
            categorizer,
            cancel: CancelToken::new(),
        }
    }

    /// Handle the caller can use to stop an in-flight run from another
    /// thread. Already-persisted transactions remain persisted.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn import_file(
        &self,
        path: &Path,
        format_key: Option<&str>,
        sink: &mut dyn ProgressSink,
    ) -> Result<ImportSummary> {
        let result = self.run(path, format_key, sink);
        match &result {
            Ok(summary) => sink.emit(ImportEvent::Success {
                imported: summary.imported,
                skipped: summary.parse_skipped,
                message: summary.message(),
            }),
            Err(e) => sink.emit(ImportEvent::Error {
                message: e.to_string(),
            }),
        }
        result
    }

    fn run(
        &self,
        path: &Path,
        format_key: Option<&str>,
        sink: &mut dyn ProgressSink,
    ) -> Result<ImportSummary> {
        if !path.is_file() {
            return Err(KopilkaError::SourceUnavailable(path.display().to_string()));
        }
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();

        let format = detect::detect_file_format(path)?;
        let lines = load_lines(path, format)?;

        let bank = match format_key {
            Some(key) => {
                detect::by_key(key).ok_or_else(|| KopilkaError::UnknownFormat(key.to_string()))?
            }
            None => detect::detect_bank(&file_name, format, &lines)
                .ok_or_else(|| KopilkaError::UnknownFormat(file_name.clone()))?,
        };

        let mut parser = bank.parser();
        pipeline::run(
            parser.as_mut(),
            LineCursor::new(lines),
            self.store,
            self.categorizer,
            sink,
            &self.cancel,
        )
    }
}

fn load_lines(path: &Path, format: FileFormat) -> Result<Vec<String>> {
    match format {
        FileFormat::Pdf => {
            #[cfg(feature = "pdf")]
            {
                pdf::extract_lines(path)
            }
            #[cfg(not(feature = "pdf"))]
            {
                Err(KopilkaError::Pdf("built without PDF support".to_string()))
            }
        }
        FileFormat::Excel => {
            #[cfg(feature = "excel")]
            {
                excel::workbook_lines(path)
            }
            #[cfg(not(feature = "excel"))]
            {
                Err(KopilkaError::Excel(
                    "built without spreadsheet support".to_string(),
                ))
            }
        }
        FileFormat::Csv | FileFormat::Unknown => {
            let bytes = std::fs::read(path).map_err(|e| {
                KopilkaError::SourceUnavailable(format!("{}: {e}", path.display()))
            })?;
            let text = String::from_utf8_lossy(&bytes);
            Ok(text.lines().map(|l| l.trim_end().to_string()).collect())
        }
    }
}

// ---------------------------------------------------------------------------
// Shared numeric/date normalization (every bank mixes `.`/`,` decimals and
// space-grouped thousands; one utility, not one per parser)
// ---------------------------------------------------------------------------

/// Parse `1 234,56`, `1,234.56`, `-1250.50`, `−500` (typographic minus,
/// NBSP groups) into a float.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '\u{2212}' { '-' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let normalized = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        // Both present: the later one is the decimal separator.
        (Some(dot), Some(comma)) => {
            if dot > comma {
                cleaned.replace(',', "")
            } else {
                cleaned.replace('.', "").replace(',', ".")
            }
        }
        (None, Some(_)) => cleaned.replace(',', "."),
        _ => cleaned,
    };
    normalized.parse().ok()
}

/// `dd.mm.yyyy`
pub fn parse_date_dmy(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.trim().split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let day: u32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let year: i32 = parts[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `HH:MM` or `HH:MM:SS`
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// Date with optional time, `dd.mm.yyyy` or ISO.
pub fn parse_date_flexible(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in [
        "%d.%m.%Y %H:%M:%S",
        "%d.%m.%Y %H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%d.%m.%Y", "%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Map a trailing currency marker to an ISO code.
pub fn currency_code(marker: &str) -> &'static str {
    match marker.trim() {
        "₽" | "RUB" | "RUR" | "руб." | "руб" => "RUB",
        "$" | "USD" => "USD",
        "€" | "EUR" => "EUR",
        _ => "RUB",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_locales() {
        assert_eq!(parse_decimal("1 234,56"), Some(1234.56));
        assert_eq!(parse_decimal("1,234.56"), Some(1234.56));
        assert_eq!(parse_decimal("-1250.50"), Some(-1250.50));
        assert_eq!(parse_decimal("1250,50"), Some(1250.50));
        assert_eq!(parse_decimal("500"), Some(500.0));
    }

    #[test]
    fn test_parse_decimal_typographic_minus_and_nbsp() {
        assert_eq!(parse_decimal("\u{2212}500"), Some(-500.0));
        assert_eq!(parse_decimal("1\u{a0}000,00"), Some(1000.0));
    }

    #[test]
    fn test_parse_decimal_garbage() {
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("abc"), None);
    }

    #[test]
    fn test_parse_date_dmy() {
        assert_eq!(
            parse_date_dmy("01.06.2024"),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
        assert_eq!(parse_date_dmy("31.02.2024"), None);
        assert_eq!(parse_date_dmy("2024-06-01"), None);
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("14:32:10"), NaiveTime::from_hms_opt(14, 32, 10));
        assert_eq!(parse_time("14:32"), NaiveTime::from_hms_opt(14, 32, 0));
        assert_eq!(parse_time("25:00"), None);
    }

    #[test]
    fn test_parse_date_flexible() {
        let d = parse_date_flexible("01.06.2024 14:32").unwrap();
        assert_eq!(d.format("%Y-%m-%d %H:%M").to_string(), "2024-06-01 14:32");
        let d = parse_date_flexible("2024-06-01").unwrap();
        assert_eq!(d.format("%H:%M").to_string(), "00:00");
    }

    #[test]
    fn test_currency_code() {
        assert_eq!(currency_code("₽"), "RUB");
        assert_eq!(currency_code("USD"), "USD");
        assert_eq!(currency_code("€"), "EUR");
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let a = CancelToken::new();
        let b = a.clone();
        assert!(!b.is_cancelled());
        a.cancel();
        assert!(b.is_cancelled());
    }
}
