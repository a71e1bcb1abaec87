//! File-format and bank detection.
//!
//! Extension first, then a short content sniff; given the format, each
//! registered bank's own `matches` predicate is tried in a fixed priority
//! order, specific banks before the generic CSV/Excel fallbacks.

use std::io::Read;
use std::path::Path;

use crate::error::{KopilkaError, Result};

use super::StatementFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Pdf,
    Csv,
    Excel,
    Unknown,
}

pub fn detect_file_format(path: &Path) -> Result<FileFormat> {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => return Ok(FileFormat::Pdf),
            "csv" | "txt" => return Ok(FileFormat::Csv),
            "xls" | "xlsx" => return Ok(FileFormat::Excel),
            _ => {}
        }
    }
    sniff(path)
}

fn sniff(path: &Path) -> Result<FileFormat> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| KopilkaError::SourceUnavailable(format!("{}: {e}", path.display())))?;
    let mut buf = [0u8; 64];
    let n = file.read(&mut buf)?;
    let head = &buf[..n];

    if head.starts_with(b"%PDF-") {
        return Ok(FileFormat::Pdf);
    }
    // xlsx is a zip container
    if head.starts_with(b"PK\x03\x04") {
        return Ok(FileFormat::Excel);
    }
    if let Ok(text) = std::str::from_utf8(head) {
        if text.contains(';') || text.contains(',') {
            return Ok(FileFormat::Csv);
        }
    }
    Ok(FileFormat::Unknown)
}

// ---------------------------------------------------------------------------
// Bank registry — enum dispatch, priority order fixed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    Sberbank,
    Tinkoff,
    AlfaBank,
    OzonBank,
    #[cfg(feature = "excel")]
    GenericExcel,
    GenericCsv,
}

/// Specific banks before generic fallbacks.
pub const ALL_BANKS: &[Bank] = &[
    Bank::Sberbank,
    Bank::Tinkoff,
    Bank::AlfaBank,
    Bank::OzonBank,
    #[cfg(feature = "excel")]
    Bank::GenericExcel,
    Bank::GenericCsv,
];

impl Bank {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Sberbank => "sberbank",
            Self::Tinkoff => "tinkoff",
            Self::AlfaBank => "alfabank",
            Self::OzonBank => "ozon",
            #[cfg(feature = "excel")]
            Self::GenericExcel => "excel",
            Self::GenericCsv => "csv",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sberbank => "Sberbank",
            Self::Tinkoff => "T-Bank",
            Self::AlfaBank => "Alfa-Bank",
            Self::OzonBank => "Ozon Bank",
            #[cfg(feature = "excel")]
            Self::GenericExcel => "Excel Import",
            Self::GenericCsv => "CSV Import",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Sberbank => "#21A038",
            Self::Tinkoff => "#FFDD2D",
            Self::AlfaBank => "#EF3124",
            Self::OzonBank => "#005BFF",
            #[cfg(feature = "excel")]
            Self::GenericExcel => "#1D6F42",
            Self::GenericCsv => "#9E9E9E",
        }
    }

    /// A fresh strategy object for one run.
    pub fn parser(&self) -> Box<dyn StatementFormat> {
        match self {
            Self::Sberbank => Box::new(super::sberbank::SberbankStatement::new()),
            Self::Tinkoff => Box::new(super::tinkoff::TinkoffStatement::new()),
            Self::AlfaBank => Box::new(super::alfabank::AlfabankStatement::new()),
            Self::OzonBank => Box::new(super::ozon::OzonStatement::new()),
            #[cfg(feature = "excel")]
            Self::GenericExcel => Box::new(super::excel::ExcelStatement::new()),
            Self::GenericCsv => Box::new(super::generic_csv::CsvStatement::new()),
        }
    }

    fn matches(&self, file_name: &str, format: FileFormat, lines: &[String]) -> bool {
        match self {
            Self::Sberbank => super::sberbank::matches(file_name, format, lines),
            Self::Tinkoff => super::tinkoff::matches(file_name, format, lines),
            Self::AlfaBank => super::alfabank::matches(file_name, format, lines),
            Self::OzonBank => super::ozon::matches(file_name, format, lines),
            #[cfg(feature = "excel")]
            Self::GenericExcel => format == FileFormat::Excel,
            Self::GenericCsv => matches!(format, FileFormat::Csv | FileFormat::Unknown),
        }
    }
}

pub fn by_key(key: &str) -> Option<Bank> {
    ALL_BANKS.iter().find(|b| b.key() == key).copied()
}

pub fn detect_bank(file_name: &str, format: FileFormat, lines: &[String]) -> Option<Bank> {
    ALL_BANKS
        .iter()
        .copied()
        .find(|b| b.matches(file_name, format, lines))
}

/// Brand strings live in the letterhead; only the first few lines count.
pub(crate) fn prefix_contains(lines: &[String], take: usize, markers: &[&str]) -> bool {
    lines
        .iter()
        .take(take)
        .any(|l| {
            let upper = l.to_uppercase();
            markers.iter().any(|m| upper.contains(m))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn to_lines(text: &str) -> Vec<String> {
        text.lines().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_format_by_extension() {
        assert_eq!(
            detect_file_format(Path::new("statement.PDF")).ok(),
            Some(FileFormat::Pdf)
        );
        assert_eq!(
            detect_file_format(Path::new("statement.csv")).ok(),
            Some(FileFormat::Csv)
        );
        assert_eq!(
            detect_file_format(Path::new("statement.xlsx")).ok(),
            Some(FileFormat::Excel)
        );
    }

    #[test]
    fn test_format_by_magic_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("noext");
        std::fs::File::create(&pdf)
            .unwrap()
            .write_all(b"%PDF-1.7 blah")
            .unwrap();
        assert_eq!(detect_file_format(&pdf).unwrap(), FileFormat::Pdf);

        let zip = dir.path().join("noext2");
        std::fs::File::create(&zip)
            .unwrap()
            .write_all(b"PK\x03\x04rest")
            .unwrap();
        assert_eq!(detect_file_format(&zip).unwrap(), FileFormat::Excel);
    }

    #[test]
    fn test_format_by_delimiter_sniff() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("data");
        std::fs::write(&csv, "01.06.2024;Магазин;-100,00").unwrap();
        assert_eq!(detect_file_format(&csv).unwrap(), FileFormat::Csv);
    }

    #[test]
    fn test_missing_file_is_source_error() {
        let err = detect_file_format(Path::new("/nonexistent/file")).unwrap_err();
        assert!(err.to_string().contains("Cannot open file"));
    }

    #[test]
    fn test_bank_priority_specific_before_generic() {
        let lines = to_lines("СберБанк\nВыписка по платёжному счёту\n01.06.2024 12:00 Оплата -10,00");
        assert_eq!(
            detect_bank("statement.csv", FileFormat::Csv, &lines),
            Some(Bank::Sberbank)
        );
    }

    #[test]
    fn test_generic_csv_is_catch_all_for_text() {
        let lines = to_lines("01.06.2024;Supermarket XYZ;-1250.50;RUB");
        assert_eq!(
            detect_bank("export.csv", FileFormat::Csv, &lines),
            Some(Bank::GenericCsv)
        );
    }

    #[test]
    fn test_unbranded_pdf_has_no_bank() {
        let lines = to_lines("Some report\nwith nothing recognizable");
        assert_eq!(detect_bank("file.pdf", FileFormat::Pdf, &lines), None);
    }

    #[test]
    fn test_by_key() {
        assert_eq!(by_key("ozon"), Some(Bank::OzonBank));
        assert_eq!(by_key("nope"), None);
    }
}
