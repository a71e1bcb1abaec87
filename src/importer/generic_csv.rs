//! Catch-all CSV handler: `date;description;amount[;currency]` with the
//! delimiter sniffed per file and both `.`/`,` decimals accepted.

use crate::models::ParsedTransaction;

use super::cursor::LineCursor;
use super::{
    currency_code, parse_date_flexible, parse_decimal, LineOutcome, StatementFormat,
    ValidationOutcome,
};

const VALIDATE_LINES: usize = 30;

pub struct CsvStatement {
    /// Forced delimiter (the Excel handler feeds `;`-joined rows);
    /// sniffed per line when unset.
    delimiter: Option<u8>,
}

impl CsvStatement {
    pub fn new() -> Self {
        Self { delimiter: None }
    }

    pub(crate) fn with_delimiter(delimiter: u8) -> Self {
        Self {
            delimiter: Some(delimiter),
        }
    }

    fn delimiter_for(&self, line: &str) -> u8 {
        if let Some(d) = self.delimiter {
            return d;
        }
        let semis = line.matches(';').count();
        let commas = line.matches(',').count();
        if semis > 0 && semis >= commas {
            b';'
        } else {
            b','
        }
    }

    pub(crate) fn parse_record(&self, line: &str) -> Option<ParsedTransaction> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(self.delimiter_for(line))
            .flexible(true)
            .from_reader(line.as_bytes());
        let record = rdr.records().next()?.ok()?;
        if record.len() < 3 {
            return None;
        }

        let date = parse_date_flexible(record.get(0)?)?;
        let title = record.get(1)?.trim();
        if title.is_empty() {
            return None;
        }
        let amount = parse_decimal(record.get(2)?)?;
        let currency = record
            .get(3)
            .filter(|c| !c.trim().is_empty())
            .map(currency_code)
            .unwrap_or("RUB");

        Some(ParsedTransaction {
            date,
            title: title.to_string(),
            amount: amount.abs(),
            is_expense: amount < 0.0,
            currency: currency.to_string(),
            note: None,
        })
    }
}

impl Default for CsvStatement {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementFormat for CsvStatement {
    fn source_name(&self) -> &'static str {
        "CSV Import"
    }

    fn source_color(&self) -> &'static str {
        "#9E9E9E"
    }

    fn validate(&self, cursor: &mut LineCursor) -> ValidationOutcome {
        for _ in 0..VALIDATE_LINES {
            let Some(line) = cursor.next_line() else { break };
            if self.parse_record(line).is_some() {
                return ValidationOutcome::Valid;
            }
        }
        ValidationOutcome::Mismatch
    }

    fn skip_headers(&mut self, cursor: &mut LineCursor) {
        // Consume everything (header row, blanks) up to the first
        // data-shaped line; degenerate headerless files keep line one.
        loop {
            cursor.mark();
            let Some(line) = cursor.next_line() else { return };
            if self.parse_record(line).is_some() {
                cursor.rewind();
                return;
            }
        }
    }

    fn should_skip_line(&self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return true;
        }
        let upper = trimmed.to_uppercase();
        upper.starts_with("ДАТА;")
            || upper.starts_with("ДАТА,")
            || upper.starts_with("DATE;")
            || upper.starts_with("DATE,")
            || upper.starts_with("ИТОГО")
    }

    fn parse_line(&mut self, line: &str) -> LineOutcome {
        match self.parse_record(line) {
            Some(parsed) => LineOutcome::Parsed(parsed),
            None => LineOutcome::Rejected,
        }
    }
}

// A bare CSV carries no branding, so this handler has no `matches` of its
// own; the registry uses it as the text catch-all (see detect.rs).

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_semicolon_record() {
        let p = CsvStatement::new();
        let parsed = p.parse_record("01.06.2024;Supermarket XYZ;-1250.50;RUB").unwrap();
        assert_eq!(parsed.date.day(), 1);
        assert_eq!(parsed.date.month(), 6);
        assert_eq!(parsed.date.year(), 2024);
        assert_eq!(parsed.title, "Supermarket XYZ");
        assert_eq!(parsed.amount, 1250.50);
        assert!(parsed.is_expense);
        assert_eq!(parsed.currency, "RUB");
    }

    #[test]
    fn test_comma_record_with_dot_decimals() {
        let p = CsvStatement::new();
        let parsed = p.parse_record("2024-06-01,Refund,42.10,USD").unwrap();
        assert!(!parsed.is_expense);
        assert_eq!(parsed.amount, 42.10);
        assert_eq!(parsed.currency, "USD");
    }

    #[test]
    fn test_date_with_time() {
        let p = CsvStatement::new();
        let parsed = p.parse_record("01.06.2024 14:32;Кафе;-300,00").unwrap();
        assert_eq!(parsed.date.hour(), 14);
        assert_eq!(parsed.date.minute(), 32);
        assert_eq!(parsed.currency, "RUB");
    }

    #[test]
    fn test_rejects_short_and_dateless_rows() {
        let p = CsvStatement::new();
        assert!(p.parse_record("только;два").is_none());
        assert!(p.parse_record("не дата;Магазин;-10,00").is_none());
        assert!(p.parse_record("").is_none());
    }

    #[test]
    fn test_header_then_data_skip() {
        let mut p = CsvStatement::new();
        let mut cursor = LineCursor::from_text(
            "Дата;Описание;Сумма;Валюта\n01.06.2024;Магазин;-100,00;RUB\n",
        );
        p.skip_headers(&mut cursor);
        assert_eq!(cursor.next_line(), Some("01.06.2024;Магазин;-100,00;RUB"));
    }

    #[test]
    fn test_headerless_file_keeps_first_line() {
        let mut p = CsvStatement::new();
        let mut cursor = LineCursor::from_text("01.06.2024;Магазин;-100,00;RUB\n");
        p.skip_headers(&mut cursor);
        assert_eq!(cursor.remaining(), 1);
    }

    #[test]
    fn test_validate() {
        let p = CsvStatement::new();
        let mut ok = LineCursor::from_text("Дата;Описание;Сумма\n01.06.2024;Магазин;-1,00\n");
        assert_eq!(p.validate(&mut ok), ValidationOutcome::Valid);
        let mut bad = LineCursor::from_text("prose\nmore prose\n");
        assert_eq!(p.validate(&mut bad), ValidationOutcome::Mismatch);
    }

    #[test]
    fn test_quoted_descriptions() {
        let p = CsvStatement::new();
        let parsed = p
            .parse_record("01.06.2024;\"Кафе; у дома\";-300,00;RUB")
            .unwrap();
        assert_eq!(parsed.title, "Кафе; у дома");
    }
}
