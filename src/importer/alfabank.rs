//! Alfa-Bank CSV exports. Semicolon-separated, credit and debit in
//! separate columns:
//!
//! ```text
//! Тип счёта;Номер счёта;Валюта;Дата операции;Референс проводки;Описание операции;Приход;Расход
//! Текущий счёт;40817810...;RUR;01.06.2024;CRD_123456;Оплата МАГНИТ;0,00;1250,50
//! ```
//!
//! Column positions are taken from the header row when present, so a
//! reordered export still imports.

use csv::StringRecord;

use crate::models::ParsedTransaction;

use super::cursor::LineCursor;
use super::detect::{prefix_contains, FileFormat};
use super::{currency_code, parse_date_flexible, parse_decimal, LineOutcome, StatementFormat, ValidationOutcome};

const VALIDATE_LINES: usize = 30;

const BRAND: &[&str] = &["АЛЬФА-БАНК", "АЛЬФА БАНК", "ALFA-BANK", "ALFABANK"];

const SUBTYPE_MARKERS: &[&str] = &["ДВИЖЕНИЕ СРЕДСТВ", "ДВИЖЕНИИ СРЕДСТВ"];

pub struct AlfabankStatement {
    idx_currency: usize,
    idx_date: usize,
    idx_reference: usize,
    idx_desc: usize,
    idx_credit: usize,
    idx_debit: usize,
}

impl AlfabankStatement {
    pub fn new() -> Self {
        // Standard layout; remapped from the header row if it differs.
        Self {
            idx_currency: 2,
            idx_date: 3,
            idx_reference: 4,
            idx_desc: 5,
            idx_credit: 6,
            idx_debit: 7,
        }
    }

    fn fields(line: &str) -> Option<StringRecord> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b';')
            .flexible(true)
            .from_reader(line.as_bytes());
        rdr.records().next()?.ok()
    }

    fn is_header_row(upper: &str) -> bool {
        upper.contains("ДАТА ОПЕРАЦИИ")
            && (upper.contains("ПРИХОД") || upper.contains("РЕФЕРЕНС"))
    }

    fn remap_columns(&mut self, header: &StringRecord) {
        for (i, field) in header.iter().enumerate() {
            let f = field.trim().to_uppercase();
            if f.contains("ВАЛЮТА") {
                self.idx_currency = i;
            } else if f.contains("ДАТА") {
                self.idx_date = i;
            } else if f.contains("РЕФЕРЕНС") {
                self.idx_reference = i;
            } else if f.contains("ОПИСАНИЕ") {
                self.idx_desc = i;
            } else if f.contains("ПРИХОД") {
                self.idx_credit = i;
            } else if f.contains("РАСХОД") {
                self.idx_debit = i;
            }
        }
    }

    fn parse_record(&self, record: &StringRecord) -> Option<ParsedTransaction> {
        let date = parse_date_flexible(record.get(self.idx_date)?)?;
        let title = record.get(self.idx_desc)?.trim();
        if title.is_empty() {
            return None;
        }

        let credit = record
            .get(self.idx_credit)
            .and_then(parse_decimal)
            .filter(|v| *v != 0.0);
        let debit = record
            .get(self.idx_debit)
            .and_then(parse_decimal)
            .filter(|v| *v != 0.0);

        let (amount, is_expense) = match (debit, credit) {
            (Some(d), _) => (d, true),
            (None, Some(c)) => (c, false),
            (None, None) => return None,
        };

        let currency = record
            .get(self.idx_currency)
            .map(currency_code)
            .unwrap_or("RUB");
        let note = record
            .get(self.idx_reference)
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(|r| format!("Референс {r}"));

        Some(ParsedTransaction {
            date,
            title: title.to_string(),
            amount,
            is_expense,
            currency: currency.to_string(),
            note,
        })
    }
}

impl Default for AlfabankStatement {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementFormat for AlfabankStatement {
    fn source_name(&self) -> &'static str {
        "Alfa-Bank"
    }

    fn source_color(&self) -> &'static str {
        "#EF3124"
    }

    fn validate(&self, cursor: &mut LineCursor) -> ValidationOutcome {
        let mut joined = String::new();
        for _ in 0..VALIDATE_LINES {
            let Some(line) = cursor.next_line() else { break };
            joined.push_str(&line.to_uppercase());
            joined.push('\n');
        }

        let has_header = joined.contains("ДАТА ОПЕРАЦИИ")
            && joined.contains("ПРИХОД")
            && joined.contains("РАСХОД");
        let has_brand = BRAND.iter().any(|m| joined.contains(m));

        if has_header {
            ValidationOutcome::Valid
        } else if has_brand && SUBTYPE_MARKERS.iter().any(|m| joined.contains(m)) {
            ValidationOutcome::WrongSubtype(
                "This is a funds-movement summary, not a transaction export. \
                 Download the operations CSV instead."
                    .to_string(),
            )
        } else {
            ValidationOutcome::Mismatch
        }
    }

    fn skip_headers(&mut self, cursor: &mut LineCursor) {
        loop {
            cursor.mark();
            let Some(line) = cursor.next_line() else { return };
            let upper = line.to_uppercase();
            if Self::is_header_row(&upper) {
                if let Some(record) = Self::fields(line) {
                    self.remap_columns(&record);
                }
                continue;
            }
            let data_shaped = Self::fields(line)
                .map(|r| self.parse_record(&r).is_some())
                .unwrap_or(false);
            if data_shaped {
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
        upper.starts_with("ИТОГО") || Self::is_header_row(&upper)
    }

    fn parse_line(&mut self, line: &str) -> LineOutcome {
        let Some(record) = Self::fields(line) else {
            return LineOutcome::Rejected;
        };
        match self.parse_record(&record) {
            Some(parsed) => LineOutcome::Parsed(parsed),
            None => LineOutcome::Rejected,
        }
    }
}

pub(crate) fn matches(file_name: &str, format: FileFormat, lines: &[String]) -> bool {
    if format != FileFormat::Csv {
        return false;
    }
    let fingerprint = lines.iter().take(5).any(|l| {
        let upper = l.to_uppercase();
        AlfabankStatement::is_header_row(&upper)
    });
    fingerprint
        || prefix_contains(lines, 10, BRAND)
        || file_name.to_lowercase().contains("alfa")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    const HEADER: &str = "Тип счёта;Номер счёта;Валюта;Дата операции;Референс проводки;Описание операции;Приход;Расход";

    #[test]
    fn test_parse_debit_row() {
        let mut p = AlfabankStatement::new();
        let LineOutcome::Parsed(tx) = p.parse_line(
            "Текущий счёт;40817810000000000001;RUR;01.06.2024;CRD_123456;Оплата МАГНИТ;0,00;1250,50",
        ) else {
            panic!("expected a parsed transaction");
        };
        assert!(tx.is_expense);
        assert_eq!(tx.amount, 1250.50);
        assert_eq!(tx.title, "Оплата МАГНИТ");
        assert_eq!(tx.currency, "RUB");
        assert_eq!(tx.note.as_deref(), Some("Референс CRD_123456"));
        assert_eq!(tx.date.day(), 1);
    }

    #[test]
    fn test_parse_credit_row() {
        let mut p = AlfabankStatement::new();
        let LineOutcome::Parsed(tx) = p.parse_line(
            "Текущий счёт;40817810000000000001;RUR;05.06.2024;REF_1;Зачисление зарплаты;75000,00;0,00",
        ) else {
            panic!("expected a parsed transaction");
        };
        assert!(!tx.is_expense);
        assert_eq!(tx.amount, 75_000.0);
    }

    #[test]
    fn test_remapped_columns() {
        let mut p = AlfabankStatement::new();
        let mut cursor = LineCursor::from_text(
            "Дата операции;Описание операции;Валюта;Приход;Расход;Референс проводки\n\
             01.06.2024;Кафе;RUR;0,00;300,00;REF_9\n",
        );
        p.skip_headers(&mut cursor);
        let line = cursor.next_line().unwrap().to_string();
        let LineOutcome::Parsed(tx) = p.parse_line(&line) else {
            panic!("expected a parsed transaction");
        };
        assert_eq!(tx.title, "Кафе");
        assert!(tx.is_expense);
        assert_eq!(tx.amount, 300.0);
    }

    #[test]
    fn test_row_with_neither_side_is_rejected() {
        let mut p = AlfabankStatement::new();
        let outcome = p.parse_line("Текущий счёт;№ счёта;RUR;01.06.2024;REF;Описание;0,00;0,00");
        assert_eq!(outcome, LineOutcome::Rejected);
    }

    #[test]
    fn test_validate_by_header_fingerprint() {
        let p = AlfabankStatement::new();
        let text = format!("{HEADER}\nТекущий счёт;1;RUR;01.06.2024;R;Оплата;0,00;10,00\n");
        let mut cursor = LineCursor::from_text(&text);
        assert_eq!(p.validate(&mut cursor), ValidationOutcome::Valid);
    }

    #[test]
    fn test_validate_mismatch_on_random_csv() {
        let p = AlfabankStatement::new();
        let mut cursor = LineCursor::from_text("01.06.2024;Supermarket;-10,00;RUB\n");
        assert_eq!(p.validate(&mut cursor), ValidationOutcome::Mismatch);
    }

    #[test]
    fn test_detection() {
        let lines: Vec<String> = vec![HEADER.to_string()];
        assert!(matches("export.csv", FileFormat::Csv, &lines));
        assert!(!matches("export.csv", FileFormat::Pdf, &lines));
        assert!(matches("alfabank_june.csv", FileFormat::Csv, &[]));
    }

    #[test]
    fn test_header_row_is_skipped_when_repeated() {
        let p = AlfabankStatement::new();
        assert!(p.should_skip_line(HEADER));
        assert!(p.should_skip_line("Итого;;;;;;75000,00;1550,50"));
    }
}
