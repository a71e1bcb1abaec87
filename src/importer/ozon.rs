//! Ozon Bank statements (PDF text). Each record is split across several
//! physical lines:
//!
//! ```text
//! 01.06.2024
//! 14:32:10
//! 778812
//! Перевод другу
//! -500 ₽
//! ```
//!
//! The parser is an explicit state machine over those fragments. A fresh
//! date line always starts a new record; if one was already being
//! assembled it is discarded, not emitted.

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

use crate::models::ParsedTransaction;

use super::cursor::LineCursor;
use super::detect::{prefix_contains, FileFormat};
use super::{currency_code, parse_date_dmy, parse_decimal, parse_time, LineOutcome, StatementFormat, ValidationOutcome};

const VALIDATE_LINES: usize = 30;

const BRAND: &[&str] = &["ОЗОН БАНК", "OZON БАНК", "OZON BANK", "ОЗОН-БАНК"];

const TITLES: &[&str] = &["ВЫПИСКА ПО СЧЁТУ", "ВЫПИСКА ПО СЧЕТУ", "ВЫПИСКА ЗА ПЕРИОД"];

const HEADER_LAYOUTS: &[&[&str]] = &[
    &["ДАТА", "НАЗНАЧЕНИЕ", "СУММА"],
    &["ДАТА", "ДОКУМЕНТ", "СУММА"],
];

const SUBTYPE_MARKERS: &[&str] = &["ДВИЖЕНИЕ СРЕДСТВ", "ДВИЖЕНИИ СРЕДСТВ"];

/// One in-progress record; single-slot, exactly one live per run.
enum State {
    Idle,
    AwaitingTime {
        date: NaiveDate,
    },
    AwaitingDocument {
        date: NaiveDate,
        time: NaiveTime,
    },
    AwaitingAmount {
        date: NaiveDate,
        time: Option<NaiveTime>,
        doc: Option<String>,
        description: String,
    },
}

pub struct OzonStatement {
    state: State,
    date_re: Regex,
    time_re: Regex,
    doc_re: Regex,
    amount_re: Regex,
    skip_re: Vec<Regex>,
}

impl OzonStatement {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            date_re: Regex::new(r"^\d{2}\.\d{2}\.\d{4}$").unwrap(),
            time_re: Regex::new(r"^\d{2}:\d{2}(?::\d{2})?$").unwrap(),
            doc_re: Regex::new(r"^\d{5,10}$").unwrap(),
            amount_re: Regex::new(
                r"^(?P<sign>[+\-\u{2212}])?\s*(?P<amount>(?:\d{1,3}(?:\s\d{3})+|\d+)(?:[.,]\d{1,2})?)\s*(?P<cur>₽|RUB|USD|EUR|\$|€)$",
            )
            .unwrap(),
            skip_re: vec![
                Regex::new(r"(?i)^(итого|входящий остаток|исходящий остаток)").unwrap(),
                Regex::new(r"(?i)страница\s*\d+").unwrap(),
                Regex::new(r"(?i)^дата\s").unwrap(),
                Regex::new(r"(?i)^назначение платежа").unwrap(),
            ],
        }
    }

    fn finalize(
        &self,
        date: NaiveDate,
        time: Option<NaiveTime>,
        doc: Option<String>,
        description: String,
        amount_line: &str,
    ) -> Option<ParsedTransaction> {
        let caps = self.amount_re.captures(amount_line)?;
        let amount = parse_decimal(&caps["amount"])?;
        let is_expense = caps.name("sign").map(|s| s.as_str()) != Some("+");
        Some(ParsedTransaction {
            date: date.and_time(time.unwrap_or(NaiveTime::MIN)),
            title: description,
            amount,
            is_expense,
            currency: currency_code(&caps["cur"]).to_string(),
            note: doc.map(|d| format!("Документ № {d}")),
        })
    }
}

impl Default for OzonStatement {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementFormat for OzonStatement {
    fn source_name(&self) -> &'static str {
        "Ozon Bank"
    }

    fn source_color(&self) -> &'static str {
        "#005BFF"
    }

    fn validate(&self, cursor: &mut LineCursor) -> ValidationOutcome {
        let mut joined = String::new();
        for _ in 0..VALIDATE_LINES {
            let Some(line) = cursor.next_line() else { break };
            joined.push_str(&line.to_uppercase());
            joined.push('\n');
        }

        let has_brand = BRAND.iter().any(|m| joined.contains(m));
        let has_title = TITLES.iter().any(|m| joined.contains(m));
        let has_header = HEADER_LAYOUTS
            .iter()
            .any(|cols| cols.iter().all(|c| joined.contains(c)));

        if has_brand && has_title && has_header {
            ValidationOutcome::Valid
        } else if has_brand && SUBTYPE_MARKERS.iter().any(|m| joined.contains(m)) {
            ValidationOutcome::WrongSubtype(
                "This is a funds-movement summary, not a list of transactions. \
                 Export the account statement instead."
                    .to_string(),
            )
        } else {
            ValidationOutcome::Mismatch
        }
    }

    fn skip_headers(&mut self, cursor: &mut LineCursor) {
        // The first record starts with a bare date line.
        loop {
            cursor.mark();
            let Some(line) = cursor.next_line() else { return };
            if self.date_re.is_match(line.trim()) {
                cursor.rewind();
                return;
            }
        }
    }

    fn should_skip_line(&self, line: &str) -> bool {
        let trimmed = line.trim();
        trimmed.is_empty() || self.skip_re.iter().any(|re| re.is_match(trimmed))
    }

    fn parse_line(&mut self, line: &str) -> LineOutcome {
        let line = line.trim();

        // A date line always opens a new record, silently dropping any
        // half-assembled one.
        if self.date_re.is_match(line) {
            if let Some(date) = parse_date_dmy(line) {
                self.state = State::AwaitingTime { date };
                return LineOutcome::Pending;
            }
            self.state = State::Idle;
            return LineOutcome::Rejected;
        }

        match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => LineOutcome::Rejected,

            State::AwaitingTime { date } => {
                if let Some(time) = parse_time_strict(&self.time_re, line) {
                    self.state = State::AwaitingDocument { date, time };
                    LineOutcome::Pending
                } else if self.doc_re.is_match(line) {
                    self.state = State::AwaitingAmount {
                        date,
                        time: None,
                        doc: Some(line.to_string()),
                        description: String::new(),
                    };
                    LineOutcome::Pending
                } else if self.amount_re.is_match(line) {
                    // Amount with no description: nothing to emit.
                    LineOutcome::Rejected
                } else {
                    self.state = State::AwaitingAmount {
                        date,
                        time: None,
                        doc: None,
                        description: line.to_string(),
                    };
                    LineOutcome::Pending
                }
            }

            State::AwaitingDocument { date, time } => {
                if self.doc_re.is_match(line) {
                    self.state = State::AwaitingAmount {
                        date,
                        time: Some(time),
                        doc: Some(line.to_string()),
                        description: String::new(),
                    };
                    LineOutcome::Pending
                } else if self.amount_re.is_match(line) {
                    LineOutcome::Rejected
                } else {
                    self.state = State::AwaitingAmount {
                        date,
                        time: Some(time),
                        doc: None,
                        description: line.to_string(),
                    };
                    LineOutcome::Pending
                }
            }

            State::AwaitingAmount {
                date,
                time,
                doc,
                mut description,
            } => {
                if self.amount_re.is_match(line) {
                    if description.is_empty() {
                        return LineOutcome::Rejected;
                    }
                    match self.finalize(date, time, doc, description, line) {
                        Some(parsed) => LineOutcome::Parsed(parsed),
                        None => LineOutcome::Rejected,
                    }
                } else if doc.is_none() && self.doc_re.is_match(line) {
                    self.state = State::AwaitingAmount {
                        date,
                        time,
                        doc: Some(line.to_string()),
                        description,
                    };
                    LineOutcome::Pending
                } else {
                    // Description continues on the next physical line.
                    if !description.is_empty() {
                        description.push(' ');
                    }
                    description.push_str(line);
                    self.state = State::AwaitingAmount {
                        date,
                        time,
                        doc,
                        description,
                    };
                    LineOutcome::Pending
                }
            }
        }
    }
}

fn parse_time_strict(re: &Regex, line: &str) -> Option<NaiveTime> {
    if re.is_match(line) {
        parse_time(line)
    } else {
        None
    }
}

pub(crate) fn matches(file_name: &str, format: FileFormat, lines: &[String]) -> bool {
    format != FileFormat::Excel
        && (prefix_contains(lines, 10, BRAND) || file_name.to_lowercase().contains("ozon"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn feed(parser: &mut OzonStatement, lines: &[&str]) -> Vec<ParsedTransaction> {
        let mut out = Vec::new();
        for line in lines {
            if let LineOutcome::Parsed(tx) = parser.parse_line(line) {
                out.push(tx);
            }
        }
        out
    }

    #[test]
    fn test_full_record() {
        let mut p = OzonStatement::new();
        let txs = feed(
            &mut p,
            &["01.06.2024", "14:32:10", "778812", "Перевод другу", "-500 ₽"],
        );
        assert_eq!(txs.len(), 1);
        let tx = &txs[0];
        assert_eq!(tx.amount, 500.0);
        assert!(tx.is_expense);
        assert_eq!(tx.currency, "RUB");
        assert_eq!(tx.title, "Перевод другу");
        assert!(tx.note.as_deref().unwrap().contains("778812"));
        assert_eq!(tx.date.hour(), 14);
        assert_eq!(tx.date.second(), 10);
    }

    #[test]
    fn test_new_date_discards_pending_record() {
        let mut p = OzonStatement::new();
        let txs = feed(
            &mut p,
            &[
                "01.06.2024",
                "14:32:10",
                "Кафе у дома",
                // no amount — record above must be dropped, not emitted
                "02.06.2024",
                "10:00:00",
                "555555",
                "Обед",
                "-300 ₽",
            ],
        );
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].title, "Обед");
    }

    #[test]
    fn test_multi_line_description_is_space_joined() {
        let mut p = OzonStatement::new();
        let txs = feed(
            &mut p,
            &[
                "01.06.2024",
                "14:32:10",
                "778812",
                "Оплата по СБП",
                "ООО Ромашка",
                "-1 250,50 ₽",
            ],
        );
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].title, "Оплата по СБП ООО Ромашка");
        assert_eq!(txs[0].amount, 1250.50);
    }

    #[test]
    fn test_income_with_plus() {
        let mut p = OzonStatement::new();
        let txs = feed(&mut p, &["01.06.2024", "09:00:00", "Возврат за заказ", "+1 000 ₽"]);
        assert_eq!(txs.len(), 1);
        assert!(!txs[0].is_expense);
        assert_eq!(txs[0].amount, 1000.0);
    }

    #[test]
    fn test_record_without_time_or_document() {
        let mut p = OzonStatement::new();
        let txs = feed(&mut p, &["01.06.2024", "Покупка Ozon", "-99,90 ₽"]);
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].date.hour(), 0);
        assert_eq!(txs[0].note, None);
    }

    #[test]
    fn test_amount_without_description_is_rejected() {
        let mut p = OzonStatement::new();
        let mut outcomes = Vec::new();
        for line in ["01.06.2024", "14:32:10", "-500 ₽"] {
            outcomes.push(p.parse_line(line));
        }
        assert_eq!(outcomes[2], LineOutcome::Rejected);
    }

    #[test]
    fn test_validate_and_headers() {
        let p = OzonStatement::new();
        let doc = "\
Озон Банк (ООО)
Выписка по счёту
Дата Документ Назначение платежа Сумма
01.06.2024
14:32:10
778812
Перевод другу
-500 ₽
";
        let mut cursor = LineCursor::from_text(doc);
        assert_eq!(p.validate(&mut cursor), ValidationOutcome::Valid);

        let mut p = OzonStatement::new();
        let mut cursor = LineCursor::from_text(doc);
        p.skip_headers(&mut cursor);
        assert_eq!(cursor.next_line(), Some("01.06.2024"));
    }

    #[test]
    fn test_skip_patterns() {
        let p = OzonStatement::new();
        assert!(p.should_skip_line("Исходящий остаток: 10 000,00 ₽"));
        assert!(p.should_skip_line("Дата Документ Назначение платежа Сумма"));
        assert!(p.should_skip_line("Страница 2"));
        assert!(!p.should_skip_line("01.06.2024"));
        assert!(!p.should_skip_line("-500 ₽"));
    }
}
