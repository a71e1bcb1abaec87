//! T-Bank (Tinkoff) account statements (PDF text).
//!
//! Rows carry the operation amount and the card-currency amount, with an
//! optional write-off date between the timestamp and the first amount:
//!   01.06.2024 14:32 02.06.2024 −500,00 ₽ −500,00 ₽ Перевод другу

use regex::Regex;

use crate::models::ParsedTransaction;

use super::cursor::LineCursor;
use super::detect::{prefix_contains, FileFormat};
use super::{currency_code, parse_date_dmy, parse_decimal, parse_time, LineOutcome, StatementFormat, ValidationOutcome};

const VALIDATE_LINES: usize = 30;

const BRAND: &[&str] = &["ТИНЬКОФФ", "TINKOFF", "Т-БАНК", "T-BANK", "ТБАНК"];

const TITLES: &[&str] = &[
    "ВЫПИСКА ПО ДОГОВОРУ",
    "ВЫПИСКА ЗА ПЕРИОД",
    "ВЫПИСКА ПО СЧЁТУ",
    "ВЫПИСКА ПО СЧЕТУ",
];

const HEADER_LAYOUTS: &[&[&str]] = &[
    &["ДАТА И ВРЕМЯ", "СУММА", "ОПИСАНИЕ"],
    &["ДАТА ОПЕРАЦИИ", "СУММА ОПЕРАЦИИ", "ОПИСАНИЕ"],
];

// «Справка о движении средств» is a balance summary the bank offers next
// to the real statement; people pick the wrong one all the time.
const SUBTYPE_MARKERS: &[&str] = &["ДВИЖЕНИИ СРЕДСТВ", "ДВИЖЕНИЕ СРЕДСТВ"];

pub struct TinkoffStatement {
    line_re: Regex,
    data_start_re: Regex,
    skip_re: Vec<Regex>,
}

impl TinkoffStatement {
    pub fn new() -> Self {
        Self {
            line_re: Regex::new(
                r"^(?P<date>\d{2}\.\d{2}\.\d{4})\s+(?P<time>\d{2}:\d{2}(?::\d{2})?)\s+(?:\d{2}\.\d{2}\.\d{4}\s+)?(?P<sign>[+\-\u{2212}])?(?P<amount>(?:\d{1,3}(?:\s\d{3})+|\d+)(?:[.,]\d{2})?)\s*(?P<cur>₽|RUB|USD|EUR|\$|€)(?:\s+[+\-\u{2212}]?(?:\d{1,3}(?:\s\d{3})+|\d+)(?:[.,]\d{2})?\s*(?:₽|RUB|USD|EUR|\$|€))?\s+(?P<desc>.+)$",
            )
            .unwrap(),
            data_start_re: Regex::new(r"^\d{2}\.\d{2}\.\d{4}\s+\d{2}:\d{2}").unwrap(),
            skip_re: vec![
                Regex::new(r"(?i)^(итого|пополнения:|траты:|баланс)").unwrap(),
                Regex::new(r"(?i)страница\s*\d+").unwrap(),
                Regex::new(r"(?i)^номер договора").unwrap(),
                Regex::new(r"(?i)^дата формирования").unwrap(),
                Regex::new(r"(?i)^дата (и время|операции)").unwrap(),
            ],
        }
    }
}

impl Default for TinkoffStatement {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementFormat for TinkoffStatement {
    fn source_name(&self) -> &'static str {
        "T-Bank"
    }

    fn source_color(&self) -> &'static str {
        "#FFDD2D"
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
                "This is the funds-movement certificate (справка о движении средств), \
                 not a transaction statement. Request the account statement instead."
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
            if self.data_start_re.is_match(line.trim()) {
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
        let Some(caps) = self.line_re.captures(line.trim()) else {
            return LineOutcome::Rejected;
        };
        let (Some(date), Some(time)) = (parse_date_dmy(&caps["date"]), parse_time(&caps["time"]))
        else {
            return LineOutcome::Rejected;
        };
        let Some(amount) = parse_decimal(&caps["amount"]) else {
            return LineOutcome::Rejected;
        };

        let is_expense = caps.name("sign").map(|s| s.as_str()) != Some("+");

        LineOutcome::Parsed(ParsedTransaction {
            date: date.and_time(time),
            title: caps["desc"].trim().to_string(),
            amount,
            is_expense,
            currency: currency_code(&caps["cur"]).to_string(),
            note: None,
        })
    }
}

pub(crate) fn matches(file_name: &str, format: FileFormat, lines: &[String]) -> bool {
    let name = file_name.to_lowercase();
    format != FileFormat::Excel
        && (prefix_contains(lines, 10, BRAND)
            || name.contains("tinkoff")
            || name.contains("tbank"))
}
