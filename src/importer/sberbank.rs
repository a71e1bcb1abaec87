//! Sberbank card/account statements (PDF text).
//!
//! Expected rows after PDF-to-text, income marked with `+`:
//!   01.06.2024 12:34 123456 Оплата товаров и услуг ПЯТЁРОЧКА 1 250,50
//!   03.06.2024 09:10 Перевод на карту +5 000,00

use regex::Regex;

use crate::models::ParsedTransaction;

use super::cursor::LineCursor;
use super::detect::{prefix_contains, FileFormat};
use super::{parse_date_dmy, parse_decimal, parse_time, LineOutcome, StatementFormat, ValidationOutcome};

const VALIDATE_LINES: usize = 30;

const BRAND: &[&str] = &["СБЕРБАНК", "СБЕР БАНК", "SBERBANK", "ПАО СБЕРБАНК"];

const TITLES: &[&str] = &[
    "ВЫПИСКА ПО ПЛАТЁЖНОМУ СЧЁТУ",
    "ВЫПИСКА ПО ПЛАТЕЖНОМУ СЧЕТУ",
    "ВЫПИСКА ПО СЧЁТУ ДЕБЕТОВОЙ КАРТЫ",
    "ВЫПИСКА ПО СЧЕТУ ДЕБЕТОВОЙ КАРТЫ",
    "ВЫПИСКА ОПЕРАЦИЙ",
];

// Column layouts have changed over the years; each row is one known set
// that must co-occur in the prefix. Adding a layout is adding a row.
const HEADER_LAYOUTS: &[&[&str]] = &[
    &["ДАТА ОПЕРАЦИИ", "СУММА"],
    &["ДАТА", "КАТЕГОРИЯ", "СУММА"],
];

const SUBTYPE_MARKERS: &[&str] = &["ДВИЖЕНИЕ СРЕДСТВ", "ДВИЖЕНИИ СРЕДСТВ"];

pub struct SberbankStatement {
    line_re: Regex,
    data_start_re: Regex,
    skip_re: Vec<Regex>,
}

impl SberbankStatement {
    pub fn new() -> Self {
        Self {
            line_re: Regex::new(
                r"^(?P<date>\d{2}\.\d{2}\.\d{4})\s+(?P<time>\d{2}:\d{2})\s+(?:(?P<auth>\d{4,8})\s+)?(?P<desc>.+?)\s+(?P<sign>[+\-\u{2212}])?(?P<amount>(?:\d{1,3}(?:\s\d{3})+|\d+)(?:[.,]\d{2})?)(?:\s*₽)?$",
            )
            .unwrap(),
            data_start_re: Regex::new(r"^\d{2}\.\d{2}\.\d{4}\s+\d{2}:\d{2}").unwrap(),
            skip_re: vec![
                Regex::new(r"(?i)^(итого|всего)\b").unwrap(),
                Regex::new(r"(?i)^остаток").unwrap(),
                Regex::new(r"(?i)страница\s*\d+\s*из\s*\d+").unwrap(),
                Regex::new(r"(?i)продолжение на следующей странице").unwrap(),
                Regex::new(r"(?i)^дата\s+операции").unwrap(),
                Regex::new(r"(?i)сформировано в сбер").unwrap(),
            ],
        }
    }
}

impl Default for SberbankStatement {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementFormat for SberbankStatement {
    fn source_name(&self) -> &'static str {
        "Sberbank"
    }

    fn source_color(&self) -> &'static str {
        "#21A038"
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
                 Export the account statement (выписка) instead."
                    .to_string(),
            )
        } else {
            ValidationOutcome::Mismatch
        }
    }

    fn skip_headers(&mut self, cursor: &mut LineCursor) {
        // Banner, title, the "Период: с ... по ..." line and column headers
        // (possibly split across lines) are all consumed; the first
        // date-shaped line is left in place.
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
        let note = caps
            .name("auth")
            .map(|a| format!("Код авторизации {}", a.as_str()));

        LineOutcome::Parsed(ParsedTransaction {
            date: date.and_time(time),
            title: caps["desc"].trim().to_string(),
            amount,
            is_expense,
            currency: "RUB".to_string(),
            note,
        })
    }
}

pub(crate) fn matches(file_name: &str, format: FileFormat, lines: &[String]) -> bool {
    format != FileFormat::Excel
        && (prefix_contains(lines, 10, BRAND) || file_name.to_lowercase().contains("sber"))
}
