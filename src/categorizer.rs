//! Deterministic description-to-category rules.
//!
//! No network, no model — keyword matching covers the bulk of real
//! statement descriptions, and everything else falls back to "Другое".

/// Black-box text classifier seam used by the import pipeline.
pub trait Categorizer {
    fn classify(&self, description: &str) -> String;
}

// (keywords, category) — first match wins, so more specific rows go first.
const RULES: &[(&[&str], &str)] = &[
    (
        &["ЗАРПЛАТА", "АВАНС", "SALARY", "PAYROLL", "ЗАЧИСЛЕНИЕ ЗАРАБОТНОЙ"],
        "Зарплата",
    ),
    (
        &["ПЯТЁРОЧКА", "ПЯТЕРОЧКА", "МАГНИТ", "ПЕРЕКРЁСТОК", "ПЕРЕКРЕСТОК", "АШАН", "ЛЕНТА", "ВКУСВИЛЛ", "SUPERMARKET", "GROCERY", "ПРОДУКТЫ"],
        "Продукты",
    ),
    (
        &["КАФЕ", "РЕСТОРАН", "КОФЕ", "COFFEE", "MCDONALD", "KFC", "БУРГЕР", "ШАУРМА", "СТОЛОВАЯ"],
        "Кафе и рестораны",
    ),
    (
        &["МЕТРО", "ТАКСИ", "TAXI", "UBER", "АВТОБУС", "ЭЛЕКТРИЧКА", "КАРШЕРИНГ", "АЗС", "БЕНЗИН"],
        "Транспорт",
    ),
    (
        &["АПТЕКА", "PHARMACY", "КЛИНИКА", "СТОМАТОЛОГ", "АНАЛИЗЫ"],
        "Здоровье",
    ),
    (
        &["МТС", "МЕГАФОН", "БИЛАЙН", "TELE2", "ИНТЕРНЕТ", "СВЯЗЬ"],
        "Связь",
    ),
    (
        &["ЖКХ", "КОММУНАЛ", "ЭЛЕКТРОЭНЕРГИЯ", "КВАРТПЛАТА", "АРЕНДА"],
        "Дом",
    ),
    (
        &["КИНО", "CINEMA", "STEAM", "ИГРЫ", "КОНЦЕРТ", "ТЕАТР", "NETFLIX", "КИНОПОИСК"],
        "Развлечения",
    ),
    (
        &["OZON", "WILDBERRIES", "ALIEXPRESS", "ЯНДЕКС МАРКЕТ", "МАРКЕТПЛЕЙС"],
        "Покупки",
    ),
    (&["ПЕРЕВОД", "TRANSFER", "СБП"], "Переводы"),
    (&["ПРОЦЕНТЫ", "КЕШБЭК", "КЭШБЭК", "CASHBACK"], "Кешбэк и проценты"),
];

pub const DEFAULT_CATEGORY: &str = "Другое";

/// Keyword classifier over a fixed rule table.
#[derive(Default)]
pub struct KeywordCategorizer;

impl KeywordCategorizer {
    pub fn new() -> Self {
        Self
    }
}

impl Categorizer for KeywordCategorizer {
    fn classify(&self, description: &str) -> String {
        let upper = description.to_uppercase();
        for (keywords, category) in RULES {
            if keywords.iter().any(|kw| upper.contains(kw)) {
                return (*category).to_string();
            }
        }
        DEFAULT_CATEGORY.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_russian_keywords() {
        let c = KeywordCategorizer::new();
        assert_eq!(c.classify("Пятёрочка 1123 Москва"), "Продукты");
        assert_eq!(c.classify("ЯНДЕКС.ТАКСИ"), "Транспорт");
        assert_eq!(c.classify("Перевод другу"), "Переводы");
    }

    #[test]
    fn test_latin_keywords() {
        let c = KeywordCategorizer::new();
        assert_eq!(c.classify("Supermarket XYZ"), "Продукты");
        assert_eq!(c.classify("UBER *TRIP"), "Транспорт");
    }

    #[test]
    fn test_case_insensitive() {
        let c = KeywordCategorizer::new();
        assert_eq!(c.classify("магнит косметик"), "Продукты");
    }

    #[test]
    fn test_first_match_wins() {
        // "Перевод" appears later in the table than the salary row.
        let c = KeywordCategorizer::new();
        assert_eq!(c.classify("Зачисление заработной платы (перевод)"), "Зарплата");
    }

    #[test]
    fn test_default_category() {
        let c = KeywordCategorizer::new();
        assert_eq!(c.classify("XYZZY 42"), DEFAULT_CATEGORY);
    }
}
