use chrono::NaiveDateTime;
use uuid::Uuid;

/// A committed ledger entry. Created once by the import pipeline and never
/// mutated by it afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: String,
    /// Signed: negative for expenses, positive for income.
    pub amount: f64,
    pub currency: String,
    pub date: NaiveDateTime,
    pub title: String,
    pub category: String,
    pub is_expense: bool,
    /// Human-readable origin, e.g. "Ozon Bank".
    pub source: String,
    /// UI hint for the origin, hex color.
    pub source_color: String,
    pub note: Option<String>,
    pub category_id: Option<i64>,
}

impl Transaction {
    /// `amount` is a magnitude; the stored sign is derived from
    /// `is_expense` so the two can never disagree.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        amount: f64,
        is_expense: bool,
        currency: &str,
        date: NaiveDateTime,
        title: &str,
        category: &str,
        source: &str,
        source_color: &str,
        note: Option<String>,
    ) -> Self {
        let magnitude = amount.abs();
        Self {
            id: Uuid::new_v4().to_string(),
            amount: if is_expense { -magnitude } else { magnitude },
            currency: currency.to_string(),
            date,
            title: title.to_string(),
            category: category.to_string(),
            is_expense,
            source: source.to_string(),
            source_color: source_color.to_string(),
            note,
            category_id: None,
        }
    }
}

/// Intermediate representation from a statement parser before
/// classification and DB insert.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTransaction {
    pub date: NaiveDateTime,
    pub title: String,
    /// Magnitude; direction is carried by `is_expense`.
    pub amount: f64,
    pub is_expense: bool,
    pub currency: String,
    pub note: Option<String>,
}
