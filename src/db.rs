use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::error::Result;
use crate::models::Transaction;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS transactions (
    id TEXT PRIMARY KEY,
    date TEXT NOT NULL,
    title TEXT NOT NULL,
    amount REAL NOT NULL,
    currency TEXT NOT NULL,
    is_expense INTEGER NOT NULL,
    category TEXT NOT NULL,
    source TEXT NOT NULL,
    source_color TEXT NOT NULL,
    note TEXT,
    category_id INTEGER,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Persistence seam used by the import pipeline. Kept as a trait so tests
/// can substitute in-memory and failing stores.
pub trait TransactionStore {
    fn add_transaction(&self, tx: &Transaction) -> Result<()>;
    fn all_transactions(&self) -> Result<Vec<Transaction>>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = get_connection(db_path)?;
        init_db(&conn)?;
        Ok(Self::new(conn))
    }
}

impl TransactionStore for SqliteStore {
    fn add_transaction(&self, tx: &Transaction) -> Result<()> {
        self.conn.execute(
            "INSERT INTO transactions (id, date, title, amount, currency, is_expense, category, source, source_color, note, category_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                tx.id,
                tx.date.format(DATE_FORMAT).to_string(),
                tx.title,
                tx.amount,
                tx.currency,
                tx.is_expense,
                tx.category,
                tx.source,
                tx.source_color,
                tx.note,
                tx.category_id,
            ],
        )?;
        Ok(())
    }

    fn all_transactions(&self) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, title, amount, currency, is_expense, category, source, source_color, note, category_id \
             FROM transactions ORDER BY date DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            let date_text: String = row.get(1)?;
            Ok(Transaction {
                id: row.get(0)?,
                date: NaiveDateTime::parse_from_str(&date_text, DATE_FORMAT)
                    .unwrap_or(NaiveDateTime::MIN),
                title: row.get(2)?,
                amount: row.get(3)?,
                currency: row.get(4)?,
                is_expense: row.get(5)?,
                category: row.get(6)?,
                source: row.get(7)?,
                source_color: row.get(8)?,
                note: row.get(9)?,
                category_id: row.get(10)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}
