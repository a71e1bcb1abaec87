use colored::Colorize;

use crate::db::{SqliteStore, TransactionStore};
use crate::error::Result;
use crate::fmt::money;
use crate::settings::get_data_dir;

pub fn run(limit: usize) -> Result<()> {
    let store = SqliteStore::open(&get_data_dir().join("kopilka.db"))?;
    let all = store.all_transactions()?;

    if all.is_empty() {
        println!("No transactions yet. Import a statement first.");
        return Ok(());
    }

    for tx in all.iter().take(limit) {
        let amount = money(tx.amount, &tx.currency);
        let amount = if tx.is_expense {
            amount.red()
        } else {
            amount.green()
        };
        println!(
            "{}  {:<40} {}  {} [{}]",
            tx.date.format("%d.%m.%Y %H:%M"),
            truncate(&tx.title, 40),
            amount,
            tx.category,
            tx.source,
        );
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max - 1).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Оплата товаров и услуг", 10), "Оплата то…");
    }
}
