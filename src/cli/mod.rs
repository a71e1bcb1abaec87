pub mod import;
pub mod init;
pub mod transactions;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "kopilka", about = "Personal finance tracker with bank statement import.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up Kopilka: choose a data directory and initialize the database.
    Init {
        /// Path for Kopilka data (default: ~/Documents/kopilka)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Import a bank statement (PDF, CSV or XLSX), auto-detecting the bank.
    Import {
        /// Path to the statement file
        file: String,
        /// Force a format key (sberbank, tinkoff, alfabank, ozon, csv, excel)
        #[arg(long)]
        format: Option<String>,
    },
    /// List recently imported transactions.
    Transactions {
        /// Maximum rows to print
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}
