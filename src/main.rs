mod categorizer;
mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod models;
mod settings;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Import { file, format } => cli::import::run(&file, format.as_deref()),
        Commands::Transactions { limit } => cli::transactions::run(limit),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
