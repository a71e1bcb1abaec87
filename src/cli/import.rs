use std::path::PathBuf;

use colored::Colorize;

use crate::categorizer::KeywordCategorizer;
use crate::db::SqliteStore;
use crate::error::Result;
use crate::importer::{ImportEvent, Importer};
use crate::settings::get_data_dir;

pub fn run(file: &str, format: Option<&str>) -> Result<()> {
    let store = SqliteStore::open(&get_data_dir().join("kopilka.db"))?;
    let categorizer = KeywordCategorizer::new();
    let importer = Importer::new(&store, &categorizer);

    let mut last_message = String::new();
    let mut sink = |event: ImportEvent| match event {
        ImportEvent::Progress {
            current,
            total,
            message,
        } => {
            if message != last_message {
                println!("  {current:>3}/{total} {message}");
                last_message = message;
            }
        }
        ImportEvent::Success {
            imported,
            skipped,
            message,
        } => {
            println!(
                "{} {imported} imported, {skipped} skipped",
                "Done:".green().bold()
            );
            if let Some(msg) = message {
                println!("  {msg}");
            }
        }
        // The error itself is reported through main's exit path.
        ImportEvent::Error { .. } => {}
    };

    importer
        .import_file(&PathBuf::from(file), format, &mut sink)
        .map(|_| ())
}
