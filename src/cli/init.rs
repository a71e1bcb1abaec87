use std::path::PathBuf;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{save_settings, Settings};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = Settings::default();
    if let Some(dir) = data_dir {
        settings.data_dir = dir;
    }
    std::fs::create_dir_all(&settings.data_dir)?;

    let conn = get_connection(&PathBuf::from(&settings.data_dir).join("kopilka.db"))?;
    init_db(&conn)?;
    save_settings(&settings)?;

    println!("Initialized Kopilka data in {}", settings.data_dir);
    Ok(())
}
