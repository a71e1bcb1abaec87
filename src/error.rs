use thiserror::Error;

#[derive(Error, Debug)]
pub enum KopilkaError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not read PDF: {0}")]
    Pdf(String),

    #[error("Could not read spreadsheet: {0}")]
    Excel(String),

    #[error("Cannot open file: {0}")]
    SourceUnavailable(String),

    #[error("The file does not look like a {0} statement")]
    FormatMismatch(String),

    #[error("{0}")]
    WrongSubtype(String),

    #[error("Unknown statement format: {0}")]
    UnknownFormat(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, KopilkaError>;
