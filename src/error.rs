use thiserror::Error;

/// Construction failures (`CredentialLoad`, `Auth`, `Fetch`) are fatal to
/// the client being built; every other variant is per-call and recoverable.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Failed to load credentials: {0}")]
    CredentialLoad(String),

    #[error("OAuth2 authentication error: {0}")]
    Auth(String),

    #[error("Failed to fetch spreadsheet: {0}")]
    Fetch(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Index out of range: {0}")]
    IndexOutOfRange(String),

    #[error("Sheet '{0}' already exists")]
    DuplicateName(String),

    #[error("Google Sheets API error: {0}")]
    Remote(String),
}

pub type Result<T> = std::result::Result<T, SheetError>;
