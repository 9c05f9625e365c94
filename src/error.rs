use thiserror::Error;

/// Errors raised while recording or querying expenses
///
/// Everything except `Storage` is a rejected input: the caller reports it
/// and carries on. `Storage` means SQLite itself failed.
#[derive(Debug, Error)]
pub enum ExpenseError {
    #[error("Invalid date format: '{0}'. Please use YYYY-MM-DD format.")]
    InvalidDateFormat(String),

    #[error("Invalid amount: '{0}'. Please enter a positive number.")]
    InvalidAmount(String),

    #[error("Category must not be empty.")]
    MissingCategory,

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl ExpenseError {
    /// True for input errors that leave the store untouched
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ExpenseError::Storage(_))
    }
}

pub type Result<T> = std::result::Result<T, ExpenseError>;
