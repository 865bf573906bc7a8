use thiserror::Error;

use crate::normalize::RowKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed {kind} row: expected {expected} fields, found {found}")]
    MalformedRow {
        kind: RowKind,
        expected: usize,
        found: usize,
    },

    #[error("invalid {field} in {kind} row: {value:?}")]
    InvalidField {
        kind: RowKind,
        field: &'static str,
        value: String,
    },

    #[error("fetch failed for {locator}: {message}")]
    Fetch { locator: String, message: String },

    #[error("archive at {location} is not a valid match table: {message}")]
    Archive { location: String, message: String },

    #[error("round inference needs at least one row")]
    InsufficientData,
}

impl Error {
    pub fn fetch(locator: impl Into<String>, message: impl ToString) -> Self {
        Error::Fetch {
            locator: locator.into(),
            message: message.to_string(),
        }
    }

    /// True for structural row problems, whether a wrong field count or a
    /// field that cannot be parsed.
    pub fn is_malformed_row(&self) -> bool {
        matches!(self, Error::MalformedRow { .. } | Error::InvalidField { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
