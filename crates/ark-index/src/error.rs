use std::fmt;

/// Errors raised by the attribute/aggregate store (spec §7).
///
/// `NotFound` is the index's internal control-flow signal ("present in the
/// metadata but absent from the table") — callers like [`crate::Index::acquire`]
/// catch and translate it rather than letting it reach a caller unexplained.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("cannot parse {what}: {reason}")]
    Invalid { what: String, reason: String },

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("{operation} violates index consistency: {detail}")]
    Consistency { operation: String, detail: String },

    #[error("{operation}: {source}")]
    Sql {
        operation: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error(transparent)]
    Types(#[from] ark_types::Error),

    #[error(transparent)]
    Metadata(#[from] ark_metadata::Error),

    #[error(transparent)]
    Matcher(#[from] ark_matcher::Error),

    #[error(transparent)]
    Binary(#[from] ark_binary::Error),
}

impl Error {
    pub fn invalid(what: impl fmt::Display, reason: impl fmt::Display) -> Error {
        Error::Invalid {
            what: what.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn not_found(what: impl fmt::Display) -> Error {
        Error::NotFound {
            what: what.to_string(),
        }
    }

    pub fn consistency(operation: impl fmt::Display, detail: impl fmt::Display) -> Error {
        Error::Consistency {
            operation: operation.to_string(),
            detail: detail.to_string(),
        }
    }

    pub fn sql(operation: impl fmt::Display, source: rusqlite::Error) -> Error {
        Error::Sql {
            operation: operation.to_string(),
            source,
        }
    }

    /// True for the index's internal "present in metadata but absent from
    /// table" control-flow signal (spec §7 "NotFound").
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
