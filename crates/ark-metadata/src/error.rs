#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Binary(#[from] ark_binary::Error),

    #[error(transparent)]
    Types(#[from] ark_types::Error),

    #[error("cannot parse {what}: {reason}")]
    Invalid { what: String, reason: String },

    #[error("data for this source is not available ({what})")]
    DataUnavailable { what: String },
}

impl Error {
    pub fn invalid(what: impl std::fmt::Display, reason: impl std::fmt::Display) -> Error {
        Error::Invalid {
            what: what.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
