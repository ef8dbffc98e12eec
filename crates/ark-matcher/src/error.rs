#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Binary(#[from] ark_binary::Error),

    #[error(transparent)]
    Types(#[from] ark_types::Error),

    #[error(transparent)]
    Value(#[from] ark_value::Error),

    #[error(transparent)]
    Time(#[from] ark_time::Error),

    #[error(transparent)]
    Metadata(#[from] ark_metadata::Error),

    #[error("cannot parse matcher {what}: {reason}")]
    Invalid { what: String, reason: String },

    #[error("unknown alias '{0}'")]
    UnknownAlias(String),
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
