use std::fmt;

/// Errors raised while decoding the arkimet binary formats.
///
/// All variants render as `"cannot parse <what>: <reason>"`, matching the
/// textual convention spelled out across the codec.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("cannot parse {what}: insufficient size, need {need}, have {have}")]
    InsufficientSize {
        what: String,
        need: usize,
        have: usize,
    },

    #[error("cannot parse {what}: invalid varint")]
    InvalidVarint { what: String },

    #[error("cannot parse {what}: {reason}")]
    Invalid { what: String, reason: String },
}

impl Error {
    pub fn insufficient(what: impl fmt::Display, need: usize, have: usize) -> Error {
        Error::InsufficientSize {
            what: what.to_string(),
            need,
            have,
        }
    }

    pub fn invalid_varint(what: impl fmt::Display) -> Error {
        Error::InvalidVarint {
            what: what.to_string(),
        }
    }

    pub fn invalid(what: impl fmt::Display, reason: impl fmt::Display) -> Error {
        Error::Invalid {
            what: what.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True if this is a short-read that a streaming caller could retry
    /// after feeding more bytes (spec §7, "Insufficient size").
    pub fn is_insufficient_size(&self) -> bool {
        matches!(self, Error::InsufficientSize { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
