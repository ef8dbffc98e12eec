#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("step '{0}' is not supported; valid values are daily, weekly, biweekly, monthly, yearly")]
    UnknownStep(String),

    #[error("shard step '{0}' is not supported; valid values are weekly, monthly, yearly")]
    UnknownShardStep(String),

    #[error("cannot parse path '{path}' as a {step} path")]
    UnparseablePath { step: &'static str, path: String },
}

pub type Result<T> = std::result::Result<T, Error>;
