use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Encoding error: {0}")]
    Encoding(#[source] serde_json::Error),

    #[error("Encoding error: config nested deeper than {max} levels")]
    ConfigTooDeep { max: usize },

    #[error("Decoding error: {0}")]
    Decoding(#[source] serde_json::Error),

    #[error("Decoding error: invalid task result: {0}")]
    InvalidResult(String),
}

impl CoreError {
    pub fn is_encoding(&self) -> bool {
        matches!(self, CoreError::Encoding(_) | CoreError::ConfigTooDeep { .. })
    }

    /// True for every fault raised while reading bytes back into a record.
    pub fn is_decoding(&self) -> bool {
        matches!(self, CoreError::Decoding(_) | CoreError::InvalidResult(_))
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
