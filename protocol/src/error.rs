use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("formatting into the record buffer failed")]
    Fmt,

    #[error("failed to encode JSON string: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("trace document does not start with '['")]
    MissingOpenBracket,

    #[error("malformed trace record: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FormatResult<T> = std::result::Result<T, FormatError>;
pub type DocumentResult<T> = std::result::Result<T, DocumentError>;
