use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("obfuscation key must not be empty")]
    EmptyKey,

    #[error("decoded save is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::string::FromUtf8Error),

    #[error("save document parse error: {0}")]
    Parse(String),

    #[error("save document serialize error: {0}")]
    Serialize(String),
}
