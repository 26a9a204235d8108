use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefDataError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("catalog decompression failed: {0}")]
    Decompress(String),

    #[error("decompressed catalog exceeds declared bound of {bound} bytes")]
    BoundExceeded { bound: usize },

    #[error("decompressed catalog is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::string::FromUtf8Error),
}
