use thiserror::Error;
use tidesave_core::CoreError;
use tidesave_refdata::RefDataError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("reference data error: {0}")]
    RefData(#[from] RefDataError),

    #[error("no save file is loaded")]
    NoSaveLoaded,

    #[error("backup of {path} failed: {source}")]
    Backup {
        path: String,
        source: std::io::Error,
    },
}
