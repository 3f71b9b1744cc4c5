use crate::index::{DocId, Phase};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),
    #[error("row codec error: {0}")]
    Codec(#[from] bincode::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("could not read document {doc_id}: {reason}")]
    UnreadableDocument { doc_id: DocId, reason: String },
    #[error("invalid document id {0:?}, expected \"shard/local\"")]
    InvalidDocId(String),
    #[error("invalid position list {0:?}")]
    InvalidPositions(String),
    #[error("phase {0} has not been committed")]
    PhaseIncomplete(Phase),
}

pub type Result<T> = std::result::Result<T, IndexError>;
