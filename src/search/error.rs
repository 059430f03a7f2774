use mongodb::bson;
use thiserror::Error;
use tokio::task::JoinError;

/// Failure talking to the catalog. Never shown to callers verbatim.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("malformed document: {0}")]
    Decode(#[from] bson::de::Error),

    #[error("search task failed: {0}")]
    Task(#[from] JoinError),

    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search term is required")]
    EmptyTerm,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type SearchResult<T> = Result<T, SearchError>;
