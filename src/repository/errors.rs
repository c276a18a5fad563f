use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("connection pool error: {0}")]
    Connection(#[from] diesel::r2d2::PoolError),
    #[error("query error: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
