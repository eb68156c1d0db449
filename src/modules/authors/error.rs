use bookshelf_db::StoreError;
use bookshelf_http::error::AppError;
use thiserror::Error;

pub const AUTHOR_NOT_FOUND: &str = "Author not found";
pub const AUTHOR_DUPLICATE: &str = "Author with this name already exists";

/// Failures of the author repository and service.
#[derive(Debug, Error)]
pub enum AuthorError {
    #[error("author not found")]
    NotFound,

    #[error("author name already taken")]
    Duplicate,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthorError {
    fn from(err: StoreError) -> Self {
        if err.is_unique_violation() {
            Self::Duplicate
        } else {
            Self::Internal(err.into())
        }
    }
}

impl From<AuthorError> for AppError {
    fn from(err: AuthorError) -> Self {
        match err {
            AuthorError::NotFound => AppError::not_found(AUTHOR_NOT_FOUND),
            AuthorError::Duplicate => AppError::conflict(AUTHOR_DUPLICATE),
            AuthorError::Internal(err) => AppError::Internal(err),
        }
    }
}
