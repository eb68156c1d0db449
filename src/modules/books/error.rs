use bookshelf_db::StoreError;
use bookshelf_http::error::AppError;
use thiserror::Error;

use crate::modules::authors::error::AUTHOR_NOT_FOUND;

pub const BOOK_NOT_FOUND: &str = "Book not found";
pub const BOOK_DUPLICATE: &str = "Book with this name already exists";
pub const INVALID_AUTHOR_ID: &str = "invalid author ID";

/// Failures of the book repository and service.
#[derive(Debug, Error)]
pub enum BookError {
    #[error("book not found")]
    NotFound,

    #[error("book title already taken")]
    Duplicate,

    #[error("author id is not a valid uuid")]
    InvalidAuthorId,

    #[error("referenced author not found")]
    AuthorNotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for BookError {
    fn from(err: StoreError) -> Self {
        if err.is_unique_violation() {
            Self::Duplicate
        } else {
            Self::Internal(err.into())
        }
    }
}

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::NotFound => AppError::not_found(BOOK_NOT_FOUND),
            BookError::Duplicate => AppError::conflict(BOOK_DUPLICATE),
            BookError::InvalidAuthorId => AppError::bad_request(INVALID_AUTHOR_ID),
            BookError::AuthorNotFound => AppError::not_found(AUTHOR_NOT_FOUND),
            BookError::Internal(err) => AppError::Internal(err),
        }
    }
}
