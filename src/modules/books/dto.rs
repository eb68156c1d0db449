use bookshelf_http::validation::{null_as_empty, FieldNames};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::models::Book;
use crate::modules::authors::dto::AuthorResponse;

/// Body of `POST /books`.
///
/// `author_id` is only checked for presence here; the service rejects
/// ids that do not parse.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct CreateBookRequest {
    #[serde(deserialize_with = "null_as_empty")]
    #[validate(length(min = 1, code = "required"))]
    pub title: String,
    #[serde(deserialize_with = "null_as_empty")]
    #[validate(length(min = 1, code = "required"))]
    pub description: String,
    #[serde(deserialize_with = "null_as_empty")]
    #[validate(length(min = 1, code = "required"))]
    pub author_id: String,
}

impl FieldNames for CreateBookRequest {
    const FIELD_NAMES: &'static [(&'static str, &'static str)] = &[
        ("title", "Title"),
        ("description", "Description"),
        ("author_id", "AuthorID"),
    ];
}

/// Body of `PUT /books/{book_id}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct UpdateBookRequest {
    #[serde(deserialize_with = "null_as_empty")]
    #[validate(length(min = 1, code = "required"))]
    pub description: String,
}

impl FieldNames for UpdateBookRequest {
    const FIELD_NAMES: &'static [(&'static str, &'static str)] = &[("description", "Description")];
}

/// Public projection of a book; the description is not exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookResponse {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorResponse>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id.to_string(),
            title: book.title,
            author: book.author.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookPayload {
    pub book: BookResponse,
}

impl From<Book> for BookPayload {
    fn from(book: Book) -> Self {
        Self { book: book.into() }
    }
}

#[derive(Debug, Serialize)]
pub struct BooksPayload {
    pub books: Vec<BookResponse>,
}

impl From<Vec<Book>> for BooksPayload {
    fn from(books: Vec<Book>) -> Self {
        Self {
            books: books.into_iter().map(Into::into).collect(),
        }
    }
}
