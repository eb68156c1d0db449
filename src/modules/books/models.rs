use uuid::Uuid;

use crate::entity::{author, book};
use crate::modules::authors::models::Author;

/// A stored book with its author resolved when `author_id` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub author_id: Option<Uuid>,
    pub author: Option<Author>,
}

/// Book fields supplied by the caller; the id is assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub description: String,
    pub author_id: Option<Uuid>,
}

impl From<(book::Model, Option<author::Model>)> for Book {
    fn from((book, author): (book::Model, Option<author::Model>)) -> Self {
        Self {
            id: book.id,
            title: book.title,
            description: book.description,
            author_id: book.author_id,
            author: author.map(Into::into),
        }
    }
}
