use bookshelf_http::validation::{null_as_empty, FieldNames};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::models::Author;

/// Body of `POST /authors`. Missing or null fields decode as empty and are
/// reported by validation.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct CreateAuthorRequest {
    #[serde(deserialize_with = "null_as_empty")]
    #[validate(length(min = 1, code = "required"))]
    pub name: String,
}

impl FieldNames for CreateAuthorRequest {
    const FIELD_NAMES: &'static [(&'static str, &'static str)] = &[("name", "Name")];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorResponse {
    pub id: String,
    pub name: String,
}

impl From<Author> for AuthorResponse {
    fn from(author: Author) -> Self {
        Self {
            id: author.id.to_string(),
            name: author.name,
        }
    }
}

/// `author` payload inlined into the success envelope.
#[derive(Debug, Serialize)]
pub struct AuthorPayload {
    pub author: AuthorResponse,
}

impl From<Author> for AuthorPayload {
    fn from(author: Author) -> Self {
        Self {
            author: author.into(),
        }
    }
}
