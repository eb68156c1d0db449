use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::dto::CreateAuthorRequest;
use super::error::AuthorError;
use super::models::{Author, NewAuthor};
use super::repository::AuthorRepository;

#[async_trait]
pub trait AuthorService: Send + Sync {
    async fn create_author(
        &self,
        cancel: &CancellationToken,
        request: CreateAuthorRequest,
    ) -> Result<Author, AuthorError>;

    async fn get_author_by_id(
        &self,
        cancel: &CancellationToken,
        id: Uuid,
    ) -> Result<Author, AuthorError>;
}

pub struct AuthorServiceImpl {
    repository: Arc<dyn AuthorRepository>,
}

impl AuthorServiceImpl {
    pub fn new(repository: Arc<dyn AuthorRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl AuthorService for AuthorServiceImpl {
    async fn create_author(
        &self,
        cancel: &CancellationToken,
        request: CreateAuthorRequest,
    ) -> Result<Author, AuthorError> {
        let author = NewAuthor { name: request.name };
        self.repository.create(cancel, author).await
    }

    async fn get_author_by_id(
        &self,
        cancel: &CancellationToken,
        id: Uuid,
    ) -> Result<Author, AuthorError> {
        self.repository.get_by_id(cancel, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockAuthorRepository {
        authors: Mutex<HashMap<Uuid, Author>>,
    }

    #[async_trait]
    impl AuthorRepository for MockAuthorRepository {
        async fn create(
            &self,
            _cancel: &CancellationToken,
            author: NewAuthor,
        ) -> Result<Author, AuthorError> {
            let mut authors = self.authors.lock().unwrap();
            if authors.values().any(|existing| existing.name == author.name) {
                return Err(AuthorError::Duplicate);
            }
            let author = Author {
                id: Uuid::new_v4(),
                name: author.name,
            };
            authors.insert(author.id, author.clone());
            Ok(author)
        }

        async fn get_by_id(
            &self,
            _cancel: &CancellationToken,
            id: Uuid,
        ) -> Result<Author, AuthorError> {
            self.authors
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or(AuthorError::NotFound)
        }
    }

    fn service() -> AuthorServiceImpl {
        AuthorServiceImpl::new(Arc::new(MockAuthorRepository::default()))
    }

    fn request(name: &str) -> CreateAuthorRequest {
        CreateAuthorRequest {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn create_then_get() {
        let service = service();
        let cancel = CancellationToken::new();

        let created = service.create_author(&cancel, request("N. K. Jemisin")).await.unwrap();
        let fetched = service.get_author_by_id(&cancel, created.id).await.unwrap();

        assert_eq!(fetched.name, "N. K. Jemisin");
    }

    #[tokio::test]
    async fn duplicate_surfaces_unchanged() {
        let service = service();
        let cancel = CancellationToken::new();

        service.create_author(&cancel, request("N. K. Jemisin")).await.unwrap();
        let err = service
            .create_author(&cancel, request("N. K. Jemisin"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthorError::Duplicate));
    }
}
