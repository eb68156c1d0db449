use async_trait::async_trait;
use bookshelf_db::cancellable;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, EntityTrait};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::error::AuthorError;
use super::models::{Author, NewAuthor};
use crate::entity::author::{self, Entity as AuthorEntity};

/// Persistence port for authors.
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Insert a new author with a freshly generated id.
    async fn create(
        &self,
        cancel: &CancellationToken,
        author: NewAuthor,
    ) -> Result<Author, AuthorError>;

    async fn get_by_id(&self, cancel: &CancellationToken, id: Uuid)
        -> Result<Author, AuthorError>;
}

pub struct SeaOrmAuthorRepository {
    db: DatabaseConnection,
}

impl SeaOrmAuthorRepository {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthorRepository for SeaOrmAuthorRepository {
    async fn create(
        &self,
        cancel: &CancellationToken,
        author: NewAuthor,
    ) -> Result<Author, AuthorError> {
        let now = OffsetDateTime::now_utc();
        let active_model = author::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            name: ActiveValue::Set(author.name),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };

        let model = cancellable(cancel, active_model.insert(&self.db)).await?;

        tracing::debug!(author_id = %model.id, "author created");
        Ok(model.into())
    }

    async fn get_by_id(
        &self,
        cancel: &CancellationToken,
        id: Uuid,
    ) -> Result<Author, AuthorError> {
        cancellable(cancel, AuthorEntity::find_by_id(id).one(&self.db))
            .await?
            .map(Into::into)
            .ok_or(AuthorError::NotFound)
    }
}
