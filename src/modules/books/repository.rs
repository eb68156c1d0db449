use async_trait::async_trait;
use bookshelf_db::cancellable;
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ActiveValue, DatabaseConnection, EntityTrait,
    QueryOrder,
};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::error::BookError;
use super::models::{Book, NewBook};
use crate::entity::author::{self, Entity as AuthorEntity};
use crate::entity::book::{self, Entity as BookEntity};

/// Persistence port for books. Reads resolve the author with left-join
/// semantics.
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn create(&self, cancel: &CancellationToken, book: NewBook) -> Result<Book, BookError>;

    /// All books; an empty store yields an empty list.
    async fn get_all(&self, cancel: &CancellationToken) -> Result<Vec<Book>, BookError>;

    async fn get_by_id(&self, cancel: &CancellationToken, id: Uuid) -> Result<Book, BookError>;

    /// Full-row upsert keyed by `book.id`.
    async fn update(&self, cancel: &CancellationToken, book: Book) -> Result<Book, BookError>;

    /// Deleting a missing id is not an error.
    async fn delete(&self, cancel: &CancellationToken, id: Uuid) -> Result<(), BookError>;
}

pub struct SeaOrmBookRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookRepository {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookRepository for SeaOrmBookRepository {
    async fn create(&self, cancel: &CancellationToken, book: NewBook) -> Result<Book, BookError> {
        let now = OffsetDateTime::now_utc();
        let active_model = book::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            title: ActiveValue::Set(book.title),
            description: ActiveValue::Set(book.description),
            author_id: ActiveValue::Set(book.author_id),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };

        let model = cancellable(cancel, active_model.insert(&self.db)).await?;

        tracing::debug!(book_id = %model.id, "book created");
        Ok(Book::from((model, None::<author::Model>)))
    }

    async fn get_all(&self, cancel: &CancellationToken) -> Result<Vec<Book>, BookError> {
        let rows = cancellable(
            cancel,
            BookEntity::find()
                .find_also_related(AuthorEntity)
                .order_by_asc(book::Column::CreatedAt)
                .order_by_asc(book::Column::Id)
                .all(&self.db),
        )
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_by_id(&self, cancel: &CancellationToken, id: Uuid) -> Result<Book, BookError> {
        cancellable(
            cancel,
            BookEntity::find_by_id(id)
                .find_also_related(AuthorEntity)
                .one(&self.db),
        )
        .await?
        .map(Into::into)
        .ok_or(BookError::NotFound)
    }

    async fn update(&self, cancel: &CancellationToken, book: Book) -> Result<Book, BookError> {
        let id = book.id;
        let now = OffsetDateTime::now_utc();
        let active_model = book::ActiveModel {
            id: ActiveValue::Set(id),
            title: ActiveValue::Set(book.title),
            description: ActiveValue::Set(book.description),
            author_id: ActiveValue::Set(book.author_id),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };

        cancellable(
            cancel,
            BookEntity::insert(active_model)
                .on_conflict(
                    OnConflict::column(book::Column::Id)
                        .update_columns([
                            book::Column::Title,
                            book::Column::Description,
                            book::Column::AuthorId,
                            book::Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(&self.db),
        )
        .await?;

        self.get_by_id(cancel, id).await
    }

    async fn delete(&self, cancel: &CancellationToken, id: Uuid) -> Result<(), BookError> {
        let result = cancellable(cancel, BookEntity::delete_by_id(id).exec(&self.db)).await?;

        tracing::debug!(book_id = %id, rows_affected = result.rows_affected, "book deleted");
        Ok(())
    }
}
