use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::dto::{CreateBookRequest, UpdateBookRequest};
use super::error::BookError;
use super::models::{Book, NewBook};
use super::repository::BookRepository;
use crate::modules::authors::repository::AuthorRepository;

#[async_trait]
pub trait BookService: Send + Sync {
    async fn create_book(
        &self,
        cancel: &CancellationToken,
        request: CreateBookRequest,
    ) -> Result<Book, BookError>;

    /// All books. An empty store is reported as [`BookError::NotFound`].
    async fn get_all_books(&self, cancel: &CancellationToken) -> Result<Vec<Book>, BookError>;

    async fn get_book_by_id(&self, cancel: &CancellationToken, id: Uuid)
        -> Result<Book, BookError>;

    async fn update_book(
        &self,
        cancel: &CancellationToken,
        request: UpdateBookRequest,
        id: Uuid,
    ) -> Result<Book, BookError>;

    async fn delete_book(&self, cancel: &CancellationToken, id: Uuid) -> Result<(), BookError>;
}

pub struct BookServiceImpl {
    books: Arc<dyn BookRepository>,
    authors: Arc<dyn AuthorRepository>,
}

impl BookServiceImpl {
    pub fn new(books: Arc<dyn BookRepository>, authors: Arc<dyn AuthorRepository>) -> Self {
        Self { books, authors }
    }
}

#[async_trait]
impl BookService for BookServiceImpl {
    async fn create_book(
        &self,
        cancel: &CancellationToken,
        request: CreateBookRequest,
    ) -> Result<Book, BookError> {
        let author_id =
            Uuid::parse_str(&request.author_id).map_err(|_| BookError::InvalidAuthorId)?;

        let author = self
            .authors
            .get_by_id(cancel, author_id)
            .await
            .map_err(|err| {
                tracing::debug!(%author_id, error = %err, "author lookup failed");
                BookError::AuthorNotFound
            })?;

        let book = NewBook {
            title: request.title,
            description: request.description,
            author_id: Some(author.id),
        };
        let mut created = self.books.create(cancel, book).await?;
        created.author = Some(author);

        Ok(created)
    }

    async fn get_all_books(&self, cancel: &CancellationToken) -> Result<Vec<Book>, BookError> {
        let books = self.books.get_all(cancel).await?;
        if books.is_empty() {
            return Err(BookError::NotFound);
        }
        Ok(books)
    }

    async fn get_book_by_id(
        &self,
        cancel: &CancellationToken,
        id: Uuid,
    ) -> Result<Book, BookError> {
        self.books.get_by_id(cancel, id).await
    }

    async fn update_book(
        &self,
        cancel: &CancellationToken,
        request: UpdateBookRequest,
        id: Uuid,
    ) -> Result<Book, BookError> {
        let mut book = self.books.get_by_id(cancel, id).await?;
        // The submitted description lands in the title; the stored
        // description is left untouched until the intended field is settled.
        book.title = request.description;

        self.books.update(cancel, book).await
    }

    async fn delete_book(&self, cancel: &CancellationToken, id: Uuid) -> Result<(), BookError> {
        self.books.get_by_id(cancel, id).await?;
        self.books.delete(cancel, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::authors::error::AuthorError;
    use crate::modules::authors::models::{Author, NewAuthor};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockBookRepository {
        books: Mutex<Vec<Book>>,
        deleted: Mutex<Vec<Uuid>>,
    }

    #[async_trait]
    impl BookRepository for MockBookRepository {
        async fn create(
            &self,
            _cancel: &CancellationToken,
            book: NewBook,
        ) -> Result<Book, BookError> {
            let mut books = self.books.lock().unwrap();
            if books.iter().any(|existing| existing.title == book.title) {
                return Err(BookError::Duplicate);
            }
            let book = Book {
                id: Uuid::new_v4(),
                title: book.title,
                description: book.description,
                author_id: book.author_id,
                author: None,
            };
            books.push(book.clone());
            Ok(book)
        }

        async fn get_all(&self, _cancel: &CancellationToken) -> Result<Vec<Book>, BookError> {
            Ok(self.books.lock().unwrap().clone())
        }

        async fn get_by_id(
            &self,
            _cancel: &CancellationToken,
            id: Uuid,
        ) -> Result<Book, BookError> {
            self.books
                .lock()
                .unwrap()
                .iter()
                .find(|book| book.id == id)
                .cloned()
                .ok_or(BookError::NotFound)
        }

        async fn update(&self, _cancel: &CancellationToken, book: Book) -> Result<Book, BookError> {
            let mut books = self.books.lock().unwrap();
            books.retain(|existing| existing.id != book.id);
            books.push(book.clone());
            Ok(book)
        }

        async fn delete(&self, _cancel: &CancellationToken, id: Uuid) -> Result<(), BookError> {
            self.books.lock().unwrap().retain(|book| book.id != id);
            self.deleted.lock().unwrap().push(id);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockAuthorRepository {
        authors: HashMap<Uuid, Author>,
        broken: bool,
    }

    #[async_trait]
    impl AuthorRepository for MockAuthorRepository {
        async fn create(
            &self,
            _cancel: &CancellationToken,
            _author: NewAuthor,
        ) -> Result<Author, AuthorError> {
            unimplemented!("not used by the book service")
        }

        async fn get_by_id(
            &self,
            _cancel: &CancellationToken,
            id: Uuid,
        ) -> Result<Author, AuthorError> {
            if self.broken {
                return Err(AuthorError::Internal(anyhow::anyhow!("connection reset")));
            }
            self.authors.get(&id).cloned().ok_or(AuthorError::NotFound)
        }
    }

    struct Fixture {
        service: BookServiceImpl,
        books: Arc<MockBookRepository>,
        author: Author,
        cancel: CancellationToken,
    }

    fn fixture_with(broken_authors: bool) -> Fixture {
        let author = Author {
            id: Uuid::new_v4(),
            name: "Martha Wells".to_string(),
        };
        let authors = MockAuthorRepository {
            authors: HashMap::from([(author.id, author.clone())]),
            broken: broken_authors,
        };
        let books = Arc::new(MockBookRepository::default());
        Fixture {
            service: BookServiceImpl::new(books.clone(), Arc::new(authors)),
            books,
            author,
            cancel: CancellationToken::new(),
        }
    }

    fn fixture() -> Fixture {
        fixture_with(false)
    }

    fn create_request(title: &str, author_id: &str) -> CreateBookRequest {
        CreateBookRequest {
            title: title.to_string(),
            description: "Murderbot diaries".to_string(),
            author_id: author_id.to_string(),
        }
    }

    #[tokio::test]
    async fn create_book_attaches_author() {
        let fx = fixture();

        let book = fx
            .service
            .create_book(&fx.cancel, create_request("All Systems Red", &fx.author.id.to_string()))
            .await
            .unwrap();

        assert_eq!(book.author_id, Some(fx.author.id));
        assert_eq!(book.author, Some(fx.author.clone()));
    }

    #[tokio::test]
    async fn create_book_rejects_malformed_author_id() {
        let fx = fixture();

        let err = fx
            .service
            .create_book(&fx.cancel, create_request("All Systems Red", "invalid-uuid"))
            .await
            .unwrap_err();

        assert!(matches!(err, BookError::InvalidAuthorId));
        assert!(fx.books.books.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_book_requires_existing_author() {
        let fx = fixture();

        let err = fx
            .service
            .create_book(
                &fx.cancel,
                create_request("All Systems Red", &Uuid::new_v4().to_string()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BookError::AuthorNotFound));
    }

    #[tokio::test]
    async fn author_lookup_failure_reads_as_missing_author() {
        let fx = fixture_with(true);

        let err = fx
            .service
            .create_book(&fx.cancel, create_request("All Systems Red", &fx.author.id.to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, BookError::AuthorNotFound));
    }

    #[tokio::test]
    async fn empty_listing_is_not_found() {
        let fx = fixture();

        let err = fx.service.get_all_books(&fx.cancel).await.unwrap_err();

        assert!(matches!(err, BookError::NotFound));
    }

    #[tokio::test]
    async fn update_writes_description_into_title() {
        let fx = fixture();
        let book = fx
            .service
            .create_book(&fx.cancel, create_request("All Systems Red", &fx.author.id.to_string()))
            .await
            .unwrap();

        let updated = fx
            .service
            .update_book(
                &fx.cancel,
                UpdateBookRequest {
                    description: "Artificial Condition".to_string(),
                },
                book.id,
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Artificial Condition");
        assert_eq!(updated.description, "Murderbot diaries");
    }

    #[tokio::test]
    async fn update_of_missing_book_is_not_found() {
        let fx = fixture();

        let err = fx
            .service
            .update_book(
                &fx.cancel,
                UpdateBookRequest {
                    description: "Artificial Condition".to_string(),
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BookError::NotFound));
    }

    #[tokio::test]
    async fn delete_reads_before_deleting() {
        let fx = fixture();
        let missing = Uuid::new_v4();

        let err = fx.service.delete_book(&fx.cancel, missing).await.unwrap_err();

        assert!(matches!(err, BookError::NotFound));
        assert!(fx.books.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_existing_book() {
        let fx = fixture();
        let book = fx
            .service
            .create_book(&fx.cancel, create_request("All Systems Red", &fx.author.id.to_string()))
            .await
            .unwrap();

        fx.service.delete_book(&fx.cancel, book.id).await.unwrap();

        assert_eq!(*fx.books.deleted.lock().unwrap(), vec![book.id]);
    }
}
