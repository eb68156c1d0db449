pub mod authors;
pub mod books;

use std::sync::Arc;

use bookshelf_kernel::ModuleRegistry;
use sea_orm::DatabaseConnection;

use authors::repository::{AuthorRepository, SeaOrmAuthorRepository};
use authors::service::AuthorServiceImpl;
use books::repository::SeaOrmBookRepository;
use books::service::BookServiceImpl;

/// Wire repositories and services over `db` and register every module.
/// Authors come first so their table exists before books reference it.
pub fn register_all(registry: &mut ModuleRegistry, db: &DatabaseConnection) {
    let author_repository: Arc<dyn AuthorRepository> =
        Arc::new(SeaOrmAuthorRepository::new(db.clone()));
    let book_repository = Arc::new(SeaOrmBookRepository::new(db.clone()));

    registry.register(authors::create_module(Arc::new(AuthorServiceImpl::new(
        author_repository.clone(),
    ))));
    registry.register(books::create_module(Arc::new(BookServiceImpl::new(
        book_repository,
        author_repository,
    ))));
}
