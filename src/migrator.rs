//! Schema migrations for every module, applied in order and tracked in
//! `seaql_migrations`.

use sea_orm_migration::{MigrationTrait, MigratorTrait};

use crate::modules::{authors, books};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(authors::migration::CreateAuthorsTable),
            Box::new(books::migration::CreateBooksTable),
        ]
    }
}
