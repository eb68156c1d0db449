//! SeaORM entities for the persisted tables.

pub mod author;
pub mod book;
