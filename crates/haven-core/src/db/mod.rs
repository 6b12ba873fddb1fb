//! Database layer for Haven

mod connection;
mod contact_repository;
mod migrations;

pub use connection::Database;
pub use contact_repository::{ContactRepository, SqliteContactRepository};
