use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] haven_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Contact ID cannot be empty")]
    EmptyContactId,
    #[error("Contact not found for id/prefix: {0}")]
    ContactNotFound(String),
    #[error("{0}")]
    AmbiguousContactId(String),
    #[error("Contact list already has {0} entries; not seeding")]
    ContactsAlreadyPresent(usize),
    #[error("Configuration error: {0}")]
    Config(String),
}
