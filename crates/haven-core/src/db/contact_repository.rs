//! Emergency contact repository implementation

use crate::error::{Error, Result};
use crate::models::{ContactId, EmergencyContact};
use rusqlite::{params, Connection, OptionalExtension};

/// Trait for emergency contact storage operations
pub trait ContactRepository {
    /// Store a new contact at the end of the list
    fn create(&self, contact: &EmergencyContact) -> Result<()>;

    /// Get a contact by ID
    fn get(&self, id: &ContactId) -> Result<Option<EmergencyContact>>;

    /// List contacts in the order they were added
    fn list(&self) -> Result<Vec<EmergencyContact>>;

    /// Remove a contact
    fn delete(&self, id: &ContactId) -> Result<()>;
}

/// `SQLite` implementation of `ContactRepository`
pub struct SqliteContactRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteContactRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a contact from a database row
    fn parse_contact(row: &rusqlite::Row<'_>) -> rusqlite::Result<EmergencyContact> {
        let id: String = row.get(0)?;
        Ok(EmergencyContact {
            id: id.parse().unwrap_or_default(),
            name: row.get(1)?,
            phone: row.get(2)?,
            relationship: row.get(3)?,
        })
    }
}

impl ContactRepository for SqliteContactRepository<'_> {
    fn create(&self, contact: &EmergencyContact) -> Result<()> {
        self.conn.execute(
            "INSERT INTO contacts (id, name, phone, relationship, position)
             VALUES (?, ?, ?, ?, (SELECT COALESCE(MAX(position), 0) + 1 FROM contacts))",
            params![
                contact.id.as_str(),
                contact.name,
                contact.phone,
                contact.relationship
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &ContactId) -> Result<Option<EmergencyContact>> {
        let contact = self
            .conn
            .query_row(
                "SELECT id, name, phone, relationship FROM contacts WHERE id = ?",
                params![id.as_str()],
                Self::parse_contact,
            )
            .optional()?;
        Ok(contact)
    }

    fn list(&self) -> Result<Vec<EmergencyContact>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, phone, relationship FROM contacts ORDER BY position ASC")?;
        let contacts = stmt
            .query_map([], Self::parse_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(contacts)
    }

    fn delete(&self, id: &ContactId) -> Result<()> {
        let removed = self
            .conn
            .execute("DELETE FROM contacts WHERE id = ?", params![id.as_str()])?;
        if removed == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }
}
