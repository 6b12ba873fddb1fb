use std::path::Path;

use haven_core::db::{ContactRepository, SqliteContactRepository};
use haven_core::util::normalize_text_option;
use haven_core::EmergencyContact;

use crate::commands::common::{
    format_contact_lines, normalize_contact_identifier, open_contacts_database, resolve_contact,
};
use crate::error::CliError;

pub fn run_contacts_add(
    name: &str,
    phone: &str,
    relationship: Option<String>,
    db_path: &Path,
) -> Result<EmergencyContact, CliError> {
    let relationship = normalize_text_option(relationship).unwrap_or_default();
    let contact = EmergencyContact::new(name, phone, relationship)?;

    let db = open_contacts_database(db_path)?;
    SqliteContactRepository::new(db.connection()).create(&contact)?;

    println!("{}", contact.id);
    Ok(contact)
}

pub fn run_contacts_list(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_contacts_database(db_path)?;
    let contacts = SqliteContactRepository::new(db.connection()).list()?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&contacts)?);
    } else if contacts.is_empty() {
        println!("No emergency contacts. Add one with `haven contacts add` or `haven contacts seed`.");
    } else {
        for line in format_contact_lines(&contacts) {
            println!("{line}");
        }
    }

    Ok(())
}

pub fn run_contacts_remove(id: &str, db_path: &Path) -> Result<EmergencyContact, CliError> {
    let query = normalize_contact_identifier(id)?;

    let db = open_contacts_database(db_path)?;
    let repo = SqliteContactRepository::new(db.connection());
    let contacts = repo.list()?;
    let contact = resolve_contact(&query, &contacts)?.clone();
    repo.delete(&contact.id)?;

    println!("Removed {contact}");
    Ok(contact)
}

pub fn run_contacts_seed(db_path: &Path) -> Result<Vec<EmergencyContact>, CliError> {
    let db = open_contacts_database(db_path)?;
    let repo = SqliteContactRepository::new(db.connection());

    let existing = repo.list()?.len();
    if existing > 0 {
        return Err(CliError::ContactsAlreadyPresent(existing));
    }

    let contacts = EmergencyContact::demo_contacts();
    for contact in &contacts {
        repo.create(contact)?;
    }

    for line in format_contact_lines(&contacts) {
        println!("{line}");
    }
    Ok(contacts)
}
