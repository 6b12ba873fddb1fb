//! Emergency contact model

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::util::normalize_text_option;

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9(][0-9 ().-]{2,}[0-9]$").expect("Invalid regex"));

/// A unique identifier for an emergency contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactId(Uuid);

impl ContactId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ContactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContactId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A trusted person who receives alerts when SOS is triggered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub id: ContactId,
    pub name: String,
    pub phone: String,
    /// Free-form label such as "Sister" or "Friend"
    #[serde(default)]
    pub relationship: String,
}

impl EmergencyContact {
    /// Create a validated contact
    ///
    /// Name and phone are trimmed and required; the phone must look like a
    /// dialable number (digits with optional `+`, spaces, dashes, dots and parentheses).
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        relationship: impl Into<String>,
    ) -> Result<Self> {
        let name = normalize_text_option(Some(name.into()))
            .ok_or_else(|| Error::InvalidInput("contact name must not be empty".into()))?;
        let phone = normalize_text_option(Some(phone.into()))
            .ok_or_else(|| Error::InvalidInput("contact phone must not be empty".into()))?;
        if !PHONE_PATTERN.is_match(&phone) {
            return Err(Error::InvalidInput(format!(
                "'{phone}' is not a valid phone number"
            )));
        }

        Ok(Self {
            id: ContactId::new(),
            name,
            phone,
            relationship: relationship.into().trim().to_string(),
        })
    }

    /// Starter contacts shown on a fresh profile
    #[must_use]
    pub fn demo_contacts() -> Vec<Self> {
        [
            ("Emma Wilson", "(555) 123-4567", "Sister"),
            ("Robert Chen", "(555) 987-6543", "Friend"),
        ]
        .into_iter()
        .filter_map(|(name, phone, relationship)| Self::new(name, phone, relationship).ok())
        .collect()
    }
}

impl fmt::Display for EmergencyContact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.relationship.is_empty() {
            write!(f, "{} <{}>", self.name, self.phone)
        } else {
            write!(f, "{} <{}> ({})", self.name, self.phone, self.relationship)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_new_trims_fields() {
        let contact =
            EmergencyContact::new("  Emma Wilson ", " (555) 123-4567 ", " Sister ").unwrap();
        assert_eq!(contact.name, "Emma Wilson");
        assert_eq!(contact.phone, "(555) 123-4567");
        assert_eq!(contact.relationship, "Sister");
    }

    #[test]
    fn test_contact_requires_name_and_phone() {
        assert!(EmergencyContact::new("   ", "555-1234", "").is_err());
        assert!(EmergencyContact::new("Emma", "  ", "").is_err());
    }

    #[test]
    fn test_contact_rejects_non_numeric_phone() {
        assert!(EmergencyContact::new("Emma", "call me maybe", "").is_err());
        assert!(EmergencyContact::new("Emma", "+1 555 123 4567", "").is_ok());
        assert!(EmergencyContact::new("Emma", "555.123.4567", "").is_ok());
    }

    #[test]
    fn test_demo_contacts() {
        let contacts = EmergencyContact::demo_contacts();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].name, "Emma Wilson");
        assert_eq!(contacts[1].relationship, "Friend");
    }

    #[test]
    fn test_display_includes_relationship_when_present() {
        let contact = EmergencyContact::new("Robert Chen", "(555) 987-6543", "Friend").unwrap();
        assert_eq!(contact.to_string(), "Robert Chen <(555) 987-6543> (Friend)");

        let bare = EmergencyContact::new("Robert Chen", "(555) 987-6543", "").unwrap();
        assert_eq!(bare.to_string(), "Robert Chen <(555) 987-6543>");
    }
}
