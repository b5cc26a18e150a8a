//! User types: the people who run and drive the fleet.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ValidationError;

/// A person with access to the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,

    pub name: String,
    pub surname: String,
    pub second_surname: Option<String>,

    /// Login email. Unique.
    pub email: String,

    /// Salted digest of the password — never the password itself.
    pub password_digest: String,

    pub role: Role,
    pub created_at: Timestamp,
}

impl User {
    /// Checks the fields a create request must carry.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "name is required"));
        }
        if self.surname.trim().is_empty() {
            return Err(ValidationError::new("surname", "surname is required"));
        }
        // Full address validation belongs to the mail layer; reject the
        // obviously malformed here.
        if !self.email.contains('@') {
            return Err(ValidationError::new(
                "email",
                format!("'{}' is not a valid email address", self.email),
            ));
        }
        Ok(())
    }

    /// Full display name: given name plus surnames.
    pub fn full_name(&self) -> String {
        match &self.second_surname {
            Some(second) => format!("{} {} {}", self.name, self.surname, second),
            None => format!("{} {}", self.name, self.surname),
        }
    }
}

/// What a user is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Manages users, vehicles, and dispatch.
    Admin,

    /// Drives an assigned vehicle.
    Driver,
}

impl Role {
    /// Storage/display form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Driver => "driver",
        }
    }
}
