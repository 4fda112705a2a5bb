//! Employee credential record.

use serde::Serialize;

use epm_core::{EmployeeNumber, Entity};

use crate::Identity;

/// Persisted employee: identity, credentials, and role flag.
///
/// `password_hash` is a PHC string and is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Employee {
    pub employee_number: EmployeeNumber,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
}

impl Employee {
    /// The identity this employee acts as once authenticated.
    pub fn identity(&self) -> Identity {
        Identity::new(self.employee_number, self.is_admin)
    }
}

impl Entity for Employee {
    type Id = EmployeeNumber;

    fn id(&self) -> &Self::Id {
        &self.employee_number
    }
}

/// Employee ready to be inserted (password already hashed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub employee_number: EmployeeNumber,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

impl NewEmployee {
    pub fn into_employee(self) -> Employee {
        Employee {
            employee_number: self.employee_number,
            name: self.name,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            is_admin: self.is_admin,
        }
    }
}
