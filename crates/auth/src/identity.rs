use serde::Serialize;

use epm_core::EmployeeNumber;

/// The authenticated actor for one request.
///
/// Produced once per request by the session layer and passed explicitly to
/// the access policy. It is never read from ambient state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Identity {
    employee_number: EmployeeNumber,
    is_admin: bool,
}

impl Identity {
    pub fn new(employee_number: EmployeeNumber, is_admin: bool) -> Self {
        Self {
            employee_number,
            is_admin,
        }
    }

    pub fn employee(employee_number: EmployeeNumber) -> Self {
        Self::new(employee_number, false)
    }

    pub fn admin(employee_number: EmployeeNumber) -> Self {
        Self::new(employee_number, true)
    }

    pub fn employee_number(&self) -> EmployeeNumber {
        self.employee_number
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}

impl core::fmt::Display for Identity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_admin {
            write!(f, "employee:{} (admin)", self.employee_number)
        } else {
            write!(f, "employee:{}", self.employee_number)
        }
    }
}
