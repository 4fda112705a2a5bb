//! Entity traits: identity and ownership.

use crate::id::EmployeeNumber;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// A record that belongs to exactly one employee.
///
/// Access decisions are made against this trait, not against concrete record
/// types, so the policy layer never depends on the crates that define them.
pub trait Owned {
    fn owner(&self) -> EmployeeNumber;
}

impl<T: Owned + ?Sized> Owned for &T {
    fn owner(&self) -> EmployeeNumber {
        (**self).owner()
    }
}
