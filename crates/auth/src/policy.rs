//! Review access policy.
//!
//! - No IO
//! - No panics
//! - One ownership-or-admin predicate governs every read and mutation

use serde::Serialize;
use thiserror::Error;

use epm_core::Owned;

use crate::Identity;

/// What an identity is trying to do with a review.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Create,
    Read,
    Edit,
    Delete,
}

impl ReviewAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewAction::Create => "create",
            ReviewAction::Read => "read",
            ReviewAction::Edit => "edit",
            ReviewAction::Delete => "delete",
        }
    }
}

impl core::fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: may not {0} this review")]
    Forbidden(ReviewAction),
}

fn owner_or_admin(identity: &Identity, resource: &impl Owned) -> bool {
    identity.is_admin() || identity.employee_number() == resource.owner()
}

pub fn can_read(identity: &Identity, review: &impl Owned) -> bool {
    owner_or_admin(identity, review)
}

/// Any authenticated identity may create a review; its subject is always the
/// identity's own employee number.
pub fn can_create(_identity: &Identity) -> bool {
    true
}

pub fn can_edit(identity: &Identity, review: &impl Owned) -> bool {
    owner_or_admin(identity, review)
}

pub fn can_delete(identity: &Identity, review: &impl Owned) -> bool {
    owner_or_admin(identity, review)
}

/// Gate for creating a new review, which has no owner to check yet.
pub fn authorize_create(identity: &Identity) -> Result<(), AuthzError> {
    if can_create(identity) {
        Ok(())
    } else {
        tracing::debug!(identity = %identity, "review creation denied");
        Err(AuthzError::Forbidden(ReviewAction::Create))
    }
}

/// Authorize `action` on `review`, returning a typed denial.
pub fn authorize(
    identity: &Identity,
    action: ReviewAction,
    review: &impl Owned,
) -> Result<(), AuthzError> {
    let allowed = match action {
        ReviewAction::Create => can_create(identity),
        ReviewAction::Read => can_read(identity, review),
        ReviewAction::Edit => can_edit(identity, review),
        ReviewAction::Delete => can_delete(identity, review),
    };

    if allowed {
        Ok(())
    } else {
        tracing::debug!(identity = %identity, action = %action, owner = %review.owner(), "review access denied");
        Err(AuthzError::Forbidden(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epm_core::EmployeeNumber;
    use proptest::prelude::*;

    struct Subject(EmployeeNumber);

    impl Owned for Subject {
        fn owner(&self) -> EmployeeNumber {
            self.0
        }
    }

    fn n(v: i64) -> EmployeeNumber {
        EmployeeNumber::new(v)
    }

    #[test]
    fn owner_may_read_edit_and_delete() {
        let jane = Identity::employee(n(202));
        let r1 = Subject(n(202));

        assert!(can_read(&jane, &r1));
        assert!(can_edit(&jane, &r1));
        assert!(can_delete(&jane, &r1));
    }

    #[test]
    fn admin_may_act_on_any_review() {
        let john = Identity::admin(n(101));
        let r1 = Subject(n(202));

        for action in [ReviewAction::Read, ReviewAction::Edit, ReviewAction::Delete] {
            assert_eq!(authorize(&john, action, &r1), Ok(()));
        }
    }

    #[test]
    fn other_employee_is_forbidden() {
        let outsider = Identity::employee(n(303));
        let r1 = Subject(n(202));

        assert!(!can_read(&outsider, &r1));
        assert_eq!(
            authorize(&outsider, ReviewAction::Delete, &r1),
            Err(AuthzError::Forbidden(ReviewAction::Delete))
        );
    }

    #[test]
    fn every_identity_may_create() {
        assert!(can_create(&Identity::employee(n(1))));
        assert!(can_create(&Identity::admin(n(2))));
        assert_eq!(authorize_create(&Identity::employee(n(303))), Ok(()));
        assert_eq!(
            authorize(&Identity::employee(n(303)), ReviewAction::Create, &Subject(n(202))),
            Ok(())
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: read, edit and delete agree with `is_admin || actor == owner`
        /// for every role/ownership combination.
        #[test]
        fn predicates_match_owner_or_admin(
            actor in 1i64..50,
            owner in 1i64..50,
            is_admin in any::<bool>(),
        ) {
            let identity = Identity::new(n(actor), is_admin);
            let review = Subject(n(owner));
            let expected = is_admin || actor == owner;

            prop_assert_eq!(can_read(&identity, &review), expected);
            prop_assert_eq!(can_edit(&identity, &review), expected);
            prop_assert_eq!(can_delete(&identity, &review), expected);
            for action in [ReviewAction::Read, ReviewAction::Edit, ReviewAction::Delete] {
                prop_assert_eq!(authorize(&identity, action, &review).is_ok(), expected);
            }
        }
    }
}
