//! Owner-chain access control.
//!
//! Every business and product endpoint applies the same rule: a resource is
//! visible and mutable to a caller iff the terminal user of its ownership
//! chain is the caller (Business -> User, Product -> Business -> User).
//! Lookups that fail the rule behave as if the resource does not exist, so
//! callers see "not found" rather than "forbidden" and cannot probe for
//! resources they do not own.
//!
//! Collection listings are the deliberate exception: public browse is
//! unscoped and never consults this module.

use crate::types::UserId;

/// A resource whose ownership chain terminates in a single user.
///
/// Implementors resolve the chain at load time; `owner_id` is the terminal
/// user, not an intermediate link.
pub trait Owned {
    /// The user at the end of the ownership chain.
    fn owner_id(&self) -> UserId;
}

/// The single access rule for ownership-scoped lookups.
#[must_use]
pub fn can_access<R: Owned>(caller: UserId, resource: &R) -> bool {
    resource.owner_id() == caller
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget {
        owner: UserId,
    }

    impl Owned for Widget {
        fn owner_id(&self) -> UserId {
            self.owner
        }
    }

    #[test]
    fn test_owner_can_access() {
        let widget = Widget {
            owner: UserId::new(1),
        };
        assert!(can_access(UserId::new(1), &widget));
    }

    #[test]
    fn test_other_user_cannot_access() {
        let widget = Widget {
            owner: UserId::new(1),
        };
        assert!(!can_access(UserId::new(2), &widget));
    }
}
