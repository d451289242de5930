//! Identity port.
//!
//! Authentication itself is delegated to the surrounding platform; the
//! engine only needs to know who the current subject is. Loading a scenario
//! without a signed-in user is refused so no orphaned progress records are
//! ever created.

use crate::progress::UserId;

/// Source of the current session's subject.
pub trait IdentityProvider: Send + Sync {
    /// Returns the authenticated user, or `None` when signed out.
    fn current_user(&self) -> Option<UserId>;
}

/// Fixed identity for embedded use and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticIdentity {
    user: Option<UserId>,
}

impl StaticIdentity {
    /// An identity that is signed in as `user`.
    #[must_use]
    pub const fn signed_in(user: UserId) -> Self {
        Self { user: Some(user) }
    }

    /// An identity with nobody signed in.
    #[must_use]
    pub const fn signed_out() -> Self {
        Self { user: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<UserId> {
        self.user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: the port stays object-safe.
    fn _assert_object_safe(_: &dyn IdentityProvider) {}

    #[test]
    fn test_static_identity() {
        let user = UserId::new();
        assert_eq!(StaticIdentity::signed_in(user).current_user(), Some(user));
        assert_eq!(StaticIdentity::signed_out().current_user(), None);
    }
}
