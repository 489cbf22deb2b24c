use std::fmt;

use serde::{Deserialize, Serialize};

/// Read access to the caller fields the repository core consults.
///
/// Only the username and target repository id influence capability
/// computation. Implemented by [`CallContext`] for remote callers and by
/// [`SystemContext`] for server-internal generation.
pub trait Identity {
    fn username(&self) -> Option<&str>;

    fn repository_id(&self) -> Option<&str>;

    /// `true` only for the server-internal identity.
    fn is_system(&self) -> bool {
        false
    }
}

/// Identity of a remote protocol caller, as produced by a binding.
///
/// Every protocol-facing service method takes a `CallContext`; the
/// server-internal [`SystemContext`] is a distinct type and can never be
/// passed where a `CallContext` is expected.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub binding: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub locale: Option<String>,
    pub repository_id: Option<String>,
    pub object_info_required: bool,
}

impl CallContext {
    /// A caller authenticated as `username`.
    pub fn user(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Default::default()
        }
    }

    /// A caller without credentials.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl Identity for CallContext {
    fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    fn repository_id(&self) -> Option<&str> {
        self.repository_id.as_deref()
    }
}

impl fmt::Debug for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("binding", &self.binding)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("locale", &self.locale)
            .field("repository_id", &self.repository_id)
            .field("object_info_required", &self.object_info_required)
            .finish()
    }
}

/// Unauthenticated identity the server uses to drive internal generation
/// (the demo filler). Every field is empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemContext;

impl Identity for SystemContext {
    fn username(&self) -> Option<&str> {
        None
    }

    fn repository_id(&self) -> Option<&str> {
        None
    }

    fn is_system(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_context() {
        let ctx = CallContext {
            repository_id: Some("A1".into()),
            ..CallContext::user("alice")
        };
        assert_eq!(ctx.username(), Some("alice"));
        assert_eq!(Identity::repository_id(&ctx), Some("A1"));
        assert!(!ctx.is_system());
    }

    #[test]
    fn anonymous_has_no_fields() {
        let ctx = CallContext::anonymous();
        assert!(ctx.username().is_none());
        assert!(ctx.binding.is_none());
        assert!(!ctx.object_info_required);
    }

    #[test]
    fn system_context_is_empty() {
        let sys = SystemContext;
        assert!(sys.username().is_none());
        assert!(sys.repository_id().is_none());
        assert!(sys.is_system());
    }

    #[test]
    fn debug_redacts_password() {
        let mut ctx = CallContext::user("bob");
        ctx.password = Some("hunter2".into());
        let debug = format!("{ctx:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("hunter2"));
    }
}
