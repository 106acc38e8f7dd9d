//! Authentication collaborator: bearer credential and signed-in flag.

use std::sync::{Arc, RwLock};

/// Source of the caller's bearer credential.
///
/// The cart never obtains or refreshes tokens itself; it only asks whoever
/// owns the session for the current one.
pub trait Credentials: Send + Sync {
    /// Current bearer token, if signed in.
    fn bearer_token(&self) -> Option<String>;

    /// Whether the caller is signed in.
    fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }
}

/// Shared, mutable session holder.
///
/// Clones share the same token, so the auth layer can sign the user in or
/// out and every repository holding a clone sees the change.
#[derive(Clone, Default)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
}

impl Session {
    /// A signed-out session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::default();
        session.sign_in(token);
        session
    }

    pub fn sign_in(&self, token: impl Into<String>) {
        let token = token.into();
        match self.token.write() {
            Ok(mut guard) => *guard = Some(token),
            Err(poisoned) => *poisoned.into_inner() = Some(token),
        }
        debug!("Session signed in");
    }

    pub fn sign_out(&self) {
        match self.token.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
        debug!("Session signed out");
    }
}

impl Credentials for Session {
    fn bearer_token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
