use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role asserted by the backend for the current user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
    TempleAdmin,
}

/// Server-asserted identity, cached read-only in the session and replaced
/// wholesale on every successful auth operation or profile update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    pub is_email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Value>,
}

/// Exactly one phase describes the session at any instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Authenticated,
    AwaitingEmailVerification,
    Anonymous,
}

/// Client-side authentication state for one process
///
/// All mutation goes through the named transition methods; callers never
/// poke fields directly, which is what keeps every transition a single
/// atomic step for subscribers.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: Option<User>,
    pub(crate) access_token: Option<SecretString>,
    pub is_loading: bool,
    pub requires_email_verification: bool,
}

impl Session {
    /// Session at process start, before the startup check has resolved
    #[must_use]
    pub fn initial() -> Self {
        Self {
            user: None,
            access_token: None,
            is_loading: true,
            requires_email_verification: false,
        }
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&SecretString> {
        self.access_token.as_ref()
    }

    /// True iff both the user and the access token are present
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.access_token.is_some()
    }

    /// Mirrors `user.is_email_verified`, false when there is no user
    #[must_use]
    pub fn is_email_verified(&self) -> bool {
        self.user.as_ref().is_some_and(|user| user.is_email_verified)
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.is_loading {
            Phase::Loading
        } else if self.is_authenticated() {
            Phase::Authenticated
        } else if self.requires_email_verification {
            Phase::AwaitingEmailVerification
        } else {
            Phase::Anonymous
        }
    }

    /// A network round trip that determines session validity is in flight
    pub(crate) fn begin_loading(&mut self) {
        self.is_loading = true;
    }

    /// Login, social login or startup check succeeded
    pub(crate) fn signed_in(&mut self, user: User, token: SecretString) {
        self.user = Some(user);
        self.access_token = Some(token);
        self.is_loading = false;
        self.requires_email_verification = false;
    }

    /// Login attempt rejected; `unverified` marks the account as pending
    /// email verification
    pub(crate) fn login_rejected(&mut self, unverified: bool) {
        self.user = None;
        self.access_token = None;
        self.is_loading = false;
        self.requires_email_verification = unverified;
    }

    /// Registration accepted; no usable session is granted until the
    /// address is verified
    pub(crate) fn await_verification(&mut self) {
        self.user = None;
        self.access_token = None;
        self.is_loading = false;
        self.requires_email_verification = true;
    }

    /// Refresh succeeded; only the token changes, never the user
    pub(crate) fn token_refreshed(&mut self, token: SecretString) {
        self.access_token = Some(token);
    }

    /// Replace the cached user with the canonical record from the backend
    /// without touching the token or the authentication status
    pub(crate) fn merge_user(&mut self, user: User) {
        self.user = Some(user);
    }

    /// Email verification confirmed by the backend
    pub(crate) fn email_verified(&mut self) {
        self.requires_email_verification = false;
        if let Some(user) = self.user.as_mut() {
            user.is_email_verified = true;
        }
    }

    /// Back to anonymous: logout, refresh failure or forced expiry
    pub(crate) fn clear(&mut self) {
        self.user = None;
        self.access_token = None;
        self.is_loading = false;
        self.requires_email_verification = false;
    }
}
