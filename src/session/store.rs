use crate::session::state::{Session, User};
use secrecy::SecretString;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Process-wide observable session store
///
/// One writer cell, any number of subscribers. Every transition goes through
/// `send_modify`, so subscribers never observe a half-applied session. The
/// refresh epoch counts completed token grants and is what lets concurrent
/// refresh attempts coalesce instead of issuing duplicate requests.
#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<Session>,
    refresh_epoch: AtomicU64,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session::initial());
        Self {
            tx,
            refresh_epoch: AtomicU64::new(0),
        }
    }

    /// Clone of the current session
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// New subscription; the receiver sees every transition from now on
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    /// Number of token grants applied so far
    pub(crate) fn refresh_epoch(&self) -> u64 {
        self.refresh_epoch.load(Ordering::SeqCst)
    }

    pub(crate) fn begin_loading(&self) {
        self.tx.send_modify(Session::begin_loading);
    }

    pub fn signed_in(&self, user: User, token: SecretString) {
        self.tx.send_modify(|session| session.signed_in(user, token));
        self.refresh_epoch.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn login_rejected(&self, unverified: bool) {
        self.tx
            .send_modify(|session| session.login_rejected(unverified));
    }

    pub(crate) fn await_verification(&self) {
        self.tx.send_modify(Session::await_verification);
    }

    pub(crate) fn token_refreshed(&self, token: SecretString) {
        self.tx.send_modify(|session| session.token_refreshed(token));
        self.refresh_epoch.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn merge_user(&self, user: User) {
        self.tx.send_modify(|session| session.merge_user(user));
    }

    pub(crate) fn email_verified(&self) {
        self.tx.send_modify(Session::email_verified);
    }

    pub fn clear(&self) {
        self.tx.send_modify(Session::clear);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::{Phase, Role, User};
    use secrecy::ExposeSecret;

    fn user() -> User {
        User {
            id: "u-1".to_string(),
            name: "Asha".to_string(),
            email: "user@x.com".to_string(),
            phone: None,
            role: Role::User,
            is_email_verified: true,
            preferences: None,
        }
    }

    #[test]
    fn snapshot_starts_loading() {
        let store = SessionStore::new();
        assert_eq!(store.snapshot().phase(), Phase::Loading);
    }

    #[tokio::test]
    async fn subscribers_observe_each_transition() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();

        store.signed_in(user(), SecretString::from("tok1".to_string()));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().phase(), Phase::Authenticated);

        store.clear();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().phase(), Phase::Anonymous);
    }

    #[test]
    fn refresh_epoch_counts_token_grants() {
        let store = SessionStore::new();
        assert_eq!(store.refresh_epoch(), 0);

        store.signed_in(user(), SecretString::from("tok1".to_string()));
        assert_eq!(store.refresh_epoch(), 1);

        store.token_refreshed(SecretString::from("tok2".to_string()));
        assert_eq!(store.refresh_epoch(), 2);
        assert_eq!(
            store.snapshot().access_token().unwrap().expose_secret(),
            "tok2"
        );

        // Clearing the session is not a grant
        store.clear();
        assert_eq!(store.refresh_epoch(), 2);
    }

    #[test]
    fn login_rejected_keeps_session_anonymous_with_flag() {
        let store = SessionStore::new();
        store.login_rejected(true);

        let session = store.snapshot();
        assert!(!session.is_authenticated());
        assert!(session.requires_email_verification);
    }
}
