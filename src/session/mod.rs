pub mod api;
pub mod error;
pub mod guard;
pub mod refresh;
pub mod state;
pub mod store;

use crate::session::api::{ApiClient, NewUser, ProfileUpdate};
use crate::session::error::Error;
use crate::session::state::User;
use crate::session::store::SessionStore;
use secrecy::SecretString;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

pub(crate) static APP_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Owns the client-side authentication lifecycle
///
/// Holds the API client, the observable store, and the single in-flight
/// refresh lock. Constructed once at application start and passed by
/// reference; all session reads and writes flow through it.
#[derive(Debug)]
pub struct SessionManager {
    api: ApiClient,
    store: Arc<SessionStore>,
    refresh_lock: Mutex<()>,
}

impl SessionManager {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, Error> {
        Ok(Self {
            api: ApiClient::new(base_url)?,
            store: Arc::new(SessionStore::new()),
            refresh_lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Startup check: try to restore a session from the refresh cookie
    ///
    /// Lands `Authenticated` when the cookie still mints a token and the
    /// profile fetch succeeds, `Anonymous` otherwise. An anonymous start is
    /// not an error.
    #[instrument(skip(self))]
    pub async fn initialize(&self) {
        match self.api.refresh().await {
            Ok(token) => match self.api.profile(token.clone()).await {
                Ok(user) => self.store.signed_in(user, token),
                Err(err) => {
                    warn!("startup profile fetch failed: {err}");
                    self.store.clear();
                }
            },
            Err(err) => {
                debug!("no restorable session: {err}");
                self.store.clear();
            }
        }
    }

    /// # Errors
    /// Returns the backend rejection; an unverified account is reported via
    /// `Error::is_email_not_verified` and leaves the flag set on the store.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
        remember_me: bool,
    ) -> Result<User, Error> {
        self.store.begin_loading();
        match self.api.login(email, password, remember_me).await {
            Ok((user, token)) => {
                self.store.signed_in(user.clone(), token);
                Ok(user)
            }
            Err(err) => {
                self.store.login_rejected(err.is_email_not_verified());
                Err(err)
            }
        }
    }

    /// Exchange a raw provider credential for a session; contract identical
    /// to `login`
    ///
    /// # Errors
    /// Returns the backend rejection.
    #[instrument(skip(self, credential))]
    pub async fn login_with_google(&self, credential: &str) -> Result<User, Error> {
        self.store.begin_loading();
        match self.api.google(credential).await {
            Ok((user, token)) => {
                self.store.signed_in(user.clone(), token);
                Ok(user)
            }
            Err(err) => {
                self.store.login_rejected(err.is_email_not_verified());
                Err(err)
            }
        }
    }

    /// Create an account; on success the session awaits email verification
    /// and is never authenticated directly
    ///
    /// # Errors
    /// Returns the backend rejection and leaves the session anonymous.
    #[instrument(skip(self, new_user))]
    pub async fn register(&self, new_user: &NewUser) -> Result<(), Error> {
        self.store.begin_loading();
        match self.api.register(new_user).await {
            Ok(()) => {
                self.store.await_verification();
                Ok(())
            }
            Err(err) => {
                self.store.clear();
                Err(err)
            }
        }
    }

    /// Best-effort backend revoke, unconditional local clear
    ///
    /// Leaving a dead session server-side is a worse failure mode than a
    /// stale revoke, so the local session is cleared even when the network
    /// call fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.sign_out(false).await;
    }

    /// Like `logout`, but revokes the refresh tokens of every device
    #[instrument(skip(self))]
    pub async fn logout_all(&self) {
        self.sign_out(true).await;
    }

    async fn sign_out(&self, everywhere: bool) {
        let token = self.store.snapshot().access_token().cloned();
        if let Err(err) = self.api.logout(token, everywhere).await {
            warn!("logout request failed, clearing local session anyway: {err}");
        }
        self.store.clear();
    }

    /// Mint a new access token from the refresh cookie
    ///
    /// Concurrent callers coalesce: the epoch is captured before taking the
    /// in-flight lock, and a caller that finds it advanced while waiting
    /// reuses the fresh token instead of issuing a second request.
    ///
    /// # Errors
    /// Returns `SessionExpired` after forcing the session back to anonymous.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), Error> {
        let seen = self.store.refresh_epoch();
        let _guard = self.refresh_lock.lock().await;

        if self.store.refresh_epoch() != seen {
            debug!("refresh already completed by a concurrent caller");
            return Ok(());
        }

        match self.api.refresh().await {
            Ok(token) => {
                self.store.token_refreshed(token);
                Ok(())
            }
            Err(err) => {
                warn!("token refresh failed, clearing session: {err}");
                self.store.clear();
                Err(Error::SessionExpired)
            }
        }
    }

    /// Fetch the current user and refresh the cached copy
    ///
    /// # Errors
    /// Returns `NotAuthenticated` without a session, `SessionExpired` when
    /// the refresh-and-retry gives up, or the backend rejection.
    pub async fn profile(&self) -> Result<User, Error> {
        let user = self.authorized(|token| self.api.profile(token)).await?;
        self.store.merge_user(user.clone());
        Ok(user)
    }

    /// Apply a partial profile update; never touches the token or the
    /// authentication status
    ///
    /// # Errors
    /// Returns `NotAuthenticated` without a session, `SessionExpired` when
    /// the refresh-and-retry gives up, or the backend rejection.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, Error> {
        let user = self
            .authorized(|token| self.api.update_profile(token, update))
            .await?;
        self.store.merge_user(user.clone());
        Ok(user)
    }

    /// Confirm an email address from a mailed verification token
    ///
    /// The endpoint grants no token, so the session only becomes
    /// authenticated here when credentials already exist; otherwise the
    /// caller proceeds to login.
    ///
    /// # Errors
    /// Returns the backend rejection for an invalid or expired token.
    #[instrument(skip(self, token))]
    pub async fn verify_email(&self, token: &str) -> Result<(), Error> {
        self.api.verify_email(token).await?;
        self.store.email_verified();
        Ok(())
    }

    /// # Errors
    /// Returns the backend rejection.
    pub async fn resend_verification(&self, email: &str) -> Result<(), Error> {
        self.api.resend_verification(email).await
    }

    /// # Errors
    /// Returns the backend rejection.
    pub async fn forgot_password(&self, email: &str) -> Result<(), Error> {
        self.api.forgot_password(email).await
    }

    /// # Errors
    /// Returns the backend rejection for an invalid or expired reset token.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &SecretString,
    ) -> Result<(), Error> {
        self.api.reset_password(token, new_password).await
    }

    /// # Errors
    /// Returns `NotAuthenticated` without a session, `SessionExpired` when
    /// the refresh-and-retry gives up, or the backend rejection.
    pub async fn change_password(
        &self,
        current: &SecretString,
        new_password: &SecretString,
    ) -> Result<(), Error> {
        self.authorized(|token| self.api.change_password(token, current, new_password))
            .await
    }

    fn bearer(&self) -> Result<SecretString, Error> {
        self.store
            .snapshot()
            .access_token()
            .cloned()
            .ok_or(Error::NotAuthenticated)
    }

    /// Run an authenticated call with exactly one refresh-and-retry on 401
    ///
    /// A second 401 after a successful refresh is a hard failure: the
    /// session is cleared and `SessionExpired` is returned, never a second
    /// retry.
    async fn authorized<T, F, Fut>(&self, call: F) -> Result<T, Error>
    where
        F: Fn(SecretString) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let token = self.bearer()?;
        match call(token).await {
            Err(err) if err.is_unauthorized() => {
                debug!("401 on authenticated call, refreshing once");
                self.refresh().await?;
                let token = self.bearer()?;
                match call(token).await {
                    Err(err) if err.is_unauthorized() => {
                        warn!("401 persisted after refresh, clearing session");
                        self.store.clear();
                        Err(Error::SessionExpired)
                    }
                    other => other,
                }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::{Phase, Role};
    use anyhow::{anyhow, Result};
    use secrecy::ExposeSecret;
    use serde_json::json;
    use std::net::TcpListener;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn user_json(email: &str, verified: bool) -> serde_json::Value {
        json!({
            "id": "u-1",
            "name": "Asha",
            "email": email,
            "role": "user",
            "isEmailVerified": verified,
        })
    }

    fn seeded_user() -> User {
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

    #[tokio::test]
    async fn login_lands_authenticated() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": user_json("user@x.com", true),
                "accessToken": "tok1"
            })))
            .mount(&server)
            .await;

        let manager = SessionManager::new(&server.uri())?;
        let password = SecretString::from("Secret1".to_string());
        manager.login("user@x.com", &password, false).await?;

        let session = manager.store().snapshot();
        assert!(session.is_authenticated());
        assert_eq!(session.user.as_ref().map(|u| u.email.as_str()), Some("user@x.com"));
        assert!(!session.requires_email_verification);
        Ok(())
    }

    #[tokio::test]
    async fn unverified_login_sets_flag_and_stays_anonymous() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": "EMAIL_NOT_VERIFIED",
                "message": "Please verify your email before logging in"
            })))
            .mount(&server)
            .await;

        let manager = SessionManager::new(&server.uri())?;
        let password = SecretString::from("Secret1".to_string());
        let err = manager
            .login("user@x.com", &password, false)
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;

        assert!(err.is_email_not_verified());
        let session = manager.store().snapshot();
        assert!(!session.is_authenticated());
        assert!(session.requires_email_verification);
        Ok(())
    }

    #[tokio::test]
    async fn register_never_lands_authenticated() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth/register"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "message": "verification mail sent"
            })))
            .mount(&server)
            .await;

        let manager = SessionManager::new(&server.uri())?;
        manager
            .register(&NewUser {
                name: "Asha".to_string(),
                email: "user@x.com".to_string(),
                password: SecretString::from("Secret1".to_string()),
                phone: None,
            })
            .await?;

        let session = manager.store().snapshot();
        assert_eq!(session.phase(), Phase::AwaitingEmailVerification);
        assert!(!session.is_authenticated());
        Ok(())
    }

    #[tokio::test]
    async fn failed_register_returns_to_anonymous() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth/register"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "message": "registration failed",
                "fields": {"email": "already registered"}
            })))
            .mount(&server)
            .await;

        let manager = SessionManager::new(&server.uri())?;
        let result = manager
            .register(&NewUser {
                name: "Asha".to_string(),
                email: "user@x.com".to_string(),
                password: SecretString::from("Secret1".to_string()),
                phone: None,
            })
            .await;

        assert!(result.is_err());
        assert_eq!(manager.store().snapshot().phase(), Phase::Anonymous);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_replaces_only_the_token() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessToken": "tok2"
            })))
            .mount(&server)
            .await;

        let manager = SessionManager::new(&server.uri())?;
        manager
            .store()
            .signed_in(seeded_user(), SecretString::from("tok1".to_string()));

        manager.refresh().await?;

        let session = manager.store().snapshot();
        assert_eq!(session.access_token().unwrap().expose_secret(), "tok2");
        assert_eq!(session.user, Some(seeded_user()));
        Ok(())
    }

    #[tokio::test]
    async fn failed_refresh_forces_anonymous() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "refresh token expired"
            })))
            .mount(&server)
            .await;

        let manager = SessionManager::new(&server.uri())?;
        manager
            .store()
            .signed_in(seeded_user(), SecretString::from("tok1".to_string()));

        let err = manager
            .refresh()
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;

        assert!(matches!(err, Error::SessionExpired));
        assert_eq!(manager.store().snapshot().phase(), Phase::Anonymous);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_refreshes_coalesce_into_one_request() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(100))
                    .set_body_json(json!({"accessToken": "tok2"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let manager = SessionManager::new(&server.uri())?;
        manager
            .store()
            .signed_in(seeded_user(), SecretString::from("tok1".to_string()));

        let (first, second) = tokio::join!(manager.refresh(), manager.refresh());
        first?;
        second?;

        assert_eq!(
            manager
                .store()
                .snapshot()
                .access_token()
                .unwrap()
                .expose_secret(),
            "tok2"
        );
        Ok(())
    }

    #[tokio::test]
    async fn protected_call_retries_exactly_once_after_401() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        // Stale token is rejected, fresh token is accepted.
        Mock::given(method("GET"))
            .and(path("/api/auth/profile"))
            .and(header("authorization", "Bearer tok1"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "token expired"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/auth/profile"))
            .and(header("authorization", "Bearer tok2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": user_json("user@x.com", true)
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessToken": "tok2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let manager = SessionManager::new(&server.uri())?;
        manager
            .store()
            .signed_in(seeded_user(), SecretString::from("tok1".to_string()));

        // Caller receives the intended payload transparently.
        let user = manager.profile().await?;
        assert_eq!(user.email, "user@x.com");
        assert!(manager.store().snapshot().is_authenticated());
        Ok(())
    }

    #[tokio::test]
    async fn second_consecutive_401_forces_anonymous() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/auth/profile"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "token expired"
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessToken": "tok2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let manager = SessionManager::new(&server.uri())?;
        manager
            .store()
            .signed_in(seeded_user(), SecretString::from("tok1".to_string()));

        let err = manager
            .profile()
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;

        assert!(matches!(err, Error::SessionExpired));
        assert_eq!(manager.store().snapshot().phase(), Phase::Anonymous);
        Ok(())
    }

    #[tokio::test]
    async fn failed_refresh_during_retry_gives_up() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/auth/profile"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "token expired"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "refresh token expired"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let manager = SessionManager::new(&server.uri())?;
        manager
            .store()
            .signed_in(seeded_user(), SecretString::from("tok1".to_string()));

        let err = manager
            .profile()
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;

        assert!(matches!(err, Error::SessionExpired));
        assert_eq!(manager.store().snapshot().phase(), Phase::Anonymous);
        Ok(())
    }

    #[tokio::test]
    async fn update_profile_keeps_token_and_auth_status() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/auth/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": {
                    "id": "u-1",
                    "name": "Asha K",
                    "email": "user@x.com",
                    "role": "user",
                    "isEmailVerified": true,
                }
            })))
            .mount(&server)
            .await;

        let manager = SessionManager::new(&server.uri())?;
        manager
            .store()
            .signed_in(seeded_user(), SecretString::from("tok1".to_string()));

        manager
            .update_profile(&ProfileUpdate {
                name: Some("Asha K".to_string()),
                ..ProfileUpdate::default()
            })
            .await?;

        let session = manager.store().snapshot();
        assert!(session.is_authenticated());
        assert_eq!(session.access_token().unwrap().expose_secret(), "tok1");
        assert_eq!(session.user.as_ref().map(|u| u.name.as_str()), Some("Asha K"));
        Ok(())
    }

    #[tokio::test]
    async fn logout_clears_session_even_when_backend_fails() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth/logout"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let manager = SessionManager::new(&server.uri())?;
        manager
            .store()
            .signed_in(seeded_user(), SecretString::from("tok1".to_string()));

        manager.logout().await;

        let session = manager.store().snapshot();
        assert_eq!(session.phase(), Phase::Anonymous);
        assert!(session.user.is_none());
        assert!(session.access_token().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn logout_all_survives_being_offline() -> Result<()> {
        // Bind and drop a listener so the port refuses connections.
        let listener = TcpListener::bind("127.0.0.1:0");
        let Ok(listener) = listener else {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        };
        let addr = listener.local_addr()?;
        drop(listener);

        let manager = SessionManager::new(&format!("http://{addr}"))?;
        manager
            .store()
            .signed_in(seeded_user(), SecretString::from("tok1".to_string()));

        manager.logout_all().await;

        let session = manager.store().snapshot();
        assert!(session.user.is_none());
        assert!(session.access_token().is_none());
        assert!(!session.is_authenticated());
        Ok(())
    }

    #[tokio::test]
    async fn initialize_restores_session_from_cookie() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessToken": "tok1"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/auth/profile"))
            .and(header("authorization", "Bearer tok1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": user_json("user@x.com", true)
            })))
            .mount(&server)
            .await;

        let manager = SessionManager::new(&server.uri())?;
        assert_eq!(manager.store().snapshot().phase(), Phase::Loading);

        manager.initialize().await;

        assert_eq!(manager.store().snapshot().phase(), Phase::Authenticated);
        Ok(())
    }

    #[tokio::test]
    async fn initialize_lands_anonymous_without_cookie() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "no refresh token"
            })))
            .mount(&server)
            .await;

        let manager = SessionManager::new(&server.uri())?;
        manager.initialize().await;

        assert_eq!(manager.store().snapshot().phase(), Phase::Anonymous);
        Ok(())
    }

    #[tokio::test]
    async fn google_login_forwards_raw_credential() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth/google"))
            .and(wiremock::matchers::body_json(json!({
                "credential": "opaque-provider-token"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": user_json("user@x.com", true),
                "accessToken": "tok1"
            })))
            .mount(&server)
            .await;

        let manager = SessionManager::new(&server.uri())?;
        manager.login_with_google("opaque-provider-token").await?;

        assert!(manager.store().snapshot().is_authenticated());
        Ok(())
    }

    #[tokio::test]
    async fn verify_email_marks_cached_user_verified() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/auth/verify-email"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let manager = SessionManager::new(&server.uri())?;
        let mut user = seeded_user();
        user.is_email_verified = false;
        manager
            .store()
            .signed_in(user, SecretString::from("tok1".to_string()));

        manager.verify_email("v-123").await?;

        let session = manager.store().snapshot();
        assert!(session.is_email_verified());
        assert_eq!(session.phase(), Phase::Authenticated);
        Ok(())
    }

    #[tokio::test]
    async fn profile_without_session_is_not_authenticated() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let manager = SessionManager::new(&server.uri())?;
        manager.store().clear();

        let err = manager
            .profile()
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;
        assert!(matches!(err, Error::NotAuthenticated));
        Ok(())
    }
}
