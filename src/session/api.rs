use crate::session::error::{classify, Error};
use crate::session::state::User;
use crate::session::APP_USER_AGENT;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info_span, Instrument};
use url::Url;
use uuid::Uuid;

/// Registration payload; field validation happens in the caller's UI layer
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub phone: Option<String>,
}

/// Partial profile update; absent fields are left untouched by the backend
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub preferences: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    user: User,
    access_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct ProfileResponse {
    user: User,
}

/// Normalize the configured base URL into an endpoint URL
///
/// # Errors
/// Returns an error if `base` cannot be parsed, has no host, or uses an
/// unsupported scheme.
pub fn endpoint_url(base: &str, path: &str) -> Result<String, Error> {
    let url = Url::parse(base).map_err(|err| Error::Endpoint(err.to_string()))?;

    let scheme = url.scheme();

    let host = url
        .host()
        .ok_or_else(|| Error::Endpoint("no host specified".to_string()))?
        .to_owned();

    let port = match url.port() {
        Some(p) => p,
        None => match scheme {
            "http" => 80,
            "https" => 443,
            _ => return Err(Error::Endpoint(format!("unsupported scheme {scheme}"))),
        },
    };

    let endpoint_url = format!("{scheme}://{host}:{port}{path}");

    debug!("endpoint URL: {}", endpoint_url);

    Ok(endpoint_url)
}

/// Typed client over the backend auth surface
///
/// The cookie store carries the HTTP-only refresh cookie between calls; the
/// client never reads or writes that cookie itself, it only triggers
/// `/api/auth/refresh` and receives a new access token.
#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    fn url(&self, path: &str) -> Result<String, Error> {
        endpoint_url(&self.base_url, path)
    }

    fn request_id(builder: RequestBuilder) -> RequestBuilder {
        builder.header("x-request-id", Uuid::new_v4().to_string())
    }

    fn bearer(builder: RequestBuilder, token: &SecretString) -> RequestBuilder {
        builder.header("authorization", format!("Bearer {}", token.expose_secret()))
    }

    /// Decode a failure response into the error taxonomy
    async fn fail(url: &str, response: Response) -> Error {
        let status = response.status().as_u16();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);

        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        debug!("{url} - {status}, {message}");

        if let Some(fields) = body.get("fields").and_then(Value::as_object) {
            let fields = fields
                .iter()
                .filter_map(|(key, value)| {
                    value.as_str().map(|value| (key.clone(), value.to_string()))
                })
                .collect();
            return Error::Validation { message, fields };
        }

        let code = body.get("code").and_then(Value::as_str);

        Error::Auth {
            kind: classify(code, &message),
            status,
            message,
        }
    }

    /// Exchange credentials for a session
    ///
    /// # Errors
    /// Returns an error if the request fails, the backend rejects the
    /// credentials, or the response is missing expected fields.
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
        remember_me: bool,
    ) -> Result<(User, SecretString), Error> {
        let url = self.url("/api/auth/login")?;

        let payload = json!({
            "email": email,
            "password": password.expose_secret(),
            "rememberMe": remember_me,
        });

        let span = info_span!("auth.login", http.method = "POST", url = %url);
        let response = Self::request_id(self.http.post(&url))
            .json(&payload)
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(Self::fail(&url, response).await);
        }

        let auth: AuthResponse = response.json().await?;
        Ok((auth.user, SecretString::from(auth.access_token)))
    }

    /// Create a new account; no session is granted
    ///
    /// # Errors
    /// Returns an error if the request fails or the backend rejects the
    /// registration.
    pub async fn register(&self, new_user: &NewUser) -> Result<(), Error> {
        let url = self.url("/api/auth/register")?;

        let payload = json!({
            "name": new_user.name,
            "email": new_user.email,
            "password": new_user.password.expose_secret(),
            "phone": new_user.phone,
        });

        let span = info_span!("auth.register", http.method = "POST", url = %url);
        let response = Self::request_id(self.http.post(&url))
            .json(&payload)
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(Self::fail(&url, response).await);
        }

        Ok(())
    }

    /// Exchange a raw provider credential for a session
    ///
    /// The credential is forwarded opaque and undecoded; the backend is the
    /// sole trust boundary for identity claims.
    ///
    /// # Errors
    /// Returns an error if the request fails or the backend rejects the
    /// credential.
    pub async fn google(&self, credential: &str) -> Result<(User, SecretString), Error> {
        let url = self.url("/api/auth/google")?;

        let payload = json!({ "credential": credential });

        let span = info_span!("auth.google", http.method = "POST", url = %url);
        let response = Self::request_id(self.http.post(&url))
            .json(&payload)
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(Self::fail(&url, response).await);
        }

        let auth: AuthResponse = response.json().await?;
        Ok((auth.user, SecretString::from(auth.access_token)))
    }

    /// Mint a new access token from the refresh cookie
    ///
    /// # Errors
    /// Returns an error if the request fails or the refresh token is no
    /// longer valid.
    pub async fn refresh(&self) -> Result<SecretString, Error> {
        let url = self.url("/api/auth/refresh")?;

        let span = info_span!("auth.refresh", http.method = "POST", url = %url);
        let response = Self::request_id(self.http.post(&url))
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(Self::fail(&url, response).await);
        }

        let token: TokenResponse = response.json().await?;
        Ok(SecretString::from(token.access_token))
    }

    /// Invalidate the current refresh token, or all of them
    ///
    /// # Errors
    /// Returns an error if the request fails; callers treat this as
    /// best-effort.
    pub async fn logout(
        &self,
        token: Option<SecretString>,
        everywhere: bool,
    ) -> Result<(), Error> {
        let path = if everywhere {
            "/api/auth/logout-all"
        } else {
            "/api/auth/logout"
        };
        let url = self.url(path)?;

        let span = info_span!("auth.logout", http.method = "POST", url = %url);
        let mut builder = Self::request_id(self.http.post(&url));
        if let Some(token) = token.as_ref() {
            builder = Self::bearer(builder, token);
        }
        let response = builder.send().instrument(span).await?;

        if !response.status().is_success() {
            return Err(Self::fail(&url, response).await);
        }

        Ok(())
    }

    /// Fetch the current user
    ///
    /// # Errors
    /// Returns an error if the request fails or the token is rejected.
    pub async fn profile(&self, token: SecretString) -> Result<User, Error> {
        let url = self.url("/api/auth/profile")?;

        let span = info_span!("auth.profile", http.method = "GET", url = %url);
        let response = Self::bearer(Self::request_id(self.http.get(&url)), &token)
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(Self::fail(&url, response).await);
        }

        let profile: ProfileResponse = response.json().await?;
        Ok(profile.user)
    }

    /// Apply a partial profile update, returning the canonical user
    ///
    /// # Errors
    /// Returns an error if the request fails, the token is rejected, or the
    /// backend reports validation errors.
    pub async fn update_profile(
        &self,
        token: SecretString,
        update: &ProfileUpdate,
    ) -> Result<User, Error> {
        let url = self.url("/api/auth/profile")?;

        let mut payload = serde_json::Map::new();
        if let Some(name) = update.name.as_ref() {
            payload.insert("name".to_string(), json!(name));
        }
        if let Some(phone) = update.phone.as_ref() {
            payload.insert("phone".to_string(), json!(phone));
        }
        if let Some(preferences) = update.preferences.as_ref() {
            payload.insert("preferences".to_string(), preferences.clone());
        }

        let span = info_span!("auth.update_profile", http.method = "PUT", url = %url);
        let response = Self::bearer(Self::request_id(self.http.put(&url)), &token)
            .json(&Value::Object(payload))
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(Self::fail(&url, response).await);
        }

        let profile: ProfileResponse = response.json().await?;
        Ok(profile.user)
    }

    /// Confirm an email address from a mailed verification token
    ///
    /// # Errors
    /// Returns an error if the request fails or the token is invalid or
    /// expired.
    pub async fn verify_email(&self, token: &str) -> Result<(), Error> {
        let url = self.url("/api/auth/verify-email")?;

        let span = info_span!("auth.verify_email", http.method = "GET", url = %url);
        let response = Self::request_id(self.http.get(&url))
            .query(&[("token", token)])
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(Self::fail(&url, response).await);
        }

        Ok(())
    }

    /// Ask the backend to resend the verification mail
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn resend_verification(&self, email: &str) -> Result<(), Error> {
        self.post_json("/api/auth/resend-verification", &json!({ "email": email }))
            .await
    }

    /// Start the password reset flow
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn forgot_password(&self, email: &str) -> Result<(), Error> {
        self.post_json("/api/auth/forgot-password", &json!({ "email": email }))
            .await
    }

    /// Finish the password reset flow
    ///
    /// # Errors
    /// Returns an error if the request fails or the reset token is invalid.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &SecretString,
    ) -> Result<(), Error> {
        self.post_json(
            "/api/auth/reset-password",
            &json!({
                "token": token,
                "password": new_password.expose_secret(),
            }),
        )
        .await
    }

    /// Change the password of the authenticated user
    ///
    /// # Errors
    /// Returns an error if the request fails or the token is rejected.
    pub async fn change_password(
        &self,
        token: SecretString,
        current: &SecretString,
        new_password: &SecretString,
    ) -> Result<(), Error> {
        let url = self.url("/api/auth/change-password")?;

        let payload = json!({
            "currentPassword": current.expose_secret(),
            "newPassword": new_password.expose_secret(),
        });

        let span = info_span!("auth.change_password", http.method = "POST", url = %url);
        let response = Self::bearer(Self::request_id(self.http.post(&url)), &token)
            .json(&payload)
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(Self::fail(&url, response).await);
        }

        Ok(())
    }

    async fn post_json(&self, path: &str, payload: &Value) -> Result<(), Error> {
        let url = self.url(path)?;

        let span = info_span!("auth.post", http.method = "POST", url = %url);
        let response = Self::request_id(self.http.post(&url))
            .json(payload)
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(Self::fail(&url, response).await);
        }

        Ok(())
    }
}
