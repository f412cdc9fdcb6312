//! Hosted identity provider backing (GoTrue `/auth/v1`).

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use neemon_core::{Email, PublicUser, UserId};

use super::{AuthError, ResetOutcome, SignupRequest};
use crate::store::{LocalStore, TabId, keys, read_json, write_json};

/// Provider failure. `message` is the provider's own text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    pub status: u16,
    pub message: String,
}

impl ProviderError {
    fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<ProviderError> for AuthError {
    fn from(e: ProviderError) -> Self {
        Self::Provider(e.message)
    }
}

/// Profile fields kept in the provider's user metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

/// A user as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: ProfileData,
}

impl ProviderUser {
    fn to_public(&self) -> Result<PublicUser, AuthError> {
        let malformed = || AuthError::Provider("identity provider returned a malformed user".into());
        Ok(PublicUser {
            id: UserId::parse(&self.id).map_err(|_| malformed())?,
            name: self.user_metadata.name.clone(),
            email: Email::parse(self.email.as_deref().unwrap_or_default())
                .map_err(|_| malformed())?,
            phone: self.user_metadata.phone.clone(),
        })
    }
}

/// Tokens plus the signed-in user.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    pub user: ProviderUser,
}

/// Sign-up answers with a session, or only a user when the project requires
/// email confirmation first.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(ProviderSession),
    User(ProviderUser),
}

/// Operations consumed from the hosted identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: &ProfileData,
    ) -> Result<SignUpResponse, ProviderError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ProviderError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError>;

    async fn get_user(&self, access_token: &str) -> Result<ProviderUser, ProviderError>;

    async fn reset_password_for_email(&self, email: &str) -> Result<(), ProviderError>;

    async fn update_user(
        &self,
        access_token: &str,
        profile: &ProfileData,
    ) -> Result<ProviderUser, ProviderError>;
}

/// Session marker persisted for the remote backing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: UserId,
}

/// Identity backed by the hosted provider.
pub struct RemoteIdentity {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn LocalStore>,
    tab: TabId,
}

impl RemoteIdentity {
    pub fn new(provider: Arc<dyn IdentityProvider>, store: Arc<dyn LocalStore>, tab: TabId) -> Self {
        Self {
            provider,
            store,
            tab,
        }
    }

    /// Current session marker, if any.
    #[must_use]
    pub fn session(&self) -> Option<RemoteSession> {
        read_json(self.store.as_ref(), keys::SESSION)
    }

    fn start_session(&self, session: &ProviderSession) -> Result<PublicUser, AuthError> {
        let user = session.user.to_public()?;
        let marker = RemoteSession {
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            user_id: user.id.clone(),
        };
        write_json(self.store.as_ref(), keys::SESSION, &marker, self.tab)?;
        Ok(user)
    }

    pub(super) async fn signup(&self, request: &SignupRequest) -> Result<PublicUser, AuthError> {
        let profile = ProfileData {
            name: request.name.clone(),
            phone: request.phone.clone(),
        };
        match self
            .provider
            .sign_up(request.email.as_str(), &request.password, &profile)
            .await?
        {
            SignUpResponse::Session(session) => self.start_session(&session),
            SignUpResponse::User(_) => Err(AuthError::Provider(
                "Check your email to confirm your account, then log in.".to_owned(),
            )),
        }
    }

    pub(super) async fn login(&self, email: &Email, password: &str) -> Result<PublicUser, AuthError> {
        let session = self
            .provider
            .sign_in_with_password(email.as_str(), password)
            .await?;
        self.start_session(&session)
    }

    /// Provider sign-out failures are logged, never surfaced.
    pub(super) async fn logout(&self) -> Result<(), AuthError> {
        if let Some(session) = self.session()
            && let Err(e) = self.provider.sign_out(&session.access_token).await
        {
            tracing::warn!(error = %e, "identity provider sign-out failed");
        }
        self.store.remove(keys::SESSION, self.tab)?;
        Ok(())
    }

    /// Sends the provider's recovery email; the new password is not used.
    pub(super) async fn reset_password(&self, email: &Email) -> Result<ResetOutcome, AuthError> {
        self.provider.reset_password_for_email(email.as_str()).await?;
        Ok(ResetOutcome::RecoveryEmailSent)
    }

    pub(super) async fn update_profile(
        &self,
        name: &str,
        phone: &str,
    ) -> Result<PublicUser, AuthError> {
        let session = self.session().ok_or(AuthError::NotAuthenticated)?;
        let profile = ProfileData {
            name: name.to_owned(),
            phone: phone.to_owned(),
        };
        let user = self
            .provider
            .update_user(&session.access_token, &profile)
            .await?;
        user.to_public()
    }

    /// Validate the stored session with the provider.
    pub(super) async fn restore(&self) -> Option<PublicUser> {
        let session = self.session()?;
        match self.provider.get_user(&session.access_token).await {
            Ok(user) => user.to_public().ok(),
            Err(e) => {
                tracing::info!(error = %e, "stored session rejected by identity provider");
                None
            }
        }
    }
}

/// GoTrue error bodies vary by endpoint and version.
#[derive(Debug, Deserialize)]
struct GoTrueErrorBody {
    #[serde(alias = "msg", alias = "error_description")]
    message: Option<String>,
    error: Option<String>,
}

/// HTTP client for a GoTrue-compatible identity provider.
#[derive(Clone)]
pub struct GoTrueClient {
    client: reqwest::Client,
    auth_url: String,
}

impl std::fmt::Debug for GoTrueClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoTrueClient")
            .field("auth_url", &self.auth_url)
            .finish_non_exhaustive()
    }
}

impl GoTrueClient {
    /// Create a client for the project at `project_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the key is not a valid header value or
    /// the HTTP client fails to build.
    pub fn new(project_url: &str, anon_key: &SecretString) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(anon_key.expose_secret())
                .map_err(|e| ProviderError::new(0, format!("invalid API key format: {e}")))?,
        );
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ProviderError::new(0, e.to_string()))?;
        Ok(Self {
            client,
            auth_url: format!("{}/auth/v1", project_url.trim_end_matches('/')),
        })
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ProviderError> {
        let response = read_success(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::new(0, e.to_string()))
    }
}

async fn read_success(request: reqwest::RequestBuilder) -> Result<reqwest::Response, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::new(0, e.to_string()))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<GoTrueErrorBody>(&text)
        .ok()
        .and_then(|body| body.message.or(body.error))
        .unwrap_or_else(|| status.to_string());
    Err(ProviderError::new(status.as_u16(), message))
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    #[tracing::instrument(skip(self, password, profile))]
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: &ProfileData,
    ) -> Result<SignUpResponse, ProviderError> {
        let body = serde_json::json!({ "email": email, "password": password, "data": profile });
        self.send(self.client.post(format!("{}/signup", self.auth_url)).json(&body))
            .await
    }

    #[tracing::instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ProviderError> {
        let body = serde_json::json!({ "email": email, "password": password });
        self.send(
            self.client
                .post(format!("{}/token?grant_type=password", self.auth_url))
                .json(&body),
        )
        .await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        read_success(
            self.client
                .post(format!("{}/logout", self.auth_url))
                .bearer_auth(access_token),
        )
        .await?;
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<ProviderUser, ProviderError> {
        self.send(
            self.client
                .get(format!("{}/user", self.auth_url))
                .bearer_auth(access_token),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn reset_password_for_email(&self, email: &str) -> Result<(), ProviderError> {
        let body = serde_json::json!({ "email": email });
        read_success(self.client.post(format!("{}/recover", self.auth_url)).json(&body)).await?;
        Ok(())
    }

    async fn update_user(
        &self,
        access_token: &str,
        profile: &ProfileData,
    ) -> Result<ProviderUser, ProviderError> {
        let body = serde_json::json!({ "data": profile });
        self.send(
            self.client
                .put(format!("{}/user", self.auth_url))
                .bearer_auth(access_token)
                .json(&body),
        )
        .await
    }
}
