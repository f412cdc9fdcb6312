//! Account and identity.
//!
//! [`Account`] exposes one surface (`signup`, `login`, `logout`,
//! `reset_password`, `update_profile`) over two backings:
//!
//! - [`LocalIdentity`] keeps users and salted Argon2id hashes in the local
//!   store
//! - [`RemoteIdentity`] delegates to a hosted GoTrue-compatible provider
//!
//! The signed-in [`PublicUser`] is persisted under the current-user key,
//! published on the event bus on every change, and replaced when another
//! tab rewrites that key.

mod error;
mod local;
mod remote;

pub use error::AuthError;
pub use local::{LocalIdentity, LocalSession, StoredUser};
pub use remote::{
    GoTrueClient, IdentityProvider, ProfileData, ProviderError, ProviderSession, ProviderUser,
    RemoteIdentity, RemoteSession, SignUpResponse,
};

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use neemon_core::{Email, PublicUser};

use crate::bus::{EventBus, StorefrontEvent};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::store::{LocalStore, TabId, decode_json, keys, read_json, write_json};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Who is signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "user", rename_all = "snake_case")]
pub enum AuthState {
    Anonymous,
    Authenticated(PublicUser),
}

impl AuthState {
    #[must_use]
    pub const fn user(&self) -> Option<&PublicUser> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => Some(user),
        }
    }
}

impl From<Option<PublicUser>> for AuthState {
    fn from(user: Option<PublicUser>) -> Self {
        user.map_or(Self::Anonymous, Self::Authenticated)
    }
}

/// What a password reset did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetOutcome {
    /// Local backing: the stored hash was replaced.
    PasswordUpdated,
    /// Remote backing: the provider emailed a recovery link.
    RecoveryEmailSent,
}

/// Validated signup input.
#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub password: String,
}

impl SignupRequest {
    /// Trim and validate signup fields.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingField`] for a blank name, email or
    /// password, [`AuthError::InvalidEmail`] for a malformed email and
    /// [`AuthError::WeakPassword`] for a short password.
    pub fn new(name: &str, email: &str, phone: &str, password: &str) -> Result<Self, AuthError> {
        let name = name.trim();
        if name.is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingField("Please fill in all required fields."));
        }
        let email = Email::parse(email)?;
        validate_password(password)?;
        Ok(Self {
            name: name.to_owned(),
            email,
            phone: phone.trim().to_owned(),
            password: password.to_owned(),
        })
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(MIN_PASSWORD_LENGTH));
    }
    Ok(())
}

/// The two identity backings.
pub enum Identity {
    Local(LocalIdentity),
    Remote(RemoteIdentity),
}

impl Identity {
    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::Remote(_) => "remote",
        }
    }
}

/// Identity facade of one tab.
pub struct Account {
    identity: Identity,
    store: Arc<dyn LocalStore>,
    tab: TabId,
    bus: EventBus,
    current: RwLock<Option<PublicUser>>,
}

impl Account {
    /// Load the persisted current user.
    pub fn load(identity: Identity, store: Arc<dyn LocalStore>, tab: TabId, bus: EventBus) -> Self {
        let current = read_json(store.as_ref(), keys::CURRENT_USER);
        Self {
            identity,
            store,
            tab,
            bus,
            current: RwLock::new(current),
        }
    }

    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<PublicUser> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.user().into()
    }

    /// Signed-in user, or [`AuthError::NotAuthenticated`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] when nobody is signed in.
    pub fn require_user(&self) -> Result<PublicUser, AuthError> {
        self.user().ok_or(AuthError::NotAuthenticated)
    }

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// Local backing: [`AuthError::DuplicateEmail`] on a case-insensitive
    /// match. Remote backing: the provider's message as
    /// [`AuthError::Provider`].
    #[tracing::instrument(skip(self, request), fields(backend = self.identity.kind()))]
    pub async fn signup(&self, request: SignupRequest) -> Result<PublicUser, AuthError> {
        let user = match &self.identity {
            Identity::Local(local) => local.signup(&request)?,
            Identity::Remote(remote) => remote.signup(&request).await?,
        };
        self.set_current(Some(user.clone()))?;
        tracing::info!(user_id = %user.id, "account created");
        Ok(user)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] (local) or the provider's
    /// message (remote) on failure.
    #[tracing::instrument(skip(self, email, password), fields(backend = self.identity.kind()))]
    pub async fn login(&self, email: &str, password: &str) -> Result<PublicUser, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingField("Enter your email and password."));
        }
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let user = match &self.identity {
            Identity::Local(local) => local.login(&email, password)?,
            Identity::Remote(remote) => remote.login(&email, password).await?,
        };
        self.set_current(Some(user.clone()))?;
        Ok(user)
    }

    /// Sign out. Always ends anonymous, even if clearing storage fails.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if the session keys cannot be removed.
    #[tracing::instrument(skip(self), fields(backend = self.identity.kind()))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        let cleared = match &self.identity {
            Identity::Local(local) => local.logout(),
            Identity::Remote(remote) => remote.logout().await,
        };
        let removed = self.set_current(None);
        cleared.and(removed)
    }

    /// Reset a password (local) or request a recovery email (remote).
    ///
    /// # Errors
    ///
    /// Local backing: [`AuthError::EmailNotFound`] if no account matches.
    #[tracing::instrument(skip(self, email, new_password), fields(backend = self.identity.kind()))]
    pub async fn reset_password(
        &self,
        email: &str,
        new_password: &str,
    ) -> Result<ResetOutcome, AuthError> {
        if email.trim().is_empty() {
            return Err(AuthError::MissingField("Enter your email and a new password."));
        }
        let email = Email::parse(email)?;
        match &self.identity {
            Identity::Local(local) => {
                if new_password.is_empty() {
                    return Err(AuthError::MissingField("Enter your email and a new password."));
                }
                validate_password(new_password)?;
                local.reset_password(&email, new_password)
            }
            Identity::Remote(remote) => remote.reset_password(&email).await,
        }
    }

    /// Change the signed-in user's name and phone.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] when nobody is signed in.
    pub async fn update_profile(&self, name: &str, phone: &str) -> Result<PublicUser, AuthError> {
        let current = self.require_user()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingField("Name is required."));
        }
        let phone = phone.trim();
        let user = match &self.identity {
            Identity::Local(local) => local.update_profile(&current, name, phone)?,
            Identity::Remote(remote) => remote.update_profile(name, phone).await?,
        };
        self.set_current(Some(user.clone()))?;
        Ok(user)
    }

    /// Re-validate the persisted session at startup. The remote backing asks
    /// the provider; a rejected session ends anonymous.
    pub async fn restore(&self) -> AuthState {
        let restored = match &self.identity {
            Identity::Local(local) => local.session().and_then(|_| self.user()),
            Identity::Remote(remote) => remote.restore().await,
        };
        if restored != self.user() {
            if let Err(e) = self.set_current(restored) {
                tracing::warn!(error = %e, "failed to persist restored session");
            }
        }
        self.state()
    }

    /// Replace the signed-in user with a value written by another tab.
    pub fn apply_remote(&self, raw: Option<&str>) {
        let user = raw.and_then(|raw| decode_json::<PublicUser>(keys::CURRENT_USER, raw));
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = user.clone();
        self.bus.publish(StorefrontEvent::AuthChanged(user));
    }

    fn set_current(&self, user: Option<PublicUser>) -> Result<(), AuthError> {
        let persisted = match &user {
            Some(user) => write_json(self.store.as_ref(), keys::CURRENT_USER, user, self.tab),
            None => self.store.remove(keys::CURRENT_USER, self.tab),
        };
        match &user {
            Some(user) => set_sentry_user(&user.id, Some(user.email.as_str())),
            None => clear_sentry_user(),
        }
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = user.clone();
        self.bus.publish(StorefrontEvent::AuthChanged(user));
        persisted.map_err(AuthError::from)
    }
}
