//! Account commands.
//!
//! # Usage
//!
//! ```bash
//! neemon account signup -n "Amina W" -e amina@example.com -p 0712345678
//! neemon account login -e amina@example.com
//! neemon account whoami
//! neemon account logout
//! ```
//!
//! Passwords are read from `NEEMON_PASSWORD` rather than argv.

use neemon_core::PublicUser;
use neemon_storefront::Storefront;
use neemon_storefront::error::Result;
use neemon_storefront::services::auth::{AuthState, ResetOutcome, SignupRequest};

/// Create an account and sign in.
///
/// # Errors
///
/// Returns validation errors, or `DuplicateEmail` if the email is taken.
pub async fn signup(
    storefront: &Storefront,
    name: &str,
    email: &str,
    phone: &str,
    password: &str,
) -> Result<PublicUser> {
    let request = SignupRequest::new(name, email, phone, password)?;
    Ok(storefront.account().signup(request).await?)
}

/// Sign in.
///
/// # Errors
///
/// Returns `InvalidCredentials` on a wrong email or password.
pub async fn login(storefront: &Storefront, email: &str, password: &str) -> Result<PublicUser> {
    Ok(storefront.account().login(email, password).await?)
}

/// Sign out. Signing out while anonymous is a no-op.
///
/// # Errors
///
/// Returns an error if the session cannot be cleared.
pub async fn logout(storefront: &Storefront) -> Result<AuthState> {
    storefront.account().logout().await?;
    Ok(storefront.account().state())
}

/// Who is signed in.
pub fn whoami(storefront: &Storefront) -> AuthState {
    storefront.account().state()
}

/// Reset a password (local backing) or request a reset email (hosted).
///
/// # Errors
///
/// Returns `EmailNotFound` for an unknown local account.
pub async fn reset_password(
    storefront: &Storefront,
    email: &str,
    new_password: &str,
) -> Result<ResetOutcome> {
    Ok(storefront
        .account()
        .reset_password(email, new_password)
        .await?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use neemon_core::remote::MemoryRemote;
    use neemon_storefront::store::{FileStore, MemoryStore};
    use neemon_storefront::{IdentityBacking, StorefrontOptions};

    use super::*;

    fn storefront_over(store: Arc<dyn neemon_storefront::store::LocalStore>) -> Storefront {
        Storefront::new(
            store,
            Arc::new(MemoryRemote::new()),
            IdentityBacking::Local,
            StorefrontOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_signup_login_logout() {
        let sf = storefront_over(Arc::new(MemoryStore::new()));
        let user = signup(&sf, "Amina W", "amina@example.com", "0712345678", "hunter22")
            .await
            .unwrap();
        assert_eq!(whoami(&sf).user(), Some(&user));

        assert_eq!(logout(&sf).await.unwrap(), AuthState::Anonymous);
        assert!(login(&sf, "amina@example.com", "wrong-one").await.is_err());
        login(&sf, "AMINA@example.com", "hunter22").await.unwrap();
        assert!(whoami(&sf).user().is_some());
    }

    #[tokio::test]
    async fn test_session_survives_between_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let first = storefront_over(Arc::new(FileStore::new(dir.path())));
        signup(&first, "Amina W", "amina@example.com", "", "hunter22")
            .await
            .unwrap();
        drop(first);

        let second = storefront_over(Arc::new(FileStore::new(dir.path())));
        second.restore().await;
        assert_eq!(
            whoami(&second).user().map(|u| u.email.to_string()),
            Some("amina@example.com".to_string())
        );
    }
}
