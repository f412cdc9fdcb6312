//! Local credential store backing.
//!
//! Users live in the profile's local store. Passwords are hashed with
//! Argon2id under a fresh 16-byte random salt at signup and at every reset;
//! the salt is stored next to the hash and must match the salt embedded in
//! it. Plaintext is never written.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use neemon_core::{Email, PublicUser, SessionToken, UserId};

use super::{AuthError, ResetOutcome, SignupRequest};
use crate::store::{LocalStore, StoredList, TabId, keys, read_json, write_json};

/// A locally registered account, including credential material.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub phone: String,
    /// Base64 salt (16 random bytes).
    pub salt: String,
    /// Argon2id PHC string.
    pub password_hash: String,
}

impl StoredUser {
    /// The credential-free projection.
    #[must_use]
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Session marker written on signup and login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSession {
    pub token: SessionToken,
    pub user_id: UserId,
}

/// Identity backed by the local store.
pub struct LocalIdentity {
    store: Arc<dyn LocalStore>,
    tab: TabId,
}

impl LocalIdentity {
    pub fn new(store: Arc<dyn LocalStore>, tab: TabId) -> Self {
        Self { store, tab }
    }

    fn users(&self) -> StoredList<StoredUser> {
        StoredList::read(self.store.as_ref(), keys::USERS)
    }

    fn save_users(&self, users: &StoredList<StoredUser>) -> Result<(), AuthError> {
        users.write(self.store.as_ref(), keys::USERS, self.tab)?;
        Ok(())
    }

    fn start_session(&self, user_id: &UserId) -> Result<(), AuthError> {
        let session = LocalSession {
            token: new_session_token(),
            user_id: user_id.clone(),
        };
        write_json(self.store.as_ref(), keys::SESSION, &session, self.tab)?;
        Ok(())
    }

    /// Current session marker, if any.
    #[must_use]
    pub fn session(&self) -> Option<LocalSession> {
        read_json(self.store.as_ref(), keys::SESSION)
    }

    pub(super) fn signup(&self, request: &SignupRequest) -> Result<PublicUser, AuthError> {
        let mut users = self.users();
        let taken = users
            .items
            .iter()
            .map(|u| u.email.as_str())
            .chain(users.opaque().iter().filter_map(|v| v.get("email").and_then(Value::as_str)))
            .any(|email| request.email.matches(email));
        if taken {
            return Err(AuthError::DuplicateEmail);
        }

        let (salt, password_hash) = hash_password(&request.password)?;
        let stored = StoredUser {
            id: UserId::generate(),
            name: request.name.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            salt,
            password_hash,
        };
        let public = stored.to_public();
        users.items.push(stored);
        self.save_users(&users)?;
        self.start_session(&public.id)?;
        Ok(public)
    }

    pub(super) fn login(&self, email: &Email, password: &str) -> Result<PublicUser, AuthError> {
        let users = self.users();
        let user = users
            .items
            .iter()
            .find(|u| email.matches(u.email.as_str()))
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, &user.salt, &user.password_hash)?;
        self.start_session(&user.id)?;
        Ok(user.to_public())
    }

    pub(super) fn logout(&self) -> Result<(), AuthError> {
        self.store.remove(keys::SESSION, self.tab)?;
        Ok(())
    }

    pub(super) fn reset_password(
        &self,
        email: &Email,
        new_password: &str,
    ) -> Result<ResetOutcome, AuthError> {
        let mut users = self.users();
        let user = users
            .items
            .iter_mut()
            .find(|u| email.matches(u.email.as_str()))
            .ok_or(AuthError::EmailNotFound)?;
        let (salt, password_hash) = hash_password(new_password)?;
        user.salt = salt;
        user.password_hash = password_hash;
        self.save_users(&users)?;
        Ok(ResetOutcome::PasswordUpdated)
    }

    pub(super) fn update_profile(
        &self,
        current: &PublicUser,
        name: &str,
        phone: &str,
    ) -> Result<PublicUser, AuthError> {
        let mut users = self.users();
        if let Some(user) = users.items.iter_mut().find(|u| u.id == current.id) {
            user.name = name.to_owned();
            user.phone = phone.to_owned();
            self.save_users(&users)?;
        }
        Ok(PublicUser {
            name: name.to_owned(),
            phone: phone.to_owned(),
            ..current.clone()
        })
    }
}

fn new_session_token() -> SessionToken {
    let bytes: [u8; 32] = rand::random();
    SessionToken::parse(&URL_SAFE_NO_PAD.encode(bytes)).unwrap_or_else(|_| SessionToken::generate())
}

/// Hash a password under a fresh salt. Returns `(salt, phc_hash)`.
fn hash_password(password: &str) -> Result<(String, String), AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::PasswordHash)?;
    Ok((salt.as_str().to_owned(), hash.to_string()))
}

/// Verify `password` against a stored salt and hash.
fn verify_password(password: &str, salt: &str, hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    if parsed.salt.map(|s| s.as_str()) != Some(salt) {
        return Err(AuthError::InvalidCredentials);
    }
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn identity() -> (Arc<MemoryStore>, LocalIdentity) {
        let store = Arc::new(MemoryStore::new());
        let identity = LocalIdentity::new(store.clone(), TabId::new());
        (store, identity)
    }

    fn request(email: &str) -> SignupRequest {
        SignupRequest::new("Wanjiru", email, "0712345678", "s3cret-pass").unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let (salt, hash) = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &salt, &hash).is_ok());
        assert!(verify_password("hunter23", &salt, &hash).is_err());
        // Salt mismatch fails even with the right password.
        let (other_salt, _) = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &other_salt, &hash).is_err());
    }

    #[test]
    fn test_same_password_different_salt_different_digest() {
        let (_store, identity) = identity();
        identity.signup(&request("a@x.com")).unwrap();
        identity.signup(&request("b@x.com")).unwrap();
        let users = identity.users().items;
        assert_ne!(users[0].salt, users[1].salt);
        assert_ne!(users[0].password_hash, users[1].password_hash);
        assert!(!users[0].password_hash.contains("s3cret-pass"));
    }

    #[test]
    fn test_duplicate_email_is_case_insensitive() {
        let (_store, identity) = identity();
        identity.signup(&request("a@x.com")).unwrap();
        let err = identity.signup(&request("A@x.com")).unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
        assert_eq!(err.to_string(), "Email already registered");
    }

    #[test]
    fn test_login_right_and_wrong_password() {
        let (_store, identity) = identity();
        let created = identity.signup(&request("a@x.com")).unwrap();
        let email = Email::parse("A@X.com").unwrap();

        let err = identity.login(&email, "wrong-pass").unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let user = identity.login(&email, "s3cret-pass").unwrap();
        assert_eq!(user.id, created.id);
        assert_eq!(identity.session().unwrap().user_id, created.id);
    }

    #[test]
    fn test_login_unknown_email() {
        let (_store, identity) = identity();
        let email = Email::parse("nobody@x.com").unwrap();
        assert!(matches!(
            identity.login(&email, "whatever"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_reset_password_regenerates_salt() {
        let (_store, identity) = identity();
        identity.signup(&request("a@x.com")).unwrap();
        let before = identity.users().items[0].salt.clone();
        let email = Email::parse("a@x.com").unwrap();

        let outcome = identity.reset_password(&email, "new-password").unwrap();
        assert_eq!(outcome, ResetOutcome::PasswordUpdated);
        assert_ne!(identity.users().items[0].salt, before);
        assert!(identity.login(&email, "s3cret-pass").is_err());
        assert!(identity.login(&email, "new-password").is_ok());

        let missing = Email::parse("nobody@x.com").unwrap();
        assert!(matches!(
            identity.reset_password(&missing, "x"),
            Err(AuthError::EmailNotFound)
        ));
    }

    #[test]
    fn test_unreadable_user_entry_does_not_unlock_duplicates() {
        let (store, identity) = identity();
        identity.signup(&request("a@x.com")).unwrap();

        let mut raw: Vec<Value> = read_json(&*store, keys::USERS).unwrap();
        raw.push(serde_json::json!({"id": "legacy", "name": "L"}));
        write_json(&*store, keys::USERS, &raw, TabId::new()).unwrap();

        let err = identity.signup(&request("A@x.com")).unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));

        identity.signup(&request("b@x.com")).unwrap();
        let raw: Vec<Value> = read_json(&*store, keys::USERS).unwrap();
        assert_eq!(raw.len(), 3);
        assert!(raw.iter().any(|v| v["id"] == "legacy"));

        let email = Email::parse("a@x.com").unwrap();
        assert!(identity.login(&email, "s3cret-pass").is_ok());
    }

    #[test]
    fn test_legacy_entry_email_counts_as_taken() {
        let (store, identity) = identity();
        let raw = serde_json::json!([{"id": "legacy", "email": "old@x.com"}]);
        write_json(&*store, keys::USERS, &raw, TabId::new()).unwrap();

        let err = identity.signup(&request("OLD@x.com")).unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
    }

    #[test]
    fn test_logout_clears_session() {
        let (store, identity) = identity();
        identity.signup(&request("a@x.com")).unwrap();
        identity.logout().unwrap();
        assert!(store.get(keys::SESSION).is_none());
    }
}
