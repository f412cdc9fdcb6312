//! Public user identity.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;

/// The externally visible identity projection.
///
/// Never carries credential material; safe to persist as the current user
/// and to hand to views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub phone: String,
}
