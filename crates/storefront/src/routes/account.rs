//! Account route handlers.
//!
//! Sign-in state belongs to the tab, so these handlers act on the
//! storefront's single account facade rather than per-request sessions.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use neemon_core::PublicUser;

use crate::error::Result;
use crate::services::auth::{AuthState, ResetOutcome, SignupRequest};
use crate::state::Storefront;

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetForm {
    pub email: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub outcome: ResetOutcome,
    pub message: &'static str,
}

/// GET /api/account
pub async fn show(State(storefront): State<Storefront>) -> Json<AuthState> {
    Json(storefront.account().state())
}

/// POST /api/account/signup
#[instrument(skip(storefront, form), fields(email = %form.email))]
pub async fn signup(
    State(storefront): State<Storefront>,
    Json(form): Json<SignupForm>,
) -> Result<Json<PublicUser>> {
    let request = SignupRequest::new(&form.name, &form.email, &form.phone, &form.password)?;
    Ok(Json(storefront.account().signup(request).await?))
}

/// POST /api/account/login
#[instrument(skip(storefront, form), fields(email = %form.email))]
pub async fn login(
    State(storefront): State<Storefront>,
    Json(form): Json<LoginForm>,
) -> Result<Json<PublicUser>> {
    Ok(Json(
        storefront
            .account()
            .login(&form.email, &form.password)
            .await?,
    ))
}

/// POST /api/account/logout
#[instrument(skip(storefront))]
pub async fn logout(State(storefront): State<Storefront>) -> Result<Json<AuthState>> {
    storefront.account().logout().await?;
    Ok(Json(AuthState::Anonymous))
}

/// POST /api/account/reset-password
#[instrument(skip(storefront, form), fields(email = %form.email))]
pub async fn reset_password(
    State(storefront): State<Storefront>,
    Json(form): Json<ResetForm>,
) -> Result<Json<ResetResponse>> {
    let outcome = storefront
        .account()
        .reset_password(&form.email, &form.new_password)
        .await?;
    let message = match outcome {
        ResetOutcome::PasswordUpdated => "Password updated. You can log in now.",
        ResetOutcome::RecoveryEmailSent => "Check your email for a password reset link.",
    };
    Ok(Json(ResetResponse { outcome, message }))
}

/// PUT /api/account/profile
#[instrument(skip(storefront, form))]
pub async fn update_profile(
    State(storefront): State<Storefront>,
    Json(form): Json<ProfileForm>,
) -> Result<Json<PublicUser>> {
    Ok(Json(
        storefront
            .account()
            .update_profile(&form.name, &form.phone)
            .await?,
    ))
}
