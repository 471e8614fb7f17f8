//! Axum route handlers for registration, email confirmation, login, token
//! refresh, password reset and the current-user profile.

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use tracing::{info, warn};

use crate::auth::avatar::gravatar_url;
use crate::auth::extractor::{bearer_token, AuthUser};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repository;
use crate::auth::schemas::{
    normalize_email, EmailRequest, LoginRequest, MessageResponse, PasswordResetRequest,
    RegisterRequest, RegisterResponse,
};
use crate::auth::tokens::{TokenPair, TokenScope};
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath};
use crate::mail::{deliver, MailMessage};
use crate::models::user::{UserProfile, UserRow};
use crate::state::AppState;
use crate::validation::Validate;

const RESET_REQUESTED: &str =
    "If a user with this email exists, a password reset token has been sent.";
const VERIFICATION_REQUESTED: &str =
    "If an unconfirmed account uses this email, a confirmation link has been sent.";

async fn send_verification_mail(state: &AppState, user: &UserRow) -> Result<(), AppError> {
    let token = state
        .tokens
        .issue(user.id, &user.email, TokenScope::EmailVerification)?;
    let message = MailMessage::email_verification(&user.email, &state.config.app_base_url, &token);
    deliver(&state.mailer, message).await;
    Ok(())
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let body = body.normalized();
    body.validate()?;

    {
        let mut conn = state.db.acquire().await?;
        if repository::find_user_by_email(&mut conn, &body.email)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Account with this email already exists".into(),
            ));
        }
    }

    let password_hash = hash_password(body.password, state.config.bcrypt_cost).await?;
    let avatar = gravatar_url(&body.email);

    let mut tx = state.db.begin().await?;
    let user = repository::create_user(&mut tx, &body.email, &password_hash, Some(&avatar)).await?;
    tx.commit().await?;

    info!("Registered user {} ({})", user.id, user.email);
    send_verification_mail(&state, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: user.into(),
            detail: "User successfully created",
        }),
    ))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let email = normalize_email(&body.email);
    let invalid = || AppError::unauthorized("Invalid credentials");

    let user = {
        let mut conn = state.db.acquire().await?;
        repository::find_user_by_email(&mut conn, &email).await?
    };
    let Some(user) = user else {
        // Same bcrypt cost as a real mismatch.
        verify_password(body.password, state.dummy_password_hash.to_string()).await?;
        return Err(invalid());
    };

    if !verify_password(body.password, user.password_hash.clone()).await? {
        return Err(invalid());
    }
    if !user.email_verified {
        return Err(AppError::unauthorized("Email not confirmed"));
    }

    let pair = state.tokens.issue_pair(user.id, &user.email)?;

    let mut tx = state.db.begin().await?;
    repository::set_refresh_token(&mut tx, user.id, Some(&pair.refresh_token)).await?;
    tx.commit().await?;

    info!("User {} logged in", user.id);
    Ok(Json(pair))
}

/// POST /api/auth/refresh
///
/// Expects the refresh token as the bearer credential. Rotates both tokens.
/// A refresh token that is valid but no longer the stored one revokes the
/// stored token as well.
pub async fn handle_refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenPair>, AppError> {
    let token = bearer_token(&headers)?;
    let claims = state.tokens.verify(token, TokenScope::RefreshToken)?;
    let invalid = || AppError::unauthorized("Invalid refresh token");

    let mut tx = state.db.begin().await?;
    let user = repository::lock_user(&mut tx, claims.sub)
        .await?
        .ok_or_else(invalid)?;

    if user.refresh_token.as_deref() != Some(token) {
        warn!("Stale refresh token presented for user {}; revoking", user.id);
        repository::set_refresh_token(&mut tx, user.id, None).await?;
        tx.commit().await?;
        return Err(invalid());
    }

    let pair = state.tokens.issue_pair(user.id, &user.email)?;
    repository::set_refresh_token(&mut tx, user.id, Some(&pair.refresh_token)).await?;
    tx.commit().await?;

    Ok(Json(pair))
}

/// GET /api/auth/confirmed_email/:token
pub async fn handle_confirm_email(
    State(state): State<AppState>,
    AppPath(token): AppPath<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let claims = state
        .tokens
        .verify(&token, TokenScope::EmailVerification)
        .map_err(|e| {
            tracing::debug!("Rejected verification token: {e}");
            AppError::InvalidArgument("Invalid token for email verification".into())
        })?;

    let mut tx = state.db.begin().await?;
    let user = repository::lock_user(&mut tx, claims.sub)
        .await?
        .filter(|user| user.email == claims.email)
        .ok_or_else(|| AppError::InvalidArgument("Verification error".into()))?;

    let message = if repository::confirm_email(&mut tx, user.id).await? {
        info!("User {} confirmed their email", user.id);
        "Email confirmed"
    } else {
        "Your email is already confirmed"
    };
    tx.commit().await?;

    Ok(Json(MessageResponse { message }))
}

/// POST /api/auth/request_email
///
/// Re-sends the confirmation link. The reply never reveals whether the
/// address is registered.
pub async fn handle_request_email(
    State(state): State<AppState>,
    AppJson(body): AppJson<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let body = body.normalized();
    body.validate()?;

    let user = {
        let mut conn = state.db.acquire().await?;
        repository::find_user_by_email(&mut conn, &body.email).await?
    };
    if let Some(user) = user.filter(|user| !user.email_verified) {
        send_verification_mail(&state, &user).await?;
    }

    Ok(Json(MessageResponse {
        message: VERIFICATION_REQUESTED,
    }))
}

/// POST /api/auth/request_reset_password
pub async fn handle_request_password_reset(
    State(state): State<AppState>,
    AppJson(body): AppJson<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let body = body.normalized();
    body.validate()?;

    let user = {
        let mut conn = state.db.acquire().await?;
        repository::find_user_by_email(&mut conn, &body.email).await?
    };
    if let Some(user) = user {
        let token = state
            .tokens
            .issue(user.id, &user.email, TokenScope::PasswordReset)?;
        deliver(&state.mailer, MailMessage::password_reset(&user.email, &token)).await;
        info!("Password reset requested for user {}", user.id);
    }

    Ok(Json(MessageResponse {
        message: RESET_REQUESTED,
    }))
}

/// POST /api/auth/reset_password
///
/// A reset token is single-use: once the password changes, every token
/// issued before the change is refused.
pub async fn handle_reset_password(
    State(state): State<AppState>,
    AppJson(body): AppJson<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let invalid = || AppError::InvalidArgument("Invalid token".into());
    let claims = state
        .tokens
        .verify(&body.token, TokenScope::PasswordReset)
        .map_err(|e| {
            tracing::debug!("Rejected reset token: {e}");
            invalid()
        })?;
    body.validate()?;

    let password_hash = hash_password(body.new_password, state.config.bcrypt_cost).await?;

    let mut tx = state.db.begin().await?;
    let user = repository::lock_user(&mut tx, claims.sub)
        .await?
        .filter(|user| user.email == claims.email)
        .ok_or_else(invalid)?;
    if let Some(changed_at) = user.password_changed_at {
        if claims.iat <= changed_at.timestamp() {
            return Err(invalid());
        }
    }
    repository::update_password(&mut tx, user.id, &password_hash).await?;
    tx.commit().await?;

    info!("Password reset for user {}", user.id);
    Ok(Json(MessageResponse {
        message: "Password has been successfully reset.",
    }))
}

/// GET /api/users/me
pub async fn handle_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    let mut conn = state.db.acquire().await?;
    let row = repository::find_user_by_id(&mut conn, user.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("Could not validate credentials"))?;
    Ok(Json(row.into()))
}
