use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::user::UserProfile;
use crate::validation::{validate_email, validate_password, Validate, USER_EMAIL_MAX_CHARS};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// User emails are stored trimmed and lower-cased.
    pub fn normalized(mut self) -> Self {
        self.email = normalize_email(&self.email);
        self
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_email("email", &self.email, USER_EMAIL_MAX_CHARS)?;
        validate_password(&self.password)
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username")]
    pub email: String,
    pub password: String,
}

/// Body of `request_email` and `request_reset_password`.
#[derive(Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

impl EmailRequest {
    pub fn normalized(mut self) -> Self {
        self.email = normalize_email(&self.email);
        self
    }
}

impl Validate for EmailRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_email("email", &self.email, USER_EMAIL_MAX_CHARS)
    }
}

#[derive(Deserialize)]
pub struct PasswordResetRequest {
    pub token: String,
    pub new_password: String,
}

impl Validate for PasswordResetRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_password(&self.new_password)
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserProfile,
    pub detail: &'static str,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
