use crate::errors::AppError;

/// Field-level checks applied to request bodies before they reach domain logic.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 50;
pub const CONTACT_EMAIL_MAX_CHARS: usize = 100;
pub const USER_EMAIL_MAX_CHARS: usize = 250;
pub const PHONE_MAX_CHARS: usize = 20;
pub const NOTES_MAX_CHARS: usize = 255;
pub const PASSWORD_MIN_BYTES: usize = 6;
/// bcrypt only looks at the first 72 bytes.
pub const PASSWORD_MAX_BYTES: usize = 72;

pub fn validate_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), AppError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(AppError::Validation(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

/// Structural email check: one `@`, non-empty local part, dotted domain, no whitespace.
pub fn validate_email(field: &str, email: &str, max: usize) -> Result<(), AppError> {
    let invalid = || AppError::Validation(format!("{field} is not a valid email address"));

    if email.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}

pub fn validate_phone(field: &str, phone: &str) -> Result<(), AppError> {
    validate_length(field, phone, 1, PHONE_MAX_CHARS)?;

    let allowed = |c: char| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')' | '.');
    if !phone.chars().all(allowed) || !phone.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(format!(
            "{field} may only contain digits, spaces and + - ( ) ."
        )));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    let len = password.len();
    if !(PASSWORD_MIN_BYTES..=PASSWORD_MAX_BYTES).contains(&len) {
        return Err(AppError::Validation(format!(
            "password must be between {PASSWORD_MIN_BYTES} and {PASSWORD_MAX_BYTES} bytes"
        )));
    }
    Ok(())
}
