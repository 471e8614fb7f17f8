use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::contacts::birthdays::DEFAULT_WINDOW_DAYS;
use crate::errors::AppError;
use crate::validation::{
    validate_email, validate_length, validate_phone, Validate, CONTACT_EMAIL_MAX_CHARS,
    NAME_MAX_CHARS, NAME_MIN_CHARS, NOTES_MAX_CHARS,
};

pub const DEFAULT_PAGE_LIMIT: i64 = 100;
pub const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactCreate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birthday: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ContactCreate {
    /// Trims surrounding whitespace from the text fields.
    pub fn normalized(mut self) -> Self {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.phone_number = self.phone_number.trim().to_string();
        self
    }
}

impl Validate for ContactCreate {
    fn validate(&self) -> Result<(), AppError> {
        validate_length("first_name", &self.first_name, NAME_MIN_CHARS, NAME_MAX_CHARS)?;
        validate_length("last_name", &self.last_name, NAME_MIN_CHARS, NAME_MAX_CHARS)?;
        validate_email("email", &self.email, CONTACT_EMAIL_MAX_CHARS)?;
        validate_phone("phone_number", &self.phone_number)?;
        if let Some(notes) = &self.notes {
            validate_length("notes", notes, 0, NOTES_MAX_CHARS)?;
        }
        Ok(())
    }
}

/// Partial update: absent fields keep their stored value.
/// `notes` distinguishes absent (keep) from explicit `null` (clear).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub birthday: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
}

impl ContactUpdate {
    pub fn normalized(mut self) -> Self {
        let trim = |v: Option<String>| v.map(|s| s.trim().to_string());
        self.first_name = trim(self.first_name);
        self.last_name = trim(self.last_name);
        self.email = trim(self.email);
        self.phone_number = trim(self.phone_number);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone_number.is_none()
            && self.birthday.is_none()
            && self.notes.is_none()
    }
}

impl Validate for ContactUpdate {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(v) = &self.first_name {
            validate_length("first_name", v, NAME_MIN_CHARS, NAME_MAX_CHARS)?;
        }
        if let Some(v) = &self.last_name {
            validate_length("last_name", v, NAME_MIN_CHARS, NAME_MAX_CHARS)?;
        }
        if let Some(v) = &self.email {
            validate_email("email", v, CONTACT_EMAIL_MAX_CHARS)?;
        }
        if let Some(v) = &self.phone_number {
            validate_phone("phone_number", v)?;
        }
        if let Some(Some(notes)) = &self.notes {
            validate_length("notes", notes, 0, NOTES_MAX_CHARS)?;
        }
        Ok(())
    }
}

fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

impl ListQuery {
    pub fn check(&self) -> Result<(), AppError> {
        if self.skip < 0 {
            return Err(AppError::InvalidArgument("skip must not be negative".into()));
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&self.limit) {
            return Err(AppError::InvalidArgument(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct BirthdayQuery {
    #[serde(default = "default_window")]
    pub days: i64,
}

fn default_window() -> i64 {
    DEFAULT_WINDOW_DAYS
}
