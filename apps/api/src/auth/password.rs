use anyhow::Context;
use tracing::warn;

use crate::errors::AppError;

/// Hashes a password with bcrypt. The work runs on the blocking pool so it
/// does not stall the async executor.
pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .context("password hashing task failed")?
        .context("failed to hash password")?;
    Ok(hashed)
}

/// Checks a password against a stored bcrypt hash. A malformed stored hash
/// counts as a mismatch.
pub async fn verify_password(password: String, password_hash: String) -> Result<bool, AppError> {
    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
        .await
        .context("password verification task failed")?;

    match outcome {
        Ok(matches) => Ok(matches),
        Err(e) => {
            warn!("Stored password hash could not be parsed: {e}");
            Ok(false)
        }
    }
}

/// A hash of a random throwaway secret. Login verifies against it when the
/// email is unknown so both outcomes cost one bcrypt verification.
pub fn dummy_hash(cost: u32) -> anyhow::Result<String> {
    let secret = uuid::Uuid::new_v4().to_string();
    bcrypt::hash(secret, cost).context("failed to build placeholder password hash")
}
