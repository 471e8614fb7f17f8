use sha2::{Digest, Sha256};

/// Gravatar URL for `email`, keyed on the SHA-256 of the normalized address.
pub fn gravatar_url(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!("https://www.gravatar.com/avatar/{digest:x}?d=identicon")
}
