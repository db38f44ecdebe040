//! Deploy token helpers (generate/hash/verify).
//!
//! Tokens look like `ct_<40 hex chars>`. Only the argon2 hash is stored,
//! together with a prefix for indexed lookup.

use cask_core::DeployError;

pub const TOKEN_PREFIX: &str = "ct_";

/// Generate a fresh deploy token.
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let random_bytes: Vec<u8> = (0..20).map(|_| rng.random()).collect();
    format!("{}{}", TOKEN_PREFIX, hex::encode(random_bytes))
}

/// True when a Basic-auth password carries the deploy token shape.
pub fn is_token(password: &str) -> bool {
    password.starts_with(TOKEN_PREFIX)
}

/// Hash a token for storage.
pub fn hash_token(token: &str) -> Result<String, DeployError> {
    use argon2::{
        password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
        Argon2,
    };

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(token.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DeployError::Internal(format!("Failed to hash token: {}", e)))
}

/// Verify a token against a stored hash.
pub fn verify_token(token: &str, hash: &str) -> bool {
    use argon2::{
        password_hash::{PasswordHash, PasswordVerifier},
        Argon2,
    };

    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(token.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Extract the prefix (first 16 chars) for indexed lookup.
pub fn token_prefix(token: &str) -> String {
    if token.len() > 16 {
        token[..16].to_string()
    } else {
        token.to_string()
    }
}
