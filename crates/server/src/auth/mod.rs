//! Password hashing and opaque session tokens.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use db::models::token::SessionToken;
use rand::{RngCore, rngs::OsRng};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::ApiError;

mod middleware;
pub(crate) use middleware::require_session;

const TOKEN_BYTES: usize = 20;

/// Argon2id PHC string.
pub(crate) fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ApiError::Hashing(err.to_string()))
}

pub(crate) fn verify_password(password: &str, phc_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// One token per user: reuse the existing row, mint a fresh one otherwise.
pub(crate) async fn issue_or_get_token(
    pool: &SqlitePool,
    user_id: Uuid,
) -> Result<String, ApiError> {
    if let Some(existing) = SessionToken::find_by_user(pool, user_id).await? {
        return Ok(existing.token);
    }
    let created = SessionToken::insert(pool, &generate_token(), user_id).await?;
    Ok(created.token)
}

/// Split a free-form full name into first/last on the first space.
pub(crate) fn split_fullname(fullname: &str) -> (String, String) {
    let fullname = fullname.trim();
    match fullname.split_once(' ') {
        Some((first, last)) => (first.to_string(), last.trim().to_string()),
        None => (fullname.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn tokens_are_forty_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 40);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fullname_splits_on_first_space() {
        assert_eq!(
            split_fullname("Ada Lovelace"),
            ("Ada".to_string(), "Lovelace".to_string())
        );
        assert_eq!(
            split_fullname("Ada Augusta King"),
            ("Ada".to_string(), "Augusta King".to_string())
        );
        assert_eq!(split_fullname("Ada"), ("Ada".to_string(), String::new()));
    }
}
