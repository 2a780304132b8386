use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Accepts Argon2 PHC strings and legacy bcrypt digests (`$2a$`, `$2b$`, `$2y$`).
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    if is_bcrypt(hash) {
        return bcrypt::verify(plain, hash).map_err(|e| {
            error!(error = %e, "bcrypt verify error");
            anyhow::anyhow!(e.to_string())
        });
    }
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

lazy_static! {
    /// Verified against when the account does not exist, so an unknown email
    /// costs the same Argon2 work as a wrong password.
    static ref DUMMY_HASH: Option<String> = hash_password("petcare-no-such-account").ok();
}

/// Runs a full verification against a throwaway hash and discards the result.
pub async fn verify_dummy_blocking(plain: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        if let Err(e) = verify_password_blocking(plain, hash).await {
            error!(error = %e, "dummy verify failed");
        }
    }
}

fn is_bcrypt(hash: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"].iter().any(|p| hash.starts_with(p))
}

/// Hashing is deliberately slow; keep it off the async workers.
pub async fn hash_password_blocking(plain: &str) -> anyhow::Result<String> {
    let plain = plain.to_string();
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .context("hash task join")?
}

pub async fn verify_password_blocking(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let plain = plain.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
        .await
        .context("verify task join")?
}

pub fn check_password_policy(plain: &str) -> AppResult<()> {
    let len = plain.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(AppError::invalid(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(AppError::invalid(format!(
            "password must be at most {} characters",
            MAX_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
        assert!(!verify_password("correct-horse-battery-staplE", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
        assert!(!a.contains("same-password"));
    }

    #[test]
    fn legacy_bcrypt_digest_verifies() {
        let legacy = bcrypt::hash("correct", 4).unwrap();
        assert!(verify_password("correct", &legacy).unwrap());
        assert!(!verify_password("wrong", &legacy).unwrap());
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[tokio::test]
    async fn blocking_wrappers_agree_with_sync_versions() {
        let hash = hash_password_blocking("tokio-friendly").await.unwrap();
        assert!(verify_password_blocking("tokio-friendly", &hash).await.unwrap());
        assert!(!verify_password_blocking("nope-nope", &hash).await.unwrap());
    }

    #[test]
    fn policy_bounds() {
        assert!(check_password_policy("short").is_err());
        assert!(check_password_policy("exactly8").is_ok());
        assert!(check_password_policy(&"x".repeat(129)).is_err());
    }

    #[test]
    fn dummy_hash_is_a_real_argon2_digest() {
        let hash = DUMMY_HASH.as_deref().unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(!verify_password("petcare-no-such-account-nope", hash).unwrap());
    }

    #[tokio::test]
    async fn dummy_verify_spends_a_full_hash() {
        // warm the lazy static so only the verify is timed
        let _ = DUMMY_HASH.as_deref();
        let start = std::time::Instant::now();
        verify_dummy_blocking("whatever-password").await;
        let dummy = start.elapsed();

        let real = hash_password("whatever-else").unwrap();
        let start = std::time::Instant::now();
        assert!(!verify_password_blocking("whatever-password", &real).await.unwrap());
        let miss = start.elapsed();

        assert!(dummy * 4 >= miss, "dummy {:?} vs real {:?}", dummy, miss);
    }
}
