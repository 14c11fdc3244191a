use crate::error::{AppError, AppResult};
use bcrypt::{hash, verify};

pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 72;

/// bcrypt cost used for every stored password.
pub const HASH_COST: u32 = 10;

/// Returns the policy violation message, if any.
pub fn password_policy_violation(password: &str) -> Option<String> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        return Some(format!("A senha deve ter pelo menos {PASSWORD_MIN_LEN} caracteres"));
    }
    // bcrypt ignores everything past 72 bytes
    if password.len() > PASSWORD_MAX_LEN {
        return Some(format!("A senha deve ter no máximo {PASSWORD_MAX_LEN} bytes"));
    }
    None
}

pub fn validate_password(password: &str) -> AppResult<()> {
    match password_policy_violation(password) {
        Some(msg) => Err(AppError::ValidationError(msg)),
        None => Ok(()),
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, HASH_COST)
        .map_err(|e| AppError::InternalError(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    verify(password, hash)
        .map_err(|e| AppError::InternalError(format!("password verification failed: {e}")))
}

/// `hash_password` on the blocking pool so request workers stay free.
pub async fn hash_password_async(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::InternalError(format!("hashing task failed: {e}")))?
}

pub async fn verify_password_async(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::InternalError(format!("verification task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret1").is_ok());
        assert!(validate_password("123456").is_ok());
        assert!(validate_password("12345").is_err());
        assert!(validate_password("").is_err());
        assert!(validate_password(&"a".repeat(73)).is_err());
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hashed = hash_password("secret1").unwrap();
        assert!(hashed.starts_with("$2b$10$"));
        assert!(verify_password("secret1", &hashed).unwrap());
        assert!(!verify_password("secret2", &hashed).unwrap());
    }

    #[tokio::test]
    async fn test_async_wrappers() {
        let hashed = hash_password_async("secret1".to_string()).await.unwrap();
        assert!(
            verify_password_async("secret1".to_string(), hashed)
                .await
                .unwrap()
        );
    }
}
