//! Async key-value storage trait shared by every backend.

use serde_json::Value;

/// Errors raised by a [`KvStore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Async trait for durable key-value storage of JSON values.
///
/// Keys are flat names such as `"token"` or `"verification_code_13812345678"`.
/// Reading a key that was never written yields `Ok(None)`; removing it is a no-op.
pub trait KvStore {
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<Value>, StoreError>>;
    fn set(
        &self,
        key: &str,
        value: Value,
    ) -> impl std::future::Future<Output = Result<(), StoreError>>;
    fn remove(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>>;
}

/// Reject keys that could escape a backend's namespace.
pub(crate) fn check_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_key() {
        assert!(check_key("token").is_ok());
        assert!(check_key("userInfo").is_ok());
        assert!(check_key("verification_code_13812345678").is_ok());

        assert!(check_key("").is_err());
        assert!(check_key("../token").is_err());
        assert!(check_key("a/b").is_err());
        assert!(check_key("with space").is_err());
    }
}
