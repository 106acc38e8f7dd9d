//! Error types for the cart store.

use std::fmt;

/// Result type for cart operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the cart store.
///
/// Every store operation returns `Result<T>`. By the time an `Err` reaches the
/// caller it has already been logged and turned into a user-facing
/// [`Notice`](crate::notify::Notice), so callers may drop it without losing
/// the visible signal.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The candidate passed to `add()` is missing its identity or carries an
    /// invalid price.
    ///
    /// No state is mutated when this is returned.
    InvalidItem(String),

    /// Writing the cart back to persistence failed.
    ///
    /// Common causes:
    /// - Storage backend unavailable or full
    /// - Cart API unreachable or returned a non-success status
    ///
    /// **Recovery:** The in-memory cart is left exactly as it was before the
    /// operation, so the user can simply retry.
    PersistenceWrite(String),

    /// Reading the cart from persistence failed.
    ///
    /// Raised by `hydrate()` and `refresh()`. The store still becomes ready.
    PersistenceRead(String),

    /// A mutating call was attempted without an authenticated session.
    ///
    /// Only raised by repositories that talk to the cart API, and by
    /// `checkout()`.
    AuthenticationRequired,

    /// Checkout was attempted on an empty cart.
    EmptyCart,

    /// A cart key string could not be parsed into `(type, id)`.
    InvalidKey(String),

    /// Serialization failed when converting line items to JSON.
    SerializationError(String),

    /// Deserialization failed when converting JSON into line items.
    DeserializationError(String),

    /// Key-value backend error (filesystem, Redis, etc).
    BackendError(String),

    /// Configuration error (bad URL, unparsable environment value).
    ConfigError(String),

    /// Generic error with custom message.
    Other(String),
}

impl Error {
    /// Whether this error came from the persistence layer.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Error::PersistenceWrite(_) | Error::PersistenceRead(_) | Error::BackendError(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidItem(msg) => write!(f, "Invalid item: {}", msg),
            Error::PersistenceWrite(msg) => write!(f, "Persistence write failed: {}", msg),
            Error::PersistenceRead(msg) => write!(f, "Persistence read failed: {}", msg),
            Error::AuthenticationRequired => write!(f, "Authentication required"),
            Error::EmptyCart => write!(f, "Cart is empty"),
            Error::InvalidKey(key) => write!(f, "Invalid cart key: {}", key),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::BackendError(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::BackendError(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::PersistenceWrite(format!("HTTP error: {}", e))
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::BackendError(format!("Redis error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidItem("missing id".to_string());
        assert_eq!(err.to_string(), "Invalid item: missing id");
        assert_eq!(
            Error::AuthenticationRequired.to_string(),
            "Authentication required"
        );
    }

    #[test]
    fn test_error_from_string() {
        let err: Error = "test error".into();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn test_error_from_json_syntax() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json")
            .expect_err("should fail to parse");
        let err: Error = json_err.into();
        assert!(matches!(err, Error::DeserializationError(_)));
    }

    #[test]
    fn test_is_persistence() {
        assert!(Error::PersistenceWrite("x".into()).is_persistence());
        assert!(Error::BackendError("x".into()).is_persistence());
        assert!(!Error::EmptyCart.is_persistence());
    }
}
