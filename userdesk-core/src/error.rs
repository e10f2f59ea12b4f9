use thiserror::Error;

/// Common result type for account management operations.
pub type Result<T> = std::result::Result<T, UserError>;

/// Errors raised by a [`CredentialStore`](crate::CredentialStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered: {0}")]
    Duplicate(String),
    #[error("user not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct HashError(pub String);

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Sign(String),
    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Login flow errors. The two credential variants carry the user-facing message.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email atau password salah")]
    InvalidCredentials,
    #[error("Terlalu banyak percobaan yang salah. silahkan dicoba beberapa saat lagi.")]
    TooManyAttempts,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found: {0}")]
    NotFound(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
