use thiserror::Error;

/// Reasons a candidate credential is rejected.
///
/// Length is checked before content, so `"12a"` reports a length problem
/// and `"12a4"` reports a format problem.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    #[error("expected {expected} characters, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("only decimal digits are allowed")]
    Format,
}

#[derive(Error, Debug)]
pub enum Error {
    // Input errors
    #[error("Invalid credential: {0}")]
    InvalidCredential(#[from] CredentialError),

    #[error("Invalid fingerprint id: {0}")]
    InvalidFingerprintId(u16),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    // Peripheral errors
    #[error("Communication error: {0}")]
    Communication(String),

    #[error("Fingerprint database full")]
    DatabaseFull,

    #[error("Remote channel unavailable")]
    ConnectivityLoss,

    // Session errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn communication(message: impl Into<String>) -> Self {
        Self::Communication(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self::InvalidMessage(message.into())
    }

    /// Errors that only abort the operation in flight.
    ///
    /// Everything except configuration and I/O setup failures is
    /// recoverable from the control loop's point of view.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
