//! Error types for peripheral operations.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during peripheral operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Operation timed out after specified duration.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Operation is not supported by this device.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// Device communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Invalid data received from device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Every fingerprint slot is occupied.
    #[error("Fingerprint database full")]
    DatabaseFull,

    /// The sensor rejected an enrollment (bad captures, mismatch, store failure).
    #[error("Enrollment failed: {message}")]
    EnrollmentFailed { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn enrollment_failed(message: impl Into<String>) -> Self {
        Self::EnrollmentFailed {
            message: message.into(),
        }
    }

    /// Whether the device itself failed, as opposed to rejecting the request.
    #[must_use]
    pub fn is_communication_failure(&self) -> bool {
        matches!(
            self,
            Self::Disconnected { .. }
                | Self::Timeout { .. }
                | Self::CommunicationError { .. }
                | Self::InvalidData { .. }
                | Self::Io(_)
        )
    }
}

impl From<HardwareError> for doorlock_core::Error {
    fn from(err: HardwareError) -> Self {
        match err {
            HardwareError::DatabaseFull => doorlock_core::Error::DatabaseFull,
            HardwareError::Io(e) => doorlock_core::Error::Io(e),
            other => doorlock_core::Error::communication(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            HardwareError::disconnected("sensor").to_string(),
            "Device disconnected: sensor"
        );
        assert_eq!(
            HardwareError::timeout(1500).to_string(),
            "Operation timeout after 1500ms"
        );
        assert_eq!(
            HardwareError::DatabaseFull.to_string(),
            "Fingerprint database full"
        );
        assert_eq!(
            HardwareError::enrollment_failed("images differ").to_string(),
            "Enrollment failed: images differ"
        );
    }

    #[test]
    fn test_communication_failure_classification() {
        assert!(HardwareError::timeout(10).is_communication_failure());
        assert!(HardwareError::communication("nack").is_communication_failure());
        assert!(!HardwareError::DatabaseFull.is_communication_failure());
        assert!(!HardwareError::enrollment_failed("x").is_communication_failure());
        assert!(!HardwareError::unsupported("beep").is_communication_failure());
    }

    #[test]
    fn test_into_core_error() {
        let core: doorlock_core::Error = HardwareError::DatabaseFull.into();
        assert!(matches!(core, doorlock_core::Error::DatabaseFull));

        let core: doorlock_core::Error = HardwareError::timeout(5).into();
        assert!(matches!(core, doorlock_core::Error::Communication(_)));
    }
}
