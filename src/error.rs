use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum SensorError {
    #[error("No fresh measurement available")]
    WouldBlock,

    #[error("Wait interrupted")]
    Interrupted,

    #[error("Failed to copy reading to caller: {0}")]
    Fault(#[source] std::io::Error),

    #[error("Operation not supported: {0}")]
    NotSupported(&'static str),

    #[error("No such device: address {0}")]
    NoSuchDevice(u32),

    #[error("Invalid device name: {0}")]
    InvalidDeviceName(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

impl SensorError {
    /// Classic errno value for the errors a reader can observe.
    ///
    /// Configuration and I/O errors have no errno counterpart.
    pub fn errno(&self) -> Option<i32> {
        match self {
            SensorError::WouldBlock => Some(11),          // EAGAIN
            SensorError::Interrupted => Some(4),          // EINTR
            SensorError::Fault(_) => Some(14),            // EFAULT
            SensorError::NotSupported(_) => Some(22),     // EINVAL
            SensorError::NoSuchDevice(_) => Some(19),     // ENODEV
            SensorError::InvalidDeviceName(_) => Some(19), // ENODEV
            _ => None,
        }
    }

    /// Whether the identical call may succeed if simply issued again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SensorError::WouldBlock | SensorError::Interrupted)
    }
}

pub type Result<T> = std::result::Result<T, SensorError>;
