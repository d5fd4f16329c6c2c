use thiserror::Error;

/// Errors produced while locating, reading, or decoding the keyboard dongle.
#[derive(Error, Debug)]
pub enum KeyboardError {
    /// The report is too short to hold every fixed-offset field.
    /// Recoverable: the report is skipped and the state is left untouched.
    #[error("report too short: got {len} bytes, need at least {min}")]
    ReportTooShort { len: usize, min: usize },

    /// The transport failed while reading. Fatal for the read loop.
    #[error("transport read failed: {0}")]
    TransportRead(String),

    #[error("failed to open device {path}: {reason}")]
    DeviceOpen { path: String, reason: String },

    #[error("no Rock Band keyboard dongle found")]
    NoMatchingDevice,

    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("reader thread error: {0}")]
    Thread(String),
}

impl KeyboardError {
    /// Whether the read loop must stop after this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, KeyboardError::ReportTooShort { .. })
    }
}

pub type Result<T> = std::result::Result<T, KeyboardError>;
