use std::fmt;

/// Error type for all core operations
///
/// Variants carry the failure kind the error classifier keys on; the payload
/// is a human-readable detail string. Core operations catch these internally
/// and convert them into classified error events instead of propagating, with
/// one exception: `Config` errors abort startup and are re-thrown to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Malformed argument passed to a core operation
    InvalidArgument(String),
    /// Input failed a validation gate
    Validation(String),
    /// Operation timed out
    Timeout(String),
    /// Connectivity to the host platform or upstream service lost
    Connection(String),
    /// I/O fault
    Io(String),
    /// Access or permission fault
    AccessDenied(String),
    /// Out-of-memory class fault; always escalated as absolute-critical
    OutOfMemory(String),
    /// Arithmetic fault (overflow, division by zero)
    Arithmetic(String),
    /// Host collaborator call failed
    Host(String),
    /// Fatal configuration error; the only error allowed to escape startup
    Config(String),
    /// Uncategorized failure
    Other(String),
}

impl CoreError {
    /// Detail string regardless of kind
    pub fn detail(&self) -> &str {
        match self {
            CoreError::InvalidArgument(s)
            | CoreError::Validation(s)
            | CoreError::Timeout(s)
            | CoreError::Connection(s)
            | CoreError::Io(s)
            | CoreError::AccessDenied(s)
            | CoreError::OutOfMemory(s)
            | CoreError::Arithmetic(s)
            | CoreError::Host(s)
            | CoreError::Config(s)
            | CoreError::Other(s) => s,
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvalidArgument(s) => write!(f, "invalid argument: {}", s),
            CoreError::Validation(s) => write!(f, "validation failed: {}", s),
            CoreError::Timeout(s) => write!(f, "timeout: {}", s),
            CoreError::Connection(s) => write!(f, "connection error: {}", s),
            CoreError::Io(s) => write!(f, "io error: {}", s),
            CoreError::AccessDenied(s) => write!(f, "access denied: {}", s),
            CoreError::OutOfMemory(s) => write!(f, "out of memory: {}", s),
            CoreError::Arithmetic(s) => write!(f, "arithmetic error: {}", s),
            CoreError::Host(s) => write!(f, "host error: {}", s),
            CoreError::Config(s) => write!(f, "configuration error: {}", s),
            CoreError::Other(s) => write!(f, "error: {}", s),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<std::io::Error> for CoreError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => CoreError::AccessDenied(error.to_string()),
            std::io::ErrorKind::TimedOut => CoreError::Timeout(error.to_string()),
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected => CoreError::Connection(error.to_string()),
            std::io::ErrorKind::OutOfMemory => CoreError::OutOfMemory(error.to_string()),
            _ => CoreError::Io(error.to_string()),
        }
    }
}
