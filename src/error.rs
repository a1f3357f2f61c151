use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the crate. Shape mismatches between parameters and
/// inputs are programming errors and panic instead.
#[derive(Debug)]
pub enum Error {
    /// A hyperparameter failed validation before training started
    InvalidConfig(String),
    /// A sample's label is outside the network's class range
    InvalidLabel { label: usize, classes: usize },
    /// A persisted snapshot is missing, malformed, or dimensionally
    /// inconsistent
    Snapshot(String),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Error::InvalidLabel { label, classes } => {
                write!(f, "label {} out of range for {} classes", label, classes)
            }
            Error::Snapshot(msg) => write!(f, "corrupt or incompatible snapshot: {}", msg),
            Error::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Snapshot(e.to_string())
    }
}
