use std::fmt;

/// Result type for taskline-term operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the rendering layer
#[derive(Debug)]
pub enum Error {
    /// Task/model layer error
    Core(taskline_core::Error),

    /// IO operation failed
    Io(std::io::Error),

    /// Manager configuration could not be realized
    Setup(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Core(err) => write!(f, "Task error: {}", err),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Setup(msg) => write!(f, "Setup error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Core(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Setup(_) => None,
        }
    }
}

impl From<taskline_core::Error> for Error {
    fn from(err: taskline_core::Error) -> Self {
        Error::Core(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
