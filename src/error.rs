use thiserror::Error;

/// Main error type for SixDegrees
#[derive(Error, Debug)]
pub enum SixDegreesError {
    /// The "from" endpoint of a search did not resolve to any user
    #[error("from user not found: {0}")]
    FromNotFound(String),

    /// The "to" endpoint of a search did not resolve to any user
    #[error("to user not found: {0}")]
    ToNotFound(String),

    /// No chain between the two users within the search horizon
    #[error("no connection found")]
    NoConnectionFound,

    /// Directory service failure (network, HTTP error, malformed payload).
    /// Retryable by the caller; never cached as a negative result.
    #[error("directory service error: {0}")]
    Transient(String),

    /// Invalid input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal faults (panicked task, broken invariant)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenient Result type using SixDegreesError
pub type Result<T> = std::result::Result<T, SixDegreesError>;
