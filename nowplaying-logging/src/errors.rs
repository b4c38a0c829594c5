use std::{io, result};
use thiserror::Error;

/// The result type of the logging operations.
pub type Result<T> = result::Result<T, Error>;

/// The errors of the logging setup.
#[derive(Debug, Error)]
pub enum Error {
    #[error("a session logger has already been initialized")]
    AlreadyInitialized,
    #[error("log config {0} does not exist")]
    NotFound(String),
    #[error("logging configuration is invalid, {0}")]
    InvalidConfig(String),
    #[error("an io error occurred, {0}")]
    Io(io::Error),
}

impl PartialEq for Error {
    fn eq(&self, other: &Error) -> bool {
        match (self, other) {
            (Error::AlreadyInitialized, Error::AlreadyInitialized) => true,
            (Error::NotFound(a), Error::NotFound(b)) => a == b,
            (Error::InvalidConfig(_), Error::InvalidConfig(_)) => true,
            (Error::Io(a), Error::Io(b)) => a.kind() == b.kind(),
            _ => false,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_eq() {
        assert_eq!(Error::AlreadyInitialized, Error::AlreadyInitialized);
        assert_eq!(
            Error::NotFound("log4rs.yml".to_string()),
            Error::NotFound("log4rs.yml".to_string())
        );
        assert_eq!(
            Error::InvalidConfig("Foo".to_string()),
            Error::InvalidConfig("Bar".to_string())
        );
        assert_ne!(
            Error::Io(io::Error::from(io::ErrorKind::NotFound)),
            Error::Io(io::Error::from(io::ErrorKind::PermissionDenied))
        );
        assert_ne!(
            Error::AlreadyInitialized,
            Error::NotFound("log4rs.yml".to_string())
        );
    }

    #[test]
    fn test_from_io() {
        let err = io::Error::from(io::ErrorKind::PermissionDenied);

        let result = Error::from(err);

        assert_eq!(
            Error::Io(io::Error::from(io::ErrorKind::PermissionDenied)),
            result
        );
    }
}
