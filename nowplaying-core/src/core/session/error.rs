use thiserror::Error;

/// The media session specific result type.
/// This result will always return [Error].
pub type Result<T> = std::result::Result<T, Error>;

/// The media session errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// The operating system rejected the operation.
    /// `String` contains the reason given by the platform.
    #[error("the platform rejected the operation, {0}")]
    Platform(String),
    /// The thumbnail kind has no implementation.
    #[error("thumbnail kind {0} is not supported")]
    UnsupportedThumbnailKind(i32),
    /// The timeline values are out of range.
    #[error("invalid timeline, {0}")]
    InvalidTimeline(String),
    /// A button handler has already been bound to the session.
    #[error("button handler can only be set once and cannot be removed")]
    AlreadyBound,
    /// The event bridge has been aborted and no longer accepts a handler.
    #[error("the event bridge has been aborted")]
    Aborted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            "the platform rejected the operation, lorem",
            Error::Platform("lorem".to_string()).to_string()
        );
        assert_eq!(
            "thumbnail kind 1 is not supported",
            Error::UnsupportedThumbnailKind(1).to_string()
        );
        assert_eq!(
            "button handler can only be set once and cannot be removed",
            Error::AlreadyBound.to_string()
        );
        assert_eq!(
            "invalid timeline, lorem",
            Error::InvalidTimeline("lorem".to_string()).to_string()
        );
    }
}
