//! Error handling.
//!

mod handler;

use http::StatusCode;
use std::fmt::{self, Debug, Display, Formatter};
use std::io;

pub use handler::{
    ErrorHandler, default_error_handler, detect_status_code, handle_error,
    set_default_error_handler,
};

/// A type alias for `Box<dyn Error + Send + Sync>`.
///
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

macro_rules! new_with_kind {
    ($name:ident, $kind:ident) => {
        #[doc = concat!("Returns a new error tagged as [`ErrorKind::", stringify!($kind), "`].")]
        ///
        #[inline]
        pub fn $name(message: impl Into<String>) -> Self {
            Self::new(ErrorKind::$kind, message)
        }
    };
}

/// The semantic category of an [`Error`].
///
/// Each kind corresponds to exactly one status code. Errors that are not
/// tagged with a kind are classified as internal server errors.
///
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    Internal,
    Invalid,
    NotExist,
    Permission,
    Unauthorized,
}

/// An error that can be written as a response by a
/// [`ResponseWriter`](crate::ResponseWriter).
///
pub struct Error {
    kind: Option<ErrorKind>,
    source: BoxError,
}

/// Tag the error side of a `Result` with an [`ErrorKind`].
///
pub trait ResultExt<T> {
    fn or_kind(self, kind: ErrorKind) -> Result<T, Error>;
}

#[derive(Debug)]
struct ErrorMessage(String);

impl ErrorKind {
    /// Returns the status code that responses for this kind are written with.
    ///
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Invalid => StatusCode::BAD_REQUEST,
            Self::NotExist => StatusCode::NOT_FOUND,
            Self::Permission => StatusCode::FORBIDDEN,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl Error {
    /// Returns a new error with the provided kind and message.
    ///
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::from_source(kind, Box::new(ErrorMessage(message.into())))
    }

    /// Returns a new error with the provided kind and source.
    ///
    pub fn from_source(kind: ErrorKind, source: BoxError) -> Self {
        Self {
            kind: Some(kind),
            source,
        }
    }

    new_with_kind!(internal, Internal);
    new_with_kind!(invalid, Invalid);
    new_with_kind!(not_exist, NotExist);
    new_with_kind!(permission, Permission);
    new_with_kind!(unauthorized, Unauthorized);

    /// Returns a new error with the kind tag replaced by `kind`.
    ///
    pub fn with_kind(self, kind: ErrorKind) -> Self {
        Self {
            kind: Some(kind),
            ..self
        }
    }

    /// Returns the kind tag of this error, if any.
    ///
    pub fn kind(&self) -> Option<ErrorKind> {
        self.kind
    }

    /// Returns a reference to the error source.
    ///
    pub fn source(&self) -> &(dyn std::error::Error + 'static) {
        &*self.source
    }

    /// Returns the kind of the first [`io::Error`] in the source chain.
    ///
    pub fn io_error_kind(&self) -> Option<io::ErrorKind> {
        let mut source = Some(self.source());

        while let Some(error) = source {
            if let Some(io_error) = error.downcast_ref::<io::Error>() {
                return Some(io_error.kind());
            }

            source = error.source();
        }

        None
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("source", &self.source)
            .finish()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&*self.source, f)
    }
}

impl<E> From<E> for Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[inline]
    fn from(source: E) -> Self {
        Self {
            kind: None,
            source: Box::new(source),
        }
    }
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    Error: From<E>,
{
    fn or_kind(self, kind: ErrorKind) -> Result<T, Error> {
        self.map_err(|error| Error::from(error).with_kind(kind))
    }
}

impl std::error::Error for ErrorMessage {}

impl Display for ErrorMessage {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::{Error, ErrorKind, ResultExt};

    #[test]
    fn test_untagged_from_std_error() {
        let error = Error::from(io::Error::other("disk on fire"));

        assert_eq!(error.kind(), None);
        assert_eq!(error.to_string(), "disk on fire");
        assert_eq!(error.io_error_kind(), Some(io::ErrorKind::Other));
    }

    #[test]
    fn test_io_error_kind_follows_the_source_chain() {
        #[derive(Debug)]
        struct Wrapped(io::Error);

        impl std::fmt::Display for Wrapped {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "wrapped: {}", self.0)
            }
        }

        impl std::error::Error for Wrapped {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                Some(&self.0)
            }
        }

        let error = Error::from(Wrapped(io::ErrorKind::NotFound.into()));
        assert_eq!(error.io_error_kind(), Some(io::ErrorKind::NotFound));

        let error = Error::invalid("no io here");
        assert_eq!(error.io_error_kind(), None);
    }

    #[test]
    fn test_or_kind() {
        let result: Result<(), io::Error> = Err(io::Error::other("nope"));
        let error = result.or_kind(ErrorKind::Unauthorized).unwrap_err();

        assert_eq!(error.kind(), Some(ErrorKind::Unauthorized));
        assert_eq!(error.to_string(), "nope");
    }
}
