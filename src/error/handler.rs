use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::{HeaderValue, Response, StatusCode};
use std::io;
use std::sync::OnceLock;

use super::Error;
use crate::response::{NOSNIFF, TEXT_PLAIN};

/// The process-wide fallback used by writers without their own handler.
///
static DEFAULT_ERROR_HANDLER: OnceLock<Box<dyn ErrorHandler>> = OnceLock::new();

/// Customize how an [`Error`] is converted to a response.
///
/// Any `Fn(&Error) -> Response<Bytes>` that is `Send + Sync` is an error
/// handler.
///
/// ```
/// use bytes::Bytes;
/// use http::{Response, StatusCode};
/// use via_resp::error::{Error, ErrorHandler};
///
/// fn teapot(_: &Error) -> Response<Bytes> {
///     let mut response = Response::new(Bytes::from_static(b"short and stout"));
///     *response.status_mut() = StatusCode::IM_A_TEAPOT;
///     response
/// }
///
/// let response = teapot.handle(&Error::internal("boiling"));
/// assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
/// ```
///
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, error: &Error) -> Response<Bytes>;
}

impl<F> ErrorHandler for F
where
    F: Fn(&Error) -> Response<Bytes> + Send + Sync,
{
    #[inline]
    fn handle(&self, error: &Error) -> Response<Bytes> {
        self(error)
    }
}

/// Returns the status code that a response for `error` should be written
/// with.
///
/// Filesystem conditions found anywhere in the source chain take precedence
/// over the kind tag of the error. Errors without a recognized condition or
/// tag map to `500 Internal Server Error`.
///
pub fn detect_status_code(error: &Error) -> StatusCode {
    match error.io_error_kind() {
        Some(io::ErrorKind::NotFound) => return StatusCode::NOT_FOUND,
        Some(io::ErrorKind::PermissionDenied) => return StatusCode::FORBIDDEN,
        _ => {}
    }

    match error.kind() {
        Some(kind) => kind.status_code(),
        None => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The built-in error handler.
///
/// Responds with the status code returned from [`detect_status_code`] and the
/// error message as a plain text body.
///
pub fn handle_error(error: &Error) -> Response<Bytes> {
    let body = Bytes::from(format!("{}\n", error));
    let content_len = body.len().into();

    let mut response = Response::new(body);
    *response.status_mut() = detect_status_code(error);

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static(NOSNIFF));
    headers.insert(CONTENT_LENGTH, content_len);

    response
}

/// Install the process-wide default error handler.
///
/// The default can be installed once. Subsequent calls return an error and
/// leave the installed handler in place.
///
/// ```
/// use via_resp::error::{self, Error, ErrorHandler, handle_error};
///
/// error::set_default_error_handler(|error: &Error| {
///     let mut response = handle_error(error);
///     response.headers_mut().insert("cache-control", "no-store".parse().unwrap());
///     response
/// })
/// .unwrap();
///
/// assert!(error::set_default_error_handler(handle_error).is_err());
///
/// let response = error::default_error_handler().handle(&Error::invalid("bad"));
/// assert_eq!(response.headers()["cache-control"], "no-store");
/// ```
///
pub fn set_default_error_handler<H>(handler: H) -> Result<(), Error>
where
    H: ErrorHandler + 'static,
{
    DEFAULT_ERROR_HANDLER
        .set(Box::new(handler))
        .map_err(|_| Error::internal("the default error handler is already installed"))
}

/// Returns the process-wide default error handler, or [`handle_error`] if a
/// default was never installed.
///
pub fn default_error_handler() -> &'static dyn ErrorHandler {
    match DEFAULT_ERROR_HANDLER.get() {
        Some(handler) => &**handler,
        None => &handle_error,
    }
}
