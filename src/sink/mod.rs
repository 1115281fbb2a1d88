//! The transport that a response is written to.
//!

mod buffered;

use http::{HeaderMap, StatusCode};
use tokio::io::AsyncWrite;

pub use buffered::BufferedSink;

/// A response that is written in order: headers, then the status line, then
/// the body.
///
/// Body bytes are written through [`AsyncWrite`]. Writing body bytes before
/// calling [`write_status`](ResponseSink::write_status) implies `200 OK`.
///
/// The status line is written once. Implementations ignore subsequent calls
/// to `write_status` as well as mutations to the header map that occur after
/// the status line was written.
///
pub trait ResponseSink: AsyncWrite + Unpin {
    fn headers(&self) -> &HeaderMap;

    fn headers_mut(&mut self) -> &mut HeaderMap;

    fn write_status(&mut self, status: StatusCode);
}

impl<S> ResponseSink for &mut S
where
    S: ResponseSink + ?Sized,
{
    #[inline]
    fn headers(&self) -> &HeaderMap {
        (**self).headers()
    }

    #[inline]
    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    #[inline]
    fn write_status(&mut self, status: StatusCode) {
        (**self).write_status(status)
    }
}
