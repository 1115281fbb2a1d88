use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Response, StatusCode};
use http_body_util::Full;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;

use super::ResponseSink;

/// A sink that records a response in memory.
///
/// The header map is captured when the status line is written. Use
/// [`into_response`](BufferedSink::into_response) to hand the recorded
/// response to a server that expects an [`http::Response`].
///
#[derive(Debug, Default)]
pub struct BufferedSink {
    headers: HeaderMap,
    head: Option<(StatusCode, HeaderMap)>,
    body: BytesMut,
}

impl BufferedSink {
    /// Returns an empty sink with no status written.
    ///
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the status code that was written, if any.
    ///
    pub fn status(&self) -> Option<StatusCode> {
        self.head.as_ref().map(|(status, _)| *status)
    }

    /// Returns the body bytes that were written so far.
    ///
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consumes the sink and returns the recorded response.
    ///
    /// If a status was never written, the response has the status `200 OK`
    /// and the current header map.
    ///
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let (status, headers) = self.head.unwrap_or((StatusCode::OK, self.headers));
        let mut response = Response::new(Full::new(self.body.freeze()));

        *response.status_mut() = status;
        *response.headers_mut() = headers;

        response
    }
}

impl ResponseSink for BufferedSink {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) {
        if let Some((written, _)) = &self.head {
            tracing::warn!(%written, ignored = %status, "superfluous call to write_status");
            return;
        }

        self.head = Some((status, self.headers.clone()));
    }
}

impl AsyncWrite for BufferedSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();

        if this.head.is_none() {
            this.write_status(StatusCode::OK);
        }

        this.body.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
