use bytes::Bytes;
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, CONTENT_TYPE,
    LAST_MODIFIED, WWW_AUTHENTICATE, X_CONTENT_TYPE_OPTIONS,
};
use http::{HeaderMap, HeaderValue, StatusCode};
use serde::Serialize;
use std::io;
use tokio::io::{AsyncRead, AsyncWriteExt};

use super::{APPLICATION_JSON, CORS_ALLOW_HEADERS, CORS_ALLOW_ORIGIN, NOSNIFF, TEXT_PLAIN};
use crate::error::{Error, ErrorHandler, default_error_handler};
use crate::sink::ResponseSink;
use crate::sniff::{self, Sniffed};

/// Writes a single response to a [`ResponseSink`].
///
/// A writer is created for one outbound response and consumed by the
/// handler that created it. Every write operation is terminal: failures that
/// occur while preparing the response, such as a missing file or a value
/// that cannot be serialized, are written as an error response rather than
/// returned to the caller.
///
/// The `io::Result` returned from each write operation reports failures of
/// the sink, and read failures of a body after the status line was written.
///
/// Headers must not be mutated after a write operation has written the
/// status line. Sinks are free to ignore such mutations.
///
pub struct ResponseWriter<S> {
    sink: S,
    cors: bool,
    error_handler: Option<Box<dyn ErrorHandler>>,
}

impl<S: ResponseSink> ResponseWriter<S> {
    /// Returns a new writer that uses the default error handler.
    ///
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            cors: false,
            error_handler: None,
        }
    }

    /// Returns a new writer that uses the provided error handler.
    ///
    pub fn with_error_handler<H>(sink: S, handler: H) -> Self
    where
        H: ErrorHandler + 'static,
    {
        Self {
            sink,
            cors: false,
            error_handler: Some(Box::new(handler)),
        }
    }

    /// Replaces the error handler of this writer. Other writers are not
    /// affected.
    ///
    pub fn set_error_handler<H>(&mut self, handler: H)
    where
        H: ErrorHandler + 'static,
    {
        self.error_handler = Some(Box::new(handler));
    }

    /// Toggles whether permissive CORS headers are attached to subsequent
    /// writes.
    ///
    pub fn set_cors(&mut self, cors: bool) {
        self.cors = cors;
    }

    /// Returns a reference to the headers of the response.
    ///
    pub fn headers(&self) -> &HeaderMap {
        self.sink.headers()
    }

    /// Returns a mutable reference to the headers of the response.
    ///
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.sink.headers_mut()
    }

    /// Consumes the writer and returns the underlying sink.
    ///
    pub fn into_inner(self) -> S {
        self.sink
    }
}

impl<S: ResponseSink> ResponseWriter<S> {
    /// Writes a response for `error` with the active error handler.
    ///
    /// The handler of this writer is used if one was set. Otherwise, the
    /// process-wide [default](crate::error::default_error_handler) is used.
    ///
    /// Headers that describe a previously prepared body are discarded before
    /// the headers of the error response are applied. `Content-Length` is
    /// derived from the error body if the handler did not set it.
    ///
    pub async fn write_error(&mut self, error: impl Into<Error>) -> io::Result<()> {
        let error = error.into();

        self.set_cors_headers();

        let response = match &self.error_handler {
            Some(handler) => handler.handle(&error),
            None => default_error_handler().handle(&error),
        };

        let (parts, body) = response.into_parts();

        tracing::debug!(status = %parts.status, error = %error, "writing error response");

        let headers = self.sink.headers_mut();

        // Headers that describe the body being replaced.
        for name in [CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED, X_CONTENT_TYPE_OPTIONS] {
            headers.remove(name);
        }

        for name in parts.headers.keys() {
            headers.remove(name);
        }

        for (name, value) in &parts.headers {
            headers.append(name.clone(), value.clone());
        }

        if !headers.contains_key(CONTENT_LENGTH) {
            headers.insert(CONTENT_LENGTH, body.len().into());
        }

        self.sink.write_status(parts.status);
        self.sink.write_all(&body).await?;
        self.sink.flush().await
    }

    /// Writes a `401 Unauthorized` response that challenges the client to
    /// authenticate with the basic scheme in `realm`.
    ///
    pub async fn write_unauthorized(&mut self, realm: &str) -> io::Result<()> {
        let challenge = match basic_challenge(realm) {
            Ok(value) => value,
            Err(error) => return self.write_error(error).await,
        };

        self.set_cors_headers();

        let status = StatusCode::UNAUTHORIZED;
        let body = status.canonical_reason().unwrap_or_default();
        let headers = self.sink.headers_mut();

        headers.insert(WWW_AUTHENTICATE, challenge);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
        headers.insert(CONTENT_LENGTH, body.len().into());

        self.sink.write_status(status);
        self.sink.write_all(body.as_bytes()).await?;
        self.sink.flush().await
    }

    /// Writes `body` with the provided status code.
    ///
    /// The content type is sniffed from the body unless it was already set.
    ///
    pub async fn write_bytes(
        &mut self,
        status: StatusCode,
        body: impl Into<Bytes>,
    ) -> io::Result<()> {
        let body = body.into();

        self.sink.headers_mut().insert(CONTENT_LENGTH, body.len().into());
        self.copy(status, &*body).await
    }

    /// Serializes `value` as pretty printed JSON and writes it with the
    /// provided status code.
    ///
    pub async fn write_json<T>(&mut self, status: StatusCode, value: &T) -> io::Result<()>
    where
        T: Serialize + ?Sized,
    {
        let body = match serde_json::to_vec_pretty(value) {
            Ok(body) => body,
            Err(error) => return self.write_error(error).await,
        };

        let headers = self.sink.headers_mut();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static(NOSNIFF));
        headers.insert(CONTENT_LENGTH, body.len().into());

        self.copy(status, body.as_slice()).await
    }

    /// Writes `text` as a plain text body with the provided status code.
    ///
    pub async fn write_text(&mut self, status: StatusCode, text: &str) -> io::Result<()> {
        let headers = self.sink.headers_mut();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
        headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static(NOSNIFF));
        headers.insert(CONTENT_LENGTH, text.len().into());

        self.copy(status, text.as_bytes()).await
    }

    /// Writes the status line and streams `body` to the sink.
    ///
    /// If the `Content-Type` header is unset, it is detected from the first
    /// [`HEADER_SIZE`](crate::sniff::HEADER_SIZE) bytes of `body`. Only those
    /// bytes are buffered. The rest of the body is streamed as it is read.
    ///
    pub async fn copy<R>(&mut self, status: StatusCode, body: R) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
    {
        self.set_cors_headers();

        let has_content_type = self
            .sink
            .headers()
            .get(CONTENT_TYPE)
            .is_some_and(|value| !value.is_empty());

        if has_content_type {
            return self.stream(status, body).await;
        }

        let Sniffed {
            body,
            content_type,
            error,
        } = sniff::detect_content_type(body).await;

        if let Some(error) = error {
            return self.write_error(error).await;
        }

        tracing::debug!(content_type, "detected content type");

        self.sink
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));

        self.stream(status, body).await
    }
}

impl<S: ResponseSink> ResponseWriter<S> {
    async fn stream<R>(&mut self, status: StatusCode, mut body: R) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
    {
        self.sink.write_status(status);
        tokio::io::copy(&mut body, &mut self.sink).await?;
        self.sink.flush().await
    }

    fn set_cors_headers(&mut self) {
        if self.cors {
            let headers = self.sink.headers_mut();

            headers.insert(
                ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static(CORS_ALLOW_ORIGIN),
            );
            headers.insert(
                ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(CORS_ALLOW_HEADERS),
            );
        }
    }
}

/// Writes a response for `error` to `sink` with the default error handler.
///
pub async fn write_error<S: ResponseSink>(sink: S, error: impl Into<Error>) -> io::Result<()> {
    ResponseWriter::new(sink).write_error(error).await
}

/// Writes a `401 Unauthorized` response for `realm` to `sink`.
///
pub async fn write_unauthorized<S: ResponseSink>(sink: S, realm: &str) -> io::Result<()> {
    ResponseWriter::new(sink).write_unauthorized(realm).await
}

/// Writes `body` to `sink` with the provided status code.
///
pub async fn write_bytes<S: ResponseSink>(
    sink: S,
    status: StatusCode,
    body: impl Into<Bytes>,
) -> io::Result<()> {
    ResponseWriter::new(sink).write_bytes(status, body).await
}

/// Writes `value` as JSON to `sink` with the provided status code.
///
pub async fn write_json<S, T>(sink: S, status: StatusCode, value: &T) -> io::Result<()>
where
    S: ResponseSink,
    T: Serialize + ?Sized,
{
    ResponseWriter::new(sink).write_json(status, value).await
}

/// Writes `text` to `sink` with the provided status code.
///
pub async fn write_text<S>(sink: S, status: StatusCode, text: &str) -> io::Result<()>
where
    S: ResponseSink,
{
    ResponseWriter::new(sink).write_text(status, text).await
}

/// Streams `body` to `sink` with the provided status code.
///
pub async fn copy<S, R>(sink: S, status: StatusCode, body: R) -> io::Result<()>
where
    S: ResponseSink,
    R: AsyncRead + Unpin,
{
    ResponseWriter::new(sink).copy(status, body).await
}

/// Format `realm` as the quoted-string of a basic auth challenge.
///
fn basic_challenge(realm: &str) -> Result<HeaderValue, Error> {
    let mut value = String::with_capacity(realm.len() + 15);

    value.push_str("Basic realm=\"");

    for c in realm.chars() {
        if c == '"' || c == '\\' {
            value.push('\\');
        }

        value.push(c);
    }

    value.push('"');

    HeaderValue::try_from(value)
        .map_err(|_| Error::invalid("the realm is not a valid header value"))
}
