//! Detect the content type of a body from its first bytes.
//!

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

/// The number of bytes read ahead to detect the content type of a body.
///
/// This is the longest prefix that the signature database needs to
/// recognize any of the formats it knows about.
///
pub const HEADER_SIZE: usize = 261;

/// The content type used when a signature does not match.
///
pub const OCTET_STREAM: &str = "application/octet-stream";

/// The outcome of [`detect_content_type`].
///
#[derive(Debug)]
pub struct Sniffed<R> {
    /// A reader that yields every byte of the original body.
    pub body: PeekReader<R>,

    /// The detected content type or [`OCTET_STREAM`].
    pub content_type: &'static str,

    /// An error that occurred while reading ahead. The content type is always
    /// [`OCTET_STREAM`] when this is `Some`.
    pub error: Option<io::Error>,
}

/// A reader that replays a buffered prefix before the rest of the inner
/// reader.
///
#[derive(Debug)]
pub struct PeekReader<R> {
    head: [u8; HEADER_SIZE],
    len: usize,
    offset: usize,
    inner: R,
}

/// Returns the content type of the body that starts with `head`.
///
pub fn sniff(head: &[u8]) -> &'static str {
    match infer::get(head) {
        Some(kind) => kind.mime_type(),
        None => OCTET_STREAM,
    }
}

/// Read up to [`HEADER_SIZE`] bytes from `reader` and detect the content type
/// of the body.
///
/// A body that ends before the window is full is not an error. The returned
/// reader yields the same bytes as `reader` would have.
///
pub async fn detect_content_type<R>(reader: R) -> Sniffed<R>
where
    R: AsyncRead + Unpin,
{
    let mut body = PeekReader::new(reader);

    if let Err(error) = body.fill().await {
        return Sniffed {
            body,
            content_type: OCTET_STREAM,
            error: Some(error),
        };
    }

    let content_type = sniff(body.head());

    Sniffed {
        body,
        content_type,
        error: None,
    }
}

impl<R: AsyncRead + Unpin> PeekReader<R> {
    /// Wraps `inner` with an empty look-ahead buffer.
    ///
    pub fn new(inner: R) -> Self {
        Self {
            head: [0; HEADER_SIZE],
            len: 0,
            offset: 0,
            inner,
        }
    }

    /// Returns the bytes that were read ahead and not yet replayed.
    ///
    pub fn head(&self) -> &[u8] {
        &self.head[self.offset..self.len]
    }

    /// Consumes the reader and returns the inner reader. Bytes that were read
    /// ahead and not yet replayed are lost.
    ///
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read from the inner reader until the buffer is full or the inner
    /// reader is exhausted.
    ///
    async fn fill(&mut self) -> io::Result<()> {
        while self.len < HEADER_SIZE {
            match self.inner.read(&mut self.head[self.len..]).await {
                Ok(0) => break,
                Ok(n) => self.len += n,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(error),
            }
        }

        Ok(())
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for PeekReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        context: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if this.offset < this.len {
            let head = &this.head[this.offset..this.len];
            let n = head.len().min(buf.remaining());

            buf.put_slice(&head[..n]);
            this.offset += n;

            return Poll::Ready(Ok(()));
        }

        Pin::new(&mut this.inner).poll_read(context, buf)
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

    use super::{HEADER_SIZE, OCTET_STREAM, detect_content_type, sniff};

    /// Yields `data` in chunks of at most `chunk` bytes, then fails with
    /// `error` if one was provided.
    struct Trickle {
        data: Vec<u8>,
        chunk: usize,
        error: Option<io::ErrorKind>,
    }

    impl AsyncRead for Trickle {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.data.is_empty() {
                return match self.error.take() {
                    Some(kind) => Poll::Ready(Err(kind.into())),
                    None => Poll::Ready(Ok(())),
                };
            }

            let n = self.chunk.min(self.data.len()).min(buf.remaining());
            let rest = self.data.split_off(n);

            buf.put_slice(&self.data);
            self.data = rest;

            Poll::Ready(Ok(()))
        }
    }

    fn gif(len: usize) -> Vec<u8> {
        let mut data = b"GIF89a".to_vec();

        data.extend((0..len).map(|n| (n % 199) as u8));
        data
    }

    #[test]
    fn test_sniff() {
        assert_eq!(sniff(b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR"), "image/png");
        assert_eq!(sniff(b"GIF89a\x01\x00"), "image/gif");
        assert_eq!(sniff(b"\xff\xd8\xff\xe0"), "image/jpeg");
        assert_eq!(sniff(b""), OCTET_STREAM);
        assert_eq!(sniff(b"just some words"), OCTET_STREAM);
    }

    #[test]
    fn test_sniff_is_idempotent() {
        let data = gif(64);
        let first = sniff(&data);

        for _ in 0..8 {
            assert_eq!(sniff(&data), first);
        }
    }

    #[tokio::test]
    async fn test_detect_content_type_reassembles_body() {
        let data = gif(HEADER_SIZE * 4);
        let sniffed = detect_content_type(data.as_slice()).await;

        assert_eq!(sniffed.content_type, "image/gif");
        assert!(sniffed.error.is_none());
        assert_eq!(sniffed.body.head().len(), HEADER_SIZE);

        let mut body = Vec::new();
        let mut reader = sniffed.body;

        reader.read_to_end(&mut body).await.unwrap();
        assert_eq!(body, data);
    }

    #[tokio::test]
    async fn test_detect_content_type_short_reads() {
        let data = gif(HEADER_SIZE);
        let reader = Trickle {
            data: data.clone(),
            chunk: 7,
            error: None,
        };

        let sniffed = detect_content_type(reader).await;

        assert_eq!(sniffed.content_type, "image/gif");
        assert_eq!(
            sniffed.body.head().len(),
            HEADER_SIZE,
            "the window is filled across short reads"
        );

        let mut body = Vec::new();
        let mut reader = sniffed.body;

        reader.read_to_end(&mut body).await.unwrap();
        assert_eq!(body, data);
    }

    #[tokio::test]
    async fn test_detect_content_type_short_body() {
        let sniffed = detect_content_type(&b"GIF89a"[..]).await;

        assert_eq!(sniffed.content_type, "image/gif");
        assert!(
            sniffed.error.is_none(),
            "a body shorter than the window is not an error"
        );

        let sniffed = detect_content_type(&b""[..]).await;

        assert_eq!(sniffed.content_type, OCTET_STREAM);
        assert!(sniffed.error.is_none());
        assert!(sniffed.body.head().is_empty());
    }

    #[tokio::test]
    async fn test_detect_content_type_read_error() {
        let reader = Trickle {
            data: gif(16),
            chunk: 4,
            error: Some(io::ErrorKind::ConnectionReset),
        };

        let sniffed = detect_content_type(reader).await;
        let error = sniffed.error.expect("the read error is reported");

        assert_eq!(error.kind(), io::ErrorKind::ConnectionReset);
        assert_eq!(sniffed.content_type, OCTET_STREAM);
        assert_eq!(
            sniffed.body.head().len(),
            22,
            "bytes read before the error are kept"
        );
    }

    #[tokio::test]
    async fn test_detect_content_type_retries_interrupted() {
        let reader = Trickle {
            data: Vec::new(),
            chunk: 1,
            error: Some(io::ErrorKind::Interrupted),
        };

        let sniffed = detect_content_type(reader).await;

        assert!(sniffed.error.is_none());
        assert_eq!(sniffed.content_type, OCTET_STREAM);
    }
}
