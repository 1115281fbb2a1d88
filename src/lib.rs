//! Write errors, files, bytes, JSON, and text as HTTP responses.
//!
//! A [`ResponseWriter`] wraps a [`ResponseSink`] for the duration of a single
//! response. Each write operation picks the status code and headers for the
//! outcome it is given and streams the body to the sink. When the content
//! type of a body is not known ahead of time, it is detected from the first
//! bytes of the body.
//!
//! ```
//! use via_resp::http::StatusCode;
//! use via_resp::http::header::CONTENT_TYPE;
//! use via_resp::{BufferedSink, Error, ResponseSink, ResponseWriter};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> std::io::Result<()> {
//! let mut sink = BufferedSink::new();
//! let mut writer = ResponseWriter::new(&mut sink);
//!
//! writer.set_cors(true);
//! writer.write_error(Error::not_exist("no such article")).await?;
//!
//! assert_eq!(sink.status(), Some(StatusCode::NOT_FOUND));
//! assert_eq!(sink.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
//! assert_eq!(sink.body(), b"no such article\n");
//! # Ok(())
//! # }
//! ```
//!

pub mod error;
pub mod response;
pub mod sink;
pub mod sniff;

#[doc(inline)]
pub use self::error::{Error, ErrorHandler, ErrorKind, ResultExt};
#[doc(inline)]
pub use self::response::{
    ResponseWriter, copy, write_bytes, write_error, write_json, write_text, write_unauthorized,
};
#[doc(inline)]
pub use self::sink::{BufferedSink, ResponseSink};

#[cfg(feature = "file")]
#[doc(inline)]
pub use self::response::write_file;

pub use http;
