//! Write application outcomes as HTTP responses.
//!

#[cfg(feature = "file")]
mod file;
mod writer;

pub use writer::{
    ResponseWriter, copy, write_bytes, write_error, write_json, write_text, write_unauthorized,
};

#[cfg(feature = "file")]
pub use file::write_file;

pub(crate) const APPLICATION_JSON: &str = "application/json; charset=utf-8";

pub(crate) const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

pub(crate) const NOSNIFF: &str = "nosniff";

pub(crate) const CORS_ALLOW_ORIGIN: &str = "*";

pub(crate) const CORS_ALLOW_HEADERS: &str = "Origin, X-Requested-With, Content-Type, Accept";
