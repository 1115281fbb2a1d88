use http::header::{CONTENT_LENGTH, LAST_MODIFIED};
use http::{HeaderValue, StatusCode};
use httpdate::HttpDate;
use std::io;
use std::path::Path;
use tokio::fs::File;

use super::ResponseWriter;
use crate::error::Error;
use crate::sink::ResponseSink;

impl<S: ResponseSink> ResponseWriter<S> {
    /// Respond with the contents of the file at `path`.
    ///
    /// The `Last-Modified` and `Content-Length` headers are derived from the
    /// file's metadata. If the file cannot be opened or inspected, an error
    /// response is written instead. The file is closed before this method
    /// returns.
    ///
    pub async fn write_file(
        &mut self,
        status: StatusCode,
        path: impl AsRef<Path>,
    ) -> io::Result<()> {
        let path = path.as_ref();

        let file = match File::open(path).await {
            Ok(file) => file,
            Err(error) => return self.write_error(error).await,
        };

        let metadata = match file.metadata().await {
            Ok(metadata) => metadata,
            Err(error) => return self.write_error(error).await,
        };

        if metadata.is_dir() {
            let message = format!("{} is a directory", path.display());
            return self.write_error(Error::not_exist(message)).await;
        }

        let headers = self.headers_mut();

        match metadata.modified() {
            Ok(modified) => {
                let last_modified = HttpDate::from(modified).to_string();

                if let Ok(value) = HeaderValue::try_from(last_modified) {
                    headers.insert(LAST_MODIFIED, value);
                }
            }
            Err(error) => {
                tracing::debug!(path = %path.display(), %error, "omitting last-modified");
            }
        }

        headers.insert(CONTENT_LENGTH, metadata.len().into());

        self.copy(status, file).await
    }
}

/// Writes the file at `path` to `sink` with the provided status code.
///
pub async fn write_file<S>(sink: S, status: StatusCode, path: impl AsRef<Path>) -> io::Result<()>
where
    S: ResponseSink,
{
    ResponseWriter::new(sink).write_file(status, path).await
}
