//! The process-wide default error handler can only be installed once, so it
//! is exercised in a test binary of its own.

use bytes::Bytes;
use http::header::CONTENT_LENGTH;
use http::{Response, StatusCode};
use via_resp::error::{self, handle_error};
use via_resp::{BufferedSink, Error, ResponseSink, ResponseWriter};

fn unavailable(error: &Error) -> Response<Bytes> {
    let mut response = Response::new(Bytes::from(format!("unavailable: {}", error)));
    *response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
    response
}

fn teapot(_: &Error) -> Response<Bytes> {
    let mut response = Response::new(Bytes::from_static(b"teapot"));
    *response.status_mut() = StatusCode::IM_A_TEAPOT;
    response
}

#[tokio::test]
async fn test_writers_resolve_the_installed_default() {
    error::set_default_error_handler(unavailable).unwrap();
    assert!(error::set_default_error_handler(handle_error).is_err());

    let mut sink = BufferedSink::new();

    ResponseWriter::new(&mut sink)
        .write_error(Error::not_exist("down for maintenance"))
        .await
        .unwrap();

    assert_eq!(sink.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    assert_eq!(sink.body(), b"unavailable: down for maintenance");
    assert_eq!(sink.headers()[CONTENT_LENGTH], "33");

    let mut sink = BufferedSink::new();

    via_resp::write_error(&mut sink, Error::invalid("bad input"))
        .await
        .unwrap();

    assert_eq!(sink.status(), Some(StatusCode::SERVICE_UNAVAILABLE));

    let mut sink = BufferedSink::new();
    let mut writer = ResponseWriter::new(&mut sink);

    writer.set_error_handler(teapot);
    writer.write_error(Error::internal("ignored")).await.unwrap();

    assert_eq!(
        sink.status(),
        Some(StatusCode::IM_A_TEAPOT),
        "a handler set on the writer takes priority over the default"
    );
    assert_eq!(sink.body(), b"teapot");
}
