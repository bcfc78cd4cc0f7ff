use std::time::Duration;

use super::*;
use crate::http::StatusCode;
use crate::session::SessionStore;

fn response() -> (Response, mpsc::Receiver<OutFrame>) {
    let (tx, rx) = mpsc::channel(8);
    (Response::new(tx, true, false, Some("example.com:8080".to_owned())), rx)
}

fn head_str(frame: OutFrame) -> (String, Framing, bool) {
    match frame {
        OutFrame::Head { bytes, framing, body_allowed } => {
            (String::from_utf8(bytes.to_vec()).unwrap(), framing, body_allowed)
        }
        other => panic!("expected head frame, got {other:?}"),
    }
}

#[tokio::test]
async fn buffered_close_uses_content_length() {
    let (mut res, mut rx) = response();
    res.set_content_type("text/plain");
    let mut out = res.output().unwrap();
    out.write(b"hello world").await.unwrap();
    out.close().await.unwrap();

    let (head, framing, body_allowed) = head_str(rx.try_recv().unwrap());
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(head.contains("content-type: text/plain\r\n"));
    assert!(head.contains("content-length: 11\r\n"));
    assert_eq!(framing, Framing::Fixed(11));
    assert!(body_allowed);

    assert!(matches!(rx.try_recv().unwrap(), OutFrame::Data(data) if &data[..] == b"hello world"));
    assert!(matches!(rx.try_recv().unwrap(), OutFrame::End { close: false }));
}

#[tokio::test]
async fn explicit_flush_commits_chunked() {
    let (mut res, mut rx) = response();
    let mut out = res.output().unwrap();
    out.write(b"part one ").await.unwrap();
    out.flush().await.unwrap();
    out.write(b"part two").await.unwrap();
    out.close().await.unwrap();

    let (head, framing, _) = head_str(rx.try_recv().unwrap());
    assert!(head.contains("transfer-encoding: chunked\r\n"));
    assert!(!head.contains("content-length"));
    assert_eq!(framing, Framing::Chunked);

    assert!(matches!(rx.try_recv().unwrap(), OutFrame::Data(data) if &data[..] == b"part one "));
    assert!(matches!(rx.try_recv().unwrap(), OutFrame::Data(data) if &data[..] == b"part two"));
    assert!(matches!(rx.try_recv().unwrap(), OutFrame::End { close: false }));
}

#[tokio::test]
async fn full_buffer_triggers_flush() {
    let (mut res, mut rx) = response();
    res.set_buffer_size(4).unwrap();
    let mut out = res.output().unwrap();
    out.write(b"123456").await.unwrap();

    let (_, framing, _) = head_str(rx.try_recv().unwrap());
    assert_eq!(framing, Framing::Chunked);
    assert!(matches!(rx.try_recv().unwrap(), OutFrame::Data(data) if &data[..] == b"123456"));
    assert!(res.is_committed());
}

#[tokio::test]
async fn declared_length_kept_on_flush() {
    let (mut res, mut rx) = response();
    res.set_content_length(6);
    let mut out = res.output().unwrap();
    out.write(b"abc").await.unwrap();
    out.flush().await.unwrap();
    out.write(b"def").await.unwrap();
    out.close().await.unwrap();

    let (_, framing, _) = head_str(rx.try_recv().unwrap());
    assert_eq!(framing, Framing::Fixed(6));
}

#[tokio::test]
async fn setters_ignored_after_commit() {
    let (mut res, mut rx) = response();
    res.set_header("x-early", "1");
    let mut out = res.output().unwrap();
    out.flush().await.unwrap();

    res.set_status(StatusCode::NOT_FOUND);
    res.set_header("x-late", "1");
    res.set_content_type("text/html");
    assert_eq!(res.status(), StatusCode::OK);

    let (head, _, _) = head_str(rx.try_recv().unwrap());
    assert!(head.contains("x-early: 1\r\n"));
    assert!(!head.contains("x-late"));
}

#[tokio::test]
async fn send_error_fails_after_commit() {
    let (mut res, _rx) = response();
    res.output().unwrap().flush().await.unwrap();
    assert!(matches!(
        res.send_error(StatusCode::INTERNAL_SERVER_ERROR).await,
        Err(StreamError::Committed)
    ));
    assert!(matches!(res.send_redirect("/").await, Err(StreamError::Committed)));
}

#[tokio::test]
async fn send_error_has_empty_body() {
    let (mut res, mut rx) = response();
    res.send_error(StatusCode::NOT_FOUND).await.unwrap();

    let (head, framing, _) = head_str(rx.try_recv().unwrap());
    assert!(head.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert_eq!(framing, Framing::Fixed(0));
    assert!(matches!(rx.try_recv().unwrap(), OutFrame::End { close: false }));
}

#[tokio::test]
async fn send_redirect_sets_location() {
    let (mut res, mut rx) = response();
    res.send_redirect("/app/").await.unwrap();

    let (head, _, _) = head_str(rx.try_recv().unwrap());
    assert!(head.starts_with("HTTP/1.1 302 Found\r\n"));
    assert!(head.contains("location: /app/\r\n"));
}

#[tokio::test]
async fn buffer_guards() {
    let (mut res, _rx) = response();
    let mut out = res.output().unwrap();
    out.write(b"buffered").await.unwrap();
    drop(out);

    assert!(matches!(res.set_buffer_size(64), Err(StreamError::BufferInUse)));
    res.reset_buffer().unwrap();
    res.set_buffer_size(64).unwrap();
    assert_eq!(res.buffer_size(), 64);

    res.output().unwrap().flush().await.unwrap();
    assert!(matches!(res.reset_buffer(), Err(StreamError::Committed)));
    assert!(matches!(res.set_buffer_size(64), Err(StreamError::Committed)));
}

#[tokio::test]
async fn buffer_size_is_clamped() {
    let (mut res, _rx) = response();
    res.set_buffer_size(usize::MAX).unwrap();
    assert_eq!(res.buffer_size(), MAX_BUFFER_SIZE);
}

#[tokio::test]
async fn writer_and_stream_are_exclusive() {
    let (mut res, _rx) = response();
    let _ = res.output().unwrap();
    assert!(matches!(res.writer(), Err(StreamError::StreamAlreadyTaken)));

    let (mut res, _rx) = response();
    let _ = res.writer().unwrap();
    assert!(matches!(res.output(), Err(StreamError::WriterAlreadyTaken)));
    // the same mode can be taken again
    let _ = res.writer().unwrap();
}

#[tokio::test]
async fn new_session_cookie_rendered_once() {
    let store = SessionStore::new(Duration::from_secs(1800));
    let session = store.create();

    let (mut res, mut rx) = response();
    res.set_session(session.clone());
    res.finish().await.unwrap();

    let (head, _, _) = head_str(rx.try_recv().unwrap());
    let expected = format!("set-cookie: SESSIONID={}; path=/; domain=example.com; HttpOnly\r\n", session.id());
    assert!(head.contains(&expected));
    assert!(!session.is_new());

    // an established session is not set again
    let (mut res, mut rx) = response();
    res.set_session(session);
    res.finish().await.unwrap();
    let (head, _, _) = head_str(rx.try_recv().unwrap());
    assert!(!head.contains("set-cookie"));
}

#[tokio::test]
async fn no_body_status_suppresses_data() {
    let (mut res, mut rx) = response();
    res.set_status(StatusCode::NO_CONTENT);
    let mut out = res.output().unwrap();
    out.write(b"ignored").await.unwrap();
    out.close().await.unwrap();

    let (head, framing, body_allowed) = head_str(rx.try_recv().unwrap());
    assert!(head.starts_with("HTTP/1.1 204 No Content\r\n"));
    assert_eq!(framing, Framing::Fixed(0));
    assert!(!body_allowed);
    assert!(matches!(rx.try_recv().unwrap(), OutFrame::End { .. }));
}

#[tokio::test]
async fn head_request_keeps_length_drops_data() {
    let (tx, mut rx) = mpsc::channel(8);
    let mut res = Response::new(tx, true, true, None);
    let mut out = res.output().unwrap();
    out.write(b"body for get").await.unwrap();
    out.close().await.unwrap();

    let (head, framing, body_allowed) = head_str(rx.try_recv().unwrap());
    assert!(head.contains("content-length: 12\r\n"));
    assert_eq!(framing, Framing::Fixed(12));
    assert!(!body_allowed);
    assert!(matches!(rx.try_recv().unwrap(), OutFrame::End { .. }));
}

#[tokio::test]
async fn close_header_when_not_keep_alive() {
    let (tx, mut rx) = mpsc::channel(8);
    let mut res = Response::new(tx, false, false, None);
    res.finish().await.unwrap();

    let (head, _, _) = head_str(rx.try_recv().unwrap());
    assert!(head.contains("connection: close\r\n"));
    assert!(matches!(rx.try_recv().unwrap(), OutFrame::End { close: true }));
}

#[tokio::test]
async fn finish_is_idempotent() {
    let (mut res, mut rx) = response();
    res.finish().await.unwrap();
    res.finish().await.unwrap();

    rx.try_recv().unwrap();
    assert!(matches!(rx.try_recv().unwrap(), OutFrame::End { .. }));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn dropped_receiver_aborts() {
    let (mut res, rx) = response();
    drop(rx);
    assert!(matches!(res.finish().await, Err(StreamError::Aborted)));
}
