use bytes::BytesMut;

use super::*;
use crate::http::Method;

fn buf(bytes: &[u8]) -> BytesMut {
    BytesMut::from(bytes)
}

#[test]
fn parse_head_complete() {
    let mut input = buf(b"GET /index?q=1 HTTP/1.1\r\nhost: example.com\r\n\r\n");
    let head = parse_head(&mut input, 8192).unwrap().unwrap();
    assert_eq!(head.method(), Method::GET);
    assert_eq!(head.target(), "/index?q=1");
    assert_eq!(head.version(), crate::http::Version::HTTP_11);
    assert_eq!(head.host(), Some("example.com"));
    assert!(input.is_empty());
}

#[test]
fn parse_head_partial() {
    let mut input = buf(b"GET / HTTP/1.1\r\nhost: exa");
    assert!(parse_head(&mut input, 8192).unwrap().is_none());
    assert_eq!(&input[..], b"GET / HTTP/1.1\r\nhost: exa");
}

#[test]
fn parse_head_too_large() {
    let mut input = buf(b"GET / HTTP/1.1\r\nx-filler: aaaaaaaaaaaaaaaaaaaaaaaa");
    assert!(matches!(
        parse_head(&mut input, 32),
        Err(ProtocolError::HeadTooLarge)
    ));
}

#[test]
fn parse_head_leaves_body_bytes() {
    let mut input = buf(b"POST /s HTTP/1.1\r\ncontent-length: 2\r\n\r\nhi");
    let head = parse_head(&mut input, 8192).unwrap().unwrap();
    assert_eq!(head.method(), Method::POST);
    assert_eq!(&input[..], b"hi");
}

#[test]
fn keep_alive_defaults() {
    let mut input = buf(b"GET / HTTP/1.1\r\n\r\n");
    let head = parse_head(&mut input, 8192).unwrap().unwrap();
    assert!(head.keep_alive());

    let mut input = buf(b"GET / HTTP/1.1\r\nconnection: close\r\n\r\n");
    let head = parse_head(&mut input, 8192).unwrap().unwrap();
    assert!(!head.keep_alive());

    let mut input = buf(b"GET / HTTP/1.0\r\n\r\n");
    let head = parse_head(&mut input, 8192).unwrap().unwrap();
    assert!(!head.keep_alive());
}

#[test]
fn expect_continue_header() {
    let mut input = buf(b"POST / HTTP/1.1\r\nexpect: 100-continue\r\ncontent-length: 1\r\n\r\n");
    let head = parse_head(&mut input, 8192).unwrap().unwrap();
    assert!(head.expect_continue());
}

fn head_for(extra: &str) -> RequestHead {
    let raw = format!("POST / HTTP/1.1\r\n{extra}\r\n");
    let mut input = BytesMut::from(raw.as_bytes());
    parse_head(&mut input, 8192).unwrap().unwrap()
}

#[test]
fn decoder_negotiation() {
    assert!(BodyDecoder::from_head(&head_for("")).unwrap().is_empty());
    assert!(BodyDecoder::from_head(&head_for("content-length: 0\r\n")).unwrap().is_empty());
    assert!(!BodyDecoder::from_head(&head_for("content-length: 5\r\n")).unwrap().is_empty());
    assert!(
        !BodyDecoder::from_head(&head_for("transfer-encoding: chunked\r\n"))
            .unwrap()
            .is_empty()
    );
}

#[test]
fn decoder_rejects_conflicts() {
    assert!(matches!(
        BodyDecoder::from_head(&head_for(
            "content-length: 5\r\ntransfer-encoding: chunked\r\n"
        )),
        Err(ProtocolError::ConflictingCodings)
    ));
    assert!(matches!(
        BodyDecoder::from_head(&head_for("transfer-encoding: gzip\r\n")),
        Err(ProtocolError::UnknownCoding)
    ));
    assert!(matches!(
        BodyDecoder::from_head(&head_for("content-length: 1\r\ncontent-length: 2\r\n")),
        Err(ProtocolError::InvalidContentLength)
    ));
    assert!(matches!(
        BodyDecoder::from_head(&head_for("content-length: nope\r\n")),
        Err(ProtocolError::InvalidContentLength)
    ));
}

#[test]
fn fixed_length_decode() {
    let mut dec = BodyDecoder::from_head(&head_for("content-length: 5\r\n")).unwrap();
    let mut input = buf(b"he");
    assert_eq!(dec.decode(&mut input).unwrap(), Some(BodyEvent::Data("he".into())));
    assert_eq!(dec.decode(&mut input).unwrap(), None);
    let mut input = buf(b"llo and the rest");
    assert_eq!(dec.decode(&mut input).unwrap(), Some(BodyEvent::Data("llo".into())));
    assert_eq!(dec.decode(&mut input).unwrap(), Some(BodyEvent::End));
    assert_eq!(&input[..], b" and the rest");
}

#[test]
fn chunked_decode() {
    let mut dec = BodyDecoder::from_head(&head_for("transfer-encoding: chunked\r\n")).unwrap();
    let mut input = buf(b"4\r\nwiki\r\n5\r\npedia\r\n0\r\n\r\n");
    assert_eq!(dec.decode(&mut input).unwrap(), Some(BodyEvent::Data("wiki".into())));
    assert_eq!(dec.decode(&mut input).unwrap(), Some(BodyEvent::Data("pedia".into())));
    assert_eq!(dec.decode(&mut input).unwrap(), Some(BodyEvent::End));
}

#[test]
fn chunked_decode_incremental() {
    let mut dec = BodyDecoder::from_head(&head_for("transfer-encoding: chunked\r\n")).unwrap();
    let mut input = buf(b"4\r\nwi");
    assert_eq!(dec.decode(&mut input).unwrap(), Some(BodyEvent::Data("wi".into())));
    assert_eq!(dec.decode(&mut input).unwrap(), None);
    input.extend_from_slice(b"ki\r\n0\r\n");
    assert_eq!(dec.decode(&mut input).unwrap(), Some(BodyEvent::Data("ki".into())));
    assert_eq!(dec.decode(&mut input).unwrap(), None);
    input.extend_from_slice(b"\r\n");
    assert_eq!(dec.decode(&mut input).unwrap(), Some(BodyEvent::End));
}

#[test]
fn chunked_decode_extensions_and_trailers() {
    let mut dec = BodyDecoder::from_head(&head_for("transfer-encoding: chunked\r\n")).unwrap();
    let mut input = buf(b"4;name=value\r\nwiki\r\n0\r\nx-trailer: 1\r\n\r\n");
    assert_eq!(dec.decode(&mut input).unwrap(), Some(BodyEvent::Data("wiki".into())));
    assert_eq!(dec.decode(&mut input).unwrap(), Some(BodyEvent::End));
}

#[test]
fn chunked_rejects_bad_size() {
    let mut dec = ChunkedDecoder::new();
    let mut input = buf(b"zz\r\n");
    assert!(matches!(dec.decode(&mut input), Err(ProtocolError::InvalidChunk)));
}

#[test]
fn chunk_head_encoding() {
    let mut out = BytesMut::new();
    encode_chunk_head(26, &mut out);
    assert_eq!(&out[..], b"1a\r\n");
}
