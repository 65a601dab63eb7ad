//! HTTP/1.x request head decoder.
//!
//! Turns the raw bytes of a request line and its header fields into a [`Request`] whose
//! method, uri, protocol version and headers are populated. The body is left empty; the
//! returned offset tells the caller where it starts.
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Maximum head size: 8KB
//! - Only HTTP/1.0 and HTTP/1.1 request lines are understood

use httparse::{Error, Status};
use tracing::trace;

use crate::ensure;
use crate::protocol::{Headers, Message, ParseError, ProtocolVersion, Request, Stream, Uri};

/// Maximum number of headers allowed in a request
pub const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire head
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Decodes a request head from `src`.
///
/// # Returns
///
/// - `Ok(Some((request, body_offset)))` if a complete head was parsed
/// - `Ok(None)` if more data is needed
/// - `Err(ParseError)` if the head is malformed or exceeds the limits
pub fn decode_head(src: &[u8]) -> Result<Option<(Request, usize)>, ParseError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let mut req = httparse::Request::new(&mut headers);

    let parsed_result = req.parse(src).map_err(|e| match e {
        Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
        e => ParseError::invalid_header(e.to_string()),
    });

    match parsed_result? {
        Status::Complete(body_offset) => {
            trace!(body_offset, header_count = req.headers.len(), "parsed request head");
            ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));

            let version = match req.version {
                Some(0) => ProtocolVersion::Http10,
                Some(1) => ProtocolVersion::Http11,
                _ => return Err(ParseError::InvalidVersion(req.version)),
            };

            let method = req.method.ok_or(ParseError::InvalidMethod)?;
            let target = req.path.ok_or_else(|| ParseError::invalid_uri("missing request target"))?;
            let uri = Uri::parse(target).map_err(ParseError::invalid_uri)?;

            let mut header_map = Headers::new();
            for header in req.headers.iter() {
                match std::str::from_utf8(header.value) {
                    Ok(value) => header_map.add(header.name, value).map_err(ParseError::invalid_header)?,
                    Err(e) => trace!(header = header.name, cause = %e, "skipped non utf-8 header value"),
                }
            }

            let message = Message::from_parts(version, header_map, Stream::memory());
            Ok(Some((Request::from_parts(method, uri, message), body_offset)))
        }
        Status::Partial => {
            ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::protocol::{HttpMessage, HttpRequest};

    #[test]
    fn body_offset() {
        let str = indoc! {r##"
        GET /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        123"##};

        let (_, body_offset) = decode_head(str.as_bytes()).unwrap().unwrap();

        assert_eq!(&str.as_bytes()[body_offset..], b"123");
    }

    #[test]
    fn from_curl() {
        let str = indoc! {r##"
        GET /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        "##};

        let (request, _) = decode_head(str.as_bytes()).unwrap().unwrap();

        assert_eq!(request.method(), "GET");
        assert_eq!(request.protocol_version(), ProtocolVersion::Http11);
        assert_eq!(request.uri().host(), "");
        assert_eq!(request.uri().path(), "/index.html");
        assert_eq!(request.uri().scheme(), "");
        assert_eq!(request.uri().query(), "");

        assert_eq!(request.headers().len(), 3);
        assert_eq!(request.header_line("accept"), "*/*");
        assert_eq!(request.header_line("host"), "127.0.0.1:8080");
        assert_eq!(request.header_line("user-agent"), "curl/7.79.1");
    }

    #[test]
    fn from_edge() {
        let str = indoc! {r##"
        GET /index/?a=1&b=2&a=3 HTTP/1.1
        Host: 127.0.0.1:8080
        Connection: keep-alive
        Cache-Control: max-age=0
        sec-ch-ua: "#Not_A Brand";v="99", "Microsoft Edge";v="109", "Chromium";v="109"
        sec-ch-ua-mobile: ?0
        sec-ch-ua-platform: "macOS"
        Upgrade-Insecure-Requests: 1
        User-Agent: Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36 Edg/109.0.1518.52
        Accept: text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9
        Sec-Fetch-Site: none
        Sec-Fetch-Mode: navigate
        Sec-Fetch-User: ?1
        Sec-Fetch-Dest: document
        Accept-Encoding: gzip, deflate, br
        Accept-Language: zh-CN,zh;q=0.9,en-US;q=0.8,en;q=0.7

        "##};

        let (request, _) = decode_head(str.as_bytes()).unwrap().unwrap();

        assert_eq!(request.uri().path(), "/index/");
        assert_eq!(request.uri().raw_query(), "a=1&b=2&a=3");
        assert_eq!(request.uri().query_params().get("a").map(String::as_str), Some("3"));
        assert_eq!(request.request_target(), "/index/?a=1&b=2&a=3");

        assert_eq!(request.headers().len(), 15);
        assert_eq!(request.header_line("connection"), "keep-alive");
        assert_eq!(request.header_line("sec-ch-ua"), r##""#Not_A Brand";v="99", "Microsoft Edge";v="109", "Chromium";v="109""##);
        assert_eq!(request.header_line("sec-ch-ua-platform"), "\"macOS\"");
        assert_eq!(request.header_line("Accept-Encoding"), "gzip, deflate, br");
        assert_eq!(request.header_line("accept-language"), "zh-CN,zh;q=0.9,en-US;q=0.8,en;q=0.7");
    }

    #[test]
    fn repeated_headers_are_kept() {
        let str = "GET / HTTP/1.1\r\nAccept: text/html\r\naccept: */*\r\n\r\n";

        let (request, _) = decode_head(str.as_bytes()).unwrap().unwrap();

        assert_eq!(request.header("Accept"), ["text/html", "*/*"]);
    }

    #[test]
    fn non_utf8_values_are_skipped() {
        let mut head = b"GET / HTTP/1.1\r\nHost: localhost\r\nX-Legacy: caf".to_vec();
        head.extend_from_slice(&[0xE9]);
        head.extend_from_slice(b"\r\nAccept: */*\r\n\r\n");

        let (request, body_offset) = decode_head(&head).unwrap().unwrap();

        assert_eq!(body_offset, head.len());
        assert!(!request.has_header("x-legacy"));
        assert_eq!(request.header_line("host"), "localhost");
        assert_eq!(request.header_line("accept"), "*/*");
    }

    #[test]
    fn partial_head() {
        assert!(decode_head(b"GET /index.html HTTP/1.1\r\nHost: 127.0.0.1").unwrap().is_none());
        assert!(decode_head(b"").unwrap().is_none());
    }

    #[test]
    fn too_large_head() {
        let mut head = b"GET / HTTP/1.1\r\nX-Padding: ".to_vec();
        head.resize(MAX_HEADER_BYTES + 1, b'a');

        assert!(matches!(decode_head(&head), Err(ParseError::TooLargeHeader { .. })));
    }

    #[test]
    fn too_many_headers() {
        let mut head = String::from("GET / HTTP/1.1\r\n");
        for i in 0..=MAX_HEADER_NUM {
            head.push_str(&format!("X-{i}: {i}\r\n"));
        }
        head.push_str("\r\n");

        assert!(matches!(decode_head(head.as_bytes()), Err(ParseError::TooManyHeaders { .. })));
    }

    #[test]
    fn malformed_head() {
        assert!(matches!(decode_head(b"GET / HTTP/1.1\r\nBad Header\r\n\r\n"), Err(ParseError::InvalidHeader { .. })));
    }
}
