use nocturne::http::parser::{ParseError, ParseLimits, parse_http_request, parse_http_request_limited};
use nocturne::http::request::Method;

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::GET);
    assert_eq!(parsed.path, "/");
    assert_eq!(parsed.version, "HTTP/1.1");
    assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
    assert!(parsed.body.is_empty());
    assert!(!parsed.secure);
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_post_request_with_body() {
    let req = b"POST /api HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::POST);
    assert_eq!(parsed.path, "/api");
    assert_eq!(parsed.body, b"hello".to_vec());
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_body_is_cut_at_content_length() {
    let req = b"POST /api HTTP/1.1\r\nContent-Length: 2\r\n\r\nhello";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.body, b"he".to_vec());
    assert_eq!(&req[consumed..], b"llo");
}

#[test]
fn test_parse_multiple_headers() {
    let req = b"GET /path HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test-client\r\nAccept: */*\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.headers.len(), 3);
    assert_eq!(parsed.headers.get("User-Agent").unwrap(), "test-client");
    assert_eq!(parsed.headers.get("Accept").unwrap(), "*/*");
}

#[test]
fn test_parse_header_value_keeps_inner_separator() {
    let req = b"GET / HTTP/1.1\r\nX-Note: a: b\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.header("X-Note"), Some("a: b"));
}

#[test]
fn test_parse_header_names_are_case_sensitive() {
    let req = b"GET / HTTP/1.1\r\nhost: example.com\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.header("host"), Some("example.com"));
    assert_eq!(parsed.header("Host"), None);
}

#[test]
fn test_parse_request_with_path_and_query_string() {
    let req = b"GET /search?q=rust HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.path, "/search?q=rust");
    assert_eq!(parsed.route_path(), "/search");
}

#[test]
fn test_parse_incomplete_request_missing_blank_line() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n";
    let result = parse_http_request(req);

    assert!(matches!(result, Err(ParseError::Incomplete)));
}

#[test]
fn test_parse_incomplete_request_partial_body() {
    let req = b"POST /api HTTP/1.1\r\nContent-Length: 10\r\n\r\nhello";
    let result = parse_http_request(req);

    assert!(matches!(result, Err(ParseError::Incomplete)));
}

#[test]
fn test_parse_unknown_method() {
    let req = b"BREW /pot HTTP/1.1\r\n\r\n";
    let err = parse_http_request(req).unwrap_err();

    assert_eq!(err, ParseError::InvalidMethod);
    assert_eq!(err.status().as_u16(), 400);
}

#[test]
fn test_parse_request_line_missing_version() {
    let req = b"GET /\r\nHost: example.com\r\n\r\n";

    assert_eq!(parse_http_request(req).unwrap_err(), ParseError::InvalidRequest);
}

#[test]
fn test_parse_header_without_separator() {
    let req = b"GET / HTTP/1.1\r\nBroken\r\n\r\n";

    assert_eq!(parse_http_request(req).unwrap_err(), ParseError::InvalidHeader);
}

#[test]
fn test_parse_non_numeric_content_length() {
    let req = b"POST / HTTP/1.1\r\nContent-Length: ten\r\n\r\n";

    assert_eq!(parse_http_request(req).unwrap_err(), ParseError::InvalidContentLength);
}

#[test]
fn test_parse_body_over_limit() {
    let limits = ParseLimits {
        max_head_bytes: 1024,
        max_body_bytes: 4,
    };
    let req = b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
    let err = parse_http_request_limited(req, limits).unwrap_err();

    assert_eq!(err, ParseError::BodyTooLarge(4));
    assert_eq!(err.status().as_u16(), 413);
}

#[test]
fn test_parse_body_limit_checked_before_body_arrives() {
    let limits = ParseLimits {
        max_head_bytes: 1024,
        max_body_bytes: 4,
    };
    let req = b"POST / HTTP/1.1\r\nContent-Length: 500\r\n\r\n";

    assert_eq!(
        parse_http_request_limited(req, limits).unwrap_err(),
        ParseError::BodyTooLarge(4)
    );
}

#[test]
fn test_parse_lowercase_content_length() {
    let req = b"POST /echo HTTP/1.1\r\nhost: x\r\ncontent-length: 5\r\n\r\nhello";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.body, b"hello".to_vec());
    assert_eq!(consumed, req.len());
    // Header names stay as the client sent them
    assert_eq!(parsed.header("content-length"), Some("5"));
    assert_eq!(parsed.header("Content-Length"), None);
    assert_eq!(parsed.content_length(), 5);
}

#[test]
fn test_parse_mixed_case_content_length_waits_for_body() {
    let req = b"POST /echo HTTP/1.1\r\nCONTENT-LENGTH: 5\r\n\r\nhel";

    assert!(matches!(parse_http_request(req), Err(ParseError::Incomplete)));
}
