use olympus_http::{Method, Request};

#[test]
fn parse_request_line() {
    let request = Request::parse(b"DELETE /api/users/42?force=yes HTTP/1.1\r\n\r\n");

    assert!(request.is_valid());
    assert_eq!(request.method(), Method::Delete);
    assert_eq!(request.http_version(), 1.1);
    assert_eq!(request.path(), "/api/users/42?force=yes");
    assert_eq!(request.collections(), ["api", "users"]);
    assert_eq!(request.resource(), "42");
    assert_eq!(request.query("force"), Some("yes"));
}

#[test]
fn parse_every_method() {
    let cases = [
        ("GET", Method::Get),
        ("PUT", Method::Put),
        ("POST", Method::Post),
        ("DELETE", Method::Delete),
        ("get", Method::Get),
    ];

    for (token, expected) in cases {
        let message = format!("{} / HTTP/1.1\r\n\r\n", token);
        let request = Request::parse(message.as_bytes());
        assert_eq!(request.method(), expected, "token {}", token);
    }
}

#[test]
fn parse_version_as_float() {
    let request = Request::parse(b"GET / HTTP/1.0\r\n\r\n");
    assert_eq!(request.http_version(), 1.0);

    let request = Request::parse(b"GET / HTTP/2\r\n\r\n");
    assert_eq!(request.http_version(), 2.0);
}

#[test]
fn unparsable_version_is_invalid() {
    let request = Request::parse(b"GET / HTTP/one\r\n\r\n");
    assert!(!request.is_valid());
}

#[test]
fn missing_token_is_invalid() {
    let messages: [&[u8]; 4] = [
        b"GET /\r\n\r\n",
        b"GET\r\n\r\n",
        b"\r\n\r\n",
        b"",
    ];

    for message in messages {
        let request = Request::parse(message);
        assert!(!request.is_valid());
        assert_eq!(request.method(), Method::Unknown);
        assert_eq!(request.path(), "");
        assert!(request.headers().is_empty());
    }
}

#[test]
fn unsupported_method_is_invalid() {
    let request = Request::parse(b"PATCH /users/1 HTTP/1.1\r\n\r\n");

    assert!(!request.is_valid());
    assert_eq!(request, Request::default());
}

#[test]
fn query_first_occurrence_wins() {
    let request = Request::parse(b"GET /search?a=1&b=2&b=3 HTTP/1.1\r\n\r\n");

    assert_eq!(request.queries().len(), 2);
    assert_eq!(request.query("a"), Some("1"));
    assert_eq!(request.query("b"), Some("2"));
}

#[test]
fn query_starts_at_last_question_mark() {
    let request = Request::parse(b"GET /odd?name?x=1 HTTP/1.1\r\n\r\n");

    assert_eq!(request.resource(), "odd?name");
    assert_eq!(request.query("x"), Some("1"));
}

#[test]
fn query_value_without_key() {
    let request = Request::parse(b"GET /flags?verbose HTTP/1.1\r\n\r\n");

    assert_eq!(request.query(""), Some("verbose"));
}

#[test]
fn single_segment_is_resource() {
    let request = Request::parse(b"GET /users HTTP/1.1\r\n\r\n");

    assert!(request.collections().is_empty());
    assert_eq!(request.resource(), "users");
}

#[test]
fn trailing_slash_leaves_resource_empty() {
    let request = Request::parse(b"GET /users/ HTTP/1.1\r\n\r\n");

    assert_eq!(request.collections(), ["users"]);
    assert_eq!(request.resource(), "");
}

#[test]
fn root_path() {
    let request = Request::parse(b"GET / HTTP/1.1\r\n\r\n");

    assert!(request.collections().is_empty());
    assert_eq!(request.resource(), "");
}

#[test]
fn path_without_slash_is_resource() {
    let request = Request::parse(b"GET users HTTP/1.1\r\n\r\n");

    assert!(request.is_valid());
    assert!(request.collections().is_empty());
    assert_eq!(request.resource(), "users");
}

#[test]
fn header_values_trimmed() {
    let request = Request::parse(
        b"GET / HTTP/1.1\r\nHost:   localhost  \r\nAccept: \"text\"\r\nX-Empty:\r\n\r\n",
    );

    assert_eq!(request.header("Host"), Some("localhost"));
    assert_eq!(request.header("Accept"), Some("text"));
    assert_eq!(request.header("X-Empty"), Some(""));
}

#[test]
fn header_first_occurrence_wins() {
    let request = Request::parse(b"GET / HTTP/1.1\r\nX-Id: 1\r\nX-Id: 2\r\n\r\n");

    assert_eq!(request.header("X-Id"), Some("1"));
}

#[test]
fn header_names_are_case_sensitive() {
    let request = Request::parse(b"GET / HTTP/1.1\r\nhost: localhost\r\n\r\n");

    assert_eq!(request.header("Host"), None);
    assert_eq!(request.header("host"), Some("localhost"));
}

#[test]
fn malformed_header_line_ends_headers() {
    let request = Request::parse(b"GET / HTTP/1.1\r\nA: 1\r\nnot a header\r\nB: 2\r\n\r\n");

    assert_eq!(request.header("A"), Some("1"));
    assert_eq!(request.header("B"), None);
}

#[test]
fn bare_line_feeds() {
    let request = Request::parse(b"GET /a/b HTTP/1.1\nHost: localhost\n\n");

    assert!(request.is_valid());
    assert_eq!(request.resource(), "b");
    assert_eq!(request.header("Host"), Some("localhost"));
}

#[test]
fn leading_blank_lines_ignored() {
    let request = Request::parse(b"\n\nGET /a HTTP/1.1\nHost: localhost\n\n");
    assert!(request.is_valid());
    assert_eq!(request.resource(), "a");
    assert_eq!(request.header("Host"), Some("localhost"));
    assert!(request.body().is_empty());

    let request = Request::parse(b"\r\n\r\nPOST /b HTTP/1.1\r\n\r\nbody");
    assert_eq!(request.resource(), "b");
    assert_eq!(&request.body()[..], b"body");
}

#[test]
fn body_after_head() {
    let request = Request::parse(b"POST /notes HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello world");

    assert_eq!(&request.body()[..], b"hello world");
    assert_eq!(request.header("Content-Length"), Some("11"));
}

#[test]
fn expects_continue_only_on_http_1_1() {
    let request = Request::parse(b"PUT / HTTP/1.1\r\nExpect: 100-continue\r\n\r\n");
    assert!(request.expects_continue());

    let request = Request::parse(b"PUT / HTTP/1.0\r\nExpect: 100-continue\r\n\r\n");
    assert!(!request.expects_continue());

    let request = Request::parse(b"PUT / HTTP/1.1\r\n\r\n");
    assert!(!request.expects_continue());
}
