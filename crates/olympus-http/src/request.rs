use std::collections::HashMap;

use bytes::Bytes;

use crate::{framing, Method};

/// Parsed HTTP request.
///
/// A request is immutable once parsed.
/// Parsing never fails, a malformed request line instead results in an invalid request, with an
/// `Unknown` method and every other field left empty.
///
/// Strings are kept exactly as received, nothing is percent-decoded or case-normalized.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Request {
    method: Method,
    http_version: f32,
    path: String,
    collections: Vec<String>,
    resource: String,
    queries: HashMap<String, String>,
    headers: HashMap<String, String>,
    body: Bytes,
}

impl Request {
    /// Parse a complete message, head and optional body.
    pub fn parse(message: &[u8]) -> Self {
        // Empty lines before the request line are ignored, as they are when framing
        let leading = message
            .iter()
            .take_while(|byte| matches!(byte, b'\r' | b'\n'))
            .count();
        let message = &message[leading..];

        let (head, body) = match framing::head_length(message) {
            Some(length) => message.split_at(length),
            None => (message, &[][..]),
        };
        let text = String::from_utf8_lossy(head);
        let mut lines = text.lines();

        // Request line
        let mut tokens = lines.next().unwrap_or_default().split_whitespace();
        let method = tokens.next().unwrap_or_default();
        let path = tokens.next().unwrap_or_default();
        let protocol = tokens.next().unwrap_or_default();
        if method.is_empty() || path.is_empty() || protocol.is_empty() {
            return Self::default();
        }

        let method = Method::from_token(&method.to_ascii_uppercase());
        if method == Method::Unknown {
            return Self::default();
        }

        // "HTTP/1.1" or a bare "1.1"
        let version = protocol.split_once('/').map_or(protocol, |(_, v)| v);
        let Ok(http_version) = version.parse::<f32>() else {
            return Self::default();
        };

        // The last '?' starts the query, not the first
        let (route, query) = match path.rfind('?') {
            Some(index) => (&path[..index], Some(&path[index + 1..])),
            None => (path, None),
        };

        let (collections, resource) = parse_segments(route);

        Self {
            method,
            http_version,
            path: path.to_string(),
            collections,
            resource,
            queries: query.map(parse_queries).unwrap_or_default(),
            headers: parse_headers(lines),
            body: Bytes::copy_from_slice(body),
        }
    }

    /// Returns false if the request line was missing a token or named an unsupported method.
    pub fn is_valid(&self) -> bool {
        self.method != Method::Unknown
    }

    /// Request method, `Unknown` for invalid requests.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Version from the protocol token, for example 1.1 for "HTTP/1.1".
    pub fn http_version(&self) -> f32 {
        self.http_version
    }

    /// Request target as received, including the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path segments before the resource.
    ///
    /// For "/users/42/posts" this is `["users", "42"]`.
    pub fn collections(&self) -> &[String] {
        &self.collections
    }

    /// Last path segment, empty if the path ends in a slash.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Get a query parameter value, the key must match exactly.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.queries.get(key).map(String::as_str)
    }

    /// All query parameters.
    ///
    /// Iteration order is unspecified.
    pub fn queries(&self) -> &HashMap<String, String> {
        &self.queries
    }

    /// Get a header value, the name must match exactly.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// All headers.
    ///
    /// Iteration order is unspecified.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Bytes following the head, empty if there are none.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns true if an HTTP/1.1 client waits for "100 Continue" before sending its body.
    pub fn expects_continue(&self) -> bool {
        self.http_version == 1.1 && self.header("Expect") == Some("100-continue")
    }
}

fn parse_segments(route: &str) -> (Vec<String>, String) {
    let route = route.strip_prefix('/').unwrap_or(route);

    let mut collections: Vec<String> = route.split('/').map(str::to_string).collect();
    let resource = collections.pop().unwrap_or_default();

    (collections, resource)
}

fn parse_queries(query: &str) -> HashMap<String, String> {
    let mut queries = HashMap::new();

    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or(("", pair));

        // First occurrence wins
        queries
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }

    queries
}

fn parse_headers<'a>(lines: impl Iterator<Item = &'a str>) -> HashMap<String, String> {
    let mut headers = HashMap::new();

    for line in lines {
        // Blank line ends the head
        let Some((key, value)) = line.split_once(':') else {
            break;
        };

        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            break;
        }

        let value = value.trim_matches(|c: char| !c.is_ascii_alphanumeric());

        headers
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }

    headers
}
