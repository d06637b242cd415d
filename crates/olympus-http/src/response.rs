use bytes::{BufMut, Bytes, BytesMut};

use crate::{ContentType, Status};

const GREETING: &str = "<html><heading>Hi there! I'm a web server for Olympus. :)</heading></html>";

/// Serialized HTTP response.
///
/// The wire representation is produced once, when the response is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: Status,
    data: Bytes,
}

impl Response {
    /// Response over HTTP/1.1 with no extra headers.
    pub fn new(body: impl Into<Bytes>, content_type: ContentType, status: Status) -> Self {
        Self::builder()
            .body(body)
            .content_type(content_type)
            .status(status)
            .build()
    }

    /// Response with only a status, and an empty HTML body.
    pub fn from_status(status: Status) -> Self {
        Self::builder().status(status).build()
    }

    /// Start building a response, see `ResponseBuilder`.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    /// Status the response was built with.
    pub fn status(&self) -> Status {
        self.status
    }

    /// The full response as sent on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Take the wire representation.
    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

/// Greeting page with status 200.
impl Default for Response {
    fn default() -> Self {
        Self::new(GREETING, ContentType::Html, Status::Ok)
    }
}

/// Builder for `Response`.
///
/// Defaults to an empty HTML "200 OK" over HTTP/1.1.
pub struct ResponseBuilder {
    version: f32,
    status: Status,
    content_type: ContentType,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self {
            version: 1.1,
            status: Status::Ok,
            content_type: ContentType::Html,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }
}

impl ResponseBuilder {
    /// HTTP version of the status line, anything other than exactly 1.0 is sent as HTTP/1.1.
    pub fn version(mut self, version: f32) -> Self {
        self.version = version;
        self
    }

    /// Set the status.
    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Set the content type of the body.
    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Add a header, headers are written in the order they're added.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Set the body, `Content-Length` follows from it.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serialize the response.
    pub fn build(self) -> Response {
        let mut data = BytesMut::new();

        // Status line
        let version = if self.version == 1.0 { "1.0" } else { "1.1" };
        let status_line = format!("HTTP/{} {}\r\n", version, self.status);
        data.put(status_line.as_bytes());

        for (key, value) in &self.headers {
            data.put(key.as_bytes());
            data.put(&b": "[..]);
            data.put(value.as_bytes());
            data.put(&b"\r\n"[..]);
        }

        data.put(&b"Content-Type: "[..]);
        data.put(self.content_type.header_value().as_bytes());
        data.put(&b"\r\nContent-Length: "[..]);
        let length = self.body.len().to_string();
        data.put(length.as_bytes());
        data.put(&b"\r\n\r\n"[..]);
        data.put(self.body);

        Response {
            status: self.status,
            data: data.freeze(),
        }
    }
}
