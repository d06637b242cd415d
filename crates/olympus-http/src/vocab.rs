use std::fmt::{self, Display, Formatter};

/// HTTP request method.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `PUT`
    Put,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
    /// The request didn't name a supported method, or was malformed.
    #[default]
    Unknown,
}

impl Method {
    /// Match an uppercase method token.
    ///
    /// Anything that isn't a supported method becomes `Unknown`.
    pub fn from_token(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "PUT" => Method::Put,
            "POST" => Method::Post,
            "DELETE" => Method::Delete,
            _ => Method::Unknown,
        }
    }

    /// Uppercase method token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
            Method::Unknown => "UNKNOWN",
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// 100, interim response to `Expect: 100-continue`.
    Continue,
    /// 200
    Ok,
    /// 201
    Created,
    /// 400
    BadRequest,
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 500
    ServerError,
    /// 503
    ServiceUnavailable,
}

impl Status {
    /// Numeric status code.
    pub fn code(&self) -> u16 {
        match self {
            Status::Continue => 100,
            Status::Ok => 200,
            Status::Created => 201,
            Status::BadRequest => 400,
            Status::Unauthorized => 401,
            Status::Forbidden => 403,
            Status::NotFound => 404,
            Status::ServerError => 500,
            Status::ServiceUnavailable => 503,
        }
    }

    /// Reason phrase of the status line.
    pub fn reason(&self) -> &'static str {
        match self {
            Status::Continue => "Continue",
            Status::Ok => "OK",
            Status::Created => "Created",
            Status::BadRequest => "Bad Request",
            Status::Unauthorized => "Unauthorized",
            Status::Forbidden => "Forbidden",
            Status::NotFound => "Not Found",
            Status::ServerError => "Server Error",
            Status::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// Returns true for interim 1xx statuses.
    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.code())
    }
}

/// Formats as the status line phrase, for example "404 Not Found".
impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

/// Content type of a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// UTF-8 HTML.
    Html,
    /// UTF-8 JSON.
    Json,
}

impl ContentType {
    /// Value of the `Content-Type` header for this type.
    pub fn header_value(&self) -> &'static str {
        match self {
            ContentType::Html => "text/html;charset=utf-8",
            ContentType::Json => "application/json;charset=utf-8",
        }
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.header_value())
    }
}
