//! HTTP requests and responses as plain data.
//!
//! # Design
//! `ImageStore::build_*` methods describe each request as an `HttpRequest`
//! without touching the network, and buffered responses come back as an
//! `HttpResponse` before parsing. Only the transport module talks to `ureq`,
//! so everything on either side of it can be tested offline.

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `form` holds URL-encoded body fields. An empty `form` on POST or PUT is
/// sent as an empty body.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub form: Vec<(String, String)>,
}

/// A fully buffered HTTP response.
///
/// Returned as-is by `ImageStore::delete`, and fed to
/// `ImageStore::parse_json` by the JSON operations.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
