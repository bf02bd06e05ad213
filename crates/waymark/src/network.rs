//! Network request types.
//!
//! Method and path matching, canned responses, and the request/response pair
//! bound to an alias once an intercepted call completes.

use crate::fixture::FixtureStore;
use crate::result::{WaymarkError, WaymarkResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// HTTP methods for request matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET request
    Get,
    /// POST request
    Post,
    /// PUT request
    Put,
    /// PATCH request
    Patch,
    /// DELETE request
    Delete,
    /// HEAD request
    Head,
    /// OPTIONS request
    Options,
}

impl HttpMethod {
    /// Convert to string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = WaymarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(WaymarkError::InvalidMethod {
                method: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pattern matched against a request's pathname
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathPattern {
    /// Exact pathname
    Exact(String),
    /// Wildcard pattern: a final `*` matches the rest of the path, a `*`
    /// elsewhere matches within a single segment
    Wildcard(String),
    /// Regular expression
    Regex(String),
}

impl PathPattern {
    /// Parse a pattern: `re:` prefix is a regex, anything containing `*` is a
    /// wildcard, everything else is exact
    pub fn parse(pattern: &str) -> WaymarkResult<Self> {
        if let Some(re) = pattern.strip_prefix("re:") {
            regex::Regex::new(re).map_err(|e| WaymarkError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;
            return Ok(Self::Regex(re.to_string()));
        }
        if !pattern.starts_with('/') {
            return Err(WaymarkError::InvalidPattern {
                pattern: pattern.to_string(),
                message: "path patterns must start with '/'".to_string(),
            });
        }
        if pattern.contains('*') {
            Ok(Self::Wildcard(pattern.to_string()))
        } else {
            Ok(Self::Exact(pattern.to_string()))
        }
    }

    /// Check if a URL or pathname matches this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        let path = pathname(url);
        match self {
            Self::Exact(pattern) => path == pattern,
            Self::Wildcard(pattern) => wildcard_matches(pattern, path),
            Self::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(path))
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(s) | Self::Wildcard(s) => f.write_str(s),
            Self::Regex(s) => write!(f, "re:{}", s),
        }
    }
}

/// Strip origin, query string and fragment from a URL
#[must_use]
pub fn pathname(url: &str) -> &str {
    let without_origin = match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            rest.find('/').map_or("/", |i| &rest[i..])
        }
        None => url,
    };
    let end = without_origin
        .find(['?', '#'])
        .unwrap_or(without_origin.len());
    &without_origin[..end]
}

fn wildcard_matches(pattern: &str, path: &str) -> bool {
    regex::Regex::new(&wildcard_regex(pattern))
        .map(|re| re.is_match(path))
        .unwrap_or(false)
}

/// Anchored regex for a wildcard pattern: a final bare `*` segment matches
/// the non-empty remainder, a bare `*` elsewhere one non-empty segment, and
/// a `*` inside a segment any run of non-`/` characters
fn wildcard_regex(pattern: &str) -> String {
    let segments: Vec<&str> = pattern.split('/').collect();
    let last = segments.len() - 1;
    let body: Vec<String> = segments
        .iter()
        .enumerate()
        .map(|(i, segment)| match *segment {
            "*" if i == last => ".+".to_string(),
            "*" => "[^/]+".to_string(),
            _ => segment
                .split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join("[^/]*"),
        })
        .collect();
    format!("^{}$", body.join("/"))
}

/// A stubbed response substituted for a real backend call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CannedResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: BTreeMap<String, String>,
    /// JSON body
    pub body: serde_json::Value,
    /// Artificial delay in milliseconds
    pub delay_ms: u64,
}

impl Default for CannedResponse {
    fn default() -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            body: serde_json::Value::Null,
            delay_ms: 0,
        }
    }
}

impl CannedResponse {
    /// Create an empty 200 response
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a JSON response
    #[must_use]
    pub fn json(body: serde_json::Value) -> Self {
        Self {
            body,
            ..Self::default()
        }
    }

    /// Create a response whose body is a fixture document
    pub fn from_fixture(store: &FixtureStore, name: &str) -> WaymarkResult<Self> {
        Ok(Self::json(store.load(name)?))
    }

    /// Set status code
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Set body
    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = body;
        self
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    /// Set delay
    #[must_use]
    pub const fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// The response a stubbed call observes
    #[must_use]
    pub fn to_response(&self) -> InterceptedResponse {
        InterceptedResponse {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

/// An outbound request issued by the page under test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterceptedRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Full URL or pathname
    pub url: String,
    /// Request headers
    pub headers: BTreeMap<String, String>,
    /// JSON body, if any
    pub body: Option<serde_json::Value>,
}

impl InterceptedRequest {
    /// Create a request without body
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Attach a JSON body
    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    /// Request pathname
    #[must_use]
    pub fn path(&self) -> &str {
        pathname(&self.url)
    }
}

/// Response observed for an intercepted request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterceptedResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: BTreeMap<String, String>,
    /// JSON body
    pub body: serde_json::Value,
}

impl InterceptedResponse {
    /// Create a response
    #[must_use]
    pub fn new(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body,
        }
    }
}

/// The realised request/response pair bound to an alias
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterceptedExchange {
    /// Alias the exchange was bound to
    pub alias: String,
    /// Request as issued
    pub request: InterceptedRequest,
    /// Response as observed
    pub response: InterceptedResponse,
    /// Whether the response came from a canned stub
    pub stubbed: bool,
}

impl InterceptedExchange {
    /// Value at a JSON pointer inside the response body (e.g. `/fieldErrors`)
    #[must_use]
    pub fn response_json_at(&self, pointer: &str) -> Option<&serde_json::Value> {
        self.response.body.pointer(pointer)
    }

    /// Value at a JSON pointer inside the request body
    #[must_use]
    pub fn request_json_at(&self, pointer: &str) -> Option<&serde_json::Value> {
        self.request.body.as_ref().and_then(|b| b.pointer(pointer))
    }
}
