use crate::ids::{RequestId, REQUEST_ID_HEADER};
use http::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage for requests and responses.
///
/// Names are `Arc<str>` because the same few names repeat on every request.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Request descriptor handed to every handler invocation.
///
/// The url is compared verbatim against registrations: the query string, if
/// the listener passes one, is part of the key.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Id shared by every log line of this request
    pub request_id: RequestId,
    pub method: Method,
    pub url: String,
    pub headers: HeaderVec,
}

impl RequestContext {
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            url: url.into(),
            headers: HeaderVec::new(),
        }
    }

    /// Add a request header. An `x-request-id` header carrying a usable ULID
    /// becomes the request id; any other value leaves the id unchanged.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if name.eq_ignore_ascii_case(REQUEST_ID_HEADER) {
            if let Some(id) = RequestId::from_header(&value) {
                self.request_id = id;
            }
        }
        self.headers.push((Arc::from(name), value));
        self
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Bytes handed to a handler: one raw chunk in streaming mode, the whole
/// concatenated body in buffered mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payload<'a>(&'a [u8]);

impl<'a> Payload<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the payload as UTF-8 text
    pub fn as_str(&self) -> Result<&'a str, std::str::Utf8Error> {
        std::str::from_utf8(self.0)
    }

    /// Deserialize the payload as JSON.
    ///
    /// Only meaningful on a complete body; a streaming chunk is usually a
    /// fragment of a document.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(self.0)
    }

    /// Flatten a JSON body into positional arguments.
    ///
    /// An object yields its values in document order, keys dropped; any other
    /// JSON value yields itself. An empty body yields no arguments.
    pub fn json_arguments(&self) -> Result<Vec<Value>, serde_json::Error> {
        if self.0.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(match serde_json::from_slice::<Value>(self.0)? {
            Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
            other => vec![other],
        })
    }
}

impl<'a> From<&'a [u8]> for Payload<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }
}
