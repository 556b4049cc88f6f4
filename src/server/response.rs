use super::request::HeaderVec;
use http::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Complete response written to a sink in one terminal write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerResponse {
    pub status: StatusCode,
    pub headers: HeaderVec,
    pub body: Vec<u8>,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderVec, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Plain text response
    #[must_use]
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "text/plain".to_string()));
        Self::new(status, headers, body.into().into_bytes())
    }

    /// JSON response
    #[must_use]
    pub fn json(status: StatusCode, body: &Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self::new(status, headers, body.to_string().into_bytes())
    }

    /// Error response: status line, `text/html` content type, empty body
    #[must_use]
    pub fn error(status: StatusCode) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "text/html".to_string()));
        Self::new(status, headers, Vec::new())
    }

    /// Reason phrase for the status line
    #[must_use]
    pub fn reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("Unknown")
    }

    /// Get a header by name (case-insensitive)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Where a request's response goes.
///
/// `respond` is the terminal write (status line, headers and body together).
/// The dispatcher always hands handlers a [`GuardedSink`], so an
/// implementation only ever sees the first response of a request.
pub trait ResponseSink {
    fn respond(&mut self, response: HandlerResponse);

    /// Whether this sink has already taken its terminal write. Sinks that
    /// cannot tell report `false`.
    fn is_terminated(&self) -> bool {
        false
    }
}

impl<S: ResponseSink + ?Sized> ResponseSink for &mut S {
    fn respond(&mut self, response: HandlerResponse) {
        (**self).respond(response);
    }

    fn is_terminated(&self) -> bool {
        (**self).is_terminated()
    }
}

/// One-shot wrapper: forwards the first terminal write, drops the rest.
///
/// A buffered handler running after an error response, or an error mapped
/// after a streaming handler already answered, lands here as a dropped write.
#[derive(Debug)]
pub struct GuardedSink<S> {
    inner: S,
    terminated: bool,
    sent_status: Option<StatusCode>,
    dropped_writes: usize,
}

impl<S: ResponseSink> GuardedSink<S> {
    /// Wrap `inner`. A sink that already reports itself terminated refuses
    /// every write from the start.
    #[must_use]
    pub fn new(inner: S) -> Self {
        let terminated = inner.is_terminated();
        Self {
            inner,
            terminated,
            sent_status: None,
            dropped_writes: 0,
        }
    }

    /// Status of the write that went through this guard, if any
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.sent_status
    }

    /// Number of terminal writes refused after the first one
    #[must_use]
    pub fn dropped_writes(&self) -> usize {
        self.dropped_writes
    }

    #[must_use]
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    #[must_use]
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ResponseSink> ResponseSink for GuardedSink<S> {
    fn respond(&mut self, response: HandlerResponse) {
        if self.terminated {
            self.dropped_writes += 1;
            warn!(
                sent_status = self.sent_status.map(|s| s.as_u16()),
                dropped_status = response.status.as_u16(),
                dropped_writes = self.dropped_writes,
                "Response already terminated - dropping write"
            );
            return;
        }
        self.terminated = true;
        self.sent_status = Some(response.status);
        self.inner.respond(response);
    }

    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

/// In-memory sink that records every response it is given.
///
/// It stands in for a connection: once it holds a response it reports itself
/// terminated, so the dispatcher stops writing to it.
#[derive(Debug, Default, Clone)]
pub struct ResponseRecorder {
    responses: Vec<HandlerResponse>,
}

impl ResponseRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// First recorded response
    #[must_use]
    pub fn response(&self) -> Option<&HandlerResponse> {
        self.responses.first()
    }

    #[must_use]
    pub fn responses(&self) -> &[HandlerResponse] {
        &self.responses
    }

    /// Render the first response as an HTTP/1.1 message head plus body
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.response().map(|res| {
            let mut out = format!("HTTP/1.1 {} {}\r\n", res.status.as_u16(), res.reason());
            for (name, value) in &res.headers {
                out.push_str(name);
                out.push_str(": ");
                out.push_str(value);
                out.push_str("\r\n");
            }
            out.push_str(&format!("content-length: {}\r\n\r\n", res.body.len()));
            out.push_str(&String::from_utf8_lossy(&res.body));
            out
        })
    }
}

impl ResponseSink for ResponseRecorder {
    fn respond(&mut self, response: HandlerResponse) {
        self.responses.push(response);
    }

    fn is_terminated(&self) -> bool {
        !self.responses.is_empty()
    }
}
