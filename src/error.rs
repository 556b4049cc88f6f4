//! # Router Errors
//!
//! Every failure the router can produce is a [`RouterError`]: a kind, a
//! user-facing message and an optional internal diagnostic. The kind decides
//! what (if anything) reaches the wire:
//!
//! | Kind | Status |
//! |------|--------|
//! | [`ErrorKind::RouteNotRegistered`] | 404 |
//! | [`ErrorKind::MethodNotRegistered`] | 500 |
//! | [`ErrorKind::InternalDispatchError`] | 500 |
//! | [`ErrorKind::InvalidRegistration`] | never sent, startup only |

use http::StatusCode;
use std::fmt;

/// Category of a [`RouterError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No route of any mode exists for the HTTP method
    MethodNotRegistered,
    /// The method is known but the url has no handler in the requested mode
    RouteNotRegistered,
    /// A registration call was missing its url or handler, or used an unsupported method
    InvalidRegistration,
    /// A registered handler failed while it was being invoked
    InternalDispatchError,
}

impl ErrorKind {
    /// HTTP status written to the response sink for this kind.
    ///
    /// `None` for [`ErrorKind::InvalidRegistration`], which is raised while
    /// routes are being wired and never during a request.
    #[must_use]
    pub fn status(self) -> Option<StatusCode> {
        match self {
            ErrorKind::RouteNotRegistered => Some(StatusCode::NOT_FOUND),
            ErrorKind::MethodNotRegistered | ErrorKind::InternalDispatchError => {
                Some(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ErrorKind::InvalidRegistration => None,
        }
    }

    /// Stable name used in log fields
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MethodNotRegistered => "method_not_registered",
            ErrorKind::RouteNotRegistered => "route_not_registered",
            ErrorKind::InvalidRegistration => "invalid_registration",
            ErrorKind::InternalDispatchError => "internal_dispatch_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error record produced by registration and dispatch.
///
/// `message` is safe to show to whoever wired the routes; `internal_message`
/// carries the diagnostic detail (handler error chain, panic payload) and is
/// only ever logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterError {
    kind: ErrorKind,
    message: String,
    internal_message: Option<String>,
}

impl RouterError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            internal_message: None,
        }
    }

    /// Attach an internal diagnostic message
    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn method_not_registered(method: &http::Method) -> Self {
        Self::new(
            ErrorKind::MethodNotRegistered,
            format!("HTTP method {method} has no registered routes"),
        )
    }

    #[must_use]
    pub fn route_not_registered(method: &http::Method, url: &str) -> Self {
        Self::new(
            ErrorKind::RouteNotRegistered,
            format!("HTTP method {method} with url \"{url}\" was not found"),
        )
    }

    #[must_use]
    pub fn invalid_registration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRegistration, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>, internal: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalDispatchError, message).with_internal(internal)
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn internal_message(&self) -> Option<&str> {
        self.internal_message.as_deref()
    }

    /// Status this error maps to, see [`ErrorKind::status`]
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.kind.status()
    }
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RouterError {}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ErrorKind::RouteNotRegistered.status(),
            Some(StatusCode::NOT_FOUND)
        );
        assert_eq!(
            ErrorKind::MethodNotRegistered.status(),
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        );
        assert_eq!(
            ErrorKind::InternalDispatchError.status(),
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        );
        assert_eq!(ErrorKind::InvalidRegistration.status(), None);
    }

    #[test]
    fn test_internal_message_is_kept_out_of_display() {
        let err = RouterError::internal("handler failed", "db connection refused");
        assert_eq!(err.kind(), ErrorKind::InternalDispatchError);
        assert_eq!(err.internal_message(), Some("db connection refused"));
        assert_eq!(err.to_string(), "internal_dispatch_error: handler failed");
    }

    #[test]
    fn test_route_not_registered_names_the_url() {
        let err = RouterError::route_not_registered(&Method::GET, "/b");
        assert!(err.message().contains("\"/b\""));
        assert_eq!(err.internal_message(), None);
    }
}
