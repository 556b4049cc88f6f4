//! Request identifiers.
//!
//! Every request lifecycle carries a ULID. Its leading 48 bits are the time it
//! was minted, so the id also dates the request: [`RequestId::age`] is how long
//! the request has been in flight (including upstream time when the caller
//! propagated its own id).

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

/// Header a caller may use to propagate its own request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// ULID-backed request identifier.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(ulid::Ulid);

impl RequestId {
    /// Mint an id for a request starting now
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Id carried by an `x-request-id` header value.
    ///
    /// `None` when the value is not a ULID or is the nil ULID, which clients
    /// send as a placeholder.
    #[must_use]
    pub fn from_header(value: &str) -> Option<Self> {
        value
            .trim()
            .parse::<RequestId>()
            .ok()
            .filter(|id| id.0 != ulid::Ulid::nil())
    }

    #[must_use]
    pub fn as_ulid(&self) -> ulid::Ulid {
        self.0
    }

    /// When the id was minted, to the millisecond
    #[must_use]
    pub fn minted_at(&self) -> SystemTime {
        self.0.datetime()
    }

    /// Time elapsed since the id was minted. Zero for ids dated in the future.
    #[must_use]
    pub fn age(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.minted_at())
            .unwrap_or(Duration::ZERO)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(RequestId)
    }
}
