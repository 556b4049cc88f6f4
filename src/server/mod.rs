//! Request-side and response-side types shared by the router and the
//! dispatcher: what a handler receives and where it writes its answer.

pub mod request;
pub mod response;

pub use request::{HeaderVec, Payload, RequestContext, MAX_INLINE_HEADERS};
pub use response::{GuardedSink, HandlerResponse, ResponseRecorder, ResponseSink};
