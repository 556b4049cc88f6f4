//! # walter
//!
//! **walter** is a small HTTP request router and request-lifecycle
//! coordinator. It maps an incoming `(method, url)` pair to a registered
//! handler and decides, per route, when that handler fires:
//!
//! - **buffered** routes fire once, after the whole body has arrived
//! - **streaming** routes fire once per body chunk, as the chunks arrive
//!
//! A url may carry both: a streaming handler as a live side channel (progress,
//! early rejection) and a buffered handler doing the actual work.
//!
//! ## Architecture
//!
//! - **[`router`]** - the routing table: exact-match lookup per method and mode
//! - **[`dispatcher`]** - the per-request state machine driving chunk
//!   accumulation and handler invocation
//! - **[`server`]** - request context, payload and response sink types
//! - **[`error`]** - the error taxonomy and its HTTP status mapping
//! - **[`logging`]**, **[`runtime_config`]**, **[`ids`]** - ambient setup
//! - **[`cli`]** - the `walter` binary front end
//!
//! The network listener is not part of this crate. Whatever accepts
//! connections calls [`Dispatcher::begin`](dispatcher::Dispatcher::begin) for
//! each request, then forwards body chunks and the end of the body.
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Listener
//!     participant Lifecycle as RequestLifecycle
//!     participant Table as RoutingTable
//!     participant Stream as Streaming handler
//!     participant Buffered as Buffered handler
//!     participant Sink as ResponseSink
//!
//!     Listener->>Lifecycle: begin(ctx, sink)
//!     loop every chunk
//!         Listener->>Lifecycle: on_chunk(chunk)
//!         Lifecycle->>Lifecycle: append to body
//!         Lifecycle->>Table: resolve(method, url, streaming)
//!         alt found
//!             Lifecycle->>Stream: (ctx, sink, chunk)
//!         else method unknown
//!             Lifecycle->>Sink: 500
//!         end
//!     end
//!     Listener->>Lifecycle: on_end()
//!     Lifecycle->>Table: resolve(method, url, buffered)
//!     alt found
//!         Lifecycle->>Buffered: (ctx, sink, body)
//!     else url unknown
//!         Lifecycle->>Sink: 404
//!     else method unknown
//!         Lifecycle->>Sink: 500
//!     end
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use walter::{Dispatcher, HandlerResponse, RequestContext, ResponseRecorder, RoutingTable};
//! use http::{Method, StatusCode};
//!
//! # fn main() -> Result<(), walter::RouterError> {
//! let mut table = RoutingTable::new();
//! table.get("/hello", |_ctx, sink, _body| {
//!     sink.respond(HandlerResponse::text(StatusCode::OK, "hi"));
//!     Ok(())
//! })?;
//!
//! let dispatcher = Dispatcher::new(table);
//! let done = dispatcher.serve_chunks(
//!     RequestContext::new(Method::GET, "/hello"),
//!     ResponseRecorder::new(),
//!     Vec::<&[u8]>::new(),
//! );
//! assert_eq!(done.status(), Some(StatusCode::OK));
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use dispatcher::{DispatchEvent, Dispatcher, FinishedRequest, LifecycleState, RequestLifecycle};
pub use error::{ErrorKind, RouterError};
pub use router::{DispatchMode, Handler, HandlerResult, Resolution, RoutingTable};
pub use server::{
    GuardedSink, HandlerResponse, Payload, RequestContext, ResponseRecorder, ResponseSink,
};
