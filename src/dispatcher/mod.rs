//! # Dispatcher Module
//!
//! The dispatcher drives the lifecycle of each request: it receives the body
//! chunk events followed by one end-of-body event, and decides which handlers
//! fire and when.
//!
//! ## Request Flow
//!
//! 1. The listener calls [`Dispatcher::begin`] with the request context and
//!    its response sink
//! 2. Every body chunk goes to [`RequestLifecycle::on_chunk`]: the chunk is
//!    appended to the body buffer and the route's streaming handler (if any)
//!    is invoked with that chunk
//! 3. The end of the body goes to [`RequestLifecycle::on_end`]: the route's
//!    buffered handler is invoked once with the concatenated body
//!
//! ```text
//!  Receiving --chunk--> Receiving --end--> Complete
//!                                     \--> Failed   (a handler failed)
//! ```
//!
//! ## Error Handling
//!
//! Nothing escapes the dispatcher. Every failure becomes a response:
//!
//! - Method with no routes at all: 500 (on every chunk and at the end)
//! - Method known, url not registered for buffered mode: 404 at the end
//! - Url not registered for streaming mode: nothing, streaming is optional
//! - Handler returns an error or panics: 500
//!
//! A response sink only ever receives one terminal write per request; later
//! writes (a 404 after a streaming handler already answered, a buffered
//! handler after a 500) are dropped by the lifecycle's guard.
//!
//! ## Example
//!
//! ```rust
//! use walter::dispatcher::Dispatcher;
//! use walter::router::RoutingTable;
//! use walter::server::{HandlerResponse, RequestContext, ResponseRecorder};
//! use http::{Method, StatusCode};
//!
//! let mut table = RoutingTable::new();
//! table
//!     .post("/echo", |_ctx, sink, body| {
//!         sink.respond(HandlerResponse::text(StatusCode::OK, body.as_str()?));
//!         Ok(())
//!     })
//!     .unwrap();
//! let dispatcher = Dispatcher::new(table);
//!
//! let ctx = RequestContext::new(Method::POST, "/echo");
//! let done = dispatcher.serve_chunks(ctx, ResponseRecorder::new(), ["he", "llo"]);
//! assert_eq!(done.sink().response().unwrap().body, b"hello");
//! ```

mod core;

pub use core::{DispatchEvent, Dispatcher, FinishedRequest, LifecycleState, RequestLifecycle};
