//! # Router Module
//!
//! The routing table maps an exact `(method, url)` pair to a handler, once per
//! dispatch mode.
//!
//! ## Overview
//!
//! Each HTTP method owns two independent maps:
//!
//! - **buffered** - the handler runs once, with the complete request body
//! - **streaming** - the handler runs once per body chunk, as chunks arrive
//!
//! A url may have a handler in either map, both, or neither. A streaming
//! handler is a side channel (progress accounting, early rejection) next to
//! the buffered handler that does the real work.
//!
//! ## Matching
//!
//! Urls are matched by string equality only. There are no path parameters,
//! wildcards or regex patterns, so there is never any ordering ambiguity
//! between routes and lookup is one hash probe.
//!
//! ## Example
//!
//! ```rust
//! use walter::router::{DispatchMode, Resolution, RoutingTable};
//! use walter::server::HandlerResponse;
//! use http::{Method, StatusCode};
//!
//! let mut table = RoutingTable::new();
//! table
//!     .get("/hello", |_ctx, sink, _body| {
//!         sink.respond(HandlerResponse::text(StatusCode::OK, "hi"));
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! assert!(table.resolve(&Method::GET, "/hello", DispatchMode::Buffered).is_found());
//! assert!(matches!(
//!     table.resolve(&Method::GET, "/nope", DispatchMode::Buffered),
//!     Resolution::RouteNotRegistered
//! ));
//! assert!(matches!(
//!     table.resolve(&Method::POST, "/hello", DispatchMode::Buffered),
//!     Resolution::MethodNotRegistered
//! ));
//! ```

mod core;

pub use core::{
    handler, DispatchMode, Handler, HandlerResult, Resolution, RouteEntry, RoutingTable,
    SUPPORTED_METHODS,
};
