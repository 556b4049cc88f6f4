//! Dispatcher core - per-request lifecycle and handler invocation.

use crate::error::{ErrorKind, RouterError};
use crate::ids::RequestId;
use crate::router::{DispatchMode, Handler, Resolution, RoutingTable};
use crate::server::{GuardedSink, HandlerResponse, Payload, RequestContext, ResponseSink};
use http::StatusCode;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// One event from the network collaborator for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchEvent<'a> {
    /// A body chunk arrived
    Chunk(&'a [u8]),
    /// The body is complete; carries the full payload
    End(&'a [u8]),
}

/// Lifecycle state of a request record.
///
/// `Complete` and `Failed` are terminal. A record is `Failed` when any
/// handler invocation during its lifetime returned an error or panicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Receiving,
    Complete,
    Failed,
}

impl LifecycleState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Receiving => "receiving",
            LifecycleState::Complete => "complete",
            LifecycleState::Failed => "failed",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Translates request events into handler invocations or error responses.
///
/// Holds the routing table behind an `Arc`: cloning a dispatcher is cheap and
/// every clone sees the same, read-only table.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: Arc<RoutingTable>,
}

impl Dispatcher {
    /// Take ownership of a fully populated routing table.
    ///
    /// Registration ends here: the table cannot be mutated through the
    /// dispatcher.
    #[must_use]
    pub fn new(table: RoutingTable) -> Self {
        info!(total_routes = table.len(), "Routing table loaded");
        Self {
            table: Arc::new(table),
        }
    }

    #[must_use]
    pub fn from_shared(table: Arc<RoutingTable>) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Single dispatch entry point for the network collaborator.
    ///
    /// Every outcome is observed through `sink`: a handler's own response, or
    /// the mapped error response. Nothing is returned and nothing propagates.
    ///
    /// Handlers still run once `sink` reports
    /// [`is_terminated`](ResponseSink::is_terminated), but their writes and
    /// any mapped error are dropped. A sink that never reports termination
    /// gets no such protection across calls; use [`Dispatcher::begin`] for it.
    pub fn dispatch(
        &self,
        ctx: &RequestContext,
        sink: &mut dyn ResponseSink,
        event: DispatchEvent<'_>,
    ) {
        let mut sink = GuardedSink::new(sink);
        if let Err(err) = self.handle_event(ctx, &mut sink, event) {
            Self::respond_with_error(ctx, &mut sink, &err);
        }
    }

    /// Start the lifecycle record of one request.
    pub fn begin<S: ResponseSink>(&self, ctx: RequestContext, sink: S) -> RequestLifecycle<'_, S> {
        debug!(
            request_id = %ctx.request_id,
            method = %ctx.method,
            url = %ctx.url,
            "Request lifecycle start"
        );
        RequestLifecycle {
            dispatcher: self,
            ctx,
            body: Vec::new(),
            chunks: 0,
            failed: false,
            sink: GuardedSink::new(sink),
        }
    }

    /// Run a whole lifecycle over `chunks`, in order, then end the body.
    pub fn serve_chunks<S, I, C>(&self, ctx: RequestContext, sink: S, chunks: I) -> FinishedRequest<S>
    where
        S: ResponseSink,
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        let mut lifecycle = self.begin(ctx, sink);
        for chunk in chunks {
            lifecycle.on_chunk(chunk.as_ref());
        }
        lifecycle.on_end()
    }

    fn handle_event(
        &self,
        ctx: &RequestContext,
        sink: &mut dyn ResponseSink,
        event: DispatchEvent<'_>,
    ) -> Result<(), RouterError> {
        match event {
            DispatchEvent::Chunk(chunk) => {
                match self
                    .table
                    .resolve(&ctx.method, &ctx.url, DispatchMode::Streaming)
                {
                    Resolution::Found(h) => {
                        Self::invoke(h, ctx, sink, chunk, DispatchMode::Streaming)
                    }
                    // streaming handlers are optional per route
                    Resolution::RouteNotRegistered => Ok(()),
                    Resolution::MethodNotRegistered => {
                        Err(RouterError::method_not_registered(&ctx.method))
                    }
                }
            }
            DispatchEvent::End(body) => {
                let h = self
                    .table
                    .resolve(&ctx.method, &ctx.url, DispatchMode::Buffered)
                    .into_result(&ctx.method, &ctx.url)?;
                Self::invoke(h, ctx, sink, body, DispatchMode::Buffered)
            }
        }
    }

    fn invoke(
        h: &Handler,
        ctx: &RequestContext,
        sink: &mut dyn ResponseSink,
        payload: &[u8],
        mode: DispatchMode,
    ) -> Result<(), RouterError> {
        debug!(
            request_id = %ctx.request_id,
            method = %ctx.method,
            url = %ctx.url,
            mode = %mode,
            payload_bytes = payload.len(),
            "Handler execution start"
        );
        let start = Instant::now();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            h(ctx, &mut *sink, Payload::new(payload))
        }));
        let elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);

        match outcome {
            Ok(Ok(())) => {
                debug!(
                    request_id = %ctx.request_id,
                    mode = %mode,
                    elapsed_us = elapsed_us,
                    "Handler execution complete"
                );
                Ok(())
            }
            Ok(Err(e)) => Err(RouterError::internal(
                format!("{mode} handler for {} {} failed", ctx.method, ctx.url),
                format!("{e:#}"),
            )),
            Err(panic) => Err(RouterError::internal(
                format!("{mode} handler for {} {} panicked", ctx.method, ctx.url),
                panic_message(&*panic),
            )),
        }
    }

    fn respond_with_error(ctx: &RequestContext, sink: &mut dyn ResponseSink, err: &RouterError) {
        let status = err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match err.kind() {
            ErrorKind::RouteNotRegistered => warn!(
                request_id = %ctx.request_id,
                method = %ctx.method,
                url = %ctx.url,
                kind = %err.kind(),
                status = status.as_u16(),
                error_message = %err.message(),
                "Route not registered"
            ),
            _ => error!(
                request_id = %ctx.request_id,
                method = %ctx.method,
                url = %ctx.url,
                kind = %err.kind(),
                status = status.as_u16(),
                error_message = %err.message(),
                internal_message = err.internal_message().unwrap_or(""),
                "Dispatch failed"
            ),
        }
        sink.respond(HandlerResponse::error(status));
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

/// Lifecycle record of one in-flight request.
///
/// Owns the accumulation buffer and the one-shot guarded sink. Chunks are fed
/// with [`on_chunk`](Self::on_chunk) in arrival order; [`on_end`](Self::on_end)
/// consumes the record, so nothing can be dispatched for it afterwards.
pub struct RequestLifecycle<'d, S: ResponseSink> {
    dispatcher: &'d Dispatcher,
    ctx: RequestContext,
    body: Vec<u8>,
    chunks: usize,
    failed: bool,
    sink: GuardedSink<S>,
}

impl<S: ResponseSink> RequestLifecycle<'_, S> {
    #[must_use]
    pub fn context(&self) -> &RequestContext {
        &self.ctx
    }

    /// Bytes accumulated so far
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn chunks_received(&self) -> usize {
        self.chunks
    }

    /// Whether a handler has failed for this request
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.sink.is_terminated()
    }

    /// Append a chunk and fire the route's streaming handler, if any.
    ///
    /// A failing streaming handler answers 500 but does not stop the
    /// lifecycle: later chunks are still accumulated and dispatched.
    pub fn on_chunk(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
        self.chunks += 1;
        debug!(
            request_id = %self.ctx.request_id,
            chunk_index = self.chunks,
            chunk_bytes = chunk.len(),
            buffered_bytes = self.body.len(),
            "Body chunk received"
        );
        self.run(DispatchEvent::Chunk(chunk));
    }

    /// Fire the buffered handler with the full body and finalize the record.
    pub fn on_end(mut self) -> FinishedRequest<S> {
        let body = std::mem::take(&mut self.body);
        self.run(DispatchEvent::End(&body));

        let state = if self.failed {
            LifecycleState::Failed
        } else {
            LifecycleState::Complete
        };
        info!(
            request_id = %self.ctx.request_id,
            method = %self.ctx.method,
            url = %self.ctx.url,
            chunks = self.chunks,
            body_bytes = body.len(),
            state = %state,
            status = self.sink.status().map(|s| s.as_u16()),
            age_ms = u64::try_from(self.ctx.request_id.age().as_millis()).unwrap_or(u64::MAX),
            "Request lifecycle finished"
        );

        FinishedRequest {
            request_id: self.ctx.request_id,
            state,
            sink: self.sink,
        }
    }

    fn run(&mut self, event: DispatchEvent<'_>) {
        if let Err(err) = self.dispatcher.handle_event(&self.ctx, &mut self.sink, event) {
            if err.kind() == ErrorKind::InternalDispatchError {
                self.failed = true;
            }
            Dispatcher::respond_with_error(&self.ctx, &mut self.sink, &err);
        }
    }
}

impl<S: ResponseSink> fmt::Debug for RequestLifecycle<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestLifecycle")
            .field("request_id", &self.ctx.request_id)
            .field("method", &self.ctx.method)
            .field("url", &self.ctx.url)
            .field("chunks", &self.chunks)
            .field("buffered_bytes", &self.body.len())
            .field("failed", &self.failed)
            .finish()
    }
}

/// What is left of a request once its lifecycle has ended
#[derive(Debug)]
pub struct FinishedRequest<S> {
    pub request_id: RequestId,
    pub state: LifecycleState,
    sink: GuardedSink<S>,
}

impl<S: ResponseSink> FinishedRequest<S> {
    /// Status of the response that reached the sink, if any did
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.sink.status()
    }

    /// Terminal writes refused because the response was already sent
    #[must_use]
    pub fn dropped_writes(&self) -> usize {
        self.sink.dropped_writes()
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        self.sink.get_ref()
    }

    #[must_use]
    pub fn into_sink(self) -> S {
        self.sink.into_inner()
    }
}
