//! Tests for the request lifecycle and dispatch timing
//!
//! # Test Coverage
//!
//! - End-to-end request scenarios (buffered hello, unknown method, unknown
//!   url, streaming byte counter)
//! - Streaming handlers fire once per chunk, in order, with the exact chunk
//! - Buffered handlers fire once, after the last chunk, with the concatenation
//! - 404 vs 500 for a missing buffered route
//! - One terminal write per response sink

use http::{Method, StatusCode};
use proptest::prelude::*;
use std::sync::{Arc, Mutex};
use walter::{
    DispatchEvent, Dispatcher, HandlerResponse, LifecycleState, RequestContext, ResponseRecorder,
    ResponseSink, RoutingTable,
};
use tracing_util::TestTracing;

const NO_CHUNKS: [&[u8]; 0] = [];

#[test]
fn test_scenario_buffered_hello() {
    let _tracing = TestTracing::init();
    let mut table = RoutingTable::new();
    table
        .get("/hello", |_ctx, sink, _body| {
            sink.respond(HandlerResponse::text(StatusCode::OK, "hi"));
            Ok(())
        })
        .unwrap();
    let dispatcher = Dispatcher::new(table);

    let done = dispatcher.serve_chunks(
        RequestContext::new(Method::GET, "/hello"),
        ResponseRecorder::new(),
        NO_CHUNKS,
    );

    assert_eq!(done.state, LifecycleState::Complete);
    let recorder = done.into_sink();
    let res = recorder.response().unwrap();
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, b"hi");
}

#[test]
fn test_lifecycle_keeps_propagated_request_id() {
    let tracing = TestTracing::init();
    let mut table = RoutingTable::new();
    table.get("/hello", |_c, _s, _p| Ok(())).unwrap();
    let dispatcher = Dispatcher::new(table);

    let upstream = walter::ids::RequestId::new();
    let done = dispatcher.serve_chunks(
        RequestContext::new(Method::GET, "/hello")
            .with_header("X-Request-Id", upstream.to_string()),
        ResponseRecorder::new(),
        NO_CHUNKS,
    );

    assert_eq!(done.request_id, upstream);
    assert!(tracing.contains(&format!("request_id={upstream}")));
    assert!(tracing.contains("age_ms="));
}

#[test]
fn test_scenario_no_registrations_is_500() {
    let tracing = TestTracing::init();
    let dispatcher = Dispatcher::new(RoutingTable::new());

    let done = dispatcher.serve_chunks(
        RequestContext::new(Method::GET, "/missing"),
        ResponseRecorder::new(),
        NO_CHUNKS,
    );

    let recorder = done.into_sink();
    let res = recorder.response().unwrap();
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.get_header("content-type"), Some("text/html"));
    assert!(res.body.is_empty());
    assert!(tracing.contains("method_not_registered"));
}

#[test]
fn test_scenario_known_method_unknown_url_is_404() {
    let _tracing = TestTracing::init();
    let mut table = RoutingTable::new();
    table.get("/a", |_c, _s, _p| Ok(())).unwrap();
    let dispatcher = Dispatcher::new(table);

    let done = dispatcher.serve_chunks(
        RequestContext::new(Method::GET, "/b"),
        ResponseRecorder::new(),
        NO_CHUNKS,
    );

    let recorder = done.into_sink();
    let res = recorder.response().unwrap();
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.reason(), "Not Found");
    assert_eq!(res.get_header("content-type"), Some("text/html"));
    assert!(res.body.is_empty());
}

#[test]
fn test_scenario_streaming_byte_counter() {
    let _tracing = TestTracing::init();
    let calls: Arc<Mutex<Vec<(String, usize)>>> = Arc::new(Mutex::new(Vec::new()));
    let total = Arc::new(Mutex::new(0usize));

    let mut table = RoutingTable::new();
    let (calls_in, total_in) = (Arc::clone(&calls), Arc::clone(&total));
    table
        .post_streaming("/upload", move |_ctx, _sink, chunk| {
            let mut total = total_in.lock().unwrap();
            *total += chunk.len();
            calls_in
                .lock()
                .unwrap()
                .push((chunk.as_str()?.to_string(), *total));
            Ok(())
        })
        .unwrap();
    let dispatcher = Dispatcher::new(table);

    dispatcher.serve_chunks(
        RequestContext::new(Method::POST, "/upload"),
        ResponseRecorder::new(),
        ["ab", "cd", "e"],
    );

    assert_eq!(
        calls.lock().unwrap().as_slice(),
        &[
            ("ab".to_string(), 2),
            ("cd".to_string(), 4),
            ("e".to_string(), 5)
        ]
    );
}

#[test]
fn test_buffered_handler_fires_after_last_chunk() {
    let events = Arc::new(Mutex::new(Vec::<String>::new()));
    let mut table = RoutingTable::new();

    let streamed = Arc::clone(&events);
    table
        .put_streaming("/doc", move |_c, _s, chunk| {
            streamed
                .lock()
                .unwrap()
                .push(format!("chunk:{}", chunk.as_str()?));
            Ok(())
        })
        .unwrap();
    let buffered = Arc::clone(&events);
    table
        .put("/doc", move |_c, sink, body| {
            buffered
                .lock()
                .unwrap()
                .push(format!("body:{}", body.as_str()?));
            sink.respond(HandlerResponse::text(StatusCode::OK, "saved"));
            Ok(())
        })
        .unwrap();
    let dispatcher = Dispatcher::new(table);

    let mut lifecycle = dispatcher.begin(
        RequestContext::new(Method::PUT, "/doc"),
        ResponseRecorder::new(),
    );
    lifecycle.on_chunk(b"x");
    lifecycle.on_chunk(b"y");
    assert_eq!(events.lock().unwrap().len(), 2);
    let done = lifecycle.on_end();

    assert_eq!(
        events.lock().unwrap().as_slice(),
        &["chunk:x", "chunk:y", "body:xy"]
    );
    assert_eq!(done.status(), Some(StatusCode::OK));
}

#[test]
fn test_streaming_handler_error_does_not_reach_listener() {
    let tracing = TestTracing::init();
    let mut table = RoutingTable::new();
    table
        .post_streaming("/up", |_c, _s, _chunk| {
            Err(anyhow::anyhow!("disk full").context("spooling chunk"))
        })
        .unwrap();
    let dispatcher = Dispatcher::new(table);

    let done = dispatcher.serve_chunks(
        RequestContext::new(Method::POST, "/up"),
        ResponseRecorder::new(),
        ["1", "2"],
    );

    assert_eq!(done.state, LifecycleState::Failed);
    assert_eq!(done.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    // both the user-facing and the internal message are logged
    assert!(tracing.contains("streaming handler for POST /up failed"));
    assert!(tracing.contains("spooling chunk: disk full"));
}

/// Sink that is itself one-shot, like a raw socket writer
struct StrictSink {
    writes: usize,
}

impl ResponseSink for StrictSink {
    fn respond(&mut self, _response: HandlerResponse) {
        self.writes += 1;
        assert_eq!(self.writes, 1, "second terminal write reached the sink");
    }
}

#[test]
fn test_sink_never_sees_two_terminal_writes() {
    let mut table = RoutingTable::new();
    table
        .post_streaming("/both", |_c, sink, _chunk| {
            sink.respond(HandlerResponse::text(StatusCode::ACCEPTED, "early"));
            Ok(())
        })
        .unwrap();
    table
        .post("/both", |_c, sink, _body| {
            sink.respond(HandlerResponse::text(StatusCode::OK, "late"));
            sink.respond(HandlerResponse::text(StatusCode::OK, "later"));
            Ok(())
        })
        .unwrap();
    let dispatcher = Dispatcher::new(table);

    let done = dispatcher.serve_chunks(
        RequestContext::new(Method::POST, "/both"),
        StrictSink { writes: 0 },
        ["a", "b", "c"],
    );

    assert_eq!(done.status(), Some(StatusCode::ACCEPTED));
    assert_eq!(done.dropped_writes(), 4);
    assert_eq!(done.into_sink().writes, 1);
}

#[test]
fn test_dispatch_entry_point_with_full_payload() {
    let mut table = RoutingTable::new();
    table
        .delete("/items", |ctx, sink, body| {
            let ids: Vec<u32> = body.json()?;
            sink.respond(HandlerResponse::text(
                StatusCode::OK,
                format!("{} deleted {}", ctx.url, ids.len()),
            ));
            Ok(())
        })
        .unwrap();
    let dispatcher = Dispatcher::new(table);

    let ctx = RequestContext::new(Method::DELETE, "/items");
    let mut recorder = ResponseRecorder::new();
    dispatcher.dispatch(&ctx, &mut recorder, DispatchEvent::Chunk(b"[1,2,"));
    dispatcher.dispatch(&ctx, &mut recorder, DispatchEvent::Chunk(b"3]"));
    assert!(recorder.responses().is_empty());

    dispatcher.dispatch(&ctx, &mut recorder, DispatchEvent::End(b"[1,2,3]"));
    assert_eq!(recorder.response().unwrap().body, b"/items deleted 3");
}

#[test]
fn test_invalid_json_body_is_500() {
    let mut table = RoutingTable::new();
    table
        .post("/typed", |_c, _s, body| {
            let _: serde_json::Value = body.json()?;
            Ok(())
        })
        .unwrap();
    let dispatcher = Dispatcher::new(table);

    let done = dispatcher.serve_chunks(
        RequestContext::new(Method::POST, "/typed"),
        ResponseRecorder::new(),
        ["{not json"],
    );
    assert_eq!(done.state, LifecycleState::Failed);
    assert_eq!(done.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
}

fn method_strategy() -> impl Strategy<Value = Method> {
    prop_oneof![
        Just(Method::GET),
        Just(Method::POST),
        Just(Method::PUT),
        Just(Method::DELETE),
    ]
}

proptest! {
    #[test]
    fn prop_streaming_handler_sees_each_chunk_in_order(
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 0..16)
    ) {
        let seen = Arc::new(Mutex::new(Vec::<Vec<u8>>::new()));
        let seen_in = Arc::clone(&seen);
        let mut table = RoutingTable::new();
        table
            .put_streaming("/s", move |_c, _s, chunk| {
                seen_in.lock().unwrap().push(chunk.as_bytes().to_vec());
                Ok(())
            })
            .unwrap();
        let dispatcher = Dispatcher::new(table);

        dispatcher.serve_chunks(
            RequestContext::new(Method::PUT, "/s"),
            ResponseRecorder::new(),
            &chunks,
        );

        prop_assert_eq!(seen.lock().unwrap().clone(), chunks);
    }

    #[test]
    fn prop_buffered_handler_sees_concatenation_once(
        method in method_strategy(),
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 0..16)
    ) {
        let bodies = Arc::new(Mutex::new(Vec::<Vec<u8>>::new()));
        let bodies_in = Arc::clone(&bodies);
        let mut table = RoutingTable::new();
        table
            .route(method.clone(), "/b", move |_c, _s, body| {
                bodies_in.lock().unwrap().push(body.as_bytes().to_vec());
                Ok(())
            }, None)
            .unwrap();
        let dispatcher = Dispatcher::new(table);

        dispatcher.serve_chunks(RequestContext::new(method, "/b"), ResponseRecorder::new(), &chunks);

        let bodies = bodies.lock().unwrap();
        prop_assert_eq!(bodies.len(), 1);
        prop_assert_eq!(&bodies[0], &chunks.concat());
    }

    #[test]
    fn prop_missing_buffered_route_status(
        registered in method_strategy(),
        requested in method_strategy(),
        url in "/[a-z]{1,8}",
    ) {
        let mut table = RoutingTable::new();
        table
            .route(registered.clone(), "/only-this-one", |_c, _s, _p| Ok(()), Some(false))
            .unwrap();
        let dispatcher = Dispatcher::new(table);

        let done = dispatcher.serve_chunks(
            RequestContext::new(requested.clone(), url),
            ResponseRecorder::new(),
            NO_CHUNKS,
        );

        let expected = if requested == registered {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        prop_assert_eq!(done.status(), Some(expected));
    }
}
