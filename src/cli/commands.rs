use crate::dispatcher::Dispatcher;
use crate::error::RouterError;
use crate::router::RoutingTable;
use crate::runtime_config::{parse_size, RuntimeConfig};
use crate::server::{HandlerResponse, RequestContext, ResponseRecorder};
use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Command-line interface for walter
///
/// Replays requests through a demo routing table, chunk by chunk, the way a
/// listener would feed them.
#[derive(Parser, Debug)]
#[command(name = "walter")]
#[command(about = "Exact-match HTTP router with streaming and buffered dispatch", long_about = None)]
pub struct Cli {
    /// Log level (overrides WALTER_LOG_LEVEL)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the routes of the demo routing table
    Routes,
    /// Send one request through the demo routing table and print the response
    Replay {
        /// HTTP method (GET, POST, PUT, DELETE, ...)
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Exact url to dispatch, e.g. /hello
        #[arg(short, long)]
        url: String,

        /// Request body given inline
        #[arg(short, long, conflicts_with = "body_file")]
        body: Option<String>,

        /// Read the request body from a file
        #[arg(long)]
        body_file: Option<PathBuf>,

        /// Chunk size in bytes, decimal or 0x hex (default: WALTER_CHUNK_SIZE or 16 KB)
        #[arg(long, value_parser = parse_chunk_size)]
        chunk_size: Option<usize>,

        /// Request header as "name: value" (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
}

fn parse_chunk_size(s: &str) -> Result<usize, String> {
    match parse_size(s) {
        Some(0) => Err("chunk size must be greater than zero".to_string()),
        Some(n) => Ok(n),
        None => Err(format!("invalid chunk size: {s}")),
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Note {
    title: String,
    #[serde(default)]
    body: String,
}

/// Routing table served by the CLI.
///
/// | Route | Mode | Behavior |
/// |-------|------|----------|
/// | `GET /hello` | buffered | 200 `hi` |
/// | `POST /upload` | streaming | logs each chunk |
/// | `POST /upload` | buffered | 201 with the received byte count |
/// | `POST /echo` | buffered | 200 with the JSON body flattened to arguments |
/// | `PUT /notes` | buffered | 200 with the parsed note, 400 on bad JSON |
/// | `DELETE /notes` | buffered | 204 |
pub fn demo_table() -> Result<RoutingTable, RouterError> {
    let mut table = RoutingTable::new();

    table.get("/hello", |_ctx, sink, _body| {
        sink.respond(HandlerResponse::text(StatusCode::OK, "hi"));
        Ok(())
    })?;

    table.post_streaming("/upload", |ctx, _sink, chunk| {
        info!(
            request_id = %ctx.request_id,
            chunk_bytes = chunk.len(),
            expected_bytes = ctx.get_header("content-length"),
            "Upload chunk"
        );
        Ok(())
    })?;

    table.post("/upload", |_ctx, sink, body| {
        sink.respond(HandlerResponse::json(
            StatusCode::CREATED,
            &json!({ "bytes": body.len() }),
        ));
        Ok(())
    })?;

    table.post("/echo", |_ctx, sink, body| {
        let arguments = body.json_arguments().context("echo body is not JSON")?;
        sink.respond(HandlerResponse::json(
            StatusCode::OK,
            &json!({ "arguments": arguments }),
        ));
        Ok(())
    })?;

    table.put("/notes", |_ctx, sink, body| {
        match body.json::<Note>() {
            Ok(note) => sink.respond(HandlerResponse::json(StatusCode::OK, &json!(note))),
            Err(e) => sink.respond(HandlerResponse::text(
                StatusCode::BAD_REQUEST,
                format!("invalid note: {e}"),
            )),
        }
        Ok(())
    })?;

    table.delete("/notes", |_ctx, sink, _body| {
        sink.respond(HandlerResponse::new(
            StatusCode::NO_CONTENT,
            Default::default(),
            Vec::new(),
        ));
        Ok(())
    })?;

    Ok(table)
}

/// Execute a parsed command, writing its output to `out`.
pub fn run_cli<W: Write>(cli: Cli, out: &mut W) -> anyhow::Result<()> {
    match cli.command {
        Commands::Routes => {
            let table = demo_table()?;
            for route in table.routes() {
                writeln!(out, "{}\t{}\t{}", route.method, route.url, route.mode)?;
            }
            Ok(())
        }
        Commands::Replay {
            method,
            url,
            body,
            body_file,
            chunk_size,
            headers,
        } => {
            let method = Method::from_bytes(method.to_uppercase().as_bytes())
                .with_context(|| format!("invalid HTTP method: {method}"))?;
            let body = match (body, body_file) {
                (Some(text), _) => text.into_bytes(),
                (None, Some(path)) => std::fs::read(&path)
                    .with_context(|| format!("failed to read body file {}", path.display()))?,
                (None, None) => Vec::new(),
            };
            let chunk_size = chunk_size.unwrap_or_else(|| RuntimeConfig::from_env().chunk_size);

            let mut ctx = RequestContext::new(method.clone(), url.clone());
            for header in &headers {
                let (name, value) = header
                    .split_once(':')
                    .ok_or_else(|| anyhow!("header must look like \"name: value\": {header}"))?;
                ctx = ctx.with_header(name.trim(), value.trim());
            }

            let dispatcher = Dispatcher::new(demo_table()?);
            let finished = dispatcher.serve_chunks(ctx, ResponseRecorder::new(), body.chunks(chunk_size));

            match finished.sink().render() {
                Some(rendered) => {
                    writeln!(out, "{rendered}")?;
                    Ok(())
                }
                None => bail!("no response was written for {method} {url}"),
            }
        }
    }
}
