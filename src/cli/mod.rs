//! # CLI Module
//!
//! Command-line front end of the `walter` binary. It wires a demo routing
//! table and plays the part of the network collaborator: a request body is
//! split into chunks and fed through the dispatcher one event at a time.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! ```bash
//! walter routes
//! ```
//!
//! ### `replay`
//!
//! ```bash
//! walter replay --method POST --url /upload --body-file photo.jpg --chunk-size 0x1000
//! walter replay --method PUT --url /notes --body '{"title":"groceries"}'
//! ```
//!
//! The rendered response (status line, headers, body) goes to stdout; logs go
//! to stderr.

mod commands;


pub use commands::{demo_table, run_cli, Cli, Commands};
