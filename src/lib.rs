//! formrelay forwards form-submission webhooks to an Airtable table.
//!
//! It receives the notification a form product sends when a form is
//! submitted, ignores every form except the tracked one, maps the
//! submitted fields onto table columns, and creates one record through
//! the Airtable REST API. Each invocation is stateless and always ends in
//! a structured [`Outcome`](forwarder::Outcome) with an HTTP-style status.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (serve, invoke, check, health).
//! - [`config`] -- Immutable forwarding configuration and its validation.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`forwarder`] -- Notification parsing, field normalization, record
//!   creation with a single shape-variant retry, and outcome classification.
//! - [`health`] -- `GET /health` endpoint handler returning runtime diagnostics.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`server`] -- Axum server setup, shared application state, HTTP client, and
//!   graceful shutdown.

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod forwarder;
pub mod health;
pub mod logging;
pub mod server;
