//! `formrelay serve` — start the webhook server.
//!
//! Builds the immutable forwarding configuration, starts the Axum HTTP
//! server with graceful shutdown, and warns up front when the record API
//! settings are incomplete (the server still starts; tracked submissions
//! are then answered with `Misconfigured`).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::cli::ServeArgs;
use crate::config::validation::resolve_target;
use crate::config::ForwarderConfig;
use crate::error::FormrelayError;
use crate::forwarder::airtable::AirtableClient;
use crate::forwarder::Forwarder;
use crate::logging;
use crate::server::{self, AppState, Stats};

pub async fn execute(args: ServeArgs) -> Result<(), FormrelayError> {
    let log_format = logging::resolve_format(args.log.pretty, args.log.json);
    logging::init(&args.log.log_level, log_format);

    let config = ForwarderConfig::from(&args.forwarder);
    if let Err(errors) = resolve_target(&config) {
        for e in &errors {
            tracing::warn!(setting = %e.setting, env = e.env, "{}", e.message);
        }
        tracing::warn!("record API is not fully configured, tracked submissions will fail");
    }

    let form_name = config.form_name.clone();
    let api = Arc::new(AirtableClient::new(server::build_http_client()));
    let state = Arc::new(AppState {
        forwarder: Forwarder::new(config, api),
        start_time: Instant::now(),
        stats: Stats::new(),
    });

    let router = server::build_router(state, args.max_body);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, form = %form_name, "formrelay started");

    axum::serve(listener, router)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    tracing::info!("formrelay stopped");
    Ok(())
}
