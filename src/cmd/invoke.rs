//! `formrelay invoke` — handle one event locally.
//!
//! Reads a runtime event (or, with `--raw`, a bare notification body) from
//! a file or stdin, runs it through the forwarder exactly as the server
//! would, and prints the runtime reply as JSON on stdout. With `--dry-run`
//! the record request bodies are printed instead of sent.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tokio::io::AsyncReadExt;

use crate::cli::InvokeArgs;
use crate::config::validation::resolve_target;
use crate::config::ForwarderConfig;
use crate::error::FormrelayError;
use crate::forwarder::airtable::{AirtableClient, CreateRecords};
use crate::forwarder::notification::RuntimeEvent;
use crate::forwarder::record::MultiValueShape;
use crate::forwarder::{Forwarder, Outcome, Prepared};
use crate::logging;
use crate::server;

pub async fn execute(args: InvokeArgs) -> Result<(), FormrelayError> {
    let log_format = logging::resolve_format(args.log.pretty, args.log.json);
    logging::init(&args.log.log_level, log_format);

    let (label, content) = read_input(args.input.as_deref()).await?;
    let body = if args.raw {
        Some(content)
    } else {
        let event: RuntimeEvent =
            serde_json::from_str(&content).map_err(|source| FormrelayError::EventParse {
                input: label,
                source,
            })?;
        event.body
    };

    let config = ForwarderConfig::from(&args.forwarder);
    let api = Arc::new(AirtableClient::new(server::build_http_client()));
    let forwarder = Forwarder::new(config, api);

    let output = if args.dry_run {
        dry_run(&forwarder, body.as_deref())
    } else {
        let invocation_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("invocation", invocation_id = %invocation_id);
        let outcome =
            tracing::Instrument::instrument(forwarder.handle(body.as_deref()), span).await;
        serde_json::to_value(outcome.reply()).unwrap_or_default()
    };

    println!("{output:#}");
    Ok(())
}

async fn read_input(path: Option<&Path>) -> Result<(String, String), FormrelayError> {
    match path {
        Some(p) if p != Path::new("-") => {
            let content = tokio::fs::read_to_string(p).await?;
            Ok((p.display().to_string(), content))
        }
        _ => {
            let mut content = String::new();
            tokio::io::stdin().read_to_string(&mut content).await?;
            Ok(("stdin".to_string(), content))
        }
    }
}

fn dry_run(forwarder: &Forwarder, body: Option<&str>) -> serde_json::Value {
    let prepared = match forwarder.prepare(body, Utc::now()) {
        Ok(prepared) => prepared,
        Err(e) => {
            tracing::error!(error = %e, "failed to read notification");
            return serde_json::to_value(Outcome::InternalError.reply()).unwrap_or_default();
        }
    };

    match prepared {
        Prepared::Ignored { form_name } => serde_json::json!({
            "outcome": Outcome::Ignored.label(),
            "form": form_name,
        }),
        Prepared::Submission(submission) => {
            let endpoint = resolve_target(forwarder.config())
                .ok()
                .map(|target| target.endpoint.to_string());
            let first = submission.record(MultiValueShape::List);
            let retry = submission
                .has_alternate_shape()
                .then(|| submission.record(MultiValueShape::Joined));
            serde_json::json!({
                "outcome": "would_forward",
                "endpoint": endpoint,
                "request": CreateRecords::single(&first),
                "retry_request": retry.as_ref().map(CreateRecords::single),
            })
        }
    }
}
