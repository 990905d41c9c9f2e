//! `formrelay health` — check the health of a running instance.
//!
//! Fetches `GET /health` through the same pooled client the forwarder uses
//! and prints the forwarding status and outcome counters, or the raw JSON.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::Uri;

use crate::cli::HealthArgs;
use crate::error::FormrelayError;
use crate::health::HealthResponse;
use crate::server::{build_http_client, HttpClient};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

fn request_failed<E>(e: E) -> FormrelayError
where
    E: std::error::Error + Send + Sync + 'static,
{
    FormrelayError::HttpRequest {
        source: Box::new(e),
    }
}

fn health_endpoint(base: &str) -> Result<Uri, FormrelayError> {
    format!("{}/health", base.trim_end_matches('/'))
        .parse()
        .map_err(|e: hyper::http::uri::InvalidUri| FormrelayError::UriParse {
            source: Box::new(e),
        })
}

async fn fetch(client: &HttpClient, uri: Uri) -> Result<Bytes, FormrelayError> {
    let req = hyper::Request::get(uri)
        .body(Full::new(Bytes::new()))
        .map_err(request_failed)?;

    let response = tokio::time::timeout(HEALTH_TIMEOUT, client.request(req))
        .await
        .map_err(|_| FormrelayError::HttpRequest {
            source: format!("no answer within {}s", HEALTH_TIMEOUT.as_secs()).into(),
        })?
        .map_err(request_failed)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FormrelayError::HealthCheckFailed(status));
    }
    Ok(response
        .into_body()
        .collect()
        .await
        .map_err(request_failed)?
        .to_bytes())
}

fn render(url: &str, health: &HealthResponse) -> String {
    let forwarding = &health.forwarding;
    let configured = if forwarding.configured {
        "configured"
    } else {
        "NOT configured"
    };
    let stats = &health.stats;
    [
        format!("\u{2713} formrelay is healthy ({url})"),
        format!("  version:     {}", health.version),
        format!("  uptime:      {}", format_uptime(health.uptime_seconds)),
        format!("  form:        {}", forwarding.form),
        format!("  table:       {} ({configured})", forwarding.table),
        format!(
            "  submissions: {} inserted, {} ignored, {} failed",
            stats.submissions_inserted, stats.submissions_ignored, stats.submissions_failed
        ),
    ]
    .join("\n")
}

pub async fn execute(args: HealthArgs) -> Result<(), FormrelayError> {
    let uri = health_endpoint(&args.url)?;
    let body = fetch(&build_http_client(), uri).await?;
    let text = String::from_utf8_lossy(&body);

    if args.json {
        println!("{text}");
        return Ok(());
    }

    match serde_json::from_str::<HealthResponse>(&text) {
        Ok(health) => println!("{}", render(&args.url, &health)),
        Err(e) => {
            eprintln!("Failed to parse health response: {e}");
            println!("{text}");
        }
    }
    Ok(())
}

fn format_uptime(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}
