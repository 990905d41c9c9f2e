//! Outbound record creation.
//!
//! [`RecordApi`] is the seam between the forwarder and the tabular-data
//! API; [`AirtableClient`] is the production implementation on top of the
//! shared connection-pooled hyper client.

use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::{Method, StatusCode};
use serde::Serialize;

use super::record::NormalizedRecord;
use crate::config::TableTarget;
use crate::error::ForwardError;
use crate::server::HttpClient;

/// Body of a record-creation request: `{"records":[{"fields":{...}}]}`.
#[derive(Debug, Serialize)]
pub struct CreateRecords<'a> {
    pub records: [RecordFields<'a>; 1],
}

#[derive(Debug, Serialize)]
pub struct RecordFields<'a> {
    pub fields: &'a NormalizedRecord,
}

impl<'a> CreateRecords<'a> {
    #[must_use]
    pub const fn single(fields: &'a NormalizedRecord) -> Self {
        Self {
            records: [RecordFields { fields }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Rejections that can be caused by sending a list to a text column (or
    /// the reverse).
    #[must_use]
    pub fn suggests_type_mismatch(&self) -> bool {
        matches!(
            self.status,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY
        )
    }
}

#[async_trait]
pub trait RecordApi: Send + Sync {
    async fn create_record(
        &self,
        target: &TableTarget,
        record: &NormalizedRecord,
    ) -> Result<ApiResponse, ForwardError>;
}

pub struct AirtableClient {
    client: HttpClient,
}

impl AirtableClient {
    #[must_use]
    pub const fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

/// Serialize the request body for one record.
pub fn request_body(record: &NormalizedRecord) -> Result<Bytes, serde_json::Error> {
    serde_json::to_vec(&CreateRecords::single(record)).map(Bytes::from)
}

pub fn build_request(
    target: &TableTarget,
    record: &NormalizedRecord,
) -> Result<hyper::Request<Full<Bytes>>, ForwardError> {
    let body = request_body(record).map_err(ForwardError::Encode)?;
    let request = hyper::Request::builder()
        .method(Method::POST)
        .uri(target.endpoint.as_str())
        .header(AUTHORIZATION, format!("Bearer {}", target.api_key))
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(body))?;
    Ok(request)
}

#[async_trait]
impl RecordApi for AirtableClient {
    #[allow(clippy::cast_possible_truncation)]
    async fn create_record(
        &self,
        target: &TableTarget,
        record: &NormalizedRecord,
    ) -> Result<ApiResponse, ForwardError> {
        let request = build_request(target, record)?;
        let start = Instant::now();

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| ForwardError::Transport {
                source: Box::new(e),
            })?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| ForwardError::Transport {
                source: Box::new(e),
            })?
            .to_bytes();

        tracing::debug!(
            endpoint = %target.endpoint,
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "record API responded"
        );

        Ok(ApiResponse {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}
