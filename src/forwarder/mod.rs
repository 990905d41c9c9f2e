//! The submission forwarder.
//!
//! [`Forwarder::handle`] takes one notification body through
//! parse → form filter → field normalization → record creation → outcome.
//! It never returns an error: every failure is folded into an [`Outcome`].
//! Submodules hold the inbound shapes ([`notification`]), the field mapping
//! ([`record`]), the outbound client ([`airtable`]) and the result type
//! ([`outcome`]).
//!
//! A rejected first attempt is retried exactly once, with multi-valued
//! columns joined into a string, when the rejection looks like a column
//! type mismatch. The two attempts are strictly sequential.

pub mod airtable;
pub mod notification;
pub mod outcome;
pub mod record;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::validation::resolve_target;
use crate::config::{ForwarderConfig, TableTarget};
use crate::error::ForwardError;

use airtable::{ApiResponse, RecordApi};
use notification::Notification;
pub use outcome::{InvocationReply, Outcome};
use record::{MultiValueShape, Submission};

/// A notification after parsing and filtering, before any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prepared {
    Ignored { form_name: String },
    Submission(Submission),
}

pub struct Forwarder {
    config: ForwarderConfig,
    api: Arc<dyn RecordApi>,
}

impl Forwarder {
    #[must_use]
    pub fn new(config: ForwarderConfig, api: Arc<dyn RecordApi>) -> Self {
        Self { config, api }
    }

    #[must_use]
    pub const fn config(&self) -> &ForwarderConfig {
        &self.config
    }

    /// Parse, filter and normalize without touching the network.
    pub fn prepare(
        &self,
        body: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Prepared, ForwardError> {
        let notification = Notification::parse(body).map_err(ForwardError::MalformedBody)?;

        let form_name = notification.form_name();
        if form_name != self.config.form_name {
            return Ok(Prepared::Ignored {
                form_name: form_name.to_string(),
            });
        }

        Ok(Prepared::Submission(Submission::from_notification(
            &notification,
            now,
        )))
    }

    pub async fn handle(&self, body: Option<&str>) -> Outcome {
        self.handle_at(body, Utc::now()).await
    }

    pub async fn handle_at(&self, body: Option<&str>, now: DateTime<Utc>) -> Outcome {
        match self.prepare(body, now) {
            Ok(Prepared::Ignored { form_name }) => {
                tracing::debug!(form = %form_name, "submission ignored");
                Outcome::Ignored
            }
            Ok(Prepared::Submission(submission)) => self.forward(&submission).await,
            Err(e) => {
                tracing::error!(error = %e, "failed to read notification");
                Outcome::InternalError
            }
        }
    }

    async fn forward(&self, submission: &Submission) -> Outcome {
        let target = match resolve_target(&self.config) {
            Ok(target) => target,
            Err(errors) => {
                for e in &errors {
                    tracing::error!(setting = %e.setting, env = e.env, "{}", e.message);
                }
                return Outcome::Misconfigured;
            }
        };

        let first = match self.attempt(&target, submission, MultiValueShape::List).await {
            Ok(response) => response,
            Err(outcome) => return outcome,
        };
        if first.is_success() {
            tracing::info!(status = first.status.as_u16(), "record created");
            return Outcome::Inserted;
        }

        if !(first.suggests_type_mismatch() && submission.has_alternate_shape()) {
            tracing::error!(
                status = first.status.as_u16(),
                body = %first.body,
                "record API rejected submission"
            );
            return Outcome::InsertFailed {
                downstream_status: Some(first.status),
            };
        }

        tracing::warn!(
            status = first.status.as_u16(),
            body = %first.body,
            "record API rejected list values, retrying with joined values"
        );

        let retry = match self.attempt(&target, submission, MultiValueShape::Joined).await {
            Ok(response) => response,
            Err(outcome) => return outcome,
        };
        if retry.is_success() {
            tracing::info!(status = retry.status.as_u16(), "record created on retry");
            return Outcome::Inserted;
        }

        tracing::error!(
            status = retry.status.as_u16(),
            body = %retry.body,
            "record API rejected retry"
        );
        Outcome::InsertFailed {
            downstream_status: Some(retry.status),
        }
    }

    async fn attempt(
        &self,
        target: &TableTarget,
        submission: &Submission,
        shape: MultiValueShape,
    ) -> Result<ApiResponse, Outcome> {
        let record = submission.record(shape);
        self.api
            .create_record(target, &record)
            .await
            .map_err(|e| match e {
                ForwardError::Transport { .. } => {
                    tracing::error!(error = %e, "record API request failed");
                    Outcome::InsertFailed {
                        downstream_status: None,
                    }
                }
                other => {
                    tracing::error!(error = %other, "could not send record");
                    Outcome::InternalError
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;
    use hyper::StatusCode;

    use super::record::{ColumnValue, NormalizedRecord};
    use super::*;

    struct ScriptedApi {
        responses: Mutex<VecDeque<Result<ApiResponse, ForwardError>>>,
        sent: Mutex<Vec<NormalizedRecord>>,
    }

    impl ScriptedApi {
        fn new(statuses: &[u16]) -> Arc<Self> {
            let responses = statuses
                .iter()
                .map(|s| {
                    Ok(ApiResponse {
                        status: StatusCode::from_u16(*s).unwrap(),
                        body: r#"{"error":{"type":"INVALID_VALUE_FOR_COLUMN"}}"#.into(),
                    })
                })
                .collect();
            Arc::new(Self {
                responses: Mutex::new(responses),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn unreachable() -> Arc<Self> {
            let mut responses = VecDeque::new();
            responses.push_back(Err(ForwardError::Transport {
                source: "connection refused".into(),
            }));
            Arc::new(Self {
                responses: Mutex::new(responses),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<NormalizedRecord> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecordApi for ScriptedApi {
        async fn create_record(
            &self,
            _target: &TableTarget,
            record: &NormalizedRecord,
        ) -> Result<ApiResponse, ForwardError> {
            self.sent.lock().unwrap().push(record.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected extra request")
        }
    }

    fn configured() -> ForwarderConfig {
        ForwarderConfig {
            api_key: Some("patKEY".into()),
            base_id: Some("appBASE".into()),
            ..ForwarderConfig::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    const APPLY: &str = concat!(
        r#"{"payload":{"form_name":"apply","data":"#,
        r#"{"email":"a@b.com","city":"NYC","gender":"F","seeking":"M,NB"}}}"#,
    );

    async fn run(config: ForwarderConfig, api: &Arc<ScriptedApi>, body: Option<&str>) -> Outcome {
        let forwarder = Forwarder::new(config, api.clone());
        forwarder.handle_at(body, now()).await
    }

    #[tokio::test]
    async fn other_forms_are_ignored_without_calls() {
        let api = ScriptedApi::new(&[]);
        let body = r#"{"payload":{"form_name":"contact","data":{"email":"a@b.com"}}}"#;
        assert_eq!(run(configured(), &api, Some(body)).await, Outcome::Ignored);
        assert!(api.sent().is_empty());
    }

    #[tokio::test]
    async fn missing_body_is_ignored() {
        let api = ScriptedApi::new(&[]);
        assert_eq!(run(configured(), &api, None).await, Outcome::Ignored);
        assert!(api.sent().is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_internal_error() {
        let api = ScriptedApi::new(&[]);
        assert_eq!(
            run(configured(), &api, Some("{\"payload\":")).await,
            Outcome::InternalError
        );
        assert!(api.sent().is_empty());
    }

    #[tokio::test]
    async fn mistyped_payload_members_do_not_fail_the_filter() {
        let api = ScriptedApi::new(&[]);
        for body in [
            r#"{"payload":{"form_name":123}}"#,
            r#"{"payload":"hello"}"#,
            r#"{"payload":{"form_name":"contact","created_at":0}}"#,
        ] {
            assert_eq!(run(configured(), &api, Some(body)).await, Outcome::Ignored);
        }
        assert!(api.sent().is_empty());
    }

    #[tokio::test]
    async fn numeric_created_at_falls_back_to_now() {
        let api = ScriptedApi::new(&[200]);
        let body = concat!(
            r#"{"payload":{"form_name":"apply","created_at":1717228800,"#,
            r#""data":{"email":"a@b.com"}}}"#,
        );
        assert_eq!(run(configured(), &api, Some(body)).await, Outcome::Inserted);

        let sent = api.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].get("Submission Date"),
            Some(&ColumnValue::from("2024-06-01T08:00:00.000Z"))
        );
        assert_eq!(sent[0].get("Email"), Some(&ColumnValue::from("a@b.com")));
    }

    #[tokio::test]
    async fn missing_credentials_are_misconfigured() {
        let api = ScriptedApi::new(&[]);
        let no_key = ForwarderConfig {
            api_key: None,
            ..configured()
        };
        assert_eq!(run(no_key, &api, Some(APPLY)).await, Outcome::Misconfigured);

        let no_base = ForwarderConfig {
            base_id: None,
            ..configured()
        };
        assert_eq!(run(no_base, &api, Some(APPLY)).await, Outcome::Misconfigured);
        assert!(api.sent().is_empty());
    }

    #[tokio::test]
    async fn misconfiguration_does_not_affect_other_forms() {
        let api = ScriptedApi::new(&[]);
        let body = r#"{"payload":{"form_name":"newsletter"}}"#;
        assert_eq!(
            run(ForwarderConfig::default(), &api, Some(body)).await,
            Outcome::Ignored
        );
    }

    #[tokio::test]
    async fn accepted_submission_is_inserted_once() {
        let api = ScriptedApi::new(&[200]);
        assert_eq!(run(configured(), &api, Some(APPLY)).await, Outcome::Inserted);

        let sent = api.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].get("Seeking"), Some(&ColumnValue::from(vec!["M", "NB"])));
        assert_eq!(
            sent[0].get("Submission Date"),
            Some(&ColumnValue::from("2024-06-01T08:00:00.000Z"))
        );
    }

    #[tokio::test]
    async fn type_mismatch_retries_once_with_joined_values() {
        let api = ScriptedApi::new(&[422, 200]);
        assert_eq!(run(configured(), &api, Some(APPLY)).await, Outcome::Inserted);

        let sent = api.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].get("Seeking"), Some(&ColumnValue::from(vec!["M", "NB"])));
        assert_eq!(sent[1].get("Seeking"), Some(&ColumnValue::from("M, NB")));
        assert_eq!(sent[0].get("Email"), sent[1].get("Email"));
    }

    #[tokio::test]
    async fn failed_retry_stops_after_second_attempt() {
        let api = ScriptedApi::new(&[422, 422]);
        assert_eq!(
            run(configured(), &api, Some(APPLY)).await,
            Outcome::InsertFailed {
                downstream_status: Some(StatusCode::UNPROCESSABLE_ENTITY)
            }
        );
        assert_eq!(api.sent().len(), 2);
    }

    #[tokio::test]
    async fn auth_failure_is_not_retried() {
        let api = ScriptedApi::new(&[401]);
        let outcome = run(configured(), &api, Some(APPLY)).await;
        assert_eq!(outcome.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(api.sent().len(), 1);
    }

    #[tokio::test]
    async fn mismatch_without_list_values_is_not_retried() {
        let api = ScriptedApi::new(&[422]);
        let body = r#"{"payload":{"form_name":"apply","data":{"email":"a@b.com"}}}"#;
        assert_eq!(
            run(configured(), &api, Some(body)).await,
            Outcome::InsertFailed {
                downstream_status: Some(StatusCode::UNPROCESSABLE_ENTITY)
            }
        );
        assert_eq!(api.sent().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_api_is_insert_failed_without_retry() {
        let api = ScriptedApi::unreachable();
        let outcome = run(configured(), &api, Some(APPLY)).await;
        assert_eq!(
            outcome,
            Outcome::InsertFailed {
                downstream_status: None
            }
        );
        assert_eq!(outcome.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.sent().len(), 1);
    }

    #[test]
    fn prepare_reports_foreign_form_name() {
        let forwarder = Forwarder::new(configured(), ScriptedApi::new(&[]));
        let prepared = forwarder
            .prepare(Some(r#"{"payload":{"form_name":"Apply"}}"#), now())
            .unwrap();
        assert_eq!(
            prepared,
            Prepared::Ignored {
                form_name: "Apply".into()
            }
        );
    }

    #[test]
    fn custom_form_name_is_honoured() {
        let config = ForwarderConfig {
            form_name: "join".into(),
            ..configured()
        };
        let forwarder = Forwarder::new(config, ScriptedApi::new(&[]));
        let prepared = forwarder
            .prepare(Some(r#"{"payload":{"form_name":"join","data":{}}}"#), now())
            .unwrap();
        assert!(matches!(prepared, Prepared::Submission(_)));
    }
}
