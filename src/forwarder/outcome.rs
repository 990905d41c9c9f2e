//! The result of one invocation and its rendering for the webhook runtime.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    Inserted,
    InsertFailed { downstream_status: Option<StatusCode> },
    Misconfigured,
    InternalError,
}

impl Outcome {
    /// Downstream client and server errors are propagated as-is; anything
    /// else that failed is reported as 500.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Ignored | Self::Inserted => StatusCode::OK,
            Self::InsertFailed {
                downstream_status: Some(status),
            } if status.is_client_error() || status.is_server_error() => *status,
            Self::InsertFailed { .. } | Self::Misconfigured | Self::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Ignored => "Ignored (not the target form)",
            Self::Inserted => "Airtable record created",
            Self::InsertFailed { .. } => "Failed to create Airtable record",
            Self::Misconfigured => "Missing Airtable configuration",
            Self::InternalError => "Function error",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::Inserted => "inserted",
            Self::InsertFailed { .. } => "insert_failed",
            Self::Misconfigured => "misconfigured",
            Self::InternalError => "internal_error",
        }
    }

    #[must_use]
    pub fn reply(&self) -> InvocationReply {
        InvocationReply {
            status_code: self.status_code().as_u16(),
            body: self.message().to_string(),
        }
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        (self.status_code(), self.message()).into_response()
    }
}

/// What a serverless runtime expects back from a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationReply {
    pub status_code: u16,
    pub body: String,
}
