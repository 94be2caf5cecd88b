//! Request rejection reasons and their HTTP status codes.

use axum::http::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::grafana::MatchError;

/// Answer given to requests that do not come from Grafana.
///
/// Grafana retries requests answered with an error, so some deployments
/// prefer to acknowledge and drop them.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BadSourcePolicy {
    /// Answer `400 Bad Request`.
    #[default]
    Reject,
    /// Answer `200 OK` without processing the request.
    Ignore,
}

/// Reasons a webhook request is not processed.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// `User-Agent` is not the expected one.
    #[error("not a {expected} request (user agent {found:?})")]
    BadSource {
        expected: String,
        found: Option<String>,
    },
    #[error("empty content")]
    EmptyBody,
    /// Body could not be read, or is larger than the limit.
    #[error("cannot read request body: {0}")]
    UnreadableBody(String),
    #[error("failed to parse JSON from payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Malformed(#[from] MatchError),
}

impl WebhookError {
    /// Maps the error to the response status.
    ///
    /// | error | status |
    /// |-------|--------|
    /// | `BadSource` | 400, or 200 with [`BadSourcePolicy::Ignore`] |
    /// | `EmptyBody` | 400 |
    /// | `UnreadableBody` | 400 |
    /// | `Decode` | 400 |
    /// | `Malformed` | 400 |
    pub fn status_code(&self, bad_source: BadSourcePolicy) -> StatusCode {
        match (self, bad_source) {
            (WebhookError::BadSource { .. }, BadSourcePolicy::Ignore) => StatusCode::OK,
            (WebhookError::BadSource { .. }, BadSourcePolicy::Reject) => StatusCode::BAD_REQUEST,
            (WebhookError::EmptyBody, _) => StatusCode::BAD_REQUEST,
            (WebhookError::UnreadableBody(_), _) => StatusCode::BAD_REQUEST,
            (WebhookError::Decode(_), _) => StatusCode::BAD_REQUEST,
            (WebhookError::Malformed(_), _) => StatusCode::BAD_REQUEST,
        }
    }
}
