//! Grafana webhook payloads.
//!
//! Two payload shapes are understood:
//!
//! - the unified alerting batch, sent by current Grafana versions:
//!
//! ```json
//! {
//!   "status": "firing",
//!   "alerts": [
//!     { "status": "firing", "labels": { "alertname": "foo" }, "valueString": "[ var='B' value=42 ]" }
//!   ]
//! }
//! ```
//!
//! - the legacy single alert, sent by the old alerting engine:
//!
//! ```json
//! { "state": "alerting", "ruleName": "foo" }
//! ```
//!
//! Every field is optional at the decoding stage. Missing fields are reported
//! by the matcher as a malformed alert instead of a decoding error.

use serde::Deserialize;

/// Decoded webhook body.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Unified alerting payload with a list of alerts.
    Batch(AlertBatch),
    /// Legacy payload describing a single alert rule.
    Legacy(LegacyAlert),
}

/// Unified alerting payload.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct AlertBatch {
    /// Overall status of the group, `firing` or `resolved`.
    pub status: Option<String>,
    /// Alerts of the group.
    pub alerts: Option<Vec<AlertItem>>,
}

/// One alert of a unified alerting payload.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AlertItem {
    /// Alert status, `firing` or `resolved`.
    pub status: Option<String>,
    /// Alert labels; only `alertname` is used.
    pub labels: Option<AlertLabels>,
    /// Values of the queries that triggered the alert.
    pub value_string: Option<String>,
}

/// Labels of an [`AlertItem`].
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct AlertLabels {
    pub alertname: Option<String>,
}

/// Legacy alerting payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LegacyAlert {
    /// Rule state: `alerting`, `pending`, `ok`, ...
    pub state: Option<String>,
    /// Name of the alert rule.
    pub rule_name: Option<String>,
}

/// Union of both payload shapes, used to tell them apart.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNotification {
    status: Option<String>,
    alerts: Option<Vec<AlertItem>>,
    state: Option<String>,
    rule_name: Option<String>,
}

impl Notification {
    /// Decodes a JSON webhook body.
    ///
    /// A body without `status` but with `state` or `ruleName` is a legacy
    /// payload, anything else is treated as a batch.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the body is not UTF-8, not JSON, not an
    /// object, or a known field has the wrong type.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let raw: RawNotification = serde_json::from_slice(body)?;

        let is_legacy = raw.status.is_none() && (raw.state.is_some() || raw.rule_name.is_some());
        if is_legacy {
            return Ok(Notification::Legacy(LegacyAlert {
                state: raw.state,
                rule_name: raw.rule_name,
            }));
        }

        Ok(Notification::Batch(AlertBatch {
            status: raw.status,
            alerts: raw.alerts,
        }))
    }
}
