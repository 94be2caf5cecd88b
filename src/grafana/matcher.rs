//! Alert evaluation against the rule table.

use log::{debug, info};
use thiserror::Error;

use crate::{
    grafana::{AlertBatch, AlertItem, LegacyAlert, Notification},
    playback::PlaybackTarget,
    rules::RuleTable,
};

/// Status of a firing alert in a unified alerting payload.
pub const FIRING: &str = "firing";
/// State of a firing alert in a legacy payload.
pub const ALERTING: &str = "alerting";

/// Structurally invalid payload.
///
/// This is an upstream problem, the request is rejected. An alert matching no
/// rule is not an error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("no '{0}' in the alert payload")]
    MissingField(&'static str),
}

/// Resolves the sound files to play for a notification.
///
/// Every alert of a batch is evaluated, and each firing alert contributes at
/// most one target: the one of the first rule with the same name, if its value
/// condition holds. Alerts that are not firing are ignored.
///
/// Evaluation is done before anything is enqueued, so a malformed alert in a
/// batch rejects the whole request.
///
/// # Errors
///
/// [`MatchError::MissingField`] when the payload has no status, a batch has no
/// `alerts`, an alert has no status, or a firing alert has no name.
pub fn evaluate(
    notification: &Notification,
    rules: &RuleTable,
) -> Result<Vec<PlaybackTarget>, MatchError> {
    match notification {
        Notification::Batch(batch) => evaluate_batch(batch, rules),
        Notification::Legacy(legacy) => evaluate_legacy(legacy, rules),
    }
}

fn evaluate_batch(batch: &AlertBatch, rules: &RuleTable) -> Result<Vec<PlaybackTarget>, MatchError> {
    batch.status.as_ref().ok_or(MatchError::MissingField("status"))?;
    let alerts = batch.alerts.as_ref().ok_or(MatchError::MissingField("alerts"))?;

    let mut targets = Vec::new();
    for alert in alerts {
        if let Some(target) = evaluate_alert(alert, rules)? {
            targets.push(target);
        }
    }

    Ok(targets)
}

fn evaluate_alert(alert: &AlertItem, rules: &RuleTable) -> Result<Option<PlaybackTarget>, MatchError> {
    let status = alert.status.as_deref().ok_or(MatchError::MissingField("status"))?;
    if status != FIRING {
        debug!("status not \"{}\" in the alert: {:?}", FIRING, alert);
        return Ok(None);
    }

    let name = alert
        .labels
        .as_ref()
        .and_then(|labels| labels.alertname.as_deref())
        .ok_or(MatchError::MissingField("alertname"))?;

    Ok(lookup(rules, name, alert.value_string.as_deref()))
}

fn evaluate_legacy(legacy: &LegacyAlert, rules: &RuleTable) -> Result<Vec<PlaybackTarget>, MatchError> {
    let state = legacy.state.as_deref().ok_or(MatchError::MissingField("state"))?;

    // "pending" counts as well in Grafana, but playing on it would be too noisy.
    if state != ALERTING {
        debug!("state not \"{}\" in the alert: {:?}", ALERTING, legacy);
        return Ok(vec![]);
    }

    let name = legacy
        .rule_name
        .as_deref()
        .ok_or(MatchError::MissingField("ruleName"))?;

    Ok(lookup(rules, name, None).into_iter().collect())
}

fn lookup(rules: &RuleTable, name: &str, value: Option<&str>) -> Option<PlaybackTarget> {
    let target = rules.lookup(name, value).cloned();
    if target.is_none() {
        info!("no rule matches alert '{}' with value {:?}", name, value);
    }
    target
}
