//! Webhook request processing.
//!
//! A request goes through the following steps, any failure answering right away:
//!
//! ```text
//! received → source checked → window checked → body read → decoded → matched → enqueued → answered
//!                                   └─ outside window: answered 200, nothing played
//! ```

use axum::{
    body::{self, Body},
    extract::State,
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use log::{debug, error, info};

use crate::{
    grafana::{Notification, evaluate},
    webhook::{ListenerContext, WebhookError},
};

/// Result of a processed request.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Received outside of the time window, nothing evaluated.
    Suppressed,
    /// Evaluated, with the number of files enqueued (possibly zero).
    Enqueued(usize),
}

/// Handles `POST` requests on any path.
pub async fn handle(
    State(ctx): State<ListenerContext>,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> Response {
    match process(&ctx, &headers, body).await {
        Ok(outcome) => {
            debug!("request for {} processed: {:?}", uri.path(), outcome);
            text(StatusCode::OK, format!("POST request for {}", uri.path()))
        }
        Err(e) => {
            match &e {
                WebhookError::Decode(_) | WebhookError::Malformed(_) => error!("{}", e),
                _ => info!("{}, ignoring", e),
            }
            text(e.status_code(ctx.bad_source), e.to_string())
        }
    }
}

async fn process(
    ctx: &ListenerContext,
    headers: &HeaderMap,
    body: Body,
) -> Result<Outcome, WebhookError> {
    check_source(ctx, headers)?;

    let now = (ctx.clock)();
    if !ctx.window.allows(now) {
        info!("request received outside of open time window {}, ignoring", ctx.window);
        return Ok(Outcome::Suppressed);
    }

    let bytes = body::to_bytes(body, ctx.max_body_bytes)
        .await
        .map_err(|e| WebhookError::UnreadableBody(e.to_string()))?;
    if bytes.is_empty() {
        return Err(WebhookError::EmptyBody);
    }

    let notification = Notification::from_slice(&bytes).inspect_err(|_| {
        error!(
            "cannot decode payload data: {}",
            String::from_utf8_lossy(&bytes)
        )
    })?;
    debug!("got payload: {:?}", notification);

    let targets = evaluate(&notification, &ctx.rules)?;
    let count = targets.len();
    for target in targets {
        info!("will play '{}'", target);
        ctx.queue.enqueue(target);
    }

    Ok(Outcome::Enqueued(count))
}

fn check_source(ctx: &ListenerContext, headers: &HeaderMap) -> Result<(), WebhookError> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok());

    if user_agent == Some(&*ctx.user_agent) {
        return Ok(());
    }

    Err(WebhookError::BadSource {
        expected: ctx.user_agent.to_string(),
        found: user_agent.map(str::to_owned),
    })
}

fn text(status: StatusCode, message: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, mime::TEXT_PLAIN_UTF_8.as_ref())],
        message,
    )
        .into_response()
}
