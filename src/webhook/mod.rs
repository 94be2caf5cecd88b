//! HTTP endpoint receiving Grafana webhook notifications.
//!
//! Grafana posts its notifications to any path of the listener. Each request is
//! checked and evaluated by [`handler`], and matched sound files are pushed on
//! the [`PlaybackQueue`]. The answer is always a short plain text message:
//!
//! | situation | status |
//! |-----------|--------|
//! | files enqueued, no rule matched, or outside of the time window | 200 |
//! | other `User-Agent` | 400, or 200 with `bad_source = "ignore"` |
//! | empty, unreadable or oversized body | 400 |
//! | invalid JSON | 400 |
//! | missing status, alerts or alert name | 400 |
//!
//! Errors never leave the handler: a bad request only affects its own answer.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::post};
use chrono::{Local, NaiveDateTime};
use log::info;
use tokio::net::TcpListener;

use crate::{playback::PlaybackQueue, rules::RuleTable, window::TimeWindow};

mod error;
mod handler;

pub use crate::webhook::error::{BadSourcePolicy, WebhookError};

/// Source of the current local time.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Wall clock in the local timezone.
pub fn local_clock() -> Clock {
    Arc::new(|| Local::now().naive_local())
}

/// Everything a request handler needs, built once at startup.
///
/// Only the queue is shared mutable state, and it is safe for concurrent
/// producers. The rule table and the window are read-only.
#[derive(Clone)]
pub struct ListenerContext {
    pub rules: Arc<RuleTable>,
    pub window: TimeWindow,
    pub queue: PlaybackQueue,
    /// Expected `User-Agent` header value.
    pub user_agent: Arc<str>,
    pub bad_source: BadSourcePolicy,
    pub max_body_bytes: usize,
    pub clock: Clock,
}

/// Builds the webhook router: `POST` on any path.
pub fn router(ctx: ListenerContext) -> Router {
    Router::new()
        .route("/", post(handler::handle))
        .route("/{*path}", post(handler::handle))
        .with_state(ctx)
}

/// Serves webhook requests on `listener` until `shutdown` completes.
///
/// # Errors
///
/// Returns an error if the listener fails.
pub async fn serve<F>(listener: TcpListener, ctx: ListenerContext, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("starting HTTP server on {}...", listener.local_addr()?);

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("stopping HTTP server...");
    Ok(())
}
