//! Request lifecycle events.
//!
//! The logging and retry interceptors describe what they observe as events;
//! handlers registered on the dispatcher decide what to do with them.

use chrono::{DateTime, Utc};
use http::Method;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Structured pre-request event.
#[derive(Debug, Clone)]
pub struct PreRequestEvent {
    pub url: Url,
    pub method: Method,
    pub timestamp: DateTime<Utc>,
}

/// Structured post-response event.
#[derive(Debug, Clone)]
pub struct PostResponseEvent {
    pub url: Url,
    pub method: Method,
    pub status: u16,
    pub latency: Duration,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub url: Url,
    pub method: Method,
    pub error: String,
    pub latency: Duration,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RetryEvent {
    pub host: String,
    pub attempt: u32,
    pub max_attempts: u32,
    pub reason: String,
    pub scheduled_after: Duration,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum RequestEvent {
    PreRequest(PreRequestEvent),
    PostResponse(PostResponseEvent),
    Error(ErrorEvent),
    Retry(RetryEvent),
}

/// Trait implemented by event handlers.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &RequestEvent);
}

/// Dispatcher that broadcasts events to registered handlers.
///
/// A panicking handler is isolated: the panic is swallowed and the remaining
/// handlers still run, so a broken sink never fails a request.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    pub fn register_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn dispatch(&self, event: RequestEvent) {
        for handler in &self.handlers {
            let outcome = catch_unwind(AssertUnwindSafe(|| handler.handle(&event)));
            if outcome.is_err() {
                log::error!("event handler panicked; event dropped");
            }
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Logs events using the `log` crate.
#[derive(Debug)]
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn handle(&self, event: &RequestEvent) {
        match event {
            RequestEvent::PreRequest(pre) => {
                log::debug!("-> {} {}", pre.method, pre.url);
            }
            RequestEvent::PostResponse(post) => {
                log::debug!(
                    "<- {} {} -> {} ({:.2}s)",
                    post.method,
                    post.url,
                    post.status,
                    post.latency.as_secs_f64()
                );
            }
            RequestEvent::Error(error) => {
                log::warn!(
                    "<- {} {} failed after {:.2}s: {}",
                    error.method,
                    error.url,
                    error.latency.as_secs_f64(),
                    error.error
                );
            }
            RequestEvent::Retry(retry) => {
                log::info!(
                    "retry {} attempt {}/{} after {:.2}s ({})",
                    retry.host,
                    retry.attempt,
                    retry.max_attempts,
                    retry.scheduled_after.as_secs_f64(),
                    retry.reason
                );
            }
        }
    }
}
