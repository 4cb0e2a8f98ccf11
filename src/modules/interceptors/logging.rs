//! Request/response logging stage.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use super::{Interceptor, Next};
use crate::modules::events::{
    ErrorEvent, EventDispatcher, PostResponseEvent, PreRequestEvent, RequestEvent,
};
use crate::transport::{TransportError, WireRequest, WireResponse};

/// Reports every call to the event dispatcher without touching it.
#[derive(Debug, Clone)]
pub struct LoggingInterceptor {
    events: Arc<EventDispatcher>,
}

impl LoggingInterceptor {
    pub fn new(events: Arc<EventDispatcher>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl Interceptor for LoggingInterceptor {
    async fn intercept(
        &self,
        request: WireRequest,
        next: Next<'_>,
    ) -> Result<WireResponse, TransportError> {
        let method = request.method.clone();
        let url = request.url.clone();

        self.events.dispatch(RequestEvent::PreRequest(PreRequestEvent {
            url: url.clone(),
            method: method.clone(),
            timestamp: chrono::Utc::now(),
        }));

        let started = Instant::now();
        let result = next.run(request).await;
        let latency = started.elapsed();

        match &result {
            Ok(response) => {
                self.events.dispatch(RequestEvent::PostResponse(PostResponseEvent {
                    url: response.url.clone(),
                    method,
                    status: response.status,
                    latency,
                    timestamp: chrono::Utc::now(),
                }));
            }
            Err(error) => {
                self.events.dispatch(RequestEvent::Error(ErrorEvent {
                    url,
                    method,
                    error: error.to_string(),
                    latency,
                    timestamp: chrono::Utc::now(),
                }));
            }
        }

        result
    }
}
