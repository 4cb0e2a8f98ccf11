//! Interceptor chain wrapped around every network call.
//!
//! Each stage receives the request plus a [`Next`] handle to the remainder of
//! the chain and decides whether, and how often, to call it. The innermost
//! `Next` hands the request to the transport.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::transport::{HttpTransport, TransportError, WireRequest, WireResponse};

pub mod header;
pub mod logging;
pub mod retry;

pub use header::HeaderInjection;
pub use logging::LoggingInterceptor;
pub use retry::{RetryInterceptor, RetryPolicy};

/// Boxed future returned by [`Next::run`].
pub type ChainFuture<'a> =
    Pin<Box<dyn Future<Output = Result<WireResponse, TransportError>> + Send + 'a>>;

/// A single stage of the chain.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(
        &self,
        request: WireRequest,
        next: Next<'_>,
    ) -> Result<WireResponse, TransportError>;
}

/// Handle to the rest of the chain. `Copy`, so a stage may run it repeatedly.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    transport: &'a dyn HttpTransport,
    rest: &'a [Arc<dyn Interceptor>],
}

impl<'a> Next<'a> {
    pub fn new(transport: &'a dyn HttpTransport, rest: &'a [Arc<dyn Interceptor>]) -> Self {
        Self { transport, rest }
    }

    pub fn run(self, request: WireRequest) -> ChainFuture<'a> {
        Box::pin(async move {
            match self.rest.split_first() {
                Some((stage, rest)) => {
                    stage
                        .intercept(request, Next::new(self.transport, rest))
                        .await
                }
                None => self.transport.send(request).await,
            }
        })
    }
}

/// Ordered list of interceptors; the first one is the outermost.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    stages: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn with(mut self, stage: Arc<dyn Interceptor>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn push(&mut self, stage: Arc<dyn Interceptor>) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub async fn execute(
        &self,
        transport: &dyn HttpTransport,
        request: WireRequest,
    ) -> Result<WireResponse, TransportError> {
        Next::new(transport, &self.stages).run(request).await
    }
}
