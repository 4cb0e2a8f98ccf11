//! Reqwest-based implementation of the `HttpTransport` trait.
//!
//! Owns the single pooled `reqwest::Client` and wires the scoped cookie jar
//! into it, so cookie capture and attachment happen on every network
//! exchange, redirect hops included.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use super::{HttpTransport, TransportError, WireRequest, WireResponse};
use crate::config::{PoolConfig, TimeoutConfig};
use crate::modules::codec::drain_response;
use crate::modules::cookies::ScopedCookieJar;

/// Reqwest-backed transport shared by every request of a client.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(
        timeouts: TimeoutConfig,
        pool: PoolConfig,
        cookies: Arc<ScopedCookieJar>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .cookie_provider(cookies)
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.read)
            .timeout(timeouts.total())
            .pool_max_idle_per_host(pool.max_idle_per_host)
            .pool_idle_timeout(pool.idle_timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Wrap an existing reqwest client. Cookie scoping only applies if the
    /// client was built with a [`ScopedCookieJar`] as its cookie provider.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: WireRequest) -> Result<WireResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = drain_response(response).await?;

        Ok(WireResponse {
            status,
            headers,
            body,
            url,
        })
    }
}
