//! High level client orchestration.
//!
//! Wires together the transport, the scoped cookie jar, the event dispatcher
//! and the interceptor chain (header injection, logging, retry) to expose a
//! client whose `execute` always hands back a [`ResponseResult`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use once_cell::sync::OnceCell;
use thiserror::Error;

use crate::config::{PoolConfig, RequestsConfig, TimeoutConfig};
use crate::modules::codec::DecodeError;
use crate::modules::cookies::ScopedCookieJar;
use crate::modules::events::{EventDispatcher, EventHandler, LoggingHandler};
use crate::modules::interceptors::{
	HeaderInjection, Interceptor, InterceptorChain, LoggingInterceptor, RetryInterceptor,
	RetryPolicy,
};
use crate::request::{RequestSpec, ResponseResult};
use crate::transport::{HttpTransport, ReqwestTransport, TransportError};

/// Result alias used across the crate.
pub type RequestsResult<T> = Result<T, RequestsError>;

/// Error surfaced by request building and execution.
#[derive(Debug, Error)]
pub enum RequestsError {
	#[error("{0}")]
	Transport(#[from] TransportError),
	#[error("decode error: {0}")]
	Decode(#[from] DecodeError),
	#[error("request url is missing")]
	MissingUrl,
	#[error("url parse error: {0}")]
	InvalidUrl(#[from] url::ParseError),
	#[error("header conversion failed: {0}")]
	InvalidHeader(String),
	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),
	#[error("http client initialisation failed: {0}")]
	Client(#[from] reqwest::Error),
	#[error("request failed: {0}")]
	Failed(String),
	#[error("request stage panicked: {0}")]
	Panicked(String),
}

/// Fluent builder for [`Requests`].
pub struct RequestsBuilder {
	config: RequestsConfig,
	cookies: Option<Arc<ScopedCookieJar>>,
	transport: Option<Arc<dyn HttpTransport>>,
	handlers: Vec<Arc<dyn EventHandler>>,
	interceptors: Vec<Arc<dyn Interceptor>>,
	logging_handler: bool,
}

impl RequestsBuilder {
	pub fn new() -> Self {
		Self {
			config: RequestsConfig::default(),
			cookies: None,
			transport: None,
			handlers: Vec::new(),
			interceptors: Vec::new(),
			logging_handler: true,
		}
	}

	pub fn with_config(mut self, config: RequestsConfig) -> Self {
		self.config = config;
		self
	}

	pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
		self.config.timeouts = timeouts;
		self
	}

	pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
		self.config.timeouts.connect = timeout;
		self
	}

	pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
		self.config.timeouts.read = timeout;
		self
	}

	pub fn with_pool(mut self, pool: PoolConfig) -> Self {
		self.config.pool = pool;
		self
	}

	pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
		self.config.retry = policy;
		self
	}

	pub fn with_max_attempts(mut self, attempts: u32) -> Self {
		self.config.retry = self.config.retry.with_max_attempts(attempts);
		self
	}

	/// Adds or replaces a default header.
	pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		let name = name.into();
		self.config
			.default_headers
			.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
		self.config.default_headers.push((name, value.into()));
		self
	}

	pub fn without_default_headers(mut self) -> Self {
		self.config.default_headers.clear();
		self
	}

	/// Shares an existing cookie jar instead of creating a fresh one.
	pub fn with_cookie_jar(mut self, cookies: Arc<ScopedCookieJar>) -> Self {
		self.cookies = Some(cookies);
		self
	}

	/// Replaces the reqwest transport. Custom transports are responsible for
	/// consulting [`Requests::cookie_jar`] themselves.
	pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
		self.transport = Some(transport);
		self
	}

	pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
		self.handlers.push(handler);
		self
	}

	/// Appends a custom stage. Custom stages run inside the retry stage, so
	/// once per attempt. A panicking stage fails the call with
	/// [`RequestsError::Panicked`] instead of unwinding through `execute`.
	pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
		self.interceptors.push(interceptor);
		self
	}

	/// Skips the built-in `log` handler; only registered handlers see events.
	pub fn disable_logging_handler(mut self) -> Self {
		self.logging_handler = false;
		self
	}

	pub fn build(self) -> RequestsResult<Requests> {
		Requests::with_builder(self)
	}
}

impl Default for RequestsBuilder {
	fn default() -> Self {
		Self::new()
	}
}

static SHARED: OnceCell<Requests> = OnceCell::new();

/// Shared client applying header injection, logging, retries and cookie
/// scoping to every request it executes.
pub struct Requests {
	config: RequestsConfig,
	cookies: Arc<ScopedCookieJar>,
	transport: Arc<dyn HttpTransport>,
	chain: InterceptorChain,
}

impl Requests {
	/// Construct a client with default configuration.
	pub fn new() -> RequestsResult<Self> {
		RequestsBuilder::new().build()
	}

	/// Obtain a builder to customise the client instance.
	pub fn builder() -> RequestsBuilder {
		RequestsBuilder::new()
	}

	/// Process-wide client with default configuration, created on first use.
	pub fn shared() -> RequestsResult<&'static Requests> {
		SHARED.get_or_try_init(Requests::new)
	}

	fn with_builder(builder: RequestsBuilder) -> RequestsResult<Self> {
		let RequestsBuilder {
			config,
			cookies,
			transport,
			handlers,
			interceptors,
			logging_handler,
		} = builder;

		let mut events = EventDispatcher::new();
		if logging_handler {
			events.register_handler(Arc::new(LoggingHandler));
		}
		for handler in handlers {
			events.register_handler(handler);
		}
		let events = Arc::new(events);

		let headers = HeaderInjection::from_pairs(
			config.default_headers.iter().map(|(name, value)| (name, value)),
		)
		.map_err(RequestsError::InvalidHeader)?;

		let mut chain = InterceptorChain::new()
			.with(Arc::new(headers))
			.with(Arc::new(LoggingInterceptor::new(events.clone())))
			.with(Arc::new(RetryInterceptor::new(config.retry, events)));
		for interceptor in interceptors {
			chain.push(interceptor);
		}

		let cookies = cookies.unwrap_or_default();
		let transport: Arc<dyn HttpTransport> = match transport {
			Some(transport) => transport,
			None => Arc::new(ReqwestTransport::new(
				config.timeouts,
				config.pool,
				cookies.clone(),
			)?),
		};

		Ok(Self {
			config,
			cookies,
			transport,
			chain,
		})
	}

	pub fn config(&self) -> &RequestsConfig {
		&self.config
	}

	pub fn cookie_jar(&self) -> &Arc<ScopedCookieJar> {
		&self.cookies
	}

	/// Drops every captured cookie.
	pub fn clear_cookies(&self) {
		self.cookies.clear();
	}

	/// Executes `spec` through the interceptor chain.
	///
	/// Never fails: transport and decode errors are reported through the
	/// returned [`ResponseResult`]. The future resolves once the call,
	/// retries included, has completed or exhausted its attempts.
	pub async fn execute(&self, spec: RequestSpec) -> ResponseResult {
		let (request, decompression) = spec.into_wire();
		let method = request.method.clone();
		let url = request.url.clone();

		let outcome = AssertUnwindSafe(self.chain.execute(self.transport.as_ref(), request))
			.catch_unwind()
			.await;

		match outcome {
			Ok(Ok(response)) => ResponseResult::from_response(response, decompression),
			Ok(Err(error)) => {
				log::debug!("{} {} failed: {}", method, url, error);
				ResponseResult::from_error(error.into())
			}
			Err(payload) => {
				let message = panic_message(payload.as_ref());
				log::error!("{} {} aborted by a panicking stage: {}", method, url, message);
				ResponseResult::from_error(RequestsError::Panicked(message))
			}
		}
	}

	/// Perform an HTTP GET request.
	pub async fn get(&self, url: &str) -> ResponseResult {
		self.execute_built(RequestSpec::builder().url(url).build()).await
	}

	/// POST URL-form-encoded fields.
	pub async fn post_form<I, K, V>(&self, url: &str, fields: I) -> ResponseResult
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.execute_built(RequestSpec::builder().url(url).form(fields).build())
			.await
	}

	/// POST an already serialised JSON document.
	pub async fn post_json(&self, url: &str, json: impl Into<String>) -> ResponseResult {
		self.execute_built(RequestSpec::builder().url(url).json(json).build())
			.await
	}

	async fn execute_built(&self, spec: RequestsResult<RequestSpec>) -> ResponseResult {
		match spec {
			Ok(spec) => self.execute(spec).await,
			Err(error) => {
				log::error!("invalid request: {}", error);
				ResponseResult::from_error(error)
			}
		}
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&str>() {
		(*message).to_string()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"unknown panic payload".to_string()
	}
}
