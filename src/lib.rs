//! # requests-rs
//!
//! A resilient, shared HTTP request layer.
//!
//! Every request built with [`RequestSpec`] goes through the same pipeline:
//! default headers are injected, the call is logged, transport failures are
//! retried with exponential backoff, cookies are captured from login hosts
//! and replayed elsewhere, and the body is optionally inflated (zlib/gzip)
//! before being handed back as a [`ResponseResult`].
//!
//! ## Example
//!
//! ```no_run
//! use requests_rs::{RequestSpec, Requests};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let requests = Requests::new()?;
//!     let spec = RequestSpec::builder()
//!         .url("https://example.com/api/login")
//!         .form([("user", "admiral"), ("pwd", "secret")])
//!         .zlib()
//!         .build()?;
//!
//!     let result = requests.execute(spec).await;
//!     match result.error() {
//!         None => println!("{:?}: {}", result.status(), result.text().unwrap_or_default()),
//!         Some(err) => eprintln!("request failed: {err}"),
//!     }
//!     Ok(())
//! }
//! ```

mod requests;

pub mod config;
pub mod modules;
pub mod request;
pub mod transport;

pub use crate::requests::{Requests, RequestsBuilder, RequestsError, RequestsResult};

pub use crate::config::{PoolConfig, RequestsConfig, TimeoutConfig};

pub use crate::request::{RequestBody, RequestSpec, RequestSpecBuilder, ResponseResult};

pub use crate::transport::{
    HttpTransport, ReqwestTransport, TransportError, WireRequest, WireResponse,
};

pub use crate::modules::{
    DecodeError, DecompressionMode, ErrorEvent, EventDispatcher, EventHandler, HeaderInjection,
    Interceptor, InterceptorChain, LoggingHandler, LoggingInterceptor, Next, PostResponseEvent,
    PreRequestEvent, RequestEvent, RetryEvent, RetryInterceptor, RetryPolicy, ScopedCookieJar,
    StoredCookie,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
