//! Cross-cutting services module
//!
//! Codecs, cookie scoping, request events and the interceptor chain applied
//! around every call.

pub mod codec;
pub mod cookies;
pub mod events;
pub mod interceptors;

// Re-export commonly used types
pub use codec::{DecodeError, DecompressionMode};
pub use cookies::{ScopedCookieJar, StoredCookie};
pub use events::{
    ErrorEvent, EventDispatcher, EventHandler, LoggingHandler, PostResponseEvent,
    PreRequestEvent, RequestEvent, RetryEvent,
};
pub use interceptors::{
    HeaderInjection, Interceptor, InterceptorChain, LoggingInterceptor, Next, RetryInterceptor,
    RetryPolicy,
};
