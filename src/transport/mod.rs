//! Network transport boundary.

pub mod client;
pub mod reqwest_client;
pub mod types;

pub use client::{HttpTransport, TransportError};
pub use reqwest_client::ReqwestTransport;
pub use types::{WireRequest, WireResponse};
