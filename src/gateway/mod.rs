//! Request gateway for the resource API
//!
//! Injects the session credential into outbound calls and normalizes every
//! failure into a single [`ApiError`] descriptor.

mod client;
mod error;
mod http;
#[cfg(test)]
pub(crate) mod testing;
mod transport;

pub use client::RequestGateway;
pub use error::{ApiError, ErrorPayload, DEFAULT_FALLBACK};
pub use http::HttpTransport;
pub use transport::{ApiRequest, ApiResponse, Transport, TransportError};
