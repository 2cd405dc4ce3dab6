//! Transports that put a [`PreparedRequest`] on the wire.
//!
//! The dispatcher only knows the [`Transport`] trait. Two implementations
//! ship with the crate: [`SimpleHttpTransport`] for API-key or anonymous
//! calls, and [`SignedHttpTransport`] for SigV4-signed calls.

mod signed;
pub mod sigv4;
mod simple;
mod wire;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ClientError;
use crate::request::PreparedRequest;
use crate::response::Response;

pub use signed::SignedHttpTransport;
pub use simple::SimpleHttpTransport;
pub use wire::TransportOptions;

/// Sends one prepared request and resolves to its response.
///
/// Non-success statuses, network failures and signing failures are all
/// reported as `Err`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn make_request(&self, request: PreparedRequest) -> Result<Response, ClientError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn make_request(&self, request: PreparedRequest) -> Result<Response, ClientError> {
        self.as_ref().make_request(request).await
    }
}
