use async_trait::async_trait;

use super::Transport;
use super::wire::{HttpCore, TransportOptions};
use crate::error::ClientError;
use crate::request::{PreparedRequest, query_pairs};
use crate::response::Response;

/// Sends requests as-is; any API key is already among the headers.
#[derive(Debug)]
pub struct SimpleHttpTransport {
    core: HttpCore,
}

impl SimpleHttpTransport {
    /// Create a transport for the API stage at `invoke_url`.
    ///
    /// # Errors
    /// Returns `ClientError::Configuration` for an unparsable URL, or
    /// `ClientError::BuildError` when the HTTP client cannot be built.
    pub fn new(invoke_url: &str, options: TransportOptions) -> Result<Self, ClientError> {
        Ok(Self {
            core: HttpCore::new(invoke_url, options)?,
        })
    }
}

#[async_trait]
impl Transport for SimpleHttpTransport {
    async fn make_request(&self, request: PreparedRequest) -> Result<Response, ClientError> {
        let PreparedRequest {
            method,
            path,
            mut headers,
            query_params,
            body,
        } = request;

        self.core.apply_default_headers(&mut headers, &body);
        let url = self.core.url_for(&path, &query_pairs(&query_params))?;
        self.core.send(method, url, &headers, body.to_bytes()).await
    }
}
