use async_trait::async_trait;
use chrono::Utc;

use super::Transport;
use super::sigv4::{AwsCredentials, SigV4Signer, SigningRequest};
use super::wire::{HttpCore, TransportOptions, host_header, remove_header};
use crate::error::ClientError;
use crate::request::{PreparedRequest, query_pairs};
use crate::response::Response;

/// Signs every request with SigV4 before sending it.
///
/// Credentials are fixed at construction. A transport built without them
/// fails each call with `ClientError::Configuration` and sends nothing.
#[derive(Debug)]
pub struct SignedHttpTransport {
    core: HttpCore,
    signer: Option<SigV4Signer>,
}

impl SignedHttpTransport {
    /// Create a signing transport for the API stage at `invoke_url`.
    ///
    /// # Errors
    /// Returns `ClientError::Configuration` for an unparsable URL, or
    /// `ClientError::BuildError` when the HTTP client cannot be built.
    pub fn new(
        invoke_url: &str,
        credentials: Option<AwsCredentials>,
        region: &str,
        service: &str,
        options: TransportOptions,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            core: HttpCore::new(invoke_url, options)?,
            signer: credentials.map(|c| SigV4Signer::new(c, region, service)),
        })
    }

    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.signer.is_some()
    }
}

#[async_trait]
impl Transport for SignedHttpTransport {
    async fn make_request(&self, request: PreparedRequest) -> Result<Response, ClientError> {
        let signer = self.signer.as_ref().ok_or_else(|| {
            ClientError::Configuration("signed request requires AWS credentials".into())
        })?;

        let PreparedRequest {
            method,
            path,
            mut headers,
            query_params,
            body,
        } = request;

        self.core.apply_default_headers(&mut headers, &body);
        let query = query_pairs(&query_params);
        let url = self.core.url_for(&path, &query)?;
        let payload = body.to_bytes();

        // Host is signed but left for reqwest to send.
        let mut signing_headers = headers.clone();
        remove_header(&mut signing_headers, "host");
        signing_headers.insert("host".to_owned(), host_header(&url)?);

        let auth_headers = signer.sign(
            &SigningRequest {
                method: &method,
                path: url.path(),
                query: &query,
                headers: &signing_headers,
                payload: &payload,
            },
            Utc::now(),
        )?;
        tracing::debug!(region = signer.region(), "signed gateway request");

        for (name, value) in auth_headers {
            remove_header(&mut headers, &name);
            headers.insert(name, value);
        }
        remove_header(&mut headers, "host");

        self.core.send(method, url, &headers, payload).await
    }
}
