//! Client for the photo album API: keyword search and photo upload.

use http::Method;
use serde::{Deserialize, Serialize};

use crate::auth::AuthType;
use crate::body::{Blob, Payload};
use crate::client::ApiGatewayClient;
use crate::config::ApiGatewayConfig;
use crate::error::ClientError;
use crate::operation::{Operation, Params};
use crate::request::AdditionalParams;
use crate::response::Response;

/// Header carrying comma-separated labels stored as object metadata.
pub const CUSTOM_LABELS_HEADER: &str = "x-amz-meta-customLabels";

/// Content type assumed for uploads whose blob has none.
pub const DEFAULT_IMAGE_TYPE: &str = "image/jpeg";

pub const SEARCH_GET: Operation = Operation {
    method: Method::GET,
    path_template: "/search",
    header_params: &[],
    query_params: &["q"],
    required: &["q"],
};

pub const UPLOAD_PUT: Operation = Operation {
    method: Method::PUT,
    path_template: "/upload/{filename}",
    header_params: &["Content-Type", CUSTOM_LABELS_HEADER],
    query_params: &[],
    required: &["filename"],
};

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoReference {
    pub object_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

impl PhotoReference {
    /// The explicit `url` if the hit has one, else the object key under
    /// `bucket_endpoint`.
    #[must_use]
    pub fn image_url(&self, bucket_endpoint: &str) -> String {
        match &self.url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!("{bucket_endpoint}{}", self.object_key),
        }
    }
}

/// Photo album operations on top of [`ApiGatewayClient`].
#[derive(Clone)]
pub struct PhotoAlbumClient {
    gateway: ApiGatewayClient,
    api_key: Option<String>,
    auth_type: AuthType,
}

impl std::fmt::Debug for PhotoAlbumClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoAlbumClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("auth_type", &self.auth_type)
            .finish_non_exhaustive()
    }
}

impl PhotoAlbumClient {
    #[must_use]
    pub fn new(gateway: ApiGatewayClient, api_key: Option<String>) -> Self {
        Self {
            gateway,
            api_key,
            auth_type: AuthType::Unauthenticated,
        }
    }

    /// Build the gateway client from configuration.
    ///
    /// # Errors
    /// Returns whatever [`ApiGatewayClient::from_config`] returns.
    pub fn from_config(config: &ApiGatewayConfig) -> Result<Self, ClientError> {
        Ok(Self::new(ApiGatewayClient::from_config(config)?, config.api_key.clone()))
    }

    #[must_use]
    pub fn with_auth_type(mut self, auth_type: AuthType) -> Self {
        self.auth_type = auth_type;
        self
    }

    #[must_use]
    pub fn auth_type(&self) -> AuthType {
        self.auth_type
    }

    /// `GET /search?q=...`
    ///
    /// # Errors
    /// `ClientError::MissingParameter` without `q`; otherwise transport errors.
    pub async fn search_get(
        &self,
        params: &Params,
        additional: &AdditionalParams,
    ) -> Result<Response, ClientError> {
        let request = SEARCH_GET.descriptor(params, Payload::Absent)?;
        self.gateway
            .make_request(request, self.auth_type, additional, self.api_key.as_deref())
            .await
    }

    /// `PUT /upload/{filename}`
    ///
    /// # Errors
    /// `ClientError::MissingParameter` without `filename`; otherwise
    /// serialization or transport errors.
    pub async fn upload_put(
        &self,
        params: &Params,
        body: impl Into<Payload>,
        additional: &AdditionalParams,
    ) -> Result<Response, ClientError> {
        let request = UPLOAD_PUT.descriptor(params, body)?;
        self.gateway
            .make_request(request, self.auth_type, additional, self.api_key.as_deref())
            .await
    }

    /// Search by free text and decode the hits.
    ///
    /// # Errors
    /// Transport errors, or `ClientError::Serialization` when the response is
    /// not a list of photo references.
    pub async fn search(&self, query: &str) -> Result<Vec<PhotoReference>, ClientError> {
        let mut params = Params::new();
        params.insert("q".to_owned(), query.to_owned());
        let response = self.search_get(&params, &AdditionalParams::default()).await?;
        let hits: Vec<PhotoReference> = response.json()?;
        tracing::info!(query, hits = hits.len(), "photo search complete");
        Ok(hits)
    }

    /// Upload a picture under `filename` with optional custom labels.
    ///
    /// The content type and labels are sent both as modeled parameters and as
    /// additional headers.
    ///
    /// # Errors
    /// Transport errors.
    pub async fn upload(
        &self,
        filename: &str,
        blob: Blob,
        custom_labels: &str,
    ) -> Result<Response, ClientError> {
        let content_type = blob.content_type().unwrap_or(DEFAULT_IMAGE_TYPE).to_owned();

        let mut params = Params::new();
        params.insert("filename".to_owned(), filename.to_owned());
        params.insert("Content-Type".to_owned(), content_type.clone());
        params.insert(CUSTOM_LABELS_HEADER.to_owned(), custom_labels.to_owned());

        let additional = AdditionalParams::new()
            .header("Content-Type", content_type)
            .header(CUSTOM_LABELS_HEADER, custom_labels);

        let size = blob.len();
        let response = self.upload_put(&params, blob, &additional).await?;
        tracing::info!(filename, size, status = %response.status(), "photo uploaded");
        Ok(response)
    }
}
