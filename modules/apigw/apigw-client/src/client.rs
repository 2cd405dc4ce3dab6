use std::sync::Arc;

use crate::auth::{AuthType, inject_api_key};
use crate::config::ApiGatewayConfig;
use crate::error::ClientError;
use crate::request::{AdditionalParams, PreparedRequest, RequestDescriptor, merge_into};
use crate::response::Response;
use crate::transport::{SignedHttpTransport, SimpleHttpTransport, Transport};

/// Routes each request to the plain or the signed transport.
///
/// Holds no per-call state; clones share the same transports.
#[derive(Clone)]
pub struct ApiGatewayClient {
    simple: Arc<dyn Transport>,
    signed: Arc<dyn Transport>,
}

impl std::fmt::Debug for ApiGatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiGatewayClient").finish_non_exhaustive()
    }
}

impl ApiGatewayClient {
    /// Use the given transports for unauthenticated and signed requests.
    #[must_use]
    pub fn new(simple: Arc<dyn Transport>, signed: Arc<dyn Transport>) -> Self {
        Self { simple, signed }
    }

    /// Build both reqwest-backed transports from configuration.
    ///
    /// # Errors
    /// Returns `ClientError::Configuration` for an invalid invoke URL, or
    /// `ClientError::BuildError` when an HTTP client cannot be built.
    pub fn from_config(config: &ApiGatewayConfig) -> Result<Self, ClientError> {
        let simple = SimpleHttpTransport::new(&config.invoke_url, config.transport.clone())?;
        let signed = SignedHttpTransport::new(
            &config.invoke_url,
            config.credentials.clone(),
            &config.region,
            &config.service,
            config.transport.clone(),
        )?;
        Ok(Self::new(Arc::new(simple), Arc::new(signed)))
    }

    /// Turn a descriptor into what a transport sends.
    ///
    /// In order: the API key goes into `x-api-key`, the body is normalized,
    /// then the additional headers and query params are overlaid. Because the
    /// overlay runs last, an additional `x-api-key` replaces the injected one.
    ///
    /// # Errors
    /// Returns `ClientError::Serialization` when a structured body has no JSON
    /// form.
    pub fn prepare(
        request: RequestDescriptor,
        additional: &AdditionalParams,
        api_key: Option<&str>,
    ) -> Result<PreparedRequest, ClientError> {
        let (method, path, mut headers, query_params, body) = request.into_parts();

        inject_api_key(&mut headers, api_key);
        let body = body.normalize()?;

        Ok(PreparedRequest {
            method,
            path,
            headers: merge_into(&headers, additional.headers.as_ref()),
            query_params: merge_into(&query_params, additional.query_params.as_ref()),
            body,
        })
    }

    /// The transport an auth type is routed to.
    #[must_use]
    pub fn transport_for(&self, auth_type: AuthType) -> &Arc<dyn Transport> {
        match auth_type {
            AuthType::Signed => &self.signed,
            AuthType::Unauthenticated => &self.simple,
        }
    }

    /// Prepare `request` and send it through the transport for `auth_type`.
    ///
    /// The transport's result is returned as-is: no retry, no timeout, no
    /// error wrapping.
    ///
    /// # Errors
    /// Returns `ClientError::Serialization` before anything is sent when the
    /// body cannot be serialized, otherwise whatever the transport returns.
    pub async fn make_request(
        &self,
        request: RequestDescriptor,
        auth_type: AuthType,
        additional: &AdditionalParams,
        api_key: Option<&str>,
    ) -> Result<Response, ClientError> {
        let prepared = Self::prepare(request, additional, api_key)?;
        tracing::debug!(
            method = %prepared.method,
            path = %prepared.path,
            auth = %auth_type,
            "dispatching gateway request"
        );
        self.transport_for(auth_type).make_request(prepared).await
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::Method;
    use serde_json::json;

    use super::*;
    use crate::auth::API_KEY_HEADER;
    use crate::body::{ByteView, NormalizedBody};

    #[test]
    fn test_scenario_binary_upload_with_key() {
        let data = Bytes::from_static(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let request = RequestDescriptor::builder()
            .method(Method::PUT)
            .path("/upload/a.png")
            .body(data.clone())
            .build()
            .unwrap();
        let additional = AdditionalParams::new().header("Content-Type", "image/png");

        let prepared = ApiGatewayClient::prepare(request, &additional, Some("abc123")).unwrap();

        assert_eq!(prepared.headers.len(), 2);
        assert_eq!(prepared.headers[API_KEY_HEADER], "abc123");
        assert_eq!(prepared.headers["Content-Type"], "image/png");
        assert_eq!(prepared.body, NormalizedBody::Binary(data));
    }

    #[test]
    fn test_scenario_json_search_without_key() {
        let request = RequestDescriptor::builder()
            .path("/search")
            .json(json!({"q": "sunset"}))
            .build()
            .unwrap();

        let prepared =
            ApiGatewayClient::prepare(request, &AdditionalParams::default(), None).unwrap();

        assert_eq!(prepared.body, NormalizedBody::Json(r#"{"q":"sunset"}"#.to_owned()));
        assert!(!prepared.headers.contains_key(API_KEY_HEADER));
    }

    #[test]
    fn test_additional_header_overrides_api_key() {
        let request = RequestDescriptor::builder().path("/search").build().unwrap();
        let additional = AdditionalParams::new().header(API_KEY_HEADER, "override");

        let prepared = ApiGatewayClient::prepare(request, &additional, Some("abc123")).unwrap();
        assert_eq!(prepared.headers[API_KEY_HEADER], "override");
    }

    #[test]
    fn test_empty_key_not_injected() {
        let request = RequestDescriptor::builder().path("/search").build().unwrap();
        let prepared =
            ApiGatewayClient::prepare(request, &AdditionalParams::default(), Some("")).unwrap();
        assert!(prepared.headers.is_empty());
    }

    #[test]
    fn test_descriptor_params_survive_merge() {
        let request = RequestDescriptor::builder()
            .path("/search")
            .header("x-trace", "1")
            .query("q", "dogs")
            .build()
            .unwrap();
        let additional = AdditionalParams::new().query("q", "cats").query("page", "2");

        let prepared = ApiGatewayClient::prepare(request, &additional, None).unwrap();
        assert_eq!(prepared.headers["x-trace"], "1");
        assert_eq!(prepared.query_params["q"].values(), ["cats".to_owned()]);
        assert_eq!(prepared.query_params["page"].values(), ["2".to_owned()]);
    }

    #[test]
    fn test_null_json_body_prepared_as_empty() {
        for request in [
            RequestDescriptor::builder().path("/x").json(None::<String>),
            RequestDescriptor::builder().path("/x").json(serde_json::Value::Null),
            RequestDescriptor::builder().path("/x").body(serde_json::Value::Null),
        ] {
            let request = request.build().unwrap();
            let prepared =
                ApiGatewayClient::prepare(request, &AdditionalParams::default(), None).unwrap();
            assert_eq!(prepared.body, NormalizedBody::Empty);
        }
    }

    #[test]
    fn test_view_body_sent_as_buffer() {
        let buffer = Bytes::from_static(b"hello world");
        let request = RequestDescriptor::builder()
            .method(Method::PUT)
            .path("/upload/x")
            .body(ByteView::with_range(buffer.clone(), 6, 5).unwrap())
            .build()
            .unwrap();
        let prepared =
            ApiGatewayClient::prepare(request, &AdditionalParams::default(), None).unwrap();
        assert_eq!(prepared.body, NormalizedBody::Binary(buffer));
    }
}
