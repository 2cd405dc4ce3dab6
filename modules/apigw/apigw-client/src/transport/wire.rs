use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use url::Url;

use crate::body::NormalizedBody;
use crate::error::ClientError;
use crate::request::HeaderParams;
use crate::response::Response;

const ACCEPT: &str = "Accept";
const CONTENT_TYPE: &str = "Content-Type";
const JSON: &str = "application/json";

/// Settings shared by both transports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// `Accept` value used when the request does not set one
    pub default_accept: String,
    /// `Content-Type` value used when the request has a body but no type
    pub default_content_type: String,
    /// Whole-request timeout; none when unset
    pub timeout: Option<Duration>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            default_accept: JSON.to_owned(),
            default_content_type: JSON.to_owned(),
            timeout: None,
        }
    }
}

/// reqwest plumbing common to the plain and signed transports.
#[derive(Debug)]
pub(super) struct HttpCore {
    base_url: String,
    http_client: reqwest::Client,
    options: TransportOptions,
}

impl HttpCore {
    pub(super) fn new(invoke_url: &str, options: TransportOptions) -> Result<Self, ClientError> {
        Url::parse(invoke_url)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| ClientError::BuildError(e.to_string()))?;

        Ok(Self {
            base_url: invoke_url.trim_end_matches('/').to_owned(),
            http_client,
            options,
        })
    }

    /// Invoke URL + path, with the query string encoded the same way the
    /// signer canonicalizes it.
    pub(super) fn url_for(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Url, ClientError> {
        let separator = if path.starts_with('/') { "" } else { "/" };
        let mut url = Url::parse(&format!("{}{separator}{path}", self.base_url))?;
        if query.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&encode_query(query)));
        }
        Ok(url)
    }

    /// Fill in `Accept` and `Content-Type`, and drop `Content-Type` when
    /// nothing is sent.
    pub(super) fn apply_default_headers(&self, headers: &mut HeaderParams, body: &NormalizedBody) {
        if !has_header(headers, ACCEPT) {
            headers.insert(ACCEPT.to_owned(), self.options.default_accept.clone());
        }
        if body.is_empty() {
            remove_header(headers, CONTENT_TYPE);
        } else if !has_header(headers, CONTENT_TYPE) {
            let content_type = body
                .content_type()
                .unwrap_or(&self.options.default_content_type);
            headers.insert(CONTENT_TYPE.to_owned(), content_type.to_owned());
        }
    }

    pub(super) async fn send(
        &self,
        method: Method,
        url: Url,
        headers: &HeaderParams,
        body: Bytes,
    ) -> Result<Response, ClientError> {
        tracing::debug!(%method, %url, body_len = body.len(), "sending gateway request");

        let mut req_builder = self
            .http_client
            .request(method, url)
            .headers(header_map(headers)?);
        if !body.is_empty() {
            req_builder = req_builder.body(body);
        }

        let resp = req_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout(e.to_string())
            } else if e.is_connect() {
                ClientError::Connection(e.to_string())
            } else {
                ClientError::Reqwest(e)
            }
        })?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let data = resp.bytes().await?;

        if !status.is_success() {
            tracing::warn!(%status, body_len = data.len(), "gateway returned non-success status");
            return Err(ClientError::Http { status, body: data });
        }

        Ok(Response::new(status, headers, data))
    }
}

/// `k=v` pairs joined with `&`, keys and values percent-encoded outside the
/// RFC 3986 unreserved set.
pub(super) fn encode_query(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// `host[:port]` as it appears in the `Host` header.
pub(super) fn host_header(url: &Url) -> Result<String, ClientError> {
    let host = url
        .host_str()
        .ok_or_else(|| ClientError::Configuration(format!("invoke URL has no host: {url}")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    })
}

pub(super) fn has_header(headers: &HeaderParams, name: &str) -> bool {
    headers.keys().any(|k| k.eq_ignore_ascii_case(name))
}

pub(super) fn remove_header(headers: &mut HeaderParams, name: &str) {
    headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
}

fn header_map(headers: &HeaderParams) -> Result<HeaderMap, ClientError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| ClientError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| ClientError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        map.append(header_name, header_value);
    }
    Ok(map)
}
