use std::collections::BTreeMap;

use http::Method;
use serde::{Deserialize, Serialize};

use crate::body::{NormalizedBody, Payload};
use crate::error::ClientError;

/// Header name to value, kept exactly as the caller spelled the names.
pub type HeaderParams = BTreeMap<String, String>;

/// Query key to one or many values.
pub type QueryParams = BTreeMap<String, QueryValue>;

/// A query parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    Multi(Vec<String>),
}

impl QueryValue {
    /// All values, in order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        match self {
            QueryValue::Single(v) => std::slice::from_ref(v),
            QueryValue::Multi(vs) => vs,
        }
    }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        QueryValue::Single(s)
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        QueryValue::Single(s.to_owned())
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(v: Vec<String>) -> Self {
        QueryValue::Multi(v)
    }
}

/// Flatten query params into `(key, value)` pairs, keys in sorted order and
/// repeated for multi-valued entries.
#[must_use]
pub fn query_pairs(params: &QueryParams) -> Vec<(String, String)> {
    params
        .iter()
        .flat_map(|(k, v)| v.values().iter().map(move |v| (k.clone(), v.clone())))
        .collect()
}

/// Overlay `additional` onto `base`. Keys from `additional` win; a missing
/// overlay leaves `base` as it is.
#[must_use]
pub fn merge_into<V: Clone>(
    base: &BTreeMap<String, V>,
    additional: Option<&BTreeMap<String, V>>,
) -> BTreeMap<String, V> {
    let mut merged = base.clone();
    if let Some(additional) = additional {
        for (key, value) in additional {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// One logical call against the gateway, before normalization.
#[derive(Debug)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    headers: HeaderParams,
    query_params: QueryParams,
    body: Payload,
}

impl RequestDescriptor {
    /// Create a new descriptor builder
    #[must_use]
    pub fn builder() -> RequestDescriptorBuilder {
        RequestDescriptorBuilder::default()
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderParams {
        &self.headers
    }

    #[must_use]
    pub fn query_params(&self) -> &QueryParams {
        &self.query_params
    }

    #[must_use]
    pub fn body(&self) -> &Payload {
        &self.body
    }

    pub(crate) fn into_parts(self) -> (Method, String, HeaderParams, QueryParams, Payload) {
        (
            self.method,
            self.path,
            self.headers,
            self.query_params,
            self.body,
        )
    }
}

/// Builder for [`RequestDescriptor`].
#[derive(Debug, Default)]
pub struct RequestDescriptorBuilder {
    method: Option<Method>,
    path: Option<String>,
    headers: HeaderParams,
    query_params: QueryParams,
    body: Payload,
}

impl RequestDescriptorBuilder {
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: HeaderParams) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn query_params(mut self, query_params: QueryParams) -> Self {
        self.query_params = query_params;
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Payload>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the body to a structured value serialized at dispatch time.
    #[must_use]
    pub fn json<T: Serialize + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.body = Payload::json(value);
        self
    }

    /// Build the descriptor. The method defaults to GET.
    ///
    /// # Errors
    /// Returns `ClientError::BuildError` when no path was set.
    pub fn build(self) -> Result<RequestDescriptor, ClientError> {
        let method = self.method.unwrap_or(Method::GET);
        let path = self
            .path
            .ok_or_else(|| ClientError::BuildError("Request path is required".into()))?;

        Ok(RequestDescriptor {
            method,
            path,
            headers: self.headers,
            query_params: self.query_params,
            body: self.body,
        })
    }
}

/// Headers and query parameters the API description did not model, supplied
/// per call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HeaderParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_params: Option<QueryParams>,
}

impl AdditionalParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query_params
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// A descriptor after API-key injection, body normalization and parameter
/// merging. This is what transports receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderParams,
    pub query_params: QueryParams,
    pub body: NormalizedBody,
}

impl PreparedRequest {
    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HeaderParams {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_merge_right_biased() {
        let base = map(&[("a", "1"), ("b", "2")]);
        let extra = map(&[("b", "20"), ("c", "30")]);
        let merged = merge_into(&base, Some(&extra));
        assert_eq!(merged, map(&[("a", "1"), ("b", "20"), ("c", "30")]));
    }

    #[test]
    fn test_merge_missing_overlay_is_noop() {
        let base = map(&[("a", "1")]);
        assert_eq!(merge_into(&base, None), base);
        assert_eq!(merge_into(&base, Some(&HeaderParams::new())), base);
    }

    #[test]
    fn test_merge_idempotent() {
        let a = map(&[("x", "1"), ("y", "2")]);
        let b = map(&[("y", "3"), ("z", "4")]);
        let once = merge_into(&a, Some(&b));
        let twice = merge_into(&once, Some(&b));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_keeps_distinct_casing() {
        let base = map(&[("content-type", "application/json")]);
        let extra = map(&[("Content-Type", "image/png")]);
        let merged = merge_into(&base, Some(&extra));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_query_pairs_flatten_multi_values() {
        let mut params = QueryParams::new();
        params.insert("tag".into(), vec!["b".to_owned(), "a".to_owned()].into());
        params.insert("q".into(), "sunset".into());
        assert_eq!(
            query_pairs(&params),
            vec![
                ("q".to_owned(), "sunset".to_owned()),
                ("tag".to_owned(), "b".to_owned()),
                ("tag".to_owned(), "a".to_owned()),
            ]
        );
    }

    #[test]
    fn test_builder_requires_path() {
        let err = RequestDescriptor::builder().build().unwrap_err();
        assert!(matches!(err, ClientError::BuildError(_)));
    }

    #[test]
    fn test_builder_defaults_to_get() {
        let req = RequestDescriptor::builder()
            .path("/search")
            .query("q", "dogs")
            .build()
            .unwrap();
        assert_eq!(*req.method(), Method::GET);
        assert_eq!(req.query_params()["q"], QueryValue::Single("dogs".into()));
        assert!(req.body().is_absent());
    }

    #[test]
    fn test_additional_params_deserialize_camel_case() {
        let params: AdditionalParams = serde_json::from_str(
            r#"{"headers":{"Content-Type":"image/png"},"queryParams":{"tag":["a","b"]}}"#,
        )
        .unwrap();
        assert_eq!(
            params,
            AdditionalParams::new()
                .header("Content-Type", "image/png")
                .query("tag", vec!["a".to_owned(), "b".to_owned()])
        );
        let empty: AdditionalParams = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, AdditionalParams::default());
    }

    #[test]
    fn test_prepared_header_lookup_ignores_case() {
        let prepared = PreparedRequest {
            method: Method::PUT,
            path: "/upload/a.png".into(),
            headers: map(&[("Content-Type", "image/png")]),
            query_params: QueryParams::new(),
            body: NormalizedBody::Empty,
        };
        assert_eq!(prepared.header("content-type"), Some("image/png"));
        assert_eq!(prepared.header("accept"), None);
    }
}
