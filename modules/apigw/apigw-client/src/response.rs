use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::ClientError;

/// A buffered gateway response.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    data: Bytes,
}

impl Response {
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, data: Bytes) -> Self {
        Self {
            status,
            headers,
            data,
        }
    }

    /// Get the HTTP status code
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the response headers
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw response body
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> Bytes {
        self.data
    }

    /// Deserialize the body as JSON.
    ///
    /// # Errors
    /// Returns `ClientError::Serialization` when the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_slice(&self.data)?)
    }

    /// The body as UTF-8 text.
    ///
    /// # Errors
    /// Returns `ClientError::InvalidResponse` for non UTF-8 bodies.
    pub fn text(&self) -> Result<String, ClientError> {
        String::from_utf8(self.data.to_vec())
            .map_err(|e| ClientError::InvalidResponse(format!("Invalid UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_body() {
        let resp = Response::new(
            StatusCode::OK,
            HeaderMap::new(),
            Bytes::from_static(br#"[{"objectKey":"a.jpg"}]"#),
        );
        let data: serde_json::Value = resp.json().unwrap();
        assert_eq!(data[0]["objectKey"], "a.jpg");
    }

    #[test]
    fn test_text_rejects_invalid_utf8() {
        let resp =
            Response::new(StatusCode::OK, HeaderMap::new(), Bytes::from_static(&[0xff, 0xfe]));
        assert!(matches!(resp.text(), Err(ClientError::InvalidResponse(_))));
    }
}
