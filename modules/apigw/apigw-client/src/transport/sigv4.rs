//! AWS Signature Version 4 request signing.
//!
//! [`SigV4Signer::sign`] is a pure function of the request parts, the
//! credentials and the timestamp passed in; it returns the headers to add.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use http::Method;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use crate::error::ClientError;
use crate::request::HeaderParams;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const DEFAULT_SERVICE: &str = "execute-api";
pub const AMZ_DATE_HEADER: &str = "x-amz-date";
pub const SECURITY_TOKEN_HEADER: &str = "x-amz-security-token";
pub const AUTHORIZATION_HEADER: &str = "Authorization";

struct CredentialsInner {
    access_key_id: String,
    secret_access_key: SecretString,
    session_token: Option<SecretString>,
}

/// Long- or short-term AWS credentials.
#[derive(Clone)]
pub struct AwsCredentials {
    inner: Arc<CredentialsInner>,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.inner.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &self.inner.session_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AwsCredentials {
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self::build(access_key_id.into(), secret_access_key.into(), None)
    }

    #[must_use]
    pub fn with_session_token(self, token: impl Into<String>) -> Self {
        Self::build(
            self.inner.access_key_id.clone(),
            self.inner.secret_access_key.expose_secret().to_owned(),
            Some(token.into()),
        )
    }

    fn build(
        access_key_id: String,
        secret_access_key: String,
        session_token: Option<String>,
    ) -> Self {
        Self {
            inner: Arc::new(CredentialsInner {
                access_key_id,
                secret_access_key: SecretString::from(secret_access_key),
                session_token: session_token.map(SecretString::from),
            }),
        }
    }

    #[must_use]
    pub fn access_key_id(&self) -> &str {
        &self.inner.access_key_id
    }

    #[must_use]
    pub fn has_session_token(&self) -> bool {
        self.inner.session_token.is_some()
    }
}

/// The request parts covered by the signature.
#[derive(Debug)]
pub struct SigningRequest<'a> {
    pub method: &'a Method,
    /// Already percent-encoded URL path
    pub path: &'a str,
    pub query: &'a [(String, String)],
    /// Must include `host`
    pub headers: &'a HeaderParams,
    pub payload: &'a [u8],
}

#[derive(Debug, Clone)]
pub struct SigV4Signer {
    credentials: AwsCredentials,
    region: String,
    service: String,
}

impl SigV4Signer {
    #[must_use]
    pub fn new(
        credentials: AwsCredentials,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            region: region.into(),
            service: service.into(),
        }
    }

    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Sign `request` as of `now` and return the headers to attach:
    /// `x-amz-date`, `Authorization`, and `x-amz-security-token` when the
    /// credentials carry a session token.
    ///
    /// # Errors
    /// Returns `ClientError::Signing` if the HMAC cannot be keyed.
    pub fn sign(
        &self,
        request: &SigningRequest<'_>,
        now: DateTime<Utc>,
    ) -> Result<HeaderParams, ClientError> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();

        let mut extra = HeaderParams::new();
        extra.insert(AMZ_DATE_HEADER.to_owned(), amz_date.clone());
        if let Some(token) = &self.credentials.inner.session_token {
            extra.insert(SECURITY_TOKEN_HEADER.to_owned(), token.expose_secret().to_owned());
        }

        let headers = canonical_headers(request.headers, &extra);
        let signed_headers = headers.keys().map(String::as_str).collect::<Vec<_>>().join(";");
        let canonical_request = canonical_request(request, &headers, &signed_headers);

        let scope = format!("{date}/{}/{}/aws4_request", self.region, self.service);
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );
        tracing::trace!(%signed_headers, %string_to_sign, "sigv4 string to sign");

        let key = signing_key(
            self.credentials.inner.secret_access_key.expose_secret(),
            &date,
            &self.region,
            &self.service,
        )?;
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

        extra.insert(
            AUTHORIZATION_HEADER.to_owned(),
            format!(
                "{ALGORITHM} Credential={}/{scope}, \
                 SignedHeaders={signed_headers}, Signature={signature}",
                self.credentials.inner.access_key_id
            ),
        );
        Ok(extra)
    }
}

/// Derive the per-day signing key: `AWS4<secret>` -> date -> region -> service -> `aws4_request`.
///
/// # Errors
/// Returns `ClientError::Signing` if the HMAC cannot be keyed.
pub fn signing_key(
    secret: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, ClientError> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, ClientError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| ClientError::Signing(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Lowercased names to comma-joined, whitespace-collapsed values. `extra`
/// replaces any same-named request header.
fn canonical_headers(headers: &HeaderParams, extra: &HeaderParams) -> BTreeMap<String, String> {
    let mut canonical: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        let name = name.to_ascii_lowercase();
        if extra.keys().any(|k| k.eq_ignore_ascii_case(&name)) {
            continue;
        }
        canonical
            .entry(name)
            .or_default()
            .push(value.split_whitespace().collect::<Vec<_>>().join(" "));
    }
    for (name, value) in extra {
        canonical.insert(name.to_ascii_lowercase(), vec![value.clone()]);
    }
    canonical
        .into_iter()
        .map(|(name, values)| (name, values.join(",")))
        .collect()
}

/// Each segment of the already-encoded path is encoded once more, as every
/// service except S3 expects.
fn canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_owned();
    }
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn canonical_request(
    request: &SigningRequest<'_>,
    headers: &BTreeMap<String, String>,
    signed_headers: &str,
) -> String {
    let path = canonical_uri(request.path);

    let mut query = request
        .query
        .iter()
        .map(|(k, v)| (urlencoding::encode(k).into_owned(), urlencoding::encode(v).into_owned()))
        .collect::<Vec<_>>();
    query.sort();
    let query = query
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let header_block: String = headers
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();

    format!(
        "{}\n{path}\n{query}\n{header_block}\n{signed_headers}\n{}",
        request.method.as_str(),
        hex::encode(Sha256::digest(request.payload))
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const ACCESS_KEY: &str = "AKIDEXAMPLE";
    const SECRET_KEY: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

    fn at_20150830() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap()
    }

    fn host(value: &str) -> HeaderParams {
        let mut headers = HeaderParams::new();
        headers.insert("Host".into(), value.into());
        headers
    }

    #[test]
    fn test_signing_key_derivation() {
        let key = signing_key(SECRET_KEY, "20120215", "us-east-1", "iam").unwrap();
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_get_vanilla() {
        let signer =
            SigV4Signer::new(AwsCredentials::new(ACCESS_KEY, SECRET_KEY), "us-east-1", "service");
        let headers = host("example.amazonaws.com");
        let signed = signer
            .sign(
                &SigningRequest {
                    method: &Method::GET,
                    path: "/",
                    query: &[],
                    headers: &headers,
                    payload: b"",
                },
                at_20150830(),
            )
            .unwrap();

        assert_eq!(signed[AMZ_DATE_HEADER], "20150830T123600Z");
        assert_eq!(
            signed[AUTHORIZATION_HEADER],
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/service/aws4_request, \
             SignedHeaders=host;x-amz-date, \
             Signature=5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
        );
        assert!(!signed.contains_key(SECURITY_TOKEN_HEADER));
    }

    #[test]
    fn test_iam_list_users() {
        let signer =
            SigV4Signer::new(AwsCredentials::new(ACCESS_KEY, SECRET_KEY), "us-east-1", "iam");
        let mut headers = host("iam.amazonaws.com");
        headers.insert(
            "Content-Type".into(),
            "application/x-www-form-urlencoded; charset=utf-8".into(),
        );
        let signed = signer
            .sign(
                &SigningRequest {
                    method: &Method::GET,
                    path: "/",
                    query: &[
                        ("Version".to_owned(), "2010-05-08".to_owned()),
                        ("Action".to_owned(), "ListUsers".to_owned()),
                    ],
                    headers: &headers,
                    payload: b"",
                },
                at_20150830(),
            )
            .unwrap();

        assert!(signed[AUTHORIZATION_HEADER].ends_with(
            "SignedHeaders=content-type;host;x-amz-date, \
             Signature=5d672d79c15b13162d9279b0855cfba6789a8edb4c82c400e06b5924a6f2b5d7"
        ));
    }

    #[test]
    fn test_session_token_is_signed_and_returned() {
        let creds = AwsCredentials::new(ACCESS_KEY, SECRET_KEY).with_session_token("token-123");
        let signer = SigV4Signer::new(creds, "us-east-1", DEFAULT_SERVICE);
        let headers = host("abc.execute-api.us-east-1.amazonaws.com");
        let signed = signer
            .sign(
                &SigningRequest {
                    method: &Method::PUT,
                    path: "/prod/upload/a.png",
                    query: &[],
                    headers: &headers,
                    payload: b"\x89PNG",
                },
                at_20150830(),
            )
            .unwrap();

        assert_eq!(signed[SECURITY_TOKEN_HEADER], "token-123");
        let authorization = &signed[AUTHORIZATION_HEADER];
        assert!(authorization.contains("SignedHeaders=host;x-amz-date;x-amz-security-token,"));
        assert!(authorization.contains("/20150830/us-east-1/execute-api/aws4_request"));
    }

    #[test]
    fn test_canonical_headers_fold_case_and_whitespace() {
        let mut headers = HeaderParams::new();
        headers.insert("X-Custom".into(), "  a   b ".into());
        headers.insert("x-custom".into(), "c".into());
        headers.insert("X-Amz-Date".into(), "stale".into());
        let mut extra = HeaderParams::new();
        extra.insert(AMZ_DATE_HEADER.into(), "20150830T123600Z".into());

        let canonical = canonical_headers(&headers, &extra);
        assert_eq!(canonical["x-custom"], "a b,c");
        assert_eq!(canonical[AMZ_DATE_HEADER], "20150830T123600Z");
    }

    #[test]
    fn test_canonical_uri_double_encodes_segments() {
        assert_eq!(canonical_uri(""), "/");
        assert_eq!(canonical_uri("/"), "/");
        assert_eq!(canonical_uri("/prod/upload/my%20photo.jpg"), "/prod/upload/my%2520photo.jpg");
    }

    #[test]
    fn test_signature_changes_with_payload() {
        let creds = AwsCredentials::new(ACCESS_KEY, SECRET_KEY);
        let signer = SigV4Signer::new(creds, "us-east-1", DEFAULT_SERVICE);
        let headers = host("example.amazonaws.com");
        let sign = |payload: &[u8]| {
            signer
                .sign(
                    &SigningRequest {
                        method: &Method::POST,
                        path: "/",
                        query: &[],
                        headers: &headers,
                        payload,
                    },
                    at_20150830(),
                )
                .unwrap()
                .remove(AUTHORIZATION_HEADER)
                .unwrap()
        };
        assert_ne!(sign(br#"{"q":"a"}"#), sign(br#"{"q":"b"}"#));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = AwsCredentials::new(ACCESS_KEY, SECRET_KEY).with_session_token("token-123");
        let debug = format!("{creds:?}");
        assert!(debug.contains(ACCESS_KEY));
        assert!(!debug.contains(SECRET_KEY));
        assert!(!debug.contains("token-123"));
    }
}
