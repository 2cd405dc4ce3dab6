use crate::request::HeaderParams;

/// Header that carries the static API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Label the API description uses for signed (IAM) operations.
pub const SIGNED_AUTH_LABEL: &str = "AWS_IAM";

/// Label the API description uses for operations without request signing.
pub const UNAUTHENTICATED_AUTH_LABEL: &str = "NONE";

/// How a request is authenticated, which also decides the transport used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuthType {
    /// Plain transport; only the optional API key is attached.
    #[default]
    Unauthenticated,
    /// SigV4-signed transport.
    Signed,
}

impl AuthType {
    /// Parse an authorization label from an API description.
    ///
    /// Anything other than `AWS_IAM` falls back to [`AuthType::Unauthenticated`].
    /// The fallback is silent apart from a debug log.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            SIGNED_AUTH_LABEL => AuthType::Signed,
            UNAUTHENTICATED_AUTH_LABEL => AuthType::Unauthenticated,
            other => {
                tracing::debug!(
                    label = other,
                    "unrecognized auth type, using unauthenticated transport"
                );
                AuthType::Unauthenticated
            }
        }
    }

    #[must_use]
    pub fn as_label(self) -> &'static str {
        match self {
            AuthType::Unauthenticated => UNAUTHENTICATED_AUTH_LABEL,
            AuthType::Signed => SIGNED_AUTH_LABEL,
        }
    }
}

impl From<&str> for AuthType {
    fn from(label: &str) -> Self {
        Self::from_label(label)
    }
}

impl std::fmt::Display for AuthType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// An API key counts only when it is present and non-empty.
#[must_use]
pub fn effective_api_key(api_key: Option<&str>) -> Option<&str> {
    api_key.filter(|key| !key.is_empty())
}

/// Set `x-api-key` when a usable key is given. Returns whether it was set.
pub fn inject_api_key(headers: &mut HeaderParams, api_key: Option<&str>) -> bool {
    match effective_api_key(api_key) {
        Some(key) => {
            headers.insert(API_KEY_HEADER.to_owned(), key.to_owned());
            true
        }
        None => false,
    }
}
