use std::time::Duration;

use crate::error::ClientError;
use crate::transport::TransportOptions;
use crate::transport::sigv4::{AwsCredentials, DEFAULT_SERVICE};

pub const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for one deployed API stage.
#[derive(Debug, Clone)]
pub struct ApiGatewayConfig {
    /// Stage invoke URL, e.g. `https://abc.execute-api.us-east-1.amazonaws.com/prod`
    pub invoke_url: String,
    pub api_key: Option<String>,
    pub region: String,
    pub service: String,
    pub credentials: Option<AwsCredentials>,
    pub transport: TransportOptions,
}

impl ApiGatewayConfig {
    #[must_use]
    pub fn new(invoke_url: impl Into<String>) -> Self {
        Self {
            invoke_url: invoke_url.into(),
            api_key: None,
            region: DEFAULT_REGION.to_owned(),
            service: DEFAULT_SERVICE.to_owned(),
            credentials: None,
            transport: TransportOptions::default(),
        }
    }

    /// An empty key is the same as no key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.is_empty()).then_some(api_key);
        self
    }

    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: AwsCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transport.timeout = Some(timeout);
        self
    }

    /// Create configuration from environment variables
    ///
    /// Expects:
    /// - `APIGW_INVOKE_URL`: stage invoke URL (required)
    /// - `APIGW_API_KEY`: API key (optional, empty means none)
    /// - `AWS_REGION`: signing region (default: `us-east-1`)
    /// - `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` / `AWS_SESSION_TOKEN`:
    ///   signing credentials (optional; used only when key id and secret are both set)
    /// - `APIGW_TIMEOUT_SECS`: request timeout in seconds (optional)
    ///
    /// # Errors
    /// Returns `ClientError::Configuration` when the invoke URL is missing or
    /// the timeout is not a number.
    pub fn from_env() -> Result<Self, ClientError> {
        let invoke_url = non_empty_var("APIGW_INVOKE_URL")
            .ok_or_else(|| ClientError::Configuration("APIGW_INVOKE_URL not set".into()))?;
        let mut config = Self::new(invoke_url);

        if let Some(api_key) = non_empty_var("APIGW_API_KEY") {
            config = config.with_api_key(api_key);
        }
        if let Some(region) = non_empty_var("AWS_REGION") {
            config = config.with_region(region);
        }
        if let (Some(key_id), Some(secret)) = (
            non_empty_var("AWS_ACCESS_KEY_ID"),
            non_empty_var("AWS_SECRET_ACCESS_KEY"),
        ) {
            let mut credentials = AwsCredentials::new(key_id, secret);
            if let Some(token) = non_empty_var("AWS_SESSION_TOKEN") {
                credentials = credentials.with_session_token(token);
            }
            config = config.with_credentials(credentials);
        }
        if let Some(secs) = non_empty_var("APIGW_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                ClientError::Configuration(format!("APIGW_TIMEOUT_SECS is not a number: {secs}"))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        tracing::debug!(
            invoke_url = %config.invoke_url,
            region = %config.region,
            has_api_key = config.api_key.is_some(),
            has_credentials = config.credentials.is_some(),
            "loaded gateway configuration from environment"
        );
        Ok(config)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
