//! API Gateway request dispatch client
//!
//! Builds requests from operation templates, applies an optional API key,
//! normalizes request bodies, merges ad-hoc headers and query parameters, and
//! routes each request to either a plain or a SigV4-signing transport.
//!
//! # Examples
//!
//! ## Raw dispatch
//!
//! ```no_run
//! use apigw_client::{
//!     AdditionalParams, ApiGatewayClient, ApiGatewayConfig, AuthType, RequestDescriptor,
//! };
//! use http::Method;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ApiGatewayConfig::new("https://abc123.execute-api.us-east-1.amazonaws.com/prod")
//!     .with_api_key("abc123");
//! let client = ApiGatewayClient::from_config(&config)?;
//!
//! let request = RequestDescriptor::builder()
//!     .method(Method::POST)
//!     .path("/search")
//!     .json(json!({"q": "sunset"}))
//!     .build()?;
//!
//! let response = client
//!     .make_request(
//!         request,
//!         AuthType::Unauthenticated,
//!         &AdditionalParams::default(),
//!         config.api_key.as_deref(),
//!     )
//!     .await?;
//! let data: serde_json::Value = response.json()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Photo album operations
//!
//! ```no_run
//! use apigw_client::{ApiGatewayConfig, Blob, PhotoAlbumClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PhotoAlbumClient::from_config(&ApiGatewayConfig::from_env()?)?;
//!
//! let blob = Blob::from_file("dog.png").await?.with_content_type("image/png");
//! client.upload("dog.png", blob, "dog, park").await?;
//!
//! for hit in client.search("dog").await? {
//!     println!("{}", hit.image_url("https://image-bucket.s3.amazonaws.com/"));
//! }
//! # Ok(())
//! # }
//! ```

mod auth;
mod body;
mod client;
mod config;
mod error;
pub mod operation;
mod photos;
mod request;
mod response;
pub mod transport;

pub use auth::{API_KEY_HEADER, AuthType, effective_api_key};
pub use body::{Blob, ByteView, JsonBody, NormalizedBody, Payload};
pub use client::ApiGatewayClient;
pub use config::ApiGatewayConfig;
pub use error::ClientError;
pub use operation::{Operation, Params};
pub use photos::{PhotoAlbumClient, PhotoReference};
pub use request::{
    AdditionalParams, HeaderParams, PreparedRequest, QueryParams, QueryValue, RequestDescriptor,
    RequestDescriptorBuilder, merge_into,
};
pub use response::Response;
pub use transport::sigv4::AwsCredentials;
pub use transport::{SignedHttpTransport, SimpleHttpTransport, Transport, TransportOptions};

// Re-export commonly used types from dependencies
pub use http::{Method, StatusCode};
