//! Operation templates taken from an API description.
//!
//! An [`Operation`] lists which caller parameters fill the path template,
//! which become headers and which become query parameters. Building a
//! descriptor checks required parameters first.

use std::collections::BTreeMap;

use http::Method;

use crate::body::Payload;
use crate::error::ClientError;
use crate::request::{HeaderParams, QueryParams, QueryValue, RequestDescriptor};

/// Named caller parameters for one operation call.
pub type Params = BTreeMap<String, String>;

/// One modeled operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub method: Method,
    /// Path with `{name}` placeholders
    pub path_template: &'static str,
    pub header_params: &'static [&'static str],
    pub query_params: &'static [&'static str],
    pub required: &'static [&'static str],
}

impl Operation {
    /// Check required params, expand the path, and pick out modeled headers
    /// and query params. Params the operation does not declare are ignored.
    ///
    /// # Errors
    /// Returns `ClientError::MissingParameter` for an absent required param
    /// or a path placeholder with no value, and `ClientError::BuildError` for
    /// a malformed template.
    pub fn descriptor(
        &self,
        params: &Params,
        body: impl Into<Payload>,
    ) -> Result<RequestDescriptor, ClientError> {
        if let Some(missing) = self.required.iter().find(|name| !params.contains_key(**name)) {
            return Err(ClientError::MissingParameter((*missing).to_owned()));
        }

        RequestDescriptor::builder()
            .method(self.method.clone())
            .path(expand_path(self.path_template, params)?)
            .headers(pick(params, self.header_params))
            .query_params(
                pick(params, self.query_params)
                    .into_iter()
                    .map(|(k, v)| (k, QueryValue::Single(v)))
                    .collect::<QueryParams>(),
            )
            .body(body)
            .build()
    }
}

fn pick(params: &Params, names: &[&str]) -> HeaderParams {
    names
        .iter()
        .filter_map(|name| params.get(*name).map(|v| ((*name).to_owned(), v.clone())))
        .collect()
}

/// Replace each `{name}` with the percent-encoded value of `name`.
///
/// # Errors
/// Returns `ClientError::MissingParameter` for a placeholder with no value
/// and `ClientError::BuildError` for an unclosed `{`.
pub fn expand_path(template: &str, params: &Params) -> Result<String, ClientError> {
    let mut path = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        path.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| ClientError::BuildError(format!("unclosed placeholder in {template}")))?;
        let name = &after[..end];
        let value = params
            .get(name)
            .ok_or_else(|| ClientError::MissingParameter(name.to_owned()))?;
        path.push_str(&urlencoding::encode(value));
        rest = &after[end + 1..];
    }
    path.push_str(rest);
    Ok(path)
}
