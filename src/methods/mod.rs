//! Method resolvers.
//!
//! A method resolver knows how to derive the resolution address for one DID method and
//! which wire dialect the service at that address speaks. Fetching is shared: one GET
//! per call, no retries.

mod http_binding;
mod web;

pub use http_binding::HttpBindingResolver;
pub use web::WebResolver;

use lazy_static::lazy_static;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use url::Url;

use crate::error::MethodError;
use crate::options::ResolutionOptions;
use crate::types::{RawDocument, RawFormat};

lazy_static! {
    /// Building a reqwest::Client is slow, so resolvers share one and clone it per call.
    static ref REQWEST_CLIENT: reqwest::Client = reqwest::Client::new();
}

/// Fetches raw method documents for one DID method
#[async_trait::async_trait]
pub trait MethodResolver: Send + Sync {
    /// The DID method this resolver handles, e.g. `web`
    fn method(&self) -> &str;

    /// Wire dialect of the documents this resolver fetches
    fn raw_format(&self) -> RawFormat;

    /// Derives the resolution address. Must depend only on the identifier and options.
    fn resolution_url(
        &self,
        method_specific_id: &str,
        options: &ResolutionOptions,
    ) -> Result<Url, MethodError>;

    /// Media types sent in the `Accept` header
    fn accept(&self) -> &'static str {
        "application/did+json, application/did+ld+json, application/json"
    }

    /// Fetches the raw document for `method_specific_id` with a single request.
    async fn fetch(
        &self,
        method_specific_id: &str,
        options: &ResolutionOptions,
    ) -> Result<RawDocument, MethodError> {
        let url = self.resolution_url(method_specific_id, options)?;
        http_get(url, self.accept(), self.raw_format(), options).await
    }
}

/// Issues one GET. The response is owned here and dropped on every return path, which
/// releases its connection; dropping the returned future aborts the request.
pub(crate) async fn http_get(
    url: Url,
    accept: &str,
    format: RawFormat,
    options: &ResolutionOptions,
) -> Result<RawDocument, MethodError> {
    let client = options
        .http_client
        .clone()
        .unwrap_or_else(|| REQWEST_CLIENT.clone());

    tracing::debug!(%url, "fetching raw DID document");
    let response = client
        .get(url.clone())
        .header(ACCEPT, accept)
        .timeout(options.timeout())
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(%url, %status, "resolution service returned a non-success status");
        return Err(MethodError::NonSuccessStatus { url, status });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let body = response.bytes().await?;
    if body.is_empty() {
        return Err(MethodError::Malformed("empty response body".to_string()));
    }
    tracing::debug!(%url, length = body.len(), "fetched raw DID document");

    Ok(RawDocument {
        body: body.to_vec(),
        content_type,
        source: url,
        format,
    })
}
