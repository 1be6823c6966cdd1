//! Resolution through a universal-resolver style HTTP binding.
//!
//! Methods without a direct web location (e.g. `did:cheqd`) are resolved by asking a
//! resolution service at `<base-url>/<did>`. The service answers with a resolution
//! envelope wrapping the document and its metadata.

use url::Url;

use super::MethodResolver;
use crate::error::MethodError;
use crate::options::ResolutionOptions;
use crate::types::RawFormat;

/// Resolver delegating one DID method to a resolution service
#[derive(Debug, Clone)]
pub struct HttpBindingResolver {
    method: String,
    base_url: Url,
}

impl HttpBindingResolver {
    /// `base_url` is the identifiers endpoint, e.g. `https://resolver.cheqd.net/1.0/identifiers`.
    pub fn new(method: impl Into<String>, base_url: Url) -> Self {
        Self {
            method: method.into(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl MethodResolver for HttpBindingResolver {
    fn method(&self) -> &str {
        &self.method
    }

    fn raw_format(&self) -> RawFormat {
        RawFormat::ResolutionEnvelope
    }

    fn accept(&self) -> &'static str {
        "application/ld+json;profile=\"https://w3id.org/did-resolution\", application/json"
    }

    fn resolution_url(
        &self,
        method_specific_id: &str,
        options: &ResolutionOptions,
    ) -> Result<Url, MethodError> {
        if method_specific_id.is_empty() {
            return Err(MethodError::InvalidIdentifier(
                "empty method-specific identifier".to_string(),
            ));
        }

        let did = format!("did:{}:{}", self.method, method_specific_id);
        let mut url = self.base_url.clone();

        if options.prefer_plain_transport && url.scheme() == "https" {
            url.set_scheme("http").map_err(|_| {
                MethodError::InvalidIdentifier("resolver base URL cannot use http".to_string())
            })?;
        }

        url.path_segments_mut()
            .map_err(|_| {
                MethodError::InvalidIdentifier("resolver base URL cannot carry a path".to_string())
            })?
            .pop_if_empty()
            .push(&did);

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ResolutionOption;

    fn cheqd() -> HttpBindingResolver {
        HttpBindingResolver::new(
            "cheqd",
            Url::parse("https://resolver.cheqd.net/1.0/identifiers/").unwrap(),
        )
    }

    #[test]
    fn test_url_derivation() {
        let url = cheqd()
            .resolution_url("mainnet:zF7rhDBfUt9d1gJPjx7s1JXfUY7oVWkY", &ResolutionOptions::default())
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://resolver.cheqd.net/1.0/identifiers/did:cheqd:mainnet:zF7rhDBfUt9d1gJPjx7s1JXfUY7oVWkY"
        );
    }

    #[test]
    fn test_address_follows_identifier() {
        let options = ResolutionOptions::default();
        let a = cheqd().resolution_url("mainnet:aaa", &options).unwrap();
        let b = cheqd().resolution_url("mainnet:bbb", &options).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_plain_transport() {
        let options: ResolutionOptions = vec![ResolutionOption::PreferPlainTransport(true)]
            .into_iter()
            .collect();
        let url = cheqd().resolution_url("testnet:abc", &options).unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.path(), "/1.0/identifiers/did:cheqd:testnet:abc");
    }

    #[test]
    fn test_empty_identifier() {
        assert!(matches!(
            cheqd().resolution_url("", &ResolutionOptions::default()),
            Err(MethodError::InvalidIdentifier(_))
        ));
    }
}
