//! `did:web` resolution.
//!
//! The document lives at `https://<domain>[:port]/<path>/did.json`, or at
//! `/.well-known/did.json` when the identifier names no path.

use url::Url;

use super::MethodResolver;
use crate::error::MethodError;
use crate::options::ResolutionOptions;
use crate::types::RawFormat;

/// Resolver for the `did:web` method
#[derive(Debug, Clone, Default)]
pub struct WebResolver;

impl WebResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl MethodResolver for WebResolver {
    fn method(&self) -> &str {
        "web"
    }

    fn raw_format(&self) -> RawFormat {
        RawFormat::DidDocument
    }

    fn resolution_url(
        &self,
        method_specific_id: &str,
        options: &ResolutionOptions,
    ) -> Result<Url, MethodError> {
        let mut segments = method_specific_id.split(':');

        // A port is carried as a percent-encoded colon in the domain segment.
        let domain = segments
            .next()
            .filter(|domain| !domain.is_empty())
            .ok_or_else(|| MethodError::InvalidIdentifier("missing domain".to_string()))?
            .replacen("%3A", ":", 1)
            .replacen("%3a", ":", 1);

        let path: Vec<&str> = segments.collect();
        if path.iter().any(|segment| segment.is_empty()) {
            return Err(MethodError::InvalidIdentifier("empty path segment".to_string()));
        }
        let path = if path.is_empty() {
            ".well-known".to_string()
        } else {
            path.join("/")
        };

        let address = format!("{}://{}/{}/did.json", options.scheme(), domain, path);
        let url = Url::parse(&address)
            .map_err(|e| MethodError::InvalidIdentifier(format!("{e} in derived address")))?;

        if url.host_str().is_none() {
            return Err(MethodError::InvalidIdentifier("missing domain".to_string()));
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ResolutionOption;

    fn url(msid: &str, options: &ResolutionOptions) -> Result<String, MethodError> {
        WebResolver::new()
            .resolution_url(msid, options)
            .map(|url| url.to_string())
    }

    #[test]
    fn test_url_derivation() {
        let test_cases = vec![
            ("w3c-ccg.github.io", "https://w3c-ccg.github.io/.well-known/did.json"),
            ("w3c-ccg.github.io:user:alice", "https://w3c-ccg.github.io/user/alice/did.json"),
            ("example.com%3A3000:user:alice", "https://example.com:3000/user/alice/did.json"),
            ("example.com%3a3000", "https://example.com:3000/.well-known/did.json"),
        ];

        for (msid, expected) in test_cases {
            assert_eq!(url(msid, &ResolutionOptions::default()).unwrap(), expected);
        }
    }

    #[test]
    fn test_plain_transport() {
        let options: ResolutionOptions = vec![ResolutionOption::PreferPlainTransport(true)]
            .into_iter()
            .collect();
        assert_eq!(
            url("localhost%3A8080", &options).unwrap(),
            "http://localhost:8080/.well-known/did.json"
        );
    }

    #[test]
    fn test_distinct_identifiers_give_distinct_addresses() {
        let options = ResolutionOptions::default();
        let alice = url("example.com:user:alice", &options).unwrap();
        let bob = url("example.com:user:bob", &options).unwrap();
        assert_ne!(alice, bob);
        assert_eq!(alice, url("example.com:user:alice", &options).unwrap());
    }

    #[test]
    fn test_invalid_identifiers() {
        for msid in [
            "example.com%3Aport",
            "%3A8080",
            "exa%20mple.com",
            "example.com::alice",
        ] {
            assert!(
                matches!(url(msid, &ResolutionOptions::default()), Err(MethodError::InvalidIdentifier(_))),
                "{msid}"
            );
        }
    }
}
