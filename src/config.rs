//! Agent settings consumed by the resolver.
//!
//! The agent's settings cover much more than resolution (label, auto-accept, storage
//! namespace, ...). They are carried here as one serde value so the whole settings
//! document can be loaded, but the resolver only reads the HTTP resolver endpoints and
//! the outbound transport names.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Agent-wide settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentSettings {
    pub use_local_agent: bool,

    pub url: Option<String>,
    pub api_token: Option<String>,

    pub label: String,
    pub auto_accept: bool,
    pub transport_return_route: String,
    pub log_level: String,
    pub db_namespace: String,

    /// Resolution services as `method@url`, e.g. `cheqd@https://resolver.cheqd.net/1.0/identifiers`
    pub http_resolvers: Vec<String>,

    /// Outbound transport types, e.g. `http` or `ws`
    pub outbound_transport: Vec<String>,
}

/// A resolution service endpoint for one DID method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResolverEndpoint {
    pub method: String,
    pub url: Url,
}

impl AgentSettings {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Appends a `method@url` resolution service.
    pub fn add_http_resolver(&mut self, resolver_url: impl Into<String>) {
        self.http_resolvers.push(resolver_url.into());
    }

    /// Appends an outbound transport type.
    pub fn add_outbound_transport(&mut self, transport_type: impl Into<String>) {
        self.outbound_transport.push(transport_type.into());
    }

    /// Parses every configured HTTP resolver entry.
    pub fn resolver_endpoints(&self) -> Result<Vec<HttpResolverEndpoint>, ConfigError> {
        self.http_resolvers
            .iter()
            .map(|entry| parse_resolver_entry(entry))
            .collect()
    }

    /// Whether an HTTP-family outbound transport is active. An empty list means the
    /// agent default, which is HTTP.
    pub fn has_http_transport(&self) -> bool {
        self.outbound_transport.is_empty()
            || self
                .outbound_transport
                .iter()
                .any(|t| t.eq_ignore_ascii_case("http") || t.eq_ignore_ascii_case("https"))
    }
}

fn parse_resolver_entry(entry: &str) -> Result<HttpResolverEndpoint, ConfigError> {
    let invalid = || ConfigError::InvalidResolverEntry(entry.to_string());

    let (method, url) = entry.split_once('@').ok_or_else(invalid)?;
    if method.is_empty()
        || !method
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let url = Url::parse(url)?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(invalid());
    }

    Ok(HttpResolverEndpoint {
        method: method.to_string(),
        url,
    })
}
