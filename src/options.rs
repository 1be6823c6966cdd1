//! Per-call resolution options.
//!
//! Options are supplied as a sequence of [`ResolutionOption`] directives and folded over
//! the defaults into one immutable [`ResolutionOptions`] value. Later directives for the
//! same key override earlier ones. Keys no resolver understands are kept so that
//! method resolvers added later can interpret them.

use std::collections::BTreeMap;
use std::time::Duration;

/// Fetch timeout applied when the caller does not supply one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Empty option list, for calls that take the defaults.
pub const NO_OPTIONS: [ResolutionOption; 0] = [];

/// A single resolution directive
#[derive(Debug, Clone)]
pub enum ResolutionOption {
    /// Fetch through this client instead of the shared one
    HttpClient(reqwest::Client),
    /// Use the unencrypted scheme instead of the method's secure default
    PreferPlainTransport(bool),
    /// Upper bound on the whole fetch, including the body read
    Timeout(Duration),
    /// A directive this crate does not interpret
    Other(String, serde_json::Value),
}

/// Folded options for one resolution call
#[derive(Debug, Clone, Default)]
pub struct ResolutionOptions {
    pub http_client: Option<reqwest::Client>,
    pub prefer_plain_transport: bool,
    pub timeout: Option<Duration>,
    pub other: BTreeMap<String, serde_json::Value>,
}

impl ResolutionOptions {
    /// Returns a copy with `option` applied on top.
    pub fn with(mut self, option: ResolutionOption) -> Self {
        match option {
            ResolutionOption::HttpClient(client) => self.http_client = Some(client),
            ResolutionOption::PreferPlainTransport(plain) => self.prefer_plain_transport = plain,
            ResolutionOption::Timeout(timeout) => self.timeout = Some(timeout),
            ResolutionOption::Other(key, value) => {
                self.other.insert(key, value);
            }
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn scheme(&self) -> &'static str {
        if self.prefer_plain_transport {
            "http"
        } else {
            "https"
        }
    }

    /// Looks up an uninterpreted directive.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.other.get(key)
    }
}

impl FromIterator<ResolutionOption> for ResolutionOptions {
    fn from_iter<I: IntoIterator<Item = ResolutionOption>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), Self::with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = ResolutionOptions::default();
        assert!(options.http_client.is_none());
        assert_eq!(options.scheme(), "https");
        assert_eq!(options.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_last_write_wins() {
        let options: ResolutionOptions = vec![
            ResolutionOption::PreferPlainTransport(true),
            ResolutionOption::Timeout(Duration::from_secs(1)),
            ResolutionOption::Other("accept".into(), json!("application/did+json")),
            ResolutionOption::PreferPlainTransport(false),
            ResolutionOption::Timeout(Duration::from_millis(250)),
            ResolutionOption::Other("accept".into(), json!("application/did+ld+json")),
        ]
        .into_iter()
        .collect();

        assert!(!options.prefer_plain_transport);
        assert_eq!(options.scheme(), "https");
        assert_eq!(options.timeout(), Duration::from_millis(250));
        assert_eq!(options.get("accept"), Some(&json!("application/did+ld+json")));
    }

    #[test]
    fn test_unknown_options_are_kept() {
        let options: ResolutionOptions = vec![
            ResolutionOption::Other("versionId".into(), json!("4")),
            ResolutionOption::PreferPlainTransport(true),
        ]
        .into_iter()
        .collect();

        assert_eq!(options.scheme(), "http");
        assert_eq!(options.get("versionId"), Some(&json!("4")));
        assert_eq!(options.get("missing"), None);
    }
}
