//! Core DID resolution functionality.
//!
//! This module provides the dispatcher that takes a DID through the resolution
//! pipeline: parse the DID, select the method resolver, fetch the raw document,
//! normalize it, and parse the canonical document. Any stage's failure ends the call
//! with a typed [`ResolutionError`]; nothing is retried here.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use chrono::Utc;
use lazy_static::lazy_static;

use crate::config::AgentSettings;
use crate::did::Did;
use crate::document::DidDocument;
use crate::error::{ConfigError, ResolutionError, Stage};
use crate::methods::{HttpBindingResolver, MethodResolver, WebResolver};
use crate::normalize::normalize_with_metadata;
use crate::options::{ResolutionOption, ResolutionOptions};
use crate::types::{ResolutionMetadata, ResolutionResult, DID_JSON, DID_LD_JSON};

lazy_static! {
    static ref DEFAULT_RESOLVER: Resolver = Resolver::new();
}

type Registry = HashMap<String, Arc<dyn MethodResolver>>;

/// Dispatches DIDs to the resolver registered for their method
pub struct Resolver {
    /// Method name to resolver. Lookups clone the `Arc` and release the lock before fetching.
    registry: RwLock<Registry>,
    /// Options applied before the caller's own
    defaults: Vec<ResolutionOption>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    /// Creates a resolver with the `did:web` method registered
    pub fn new() -> Self {
        let resolver = Self::empty();
        resolver.register(Arc::new(WebResolver::new()));
        resolver
    }

    /// Creates a resolver with no methods registered
    pub fn empty() -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            defaults: Vec::new(),
        }
    }

    /// Creates a resolver from the agent settings: `did:web` plus one HTTP binding
    /// per configured resolution service. A later entry for the same method wins.
    pub fn from_settings(settings: &AgentSettings) -> Result<Self, ConfigError> {
        let resolver = Self::new();

        for endpoint in settings.resolver_endpoints()? {
            tracing::debug!(method = %endpoint.method, url = %endpoint.url, "registering HTTP resolver");
            resolver.register(Arc::new(HttpBindingResolver::new(
                endpoint.method,
                endpoint.url,
            )));
        }

        if !settings.has_http_transport() {
            tracing::warn!(
                transports = ?settings.outbound_transport,
                "no HTTP outbound transport is active; DID resolution still fetches over HTTP"
            );
        }

        Ok(resolver)
    }

    /// Adds an option applied to every call ahead of the caller's options.
    pub fn with_default_option(mut self, option: ResolutionOption) -> Self {
        self.defaults.push(option);
        self
    }

    /// Registers `resolver` for its method, returning the one it replaces.
    pub fn register(&self, resolver: Arc<dyn MethodResolver>) -> Option<Arc<dyn MethodResolver>> {
        let method = resolver.method().to_string();
        let mut registry = match self.registry.write() {
            Ok(registry) => registry,
            Err(poisoned) => poisoned.into_inner(),
        };
        registry.insert(method, resolver)
    }

    /// Registered method names, sorted
    pub fn methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self.read_registry().keys().cloned().collect();
        methods.sort();
        methods
    }

    fn method_resolver(&self, method: &str) -> Option<Arc<dyn MethodResolver>> {
        self.read_registry().get(method).cloned()
    }

    fn read_registry(&self) -> std::sync::RwLockReadGuard<'_, Registry> {
        match self.registry.read() {
            Ok(registry) => registry,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Resolves a DID into its canonical DID Document
    ///
    /// # Arguments
    /// * `did` - The DID to resolve
    /// * `options` - Resolution directives; later ones override earlier ones
    ///
    /// # Example
    /// ```no_run
    /// use did_resolution::{Resolver, ResolutionOption};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let resolver = Resolver::new();
    ///     let result = resolver.resolve(
    ///         "did:web:example.com",
    ///         [ResolutionOption::Timeout(std::time::Duration::from_secs(5))],
    ///     ).await?;
    ///     println!("Resolved DID Document: {:?}", result.did_document);
    ///     Ok(())
    /// }
    /// ```
    pub async fn resolve<I>(&self, did: &str, options: I) -> Result<ResolutionResult, ResolutionError>
    where
        I: IntoIterator<Item = ResolutionOption>,
    {
        self.run(did, options).await.map_err(|err| {
            tracing::warn!(
                did = err.did(),
                stage = %err.stage(),
                kind = ?err.kind(),
                reason = %err.reason(),
                "DID resolution failed"
            );
            err
        })
    }

    async fn run<I>(&self, did: &str, options: I) -> Result<ResolutionResult, ResolutionError>
    where
        I: IntoIterator<Item = ResolutionOption>,
    {
        let start_time = Instant::now();

        let parsed = Did::parse(did).map_err(|e| ResolutionError::InvalidDid {
            did: did.to_string(),
            stage: Stage::ParseDid,
            reason: e.to_string(),
        })?;

        let method_resolver = self.method_resolver(parsed.method()).ok_or_else(|| {
            ResolutionError::UnsupportedMethod {
                did: did.to_string(),
                method: parsed.method().to_string(),
            }
        })?;

        let options: ResolutionOptions = self.defaults.iter().cloned().chain(options).collect();

        let raw = method_resolver
            .fetch(parsed.method_specific_id(), &options)
            .await
            .map_err(|e| ResolutionError::from_method(did, e))?;

        let normalized = normalize_with_metadata(&raw.body, raw.format)
            .map_err(|e| ResolutionError::from_normalize(did, e))?;

        let did_document = DidDocument::from_json(&normalized.document).map_err(|source| {
            ResolutionError::CanonicalParseFailure {
                did: did.to_string(),
                document_id: document_id(&normalized.document),
                source,
            }
        })?;

        // Never hand back a document describing some other subject.
        if did_document.id != parsed.as_str() {
            return Err(ResolutionError::MalformedRawDocument {
                did: did.to_string(),
                stage: Stage::ParseCanonical,
                reason: "document identifier does not match the requested DID".to_string(),
            });
        }

        let content_type = if did_document.context.is_some() {
            DID_LD_JSON
        } else {
            DID_JSON
        };

        let metadata = ResolutionMetadata {
            content_type: content_type.to_string(),
            source_content_type: raw.content_type,
            source: raw.source,
            retrieved: Utc::now(),
            duration: start_time.elapsed(),
        };
        tracing::debug!(did, duration = ?metadata.duration, "resolved DID document");

        Ok(ResolutionResult {
            did_document,
            metadata,
            document_metadata: normalized.metadata,
        })
    }
}

fn document_id(canonical: &[u8]) -> Option<String> {
    serde_json::from_slice::<serde_json::Value>(canonical)
        .ok()?
        .get("id")?
        .as_str()
        .map(str::to_string)
}

/// Resolves a DID with the process-wide resolver, which handles `did:web`
pub async fn resolve_did<I>(did: &str, options: I) -> Result<ResolutionResult, ResolutionError>
where
    I: IntoIterator<Item = ResolutionOption>,
{
    DEFAULT_RESOLVER.resolve(did, options).await
}
