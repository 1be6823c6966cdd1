//! A pluggable DID resolver with a uniform output shape.
//!
//! Each DID method has its own resolution protocol and document dialect. This library
//! selects the method resolver for a DID, fetches the method-specific raw document,
//! normalizes it into the canonical DID Document vocabulary and parses it into a
//! validated [`DidDocument`]. It only reads: creating or updating DIDs is out of scope.

mod config;
mod did;
mod document;
mod error;
mod methods;
mod normalize;
mod options;
mod resolver;
mod types;

pub use config::{AgentSettings, HttpResolverEndpoint};
pub use did::Did;
pub use document::{DidDocument, OneOrMany, Service, VerificationMethod, VerificationRelationship};
pub use error::{
    ConfigError, DidError, DocumentError, ErrorKind, MethodError, NormalizeError, ResolutionError,
    Stage,
};
pub use methods::{HttpBindingResolver, MethodResolver, WebResolver};
pub use normalize::{normalize, normalize_with_metadata, Normalized};
pub use options::{ResolutionOption, ResolutionOptions, DEFAULT_TIMEOUT, NO_OPTIONS};
pub use resolver::{resolve_did, Resolver};
pub use types::{
    DocumentMetadata, RawDocument, RawFormat, ResolutionMetadata, ResolutionResult, DID_JSON,
    DID_LD_JSON,
};

/// Resolves a DID with the process-wide resolver
///
/// # Arguments
/// * `did` - The DID to resolve
/// * `options` - Resolution directives
///
/// # Example
/// ```no_run
/// use did_resolution::{resolve, NO_OPTIONS};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let result = resolve("did:web:example.com", NO_OPTIONS).await?;
///
///     println!("Resolved DID Document: {:?}", result.did_document);
///     Ok(())
/// }
/// ```
pub async fn resolve<I>(did: &str, options: I) -> Result<ResolutionResult, ResolutionError>
where
    I: IntoIterator<Item = ResolutionOption>,
{
    resolve_did(did, options).await
}
