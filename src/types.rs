//! Core types for DID resolution.
//!
//! This module provides the values that flow between the pipeline stages: the raw
//! response a method resolver hands back, and the result returned to the caller.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::document::DidDocument;

/// Media type of a canonical document without `@context`.
pub const DID_JSON: &str = "application/did+json";

/// Media type of a canonical document carrying `@context`.
pub const DID_LD_JSON: &str = "application/did+ld+json";

/// Wire dialect of a raw method document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawFormat {
    /// The body is the DID document itself, e.g. `did.json` served for `did:web`
    DidDocument,
    /// The body wraps the document as `{didDocument, didDocumentMetadata, didResolutionMetadata}`
    ResolutionEnvelope,
}

/// A raw method document as delivered by the resolution service
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub body: Vec<u8>,
    /// `Content-Type` reported by the service, if any
    pub content_type: Option<String>,
    /// Address the document was fetched from
    pub source: Url,
    pub format: RawFormat,
}

/// Resolution result containing the DID Document and metadata
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    /// The resolved DID Document
    pub did_document: DidDocument,

    /// Metadata about the resolution process
    pub metadata: ResolutionMetadata,

    /// Metadata about the document, when the method's dialect carries any
    pub document_metadata: DocumentMetadata,
}

/// Metadata about the resolution process
#[derive(Debug, Clone)]
pub struct ResolutionMetadata {
    /// Content type of the canonical representation
    pub content_type: String,

    /// Content type reported by the resolution service
    pub source_content_type: Option<String>,

    /// Where the raw document was fetched from
    pub source: Url,

    /// When the document was retrieved
    pub retrieved: DateTime<Utc>,

    /// How long the resolution took
    pub duration: Duration,
}

/// Document metadata reported by envelope-style resolution services
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,

    #[serde(rename = "versionId", default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deactivated: Option<bool>,
}
