//! Error types for DID resolution.
//!
//! Every layer of the pipeline has its own error type, built with `thiserror`. The
//! dispatcher folds them into [`ResolutionError`], which carries the DID being resolved
//! and the stage that failed. Callers branch on [`ResolutionError::kind`], never on the
//! message text.

use std::fmt;

use thiserror::Error;

/// Pipeline stage at which a resolution call terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ParseDid,
    SelectResolver,
    Fetch,
    Normalize,
    ParseCanonical,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ParseDid => "parse-did",
            Stage::SelectResolver => "select-resolver",
            Stage::Fetch => "fetch",
            Stage::Normalize => "normalize",
            Stage::ParseCanonical => "parse-canonical",
        };
        f.write_str(name)
    }
}

/// Kind of a resolution failure, ordered by pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input does not parse into method and method-specific identifier.
    InvalidDid,
    /// No resolver is registered for the method.
    UnsupportedMethod,
    /// Transport failure or non-success status from the resolution service.
    ResolutionUnavailable,
    /// The payload was delivered but fails structural validation.
    MalformedRawDocument,
    /// The canonical JSON was rejected by the document model.
    CanonicalParseFailure,
}

impl ErrorKind {
    /// Whether a caller may retry the same call, with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::ResolutionUnavailable)
    }

    /// The DID Resolution error code matching this kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidDid => "invalidDid",
            ErrorKind::UnsupportedMethod => "methodNotSupported",
            ErrorKind::ResolutionUnavailable => "notFound",
            ErrorKind::MalformedRawDocument => "representationNotSupported",
            ErrorKind::CanonicalParseFailure => "internalError",
        }
    }
}

/// Errors returned by [`crate::Resolver::resolve`].
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// The DID is malformed, or its method-specific identifier yields no address
    #[error("Invalid DID {did:?} ({stage}): {reason}")]
    InvalidDid {
        did: String,
        stage: Stage,
        reason: String,
    },

    /// No resolver is registered for the DID method
    #[error("Unsupported DID method {method:?} for {did}")]
    UnsupportedMethod { did: String, method: String },

    /// The resolution service could not be reached or refused the request
    #[error("DID resolution unavailable for {did}: {source}")]
    ResolutionUnavailable {
        did: String,
        #[source]
        source: MethodError,
    },

    /// The raw document was delivered but is structurally invalid
    #[error("Malformed raw document for {did} ({stage}): {reason}")]
    MalformedRawDocument {
        did: String,
        stage: Stage,
        reason: String,
    },

    /// The normalized document was rejected by the canonical document model
    #[error("Canonical parse failure for {did} (document {document_id:?}): {source}")]
    CanonicalParseFailure {
        did: String,
        document_id: Option<String>,
        #[source]
        source: DocumentError,
    },
}

impl ResolutionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolutionError::InvalidDid { .. } => ErrorKind::InvalidDid,
            ResolutionError::UnsupportedMethod { .. } => ErrorKind::UnsupportedMethod,
            ResolutionError::ResolutionUnavailable { .. } => ErrorKind::ResolutionUnavailable,
            ResolutionError::MalformedRawDocument { .. } => ErrorKind::MalformedRawDocument,
            ResolutionError::CanonicalParseFailure { .. } => ErrorKind::CanonicalParseFailure,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            ResolutionError::InvalidDid { stage, .. } => *stage,
            ResolutionError::UnsupportedMethod { .. } => Stage::SelectResolver,
            ResolutionError::ResolutionUnavailable { .. } => Stage::Fetch,
            ResolutionError::MalformedRawDocument { stage, .. } => *stage,
            ResolutionError::CanonicalParseFailure { .. } => Stage::ParseCanonical,
        }
    }

    /// The DID the failed call was resolving.
    pub fn did(&self) -> &str {
        match self {
            ResolutionError::InvalidDid { did, .. }
            | ResolutionError::UnsupportedMethod { did, .. }
            | ResolutionError::ResolutionUnavailable { did, .. }
            | ResolutionError::MalformedRawDocument { did, .. }
            | ResolutionError::CanonicalParseFailure { did, .. } => did,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Structural reason for the failure. Unlike the `Display` output it never carries
    /// values taken from the fetched document, so it is safe to log.
    pub fn reason(&self) -> String {
        match self {
            ResolutionError::InvalidDid { reason, .. }
            | ResolutionError::MalformedRawDocument { reason, .. } => reason.clone(),
            ResolutionError::UnsupportedMethod { method, .. } => {
                format!("no resolver registered for method {method:?}")
            }
            ResolutionError::ResolutionUnavailable { source, .. } => source.to_string(),
            ResolutionError::CanonicalParseFailure { source, .. } => source.category().to_string(),
        }
    }

    pub(crate) fn from_method(did: &str, err: MethodError) -> Self {
        match err {
            MethodError::InvalidIdentifier(reason) => ResolutionError::InvalidDid {
                did: did.to_string(),
                stage: Stage::Fetch,
                reason,
            },
            MethodError::Malformed(reason) => ResolutionError::MalformedRawDocument {
                did: did.to_string(),
                stage: Stage::Fetch,
                reason,
            },
            source => ResolutionError::ResolutionUnavailable {
                did: did.to_string(),
                source,
            },
        }
    }

    pub(crate) fn from_normalize(did: &str, err: NormalizeError) -> Self {
        ResolutionError::MalformedRawDocument {
            did: did.to_string(),
            stage: Stage::Normalize,
            reason: err.to_string(),
        }
    }
}

/// DID syntax errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DidError {
    #[error("missing \"did:\" scheme")]
    MissingScheme,

    #[error("missing method separator")]
    MissingMethodSeparator,

    #[error("invalid method name {0:?}")]
    InvalidMethod(String),

    #[error("empty method-specific identifier")]
    EmptyMethodSpecificId,

    #[error("invalid character {0:?} in method-specific identifier")]
    InvalidCharacter(char),
}

/// Errors raised by a method resolver while fetching a raw document
#[derive(Error, Debug)]
pub enum MethodError {
    /// No resolution address can be derived from the identifier
    #[error("Invalid method-specific identifier: {0}")]
    InvalidIdentifier(String),

    /// Transport-level failure, including timeouts and cancelled body reads
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// The resolution service answered with a non-success status
    #[error("HTTP {status} when fetching {url}")]
    NonSuccessStatus {
        url: url::Url,
        status: reqwest::StatusCode,
    },

    /// The response arrived but cannot be a raw document
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Structural failures found by the normalizer. Messages never quote document content.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("raw document is not valid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("raw document is not a JSON object")]
    NotAnObject,

    #[error("resolution envelope has no didDocument object")]
    MissingEnvelopeDocument,

    #[error("missing identifier")]
    MissingIdentifier,

    #[error("field {field:?} {problem}")]
    InvalidField {
        field: &'static str,
        problem: &'static str,
    },

    #[error("canonicalization failed: {0}")]
    CanonicalizeError(String),
}

/// Validation failures of the canonical document model
#[derive(Error, Debug)]
pub enum DocumentError {
    /// serde's own message quotes the offending value, so only its position is kept
    #[error("document JSON rejected ({category}) at line {line}, column {column}")]
    JsonError {
        category: &'static str,
        line: usize,
        column: usize,
    },

    #[error("document identifier is not a DID: {0}")]
    InvalidId(#[source] DidError),

    #[error("@context must be a string, an object or an array")]
    InvalidContext,

    #[error("verification method {id:?}: {reason}")]
    InvalidVerificationMethod { id: String, reason: String },

    #[error("service {id:?}: {reason}")]
    InvalidService { id: String, reason: String },

    #[error("{relationship} references unknown verification method {reference:?}")]
    UnknownVerificationMethod {
        relationship: &'static str,
        reference: String,
    },
}

impl From<serde_json::Error> for DocumentError {
    fn from(err: serde_json::Error) -> Self {
        let category = match err.classify() {
            serde_json::error::Category::Io => "io",
            serde_json::error::Category::Syntax => "syntax",
            serde_json::error::Category::Data => "data",
            serde_json::error::Category::Eof => "eof",
        };
        DocumentError::JsonError {
            category,
            line: err.line(),
            column: err.column(),
        }
    }
}

impl DocumentError {
    /// Short name of the violated rule, free of document values.
    pub fn category(&self) -> &'static str {
        match self {
            DocumentError::JsonError { .. } => "document does not match the DID Document schema",
            DocumentError::InvalidId(_) => "document identifier is not a DID",
            DocumentError::InvalidContext => "invalid @context",
            DocumentError::InvalidVerificationMethod { .. } => "invalid verification method",
            DocumentError::InvalidService { .. } => "invalid service",
            DocumentError::UnknownVerificationMethod { .. } => {
                "relationship references an unknown verification method"
            }
        }
    }
}

/// Agent settings errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP resolver entry {0:?} must have the form method@url")]
    InvalidResolverEntry(String),

    #[error("URL parse error in HTTP resolver entry: {0}")]
    UrlError(#[from] url::ParseError),
}
