//! Raw document normalization.
//!
//! Maps a method-specific raw document onto the canonical DID Document vocabulary. The
//! mapping is pure: the same raw bytes always give the same canonical bytes (JCS
//! serialization), recognized fields are copied verbatim, unrecognized fields are
//! dropped, and absent or empty collections are left out of the output.

use serde_json::{Map, Value};

use crate::error::NormalizeError;
use crate::types::{DocumentMetadata, RawFormat};

const VERIFICATION_METHOD_FIELDS: &[&str] = &[
    "id",
    "type",
    "controller",
    "publicKeyMultibase",
    "publicKeyBase58",
    "publicKeyJwk",
];

const SERVICE_FIELDS: &[&str] = &[
    "id",
    "type",
    "serviceEndpoint",
    "recipientKeys",
    "routingKeys",
    "accept",
    "priority",
];

const VERIFICATION_METHOD_COLLECTIONS: &[&str] = &["verificationMethod", "publicKey"];

const RELATIONSHIPS: &[&str] = &[
    "authentication",
    "assertionMethod",
    "capabilityDelegation",
    "capabilityInvocation",
    "keyAgreement",
];

/// Canonical document plus whatever document metadata the dialect carried
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub document: Vec<u8>,
    pub metadata: DocumentMetadata,
}

/// Maps a raw document into canonical JSON bytes.
pub fn normalize(raw: &[u8], format: RawFormat) -> Result<Vec<u8>, NormalizeError> {
    normalize_with_metadata(raw, format).map(|normalized| normalized.document)
}

/// Like [`normalize`], also returning the envelope's document metadata.
pub fn normalize_with_metadata(
    raw: &[u8],
    format: RawFormat,
) -> Result<Normalized, NormalizeError> {
    let Value::Object(mut top) = serde_json::from_slice::<Value>(raw)? else {
        return Err(NormalizeError::NotAnObject);
    };

    let (document, metadata) = match format {
        RawFormat::DidDocument => (top, DocumentMetadata::default()),
        RawFormat::ResolutionEnvelope => {
            let metadata = document_metadata(top.get("didDocumentMetadata"));
            match top.remove("didDocument") {
                Some(Value::Object(document)) => (document, metadata),
                _ => return Err(NormalizeError::MissingEnvelopeDocument),
            }
        }
    };

    let canonical = map_document(&document)?;
    let document = serde_json_canonicalizer::to_string(&Value::Object(canonical))
        .map_err(|e| NormalizeError::CanonicalizeError(e.to_string()))?
        .into_bytes();

    Ok(Normalized { document, metadata })
}

fn map_document(raw: &Map<String, Value>) -> Result<Map<String, Value>, NormalizeError> {
    let id = match raw.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::String(_)) | Some(Value::Null) | None => {
            return Err(NormalizeError::MissingIdentifier)
        }
        Some(_) => {
            return Err(NormalizeError::InvalidField {
                field: "id",
                problem: "is not a string",
            })
        }
    };

    let mut out = Map::new();
    match raw.get("@context") {
        Some(Value::Array(contexts)) if contexts.is_empty() => {}
        _ => copy_verbatim(raw, "@context", &mut out),
    }
    out.insert("id".to_string(), Value::String(id));

    for &field in VERIFICATION_METHOD_COLLECTIONS {
        let entries = map_collection(raw, field, |entry| match entry {
            Value::Object(vm) => Some(project(vm, VERIFICATION_METHOD_FIELDS)),
            _ => None,
        })?;
        insert_non_empty(&mut out, field, entries);
    }

    let services = map_collection(raw, "service", |entry| match entry {
        Value::Object(service) => Some(project(service, SERVICE_FIELDS)),
        _ => None,
    })?;
    insert_non_empty(&mut out, "service", services);

    for &field in RELATIONSHIPS {
        let entries = map_collection(raw, field, |entry| match entry {
            Value::String(reference) => Some(Value::String(reference.clone())),
            Value::Object(vm) => Some(project(vm, VERIFICATION_METHOD_FIELDS)),
            _ => None,
        })?;
        insert_non_empty(&mut out, field, entries);
    }

    copy_verbatim(raw, "created", &mut out);
    copy_verbatim(raw, "updated", &mut out);

    match raw.get("proof") {
        Some(Value::Array(proofs)) if proofs.is_empty() => {}
        _ => copy_verbatim(raw, "proof", &mut out),
    }

    Ok(out)
}

/// Maps every entry of an array field, in order. A null or absent field maps to nothing.
fn map_collection<F>(
    raw: &Map<String, Value>,
    field: &'static str,
    map_entry: F,
) -> Result<Vec<Value>, NormalizeError>
where
    F: Fn(&Value) -> Option<Value>,
{
    match raw.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(entries)) => entries
            .iter()
            .map(|entry| {
                map_entry(entry).ok_or(NormalizeError::InvalidField {
                    field,
                    problem: "contains an entry of the wrong kind",
                })
            })
            .collect(),
        Some(_) => Err(NormalizeError::InvalidField {
            field,
            problem: "is not an array",
        }),
    }
}

fn project(entry: &Map<String, Value>, fields: &[&str]) -> Value {
    let mut out = Map::new();
    for field in fields {
        copy_verbatim(entry, field, &mut out);
    }
    Value::Object(out)
}

fn copy_verbatim(from: &Map<String, Value>, field: &str, to: &mut Map<String, Value>) {
    if let Some(value) = from.get(field) {
        if !value.is_null() {
            to.insert(field.to_string(), value.clone());
        }
    }
}

fn insert_non_empty(out: &mut Map<String, Value>, field: &str, entries: Vec<Value>) {
    if !entries.is_empty() {
        out.insert(field.to_string(), Value::Array(entries));
    }
}

fn document_metadata(raw: Option<&Value>) -> DocumentMetadata {
    let Some(Value::Object(raw)) = raw else {
        return DocumentMetadata::default();
    };
    let string = |field: &str| raw.get(field).and_then(Value::as_str).map(str::to_string);

    DocumentMetadata {
        created: string("created"),
        updated: string("updated"),
        version_id: string("versionId"),
        deactivated: raw.get("deactivated").and_then(Value::as_bool),
    }
}
