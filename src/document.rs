//! Canonical DID Document model.
//!
//! [`DidDocument::from_json`] is the strict parser at the end of the resolution pipeline.
//! It accepts the normalizer's canonical JSON and rejects structural violations; it never
//! repairs a document.

use base58::FromBase58;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::did::Did;
use crate::error::DocumentError;

/// A complete DID Document as defined in the DID Core specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DidDocument {
    /// The context of the DID Document
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// The DID itself
    pub id: String,

    /// Verification methods associated with this DID
    #[serde(rename = "verificationMethod", default, skip_serializing_if = "Vec::is_empty")]
    pub verification_method: Vec<VerificationMethod>,

    /// Legacy name for verification methods, still emitted by older resolvers
    #[serde(rename = "publicKey", default, skip_serializing_if = "Vec::is_empty")]
    pub public_key: Vec<VerificationMethod>,

    /// Services associated with this DID
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Service>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<VerificationRelationship>,

    #[serde(rename = "assertionMethod", default, skip_serializing_if = "Vec::is_empty")]
    pub assertion_method: Vec<VerificationRelationship>,

    #[serde(rename = "capabilityDelegation", default, skip_serializing_if = "Vec::is_empty")]
    pub capability_delegation: Vec<VerificationRelationship>,

    #[serde(rename = "capabilityInvocation", default, skip_serializing_if = "Vec::is_empty")]
    pub capability_invocation: Vec<VerificationRelationship>,

    #[serde(rename = "keyAgreement", default, skip_serializing_if = "Vec::is_empty")]
    pub key_agreement: Vec<VerificationRelationship>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,

    /// Proofs over the document, kept opaque
    #[serde(
        default,
        deserialize_with = "one_or_many_values",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub proof: Vec<Value>,
}

/// A verification method in a DID Document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationMethod {
    /// The unique identifier for this verification method
    pub id: String,

    /// The type of the verification method
    #[serde(rename = "type")]
    pub method_type: String,

    /// The controller of this verification method
    pub controller: String,

    /// The public key in multibase format
    #[serde(rename = "publicKeyMultibase", default, skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,

    #[serde(rename = "publicKeyBase58", default, skip_serializing_if = "Option::is_none")]
    pub public_key_base58: Option<String>,

    #[serde(rename = "publicKeyJwk", default, skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<Map<String, Value>>,
}

/// A service endpoint in a DID Document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// The unique identifier for this service
    pub id: String,

    /// The type of the service
    #[serde(rename = "type")]
    pub service_type: OneOrMany<String>,

    /// The endpoint URL, map or set
    #[serde(rename = "serviceEndpoint")]
    pub service_endpoint: Value,

    #[serde(rename = "recipientKeys", default, skip_serializing_if = "Vec::is_empty")]
    pub recipient_keys: Vec<String>,

    #[serde(rename = "routingKeys", default, skip_serializing_if = "Vec::is_empty")]
    pub routing_keys: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accept: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u64>,
}

/// Entry of a verification relationship such as `authentication`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerificationRelationship {
    /// Absolute or `#fragment` reference to a declared verification method
    Reference(String),
    Embedded(VerificationMethod),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn to_vec(&self) -> Vec<&T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values.iter().collect(),
        }
    }
}

fn one_or_many_values<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(values) => values,
        value => vec![value],
    })
}

impl DidDocument {
    /// Parses canonical JSON and validates the document structure
    pub fn from_json(json: &[u8]) -> Result<Self, DocumentError> {
        let document: DidDocument = serde_json::from_slice(json)?;
        document.validate()?;
        Ok(document)
    }

    /// Finds a verification method by absolute or `#fragment` id, including methods
    /// embedded in a verification relationship.
    pub fn verification_method(&self, id: &str) -> Option<&VerificationMethod> {
        let id = self.absolute_id(id);
        self.declared_methods().find(|vm| self.absolute_id(&vm.id) == id)
    }

    fn relationships(&self) -> [(&'static str, &Vec<VerificationRelationship>); 5] {
        [
            ("authentication", &self.authentication),
            ("assertionMethod", &self.assertion_method),
            ("capabilityDelegation", &self.capability_delegation),
            ("capabilityInvocation", &self.capability_invocation),
            ("keyAgreement", &self.key_agreement),
        ]
    }

    fn declared_methods(&self) -> impl Iterator<Item = &VerificationMethod> {
        let embedded = self
            .relationships()
            .into_iter()
            .flat_map(|(_, entries)| entries.iter())
            .filter_map(|entry| match entry {
                VerificationRelationship::Embedded(vm) => Some(vm),
                VerificationRelationship::Reference(_) => None,
            });
        self.verification_method
            .iter()
            .chain(self.public_key.iter())
            .chain(embedded)
    }

    /// Whether `reference` points into this document rather than another DID's.
    fn is_local_reference(&self, reference: &str) -> bool {
        let did = reference.split('#').next().unwrap_or(reference);
        did.is_empty() || did == self.id
    }

    pub fn service(&self, id: &str) -> Option<&Service> {
        let id = self.absolute_id(id);
        self.service.iter().find(|s| self.absolute_id(&s.id) == id)
    }

    fn absolute_id(&self, id: &str) -> String {
        if id.starts_with('#') {
            format!("{}{}", self.id, id)
        } else {
            id.to_string()
        }
    }

    fn validate(&self) -> Result<(), DocumentError> {
        Did::parse(&self.id).map_err(DocumentError::InvalidId)?;

        if let Some(context) = &self.context {
            let valid = match context {
                Value::String(_) | Value::Object(_) => true,
                Value::Array(items) => items
                    .iter()
                    .all(|item| item.is_string() || item.is_object()),
                _ => false,
            };
            if !valid {
                return Err(DocumentError::InvalidContext);
            }
        }

        for vm in self.verification_method.iter().chain(self.public_key.iter()) {
            vm.validate()?;
        }

        for service in &self.service {
            service.validate()?;
        }

        // References to another DID's methods cannot be checked without resolving it.
        for (name, entries) in self.relationships() {
            for entry in entries {
                match entry {
                    VerificationRelationship::Reference(reference) => {
                        if self.is_local_reference(reference)
                            && self.verification_method(reference).is_none()
                        {
                            return Err(DocumentError::UnknownVerificationMethod {
                                relationship: name,
                                reference: reference.clone(),
                            });
                        }
                    }
                    VerificationRelationship::Embedded(vm) => vm.validate()?,
                }
            }
        }

        Ok(())
    }
}

impl VerificationMethod {
    /// Decodes the key material, if it is multibase or base58 encoded.
    pub fn public_key_bytes(&self) -> Option<Vec<u8>> {
        if let Some(multibase) = &self.public_key_multibase {
            return multibase.strip_prefix('z')?.from_base58().ok();
        }
        self.public_key_base58.as_ref()?.from_base58().ok()
    }

    fn validate(&self) -> Result<(), DocumentError> {
        let invalid = |reason: &str| DocumentError::InvalidVerificationMethod {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.is_empty() {
            return Err(invalid("empty id"));
        }
        if self.method_type.is_empty() {
            return Err(invalid("empty type"));
        }
        if self.controller.is_empty() {
            return Err(invalid("empty controller"));
        }

        let materials = [
            self.public_key_multibase.is_some(),
            self.public_key_base58.is_some(),
            self.public_key_jwk.is_some(),
        ];
        match materials.iter().filter(|present| **present).count() {
            0 => return Err(invalid("no key material")),
            1 => {}
            _ => return Err(invalid("more than one key material")),
        }

        if let Some(multibase) = &self.public_key_multibase {
            let encoded = multibase
                .strip_prefix('z')
                .ok_or_else(|| invalid("publicKeyMultibase is not base58btc encoded"))?;
            match encoded.from_base58() {
                Ok(bytes) if !bytes.is_empty() => {}
                _ => return Err(invalid("publicKeyMultibase does not decode")),
            }
        }

        if let Some(base58) = &self.public_key_base58 {
            match base58.from_base58() {
                Ok(bytes) if !bytes.is_empty() => {}
                _ => return Err(invalid("publicKeyBase58 does not decode")),
            }
        }

        if let Some(jwk) = &self.public_key_jwk {
            if !jwk.get("kty").is_some_and(Value::is_string) {
                return Err(invalid("publicKeyJwk has no kty"));
            }
        }

        Ok(())
    }
}

impl Service {
    fn validate(&self) -> Result<(), DocumentError> {
        let invalid = |reason: &str| DocumentError::InvalidService {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.is_empty() {
            return Err(invalid("empty id"));
        }
        let types = self.service_type.to_vec();
        if types.is_empty() || types.iter().any(|t| t.is_empty()) {
            return Err(invalid("empty type"));
        }
        match &self.service_endpoint {
            Value::String(endpoint) if endpoint.is_empty() => Err(invalid("empty serviceEndpoint")),
            Value::String(_) | Value::Object(_) => Ok(()),
            Value::Array(endpoints) if !endpoints.is_empty() => Ok(()),
            _ => Err(invalid("serviceEndpoint must be a URI, a map or a non-empty set")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEY: &str = "z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK";

    fn parse(value: Value) -> Result<DidDocument, DocumentError> {
        DidDocument::from_json(value.to_string().as_bytes())
    }

    fn sample() -> Value {
        json!({
            "@context": ["https://www.w3.org/ns/did/v1"],
            "id": "did:example:123",
            "verificationMethod": [
                {
                    "id": "did:example:123#key-1",
                    "type": "Ed25519VerificationKey2020",
                    "controller": "did:example:123",
                    "publicKeyMultibase": KEY
                },
                {
                    "id": "#key-2",
                    "type": "JsonWebKey2020",
                    "controller": "did:example:123",
                    "publicKeyJwk": { "kty": "OKP", "crv": "Ed25519", "x": "G80iskrv_nE69qbGLSpeOHJgmV4MKIzsy5l5iT6pCww" }
                }
            ],
            "service": [{
                "id": "did:example:123#agent",
                "type": ["DIDCommMessaging", "LinkedDomains"],
                "serviceEndpoint": "https://agent.example.com"
            }],
            "authentication": ["did:example:123#key-1", "#key-2"],
            "created": "2022-08-19T08:40:00Z",
            "proof": { "type": "Ed25519Signature2020" }
        })
    }

    #[test]
    fn test_parse_valid_document() {
        let doc = parse(sample()).unwrap();
        assert_eq!(doc.id, "did:example:123");
        assert_eq!(doc.verification_method.len(), 2);
        assert_eq!(doc.authentication.len(), 2);
        assert_eq!(doc.service[0].service_type.to_vec().len(), 2);
        assert_eq!(doc.proof.len(), 1);
        assert!(doc.created.is_some());
        assert!(doc.verification_method("#key-1").is_some());
        assert!(doc.service("#agent").is_some());
        assert_eq!(
            doc.verification_method[0].public_key_bytes().map(|b| b.len()),
            Some(34)
        );
    }

    #[test]
    fn test_minimal_document() {
        let doc = parse(json!({ "id": "did:example:123" })).unwrap();
        assert!(doc.verification_method.is_empty());
        assert!(doc.context.is_none());
        assert_eq!(serde_json::to_value(&doc).unwrap(), json!({ "id": "did:example:123" }));
    }

    #[test]
    fn test_rejects_non_did_identifier() {
        let err = parse(json!({ "id": "example:123" })).unwrap_err();
        assert!(matches!(err, DocumentError::InvalidId(_)));
    }

    #[test]
    fn test_rejects_bad_key_material() {
        let cases = vec![
            json!({ "id": "#k", "type": "T", "controller": "did:example:123" }),
            json!({ "id": "#k", "type": "T", "controller": "did:example:123", "publicKeyMultibase": "z0OIl" }),
            json!({ "id": "#k", "type": "T", "controller": "did:example:123", "publicKeyMultibase": "uAAAA" }),
            json!({ "id": "#k", "type": "T", "controller": "did:example:123", "publicKeyMultibase": KEY, "publicKeyBase58": "6Mk" }),
            json!({ "id": "#k", "type": "T", "controller": "did:example:123", "publicKeyJwk": { "crv": "Ed25519" } }),
            json!({ "id": "#k", "type": "", "controller": "did:example:123", "publicKeyMultibase": KEY }),
        ];

        for vm in cases {
            let err = parse(json!({ "id": "did:example:123", "verificationMethod": [vm] })).unwrap_err();
            assert!(matches!(err, DocumentError::InvalidVerificationMethod { .. }), "{err}");
        }
    }

    #[test]
    fn test_rejects_unknown_reference() {
        let mut doc = sample();
        doc["authentication"] = json!(["did:example:123#missing"]);
        let err = parse(doc).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::UnknownVerificationMethod { relationship: "authentication", .. }
        ));
    }

    #[test]
    fn test_accepts_reference_to_another_did() {
        let mut doc = sample();
        doc["authentication"] = json!(["did:example:controller#key-1", "#key-2"]);
        let doc = parse(doc).unwrap();
        assert!(doc.verification_method("did:example:controller#key-1").is_none());
    }

    #[test]
    fn test_accepts_reference_to_embedded_method() {
        let mut doc = sample();
        doc["keyAgreement"] = json!([{
            "id": "did:example:123#agreement",
            "type": "Ed25519VerificationKey2020",
            "controller": "did:example:123",
            "publicKeyMultibase": KEY
        }]);
        doc["capabilityInvocation"] = json!(["#agreement"]);

        let doc = parse(doc).unwrap();
        assert_eq!(
            doc.verification_method("#agreement").map(|vm| vm.id.as_str()),
            Some("did:example:123#agreement")
        );
    }

    #[test]
    fn test_rejects_bad_service() {
        let mut doc = sample();
        doc["service"][0]["serviceEndpoint"] = json!("");
        assert!(matches!(parse(doc).unwrap_err(), DocumentError::InvalidService { .. }));

        let mut doc = sample();
        doc["service"][0]["serviceEndpoint"] = json!(null);
        assert!(matches!(parse(doc).unwrap_err(), DocumentError::InvalidService { .. }));
    }

    #[test]
    fn test_rejects_bad_timestamp_and_context() {
        let mut doc = sample();
        doc["created"] = json!("yesterday");
        assert!(matches!(parse(doc).unwrap_err(), DocumentError::JsonError { .. }));

        let mut doc = sample();
        doc["@context"] = json!(42);
        assert!(matches!(parse(doc).unwrap_err(), DocumentError::InvalidContext));
    }

    #[test]
    fn test_embedded_relationship_is_validated() {
        let mut doc = sample();
        doc["keyAgreement"] = json!([{ "id": "#x", "type": "X25519KeyAgreementKey2020", "controller": "did:example:123" }]);
        assert!(matches!(
            parse(doc).unwrap_err(),
            DocumentError::InvalidVerificationMethod { .. }
        ));
    }
}
