//! DID parsing.
//!
//! This module splits a DID into its method and method-specific identifier and checks
//! both against the DID syntax. DID URLs (paths, queries, fragments) are rejected: the
//! resolver reads documents, it does not dereference resources.

use std::fmt;

use crate::error::DidError;

/// A parsed DID of the form `did:<method>:<method-specific-id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Did {
    did: String,
    method_len: usize,
}

impl Did {
    /// Parses and validates a DID string
    pub fn parse(did: &str) -> Result<Self, DidError> {
        let rest = did.strip_prefix("did:").ok_or(DidError::MissingScheme)?;
        let (method, msid) = rest
            .split_once(':')
            .ok_or(DidError::MissingMethodSeparator)?;

        if method.is_empty()
            || !method
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(DidError::InvalidMethod(method.to_string()));
        }

        validate_method_specific_id(msid)?;

        Ok(Self {
            did: did.to_string(),
            method_len: method.len(),
        })
    }

    /// The method segment, e.g. `web`
    pub fn method(&self) -> &str {
        &self.did[4..4 + self.method_len]
    }

    /// Everything after the method separator
    pub fn method_specific_id(&self) -> &str {
        &self.did[5 + self.method_len..]
    }

    pub fn as_str(&self) -> &str {
        &self.did
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.did)
    }
}

fn validate_method_specific_id(msid: &str) -> Result<(), DidError> {
    // Inner segments may be empty; the last one may not.
    if msid.is_empty() || msid.ends_with(':') {
        return Err(DidError::EmptyMethodSpecificId);
    }

    let bytes = msid.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' | ':' => i += 1,
            '%' => {
                let valid = bytes.len() > i + 2
                    && bytes[i + 1].is_ascii_hexdigit()
                    && bytes[i + 2].is_ascii_hexdigit();
                if !valid {
                    return Err(DidError::InvalidCharacter('%'));
                }
                i += 3;
            }
            _ => {
                // Report the full character rather than the first UTF-8 byte.
                let ch = msid[i..].chars().next().unwrap_or(c);
                return Err(DidError::InvalidCharacter(ch));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_did_parsing() {
        let test_cases = vec![
            ("did:web:example.com", ("web", "example.com")),
            ("did:web:example.com%3A8080:user:alice", ("web", "example.com%3A8080:user:alice")),
            (
                "did:cheqd:mainnet:zF7rhDBfUt9d1gJPjx7s1JXfUY7oVWkY",
                ("cheqd", "mainnet:zF7rhDBfUt9d1gJPjx7s1JXfUY7oVWkY"),
            ),
            ("did:example:123", ("example", "123")),
            ("did:example::abc", ("example", ":abc")),
        ];

        for (input, expected) in test_cases {
            let parsed = Did::parse(input).unwrap();
            assert_eq!(parsed.method(), expected.0);
            assert_eq!(parsed.method_specific_id(), expected.1);
            assert_eq!(parsed.to_string(), input);
        }
    }

    #[test]
    fn test_invalid_did_format() {
        let invalid_dids = vec![
            ("web:example.com", DidError::MissingScheme),
            ("did:web", DidError::MissingMethodSeparator),
            ("did::example.com", DidError::InvalidMethod(String::new())),
            ("did:Web:example.com", DidError::InvalidMethod("Web".into())),
            ("did:web:", DidError::EmptyMethodSpecificId),
            ("did:web:example.com:", DidError::EmptyMethodSpecificId),
            ("did:web:example.com#key1", DidError::InvalidCharacter('#')),
            ("did:web:example.com/path", DidError::InvalidCharacter('/')),
            ("did:web:example.com%3", DidError::InvalidCharacter('%')),
            ("did:web:exämple.com", DidError::InvalidCharacter('ä')),
        ];

        for (did, expected) in invalid_dids {
            assert_eq!(Did::parse(did), Err(expected), "{did}");
        }
    }
}
