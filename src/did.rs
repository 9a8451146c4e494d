//! Decentralized identifiers — the addressing scheme for HSTP principals,
//! destinations, and pub/sub channels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque identifier with a method and a method-specific id, e.g.
/// `did:example:alice`. Compared by value.
///
/// `Did` deliberately does not validate the method-specific id against any
/// particular method's grammar — that is the resolver's concern
/// ([`crate::resolver::DidResolver`]), not the wire type's.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did {
    method: String,
    method_specific_id: String,
}

/// Error returned when a string does not parse as `did:<method>:<id>`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid DID: {0:?} (expected \"did:<method>:<method-specific-id>\")")]
pub struct InvalidDid(String);

impl Did {
    /// Builds a DID from an already-split method and method-specific id.
    ///
    /// # Errors
    /// Returns [`InvalidDid`] if either part is empty.
    pub fn new(method: impl Into<String>, method_specific_id: impl Into<String>) -> Result<Self, InvalidDid> {
        let method = method.into();
        let method_specific_id = method_specific_id.into();
        if method.is_empty() || method_specific_id.is_empty() {
            return Err(InvalidDid(format!("did:{method}:{method_specific_id}")));
        }
        Ok(Self {
            method,
            method_specific_id,
        })
    }

    /// The DID method, e.g. `"example"` in `did:example:alice`.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The method-specific id, e.g. `"alice"` in `did:example:alice`.
    #[must_use]
    pub fn method_specific_id(&self) -> &str {
        &self.method_specific_id
    }

    /// Converts to a transport-safe token by replacing characters reserved
    /// by common wire formats (topic names, URL path segments) with `_`.
    ///
    /// Per spec §6, MQTT's `did-safe` form replaces `:` with `_`; this
    /// generalizes to the other reserved characters a topic/path segment
    /// forbids.
    #[must_use]
    pub fn to_transport_safe_token(&self) -> String {
        self.to_string()
            .chars()
            .map(|c| if c == ':' || c == '/' || c == '#' || c == '+' { '_' } else { c })
            .collect()
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "did:{}:{}", self.method, self.method_specific_id)
    }
}

impl std::str::FromStr for Did {
    type Err = InvalidDid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix("did:").ok_or_else(|| InvalidDid(s.to_string()))?;
        let (method, id) = rest.split_once(':').ok_or_else(|| InvalidDid(s.to_string()))?;
        Did::new(method, id)
    }
}

impl TryFrom<String> for Did {
    type Error = InvalidDid;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_method_and_id() {
        let did: Did = "did:example:alice".parse().unwrap();
        assert_eq!(did.method(), "example");
        assert_eq!(did.method_specific_id(), "alice");
        assert_eq!(did.to_string(), "did:example:alice");
    }

    #[test]
    fn rejects_missing_prefix() {
        assert!("example:alice".parse::<Did>().is_err());
    }

    #[test]
    fn rejects_missing_method_specific_id() {
        assert!("did:example".parse::<Did>().is_err());
    }

    #[test]
    fn equal_by_value() {
        let a: Did = "did:example:alice".parse().unwrap();
        let b: Did = "did:example:alice".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn transport_safe_token_replaces_colons() {
        let did: Did = "did:example:alice".parse().unwrap();
        assert_eq!(did.to_transport_safe_token(), "did_example_alice");
    }
}
