//! Composite identifiers for approval and task records.
//!
//! Three backend collections (procurement applications, inbound and outbound
//! applications) are addressed uniformly through a single string of the form
//! `"<KIND>:<raw id>"`. Internally the pair is carried as [`ApprovalRef`]; the
//! string form only exists at the boundary (route params, request paths).

use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// Separator between the kind and the raw id.
const SEPARATOR: char = ':';

/// Source collection of an approval item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalKind {
    Procurement,
    Inbound,
    Outbound,
}

impl ApprovalKind {
    pub const ALL: [ApprovalKind; 3] = [Self::Procurement, Self::Inbound, Self::Outbound];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalKind::Procurement => "PROCUREMENT",
            ApprovalKind::Inbound => "INBOUND",
            ApprovalKind::Outbound => "OUTBOUND",
        }
    }

    /// Human-readable label shown next to approval rows.
    pub fn type_label(&self) -> &'static str {
        match self {
            ApprovalKind::Procurement => "Procurement request",
            ApprovalKind::Inbound => "Inbound request",
            ApprovalKind::Outbound => "Outbound request",
        }
    }

    /// Prefix of the zero-padded display id (`PO-000042`).
    pub fn display_prefix(&self) -> &'static str {
        match self {
            ApprovalKind::Procurement => "PO",
            ApprovalKind::Inbound => "IN",
            ApprovalKind::Outbound => "OUT",
        }
    }

    /// Human display id: prefix plus the raw id left-padded to 6 characters.
    pub fn display_id(&self, raw_id: &str) -> String {
        format!("{}-{:0>6}", self.display_prefix(), raw_id)
    }
}

impl core::fmt::Display for ApprovalKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROCUREMENT" => Ok(Self::Procurement),
            "INBOUND" => Ok(Self::Inbound),
            "OUTBOUND" => Ok(Self::Outbound),
            other => Err(DomainError::invalid_id(format!("unknown approval kind '{other}'"))),
        }
    }
}

/// Tagged reference to an approval-capable record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ApprovalRef {
    Procurement(String),
    Inbound(String),
    Outbound(String),
}

impl ApprovalRef {
    pub fn new(kind: ApprovalKind, raw_id: impl Into<String>) -> Self {
        let raw_id = raw_id.into();
        match kind {
            ApprovalKind::Procurement => Self::Procurement(raw_id),
            ApprovalKind::Inbound => Self::Inbound(raw_id),
            ApprovalKind::Outbound => Self::Outbound(raw_id),
        }
    }

    pub fn kind(&self) -> ApprovalKind {
        match self {
            ApprovalRef::Procurement(_) => ApprovalKind::Procurement,
            ApprovalRef::Inbound(_) => ApprovalKind::Inbound,
            ApprovalRef::Outbound(_) => ApprovalKind::Outbound,
        }
    }

    pub fn raw_id(&self) -> &str {
        match self {
            ApprovalRef::Procurement(id) | ApprovalRef::Inbound(id) | ApprovalRef::Outbound(id) => id,
        }
    }

    /// Serialize to the wire form `"<KIND>:<raw id>"`.
    pub fn encode(&self) -> String {
        encode(self.kind(), self.raw_id())
    }
}

impl core::fmt::Display for ApprovalRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}{}", self.kind(), SEPARATOR, self.raw_id())
    }
}

impl FromStr for ApprovalRef {
    type Err = DomainError;

    /// Strict parse: the kind must be known and the raw id non-empty.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = decode(s);
        if decoded.id.is_empty() {
            return Err(DomainError::invalid_id(format!("missing raw id in '{s}'")));
        }
        let kind = decoded.kind.parse::<ApprovalKind>()?;
        Ok(Self::new(kind, decoded.id))
    }
}

/// Serialized as its wire form.
impl Serialize for ApprovalRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ApprovalRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Loosely decoded composite id. Either part may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedId {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

/// Encode a `(kind, raw id)` pair.
pub fn encode(kind: ApprovalKind, raw_id: &str) -> String {
    format!("{}{}{}", kind.as_str(), SEPARATOR, raw_id)
}

/// Decode a composite id without failing.
///
/// Splits at the first separator, so any raw id survives a round-trip. Empty
/// input yields two empty parts; input without a separator is all kind.
pub fn decode(composite: &str) -> DecodedId {
    if composite.is_empty() {
        return DecodedId::default();
    }
    match composite.split_once(SEPARATOR) {
        Some((kind, id)) => DecodedId {
            kind: kind.to_string(),
            id: id.to_string(),
        },
        None => DecodedId {
            kind: composite.to_string(),
            id: String::new(),
        },
    }
}

/// [`decode`] for an optional input (absent route param, missing field).
pub fn decode_opt(composite: Option<&str>) -> DecodedId {
    composite.map(decode).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encodes_kind_and_raw_id() {
        assert_eq!(encode(ApprovalKind::Inbound, "42"), "INBOUND:42");
        assert_eq!(ApprovalRef::Procurement("7".into()).encode(), "PROCUREMENT:7");
    }

    #[test]
    fn decode_empty_and_absent_yield_empty_parts() {
        assert_eq!(decode(""), DecodedId::default());
        assert_eq!(decode_opt(None), DecodedId::default());
        assert_eq!(decode_opt(Some("")), DecodedId::default());
    }

    #[test]
    fn decode_without_separator_keeps_everything_as_kind() {
        let decoded = decode("PROCUREMENT");
        assert_eq!(decoded.kind, "PROCUREMENT");
        assert_eq!(decoded.id, "");
    }

    #[test]
    fn strict_parse_rejects_unknown_kind_and_missing_id() {
        assert!("REFUND:3".parse::<ApprovalRef>().is_err());
        assert!("OUTBOUND:".parse::<ApprovalRef>().is_err());
        assert_eq!(
            "OUTBOUND:3".parse::<ApprovalRef>().unwrap(),
            ApprovalRef::Outbound("3".into())
        );
    }

    #[test]
    fn display_id_is_zero_padded() {
        assert_eq!(ApprovalKind::Procurement.display_id("42"), "PO-000042");
        assert_eq!(ApprovalKind::Outbound.display_id("1234567"), "OUT-1234567");
    }

    fn any_kind() -> impl Strategy<Value = ApprovalKind> {
        prop::sample::select(ApprovalKind::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn decode_recovers_encoded_pair(kind in any_kind(), raw in ".{1,24}") {
            let decoded = decode(&encode(kind, &raw));
            prop_assert_eq!(decoded.kind, kind.as_str());
            prop_assert_eq!(decoded.id, raw.clone());

            let parsed: ApprovalRef = encode(kind, &raw).parse().unwrap();
            prop_assert_eq!(parsed, ApprovalRef::new(kind, raw));
        }

        #[test]
        fn same_pair_always_encodes_identically(kind in any_kind(), raw in "[0-9]{1,12}") {
            prop_assert_eq!(encode(kind, &raw), ApprovalRef::new(kind, raw.clone()).encode());
        }
    }
}
