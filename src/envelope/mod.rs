//! MK-009: Storage envelope. Attribute values as stored by a DynamoDB-style table.
//!
//! The codec only ever produces and consumes the string member. Every other
//! member is rejected on read.

use crate::core::error::Error;
use crate::core::schema::Record;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single attribute value, serialized in the store's JSON shape (`{"S": "..."}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    S(String),
    N(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    #[serde(rename = "SS")]
    StringSet(Vec<String>),
    #[serde(rename = "NS")]
    NumberSet(Vec<String>),
    L(Vec<AttributeValue>),
    M(IndexMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Wire tag of this member.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::S(_) => "S",
            Self::N(_) => "N",
            Self::Bool(_) => "BOOL",
            Self::Null(_) => "NULL",
            Self::StringSet(_) => "SS",
            Self::NumberSet(_) => "NS",
            Self::L(_) => "L",
            Self::M(_) => "M",
        }
    }

    /// The string member, or a typed error naming what was found instead.
    pub fn as_string(&self) -> Result<&str, EnvelopeError> {
        match self {
            Self::S(s) => Ok(s),
            other => Err(EnvelopeError::NotString {
                found: other.kind(),
            }),
        }
    }

    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        serde_json::to_string(self).map_err(EnvelopeError::Json)
    }

    pub fn from_json(json: &str) -> Result<Self, EnvelopeError> {
        serde_json::from_str(json).map_err(EnvelopeError::Json)
    }
}

/// Failure wrapping or unwrapping the envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("expected string attribute value (S), got {found}")]
    NotString { found: &'static str },

    #[error("attribute value JSON: {0}")]
    Json(#[source] serde_json::Error),
}

/// Encode `record` and wrap the result as a string attribute.
pub fn marshal_fields<R: Record>(record: &R, tag: &str) -> Result<AttributeValue, Error> {
    let schema = R::schema()?;
    Ok(AttributeValue::S(schema.encode(record, tag)?))
}

/// Unwrap a string attribute and decode it into `record`.
pub fn unmarshal_fields<R: Record>(
    record: &mut R,
    tag: &str,
    value: &AttributeValue,
) -> Result<(), Error> {
    let s = value.as_string()?;
    let schema = R::schema()?;
    schema.decode_into(record, tag, s)?;
    Ok(())
}

/// Types that write themselves as a single attribute value.
pub trait MarshalAttributeValue {
    fn marshal_attribute_value(&self) -> Result<AttributeValue, Error>;
}

/// Types that read themselves back from a single attribute value.
pub trait UnmarshalAttributeValue {
    fn unmarshal_attribute_value(&mut self, value: &AttributeValue) -> Result<(), Error>;
}

/// A record stored as one composite key attribute under a chosen tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiKey<T> {
    pub value: T,
    pub tag: String,
}

impl<T> MultiKey<T> {
    pub fn new(value: T, tag: impl Into<String>) -> Self {
        Self {
            value,
            tag: tag.into(),
        }
    }
}

impl<T: Record> MarshalAttributeValue for MultiKey<T> {
    fn marshal_attribute_value(&self) -> Result<AttributeValue, Error> {
        marshal_fields(&self.value, &self.tag)
    }
}

impl<T: Record> UnmarshalAttributeValue for MultiKey<T> {
    fn unmarshal_attribute_value(&mut self, value: &AttributeValue) -> Result<(), Error> {
        unmarshal_fields(&mut self.value, &self.tag, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct UserKey {
        org: String,
        user: u32,
    }

    crate::record!(UserKey {
        org [mkey = "ORG# |", gsi1 = "O: ::"],
        user [mkey = "USER#", gsi1 = "U:"],
    });

    fn sample() -> UserKey {
        UserKey {
            org: "acme".to_string(),
            user: 7,
        }
    }

    #[test]
    fn test_mk009_json_shape() {
        let av = AttributeValue::S("a#b".to_string());
        assert_eq!(av.to_json().unwrap(), r#"{"S":"a#b"}"#);
        assert_eq!(AttributeValue::from_json(r#"{"S":"a#b"}"#).unwrap(), av);
        assert_eq!(AttributeValue::Bool(true).to_json().unwrap(), r#"{"BOOL":true}"#);
        assert_eq!(
            AttributeValue::from_json(r#"{"SS":["x","y"]}"#).unwrap(),
            AttributeValue::StringSet(vec!["x".to_string(), "y".to_string()])
        );
    }

    #[test]
    fn test_mk009_bad_json() {
        assert!(matches!(
            AttributeValue::from_json(r#"{"Q":1}"#),
            Err(EnvelopeError::Json(_))
        ));
    }

    #[test]
    fn test_mk009_marshal_unmarshal() {
        let av = marshal_fields(&sample(), "").unwrap();
        assert_eq!(av, AttributeValue::S("ORG#acme|USER#7".to_string()));

        let mut back = UserKey::default();
        unmarshal_fields(&mut back, "", &av).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_mk009_rejects_non_string() {
        let mut back = UserKey::default();
        let err = unmarshal_fields(&mut back, "", &AttributeValue::N("7".to_string())).unwrap_err();
        assert!(matches!(
            err,
            Error::Envelope(EnvelopeError::NotString { found: "N" })
        ));
        assert!(err.to_string().contains("got N"));
    }

    #[test]
    fn test_mk009_decode_error_passes_through() {
        let mut back = UserKey::default();
        let err = unmarshal_fields(&mut back, "", &AttributeValue::S("nope".to_string())).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_mk009_multi_key_per_tag() {
        let key = MultiKey::new(sample(), "gsi1");
        let av = key.marshal_attribute_value().unwrap();
        assert_eq!(av.as_string().unwrap(), "O:acme::U:7");

        let mut back = MultiKey::new(UserKey::default(), "gsi1");
        back.unmarshal_attribute_value(&av).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_mk009_kind_names() {
        assert_eq!(AttributeValue::Null(true).kind(), "NULL");
        assert_eq!(AttributeValue::M(IndexMap::new()).kind(), "M");
        assert_eq!(AttributeValue::L(vec![]).kind(), "L");
        assert_eq!(AttributeValue::NumberSet(vec![]).kind(), "NS");
    }
}
