//! MK-002: Error kinds.
//!
//! `LayoutError` is raised once, when a field set is assembled. `EncodeError`
//! and `DecodeError` are per call and deterministic: retrying never helps.

use std::num::{IntErrorKind, ParseFloatError, ParseIntError};
use thiserror::Error;

/// Invalid field declarations, caught when a schema is built and never per call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error(
        "bad layout instruction {instruction:?} on field '{field}' (tag '{tag}'): \
         expected \"<prefix>[ <terminator>]\", found {tokens} space-separated tokens"
    )]
    TooManyTokens {
        field: String,
        tag: String,
        instruction: String,
        tokens: usize,
    },

    #[error("field '{field}' is declared more than once")]
    DuplicateField { field: String },

    #[error("field name must not be empty (position {position})")]
    EmptyFieldName { position: usize },

    #[error("field '{field}' has type {type_name}, which has no text conversion")]
    UnsupportedType { field: String, type_name: String },
}

/// Failure converting a single value to or from text.
#[derive(Debug, Error)]
pub enum TextError {
    #[error("invalid integer {text:?}: {source}")]
    Integer {
        text: String,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid float {text:?}: {source}")]
    Float {
        text: String,
        #[source]
        source: ParseFloatError,
    },

    /// Raised by user-defined conversions.
    #[error("{message}")]
    Custom {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl TextError {
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Custom {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// True when an integer was well-formed but outside the declared width.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            Self::Integer { source, .. }
                if matches!(source.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow)
        )
    }
}

/// Failure assembling the encoded string.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("cannot encode field '{field}' of type {type_name}: {source}")]
    Conversion {
        field: String,
        type_name: &'static str,
        #[source]
        source: TextError,
    },
}

impl EncodeError {
    pub fn field(&self) -> &str {
        match self {
            Self::Conversion { field, .. } => field,
        }
    }
}

/// Failure splitting an encoded string back into fields.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("field '{field}': expected prefix {expected:?} not found at {remaining:?}")]
    PrefixMismatch {
        field: String,
        expected: String,
        remaining: String,
    },

    #[error("field '{field}': terminator {terminator:?} not found in {remaining:?}")]
    MissingTerminator {
        field: String,
        terminator: String,
        remaining: String,
    },

    #[error("field '{field}': cannot decode {text:?} into {type_name}: {source}")]
    Conversion {
        field: String,
        type_name: &'static str,
        text: String,
        #[source]
        source: TextError,
    },

    #[error("unexpected trailing input after last field: {remaining:?}")]
    TrailingInput { remaining: String },
}

impl DecodeError {
    /// Field the failure is attributed to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::PrefixMismatch { field, .. }
            | Self::MissingTerminator { field, .. }
            | Self::Conversion { field, .. } => Some(field),
            Self::TrailingInput { .. } => None,
        }
    }
}

/// Any failure surfaced by the crate-level entry points.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Envelope(#[from] crate::envelope::EnvelopeError),
}
