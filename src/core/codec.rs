//! MK-007: Encode and decode over a resolved plan.
//!
//! Encode appends `prefix + text + terminator` per field. Decode walks a
//! cursor over the input, one field at a time, with no backtracking:
//!
//! ```text
//! AwaitPrefix(0) -> AwaitTerminator(0) -> AwaitPrefix(1) -> ... -> Done
//! ```
//!
//! Any failure stops the walk. Fields already written stay written.

use super::error::{DecodeError, EncodeError};
use super::schema::Field;
use super::types::{Plan, PlanEntry, TrailingInput};

/// Encode `record` field by field under `plan`.
pub(crate) fn encode<R>(fields: &[Field<R>], plan: &Plan, record: &R) -> Result<String, EncodeError> {
    debug_assert_eq!(fields.len(), plan.len(), "plan does not match field list");

    let mut out = String::new();
    for (field, entry) in fields.iter().zip(plan.iter()) {
        let text = field.read_text(record).map_err(|source| {
            tracing::debug!(field = field.name(), error = %source, "field encode failed");
            EncodeError::Conversion {
                field: field.name().to_string(),
                type_name: field.type_name(),
                source,
            }
        })?;
        tracing::trace!(field = field.name(), text = %text, "encoded field");

        out.push_str(&entry.prefix);
        out.push_str(&text);
        out.push_str(&entry.terminator);
    }
    Ok(out)
}

/// Decode `input` into `record` field by field under `plan`.
pub(crate) fn decode<R>(
    fields: &[Field<R>],
    plan: &Plan,
    record: &mut R,
    input: &str,
    trailing: TrailingInput,
) -> Result<(), DecodeError> {
    debug_assert_eq!(fields.len(), plan.len(), "plan does not match field list");

    let mut cursor = Cursor::new(input);
    for (field, entry) in fields.iter().zip(plan.iter()) {
        let raw = cursor.next_field(field.name(), entry).inspect_err(|e| {
            tracing::debug!(error = %e, "field split failed");
        })?;

        field.write_text(record, raw).map_err(|source| {
            tracing::debug!(field = field.name(), error = %source, "field decode failed");
            DecodeError::Conversion {
                field: field.name().to_string(),
                type_name: field.type_name(),
                text: raw.to_string(),
                source,
            }
        })?;
        tracing::trace!(field = field.name(), text = raw, "decoded field");
    }

    if trailing == TrailingInput::Reject && !cursor.is_empty() {
        return Err(DecodeError::TrailingInput {
            remaining: cursor.remaining().to_string(),
        });
    }
    Ok(())
}

/// Unconsumed suffix of the input being decoded.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    remaining: &'a str,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { remaining: input }
    }

    pub fn remaining(&self) -> &'a str {
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Consume one field: its prefix, its raw text, and its terminator.
    ///
    /// An empty terminator takes everything that is left.
    pub fn next_field(&mut self, field: &str, entry: &PlanEntry) -> Result<&'a str, DecodeError> {
        let rest = self
            .remaining
            .strip_prefix(entry.prefix.as_str())
            .ok_or_else(|| DecodeError::PrefixMismatch {
                field: field.to_string(),
                expected: entry.prefix.clone(),
                remaining: self.remaining.to_string(),
            })?;

        if entry.terminator.is_empty() {
            self.remaining = "";
            return Ok(rest);
        }

        let end = rest
            .find(entry.terminator.as_str())
            .ok_or_else(|| DecodeError::MissingTerminator {
                field: field.to_string(),
                terminator: entry.terminator.clone(),
                remaining: rest.to_string(),
            })?;

        self.remaining = &rest[end + entry.terminator.len()..];
        Ok(&rest[..end])
    }
}
