//! mkey: composite keys for key-value stores.
//!
//! Encodes a flat record into one delimited string (and back) so it can be
//! stored as a single partition or sort key. Each field gets a prefix and a
//! terminator, chosen per tag by `"<prefix>[ <terminator>]"` instructions.
//!
//! ```
//! #[derive(Debug, Default, PartialEq)]
//! struct Key { a: String, b: String }
//!
//! mkey::record!(Key { a, b });
//!
//! let key = Key { a: "first".into(), b: "second".into() };
//! let s = mkey::encode(&key, "").unwrap();
//! assert_eq!(s, "first#second");
//! assert_eq!(mkey::decode::<Key>("", &s).unwrap(), key);
//! ```

pub mod cli;
pub mod core;
pub mod envelope;
pub mod testing;

pub use crate::core::error::{DecodeError, EncodeError, Error, LayoutError, TextError};
pub use crate::core::schema::{Field, Record, Schema};
pub use crate::core::text::KeyText;
pub use crate::core::types::{
    CodecOptions, Plan, PlanEntry, TrailingInput, DEFAULT_TAG, DEFAULT_TERMINATOR,
};

/// Encode `record` under `tag` (empty = [`DEFAULT_TAG`]).
pub fn encode<R: Record>(record: &R, tag: &str) -> Result<String, Error> {
    Ok(R::schema()?.encode(record, tag)?)
}

/// Decode `input` under `tag` into a fresh record.
pub fn decode<R: Record + Default>(tag: &str, input: &str) -> Result<R, Error> {
    Ok(R::schema()?.decode(tag, input)?)
}

/// Decode `input` under `tag` into an existing record.
///
/// Fields decoded before a failure keep their new values; discard the record on error.
pub fn decode_into<R: Record>(record: &mut R, tag: &str, input: &str) -> Result<(), Error> {
    R::schema()?.decode_into(record, tag, input)?;
    Ok(())
}
