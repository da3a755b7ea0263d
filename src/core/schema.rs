//! MK-006: Field descriptors and schemas.
//!
//! A record type registers its participating fields once, in key order. Each
//! descriptor carries the field's tag instructions and a get/set pair that
//! goes through [`KeyText`]. Instruction syntax is checked when the schema is
//! built, so encode and decode never see a malformed declaration.

use super::codec;
use super::error::{DecodeError, EncodeError, LayoutError, TextError};
use super::resolver::{self, FieldLayout};
use super::text::KeyText;
use super::types::{effective_tag, CodecOptions, Plan};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;
use tracing::instrument;

type GetText<R> = Box<dyn Fn(&R) -> Result<String, TextError> + Send + Sync>;
type SetText<R> = Box<dyn Fn(&mut R, &str) -> Result<(), TextError> + Send + Sync>;

/// One participating sub-field of a record.
pub struct Field<R> {
    name: String,
    type_name: &'static str,
    tags: IndexMap<String, String>,
    get: GetText<R>,
    set: SetText<R>,
}

impl<R: 'static> Field<R> {
    /// Describe a field through borrow accessors.
    ///
    /// ```
    /// use mkey::Field;
    ///
    /// struct Key { tenant: String }
    ///
    /// let f = Field::new("tenant", |k: &Key| &k.tenant, |k: &mut Key| &mut k.tenant)
    ///     .tag("mkey", "T= |");
    /// assert_eq!(f.type_name(), "string");
    /// ```
    pub fn new<V, G, S>(name: impl Into<String>, get: G, set: S) -> Self
    where
        V: KeyText + 'static,
        G: Fn(&R) -> &V + Send + Sync + 'static,
        S: Fn(&mut R) -> &mut V + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            type_name: V::type_name(),
            tags: IndexMap::new(),
            get: Box::new(move |record: &R| get(record).to_text()),
            set: Box::new(move |record: &mut R, text: &str| {
                *set(record) = V::from_text(text)?;
                Ok(())
            }),
        }
    }

    /// Describe a field through raw text conversion functions.
    pub fn from_fns<G, S>(name: impl Into<String>, type_name: &'static str, get: G, set: S) -> Self
    where
        G: Fn(&R) -> Result<String, TextError> + Send + Sync + 'static,
        S: Fn(&mut R, &str) -> Result<(), TextError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            type_name,
            tags: IndexMap::new(),
            get: Box::new(get),
            set: Box::new(set),
        }
    }
}

impl<R> Field<R> {
    /// Attach a layout instruction under `tag`. A later call for the same tag replaces it.
    pub fn tag(mut self, tag: impl Into<String>, instruction: impl Into<String>) -> Self {
        self.tags.insert(tag.into(), instruction.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn tags(&self) -> &IndexMap<String, String> {
        &self.tags
    }

    /// Current value of this field as text.
    pub fn read_text(&self, record: &R) -> Result<String, TextError> {
        (self.get)(record)
    }

    /// Parse `text` and store it into this field.
    pub fn write_text(&self, record: &mut R, text: &str) -> Result<(), TextError> {
        (self.set)(record, text)
    }
}

impl<R> fmt::Debug for Field<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// Validated, ordered field set for a record type.
pub struct Schema<R> {
    fields: Vec<Field<R>>,
    layouts: Vec<FieldLayout>,
}

impl<R> Schema<R> {
    /// Build a schema, rejecting empty or duplicate names and malformed instructions.
    pub fn new(fields: Vec<Field<R>>) -> Result<Self, LayoutError> {
        let mut seen = HashSet::with_capacity(fields.len());
        let mut layouts = Vec::with_capacity(fields.len());

        for (position, field) in fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(LayoutError::EmptyFieldName { position });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(LayoutError::DuplicateField {
                    field: field.name.clone(),
                });
            }
            layouts.push(FieldLayout::from_raw(&field.name, &field.tags)?);
        }

        Ok(Self { fields, layouts })
    }

    pub fn fields(&self) -> &[Field<R>] {
        &self.fields
    }

    pub fn layouts(&self) -> &[FieldLayout] {
        &self.layouts
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Resolved plan under `tag` (empty = default tag).
    pub fn plan(&self, tag: &str) -> Plan {
        resolver::resolve(&self.layouts, tag)
    }

    /// Encode `record` into a single key string.
    #[instrument(level = "debug", skip_all, fields(tag = effective_tag(tag)))]
    pub fn encode(&self, record: &R, tag: &str) -> Result<String, EncodeError> {
        codec::encode(&self.fields, &self.plan(tag), record)
    }

    /// Decode `input` into `record` in place, ignoring trailing input.
    ///
    /// On error, fields decoded before the failing one keep their new values.
    pub fn decode_into(&self, record: &mut R, tag: &str, input: &str) -> Result<(), DecodeError> {
        self.decode_into_with(record, &CodecOptions::with_tag(tag), input)
    }

    /// Decode `input` into `record` in place under explicit options.
    #[instrument(level = "debug", skip_all, fields(tag = effective_tag(&options.tag)))]
    pub fn decode_into_with(
        &self,
        record: &mut R,
        options: &CodecOptions,
        input: &str,
    ) -> Result<(), DecodeError> {
        let plan = self.plan(&options.tag);
        codec::decode(&self.fields, &plan, record, input, options.trailing)
    }

    /// Decode `input` into a fresh default record.
    pub fn decode(&self, tag: &str, input: &str) -> Result<R, DecodeError>
    where
        R: Default,
    {
        let mut record = R::default();
        self.decode_into(&mut record, tag, input)?;
        Ok(record)
    }
}

impl<R> fmt::Debug for Schema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema").field("fields", &self.fields).finish()
    }
}

/// A type whose participating fields are registered for key encoding.
///
/// Usually implemented with [`record!`](crate::record).
pub trait Record: Sized + 'static {
    /// Participating fields in key order.
    fn fields() -> Vec<Field<Self>>;

    /// Build and validate the schema for this type.
    fn schema() -> Result<Schema<Self>, LayoutError> {
        Schema::new(Self::fields())
    }
}

/// Implement [`Record`] for a struct by listing its participating fields in key order.
///
/// Fields left out of the list never take part in encoding or decoding.
/// Each field may carry `[tag = "instruction", ...]`.
///
/// ```
/// #[derive(Debug, Default, PartialEq)]
/// struct OrderKey {
///     tenant: String,
///     order: u64,
///     cached_label: String,
/// }
///
/// mkey::record!(OrderKey {
///     tenant [mkey = "TENANT= |"],
///     order [mkey = "ORDER="],
/// });
///
/// let key = OrderKey { tenant: "acme".into(), order: 42, cached_label: "x".into() };
/// let s = mkey::encode(&key, "").unwrap();
/// assert_eq!(s, "TENANT=acme|ORDER=42");
/// ```
#[macro_export]
macro_rules! record {
    ($record:ty { $( $field:ident $( [ $( $tag:ident = $instruction:literal ),* $(,)? ] )? ),* $(,)? }) => {
        impl $crate::Record for $record {
            fn fields() -> ::std::vec::Vec<$crate::Field<Self>> {
                ::std::vec![
                    $(
                        $crate::Field::new(
                            ::std::stringify!($field),
                            |r: &Self| &r.$field,
                            |r: &mut Self| &mut r.$field,
                        )
                        $( $( .tag(::std::stringify!($tag), $instruction) )* )?
                    ),*
                ]
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{PlanEntry, TrailingInput};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Pair {
        a: String,
        b: String,
    }

    crate::record!(Pair { a, b });

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Tagged {
        first: String,
        second: String,
        third: String,
    }

    crate::record!(Tagged {
        first [mkey = "First= |", alt = "f: ::"],
        second [mkey = "Second= |", alt = "s: ::"],
        third [mkey = "Third=", alt = "t:"],
    });

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Mixed {
        hidden_a: String,
        b: String,
        hidden_c: String,
        d: String,
    }

    crate::record!(Mixed { b, d });

    #[test]
    fn test_mk006_record_macro_fields() {
        let fields = Tagged::fields();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].name(), "first");
        assert_eq!(fields[0].type_name(), "string");
        assert_eq!(fields[0].tags().get("mkey").map(String::as_str), Some("First= |"));
        assert_eq!(fields[2].tags().get("alt").map(String::as_str), Some("t:"));
    }

    #[test]
    fn test_mk006_schema_plan_per_tag() {
        let schema = Tagged::schema().unwrap();
        assert_eq!(schema.plan("mkey").entries[0], PlanEntry::new("First=", "|"));
        assert_eq!(schema.plan("alt").entries[1], PlanEntry::new("s:", "::"));
        assert_eq!(schema.plan("none").entries[0], PlanEntry::new("", "#"));
    }

    #[test]
    fn test_mk006_schema_rejects_bad_instruction() {
        let fields = vec![Field::new("a", |p: &Pair| &p.a, |p: &mut Pair| &mut p.a)
            .tag("mkey", "x y z")];
        let err = Schema::new(fields).unwrap_err();
        assert!(matches!(err, LayoutError::TooManyTokens { tokens: 3, .. }));
    }

    #[test]
    fn test_mk006_schema_rejects_duplicate() {
        let fields = vec![
            Field::new("a", |p: &Pair| &p.a, |p: &mut Pair| &mut p.a),
            Field::new("a", |p: &Pair| &p.b, |p: &mut Pair| &mut p.b),
        ];
        let err = Schema::new(fields).unwrap_err();
        assert_eq!(err, LayoutError::DuplicateField { field: "a".to_string() });
    }

    #[test]
    fn test_mk006_schema_rejects_empty_name() {
        let fields = vec![Field::new("", |p: &Pair| &p.a, |p: &mut Pair| &mut p.a)];
        assert_eq!(
            Schema::new(fields).unwrap_err(),
            LayoutError::EmptyFieldName { position: 0 }
        );
    }

    #[test]
    fn test_mk006_tag_replaces() {
        let f = Field::new("a", |p: &Pair| &p.a, |p: &mut Pair| &mut p.a)
            .tag("mkey", "A=")
            .tag("mkey", "B=");
        assert_eq!(f.tags().len(), 1);
        assert_eq!(f.tags()["mkey"], "B=");
    }

    #[test]
    fn test_mk006_field_text_access() {
        let f = Field::new("a", |p: &Pair| &p.a, |p: &mut Pair| &mut p.a);
        let mut p = Pair::default();
        f.write_text(&mut p, "hello").unwrap();
        assert_eq!(f.read_text(&p).unwrap(), "hello");
        assert_eq!(p.a, "hello");
    }

    #[test]
    fn test_mk006_from_fns() {
        let f: Field<Vec<String>> = Field::from_fns(
            "joined",
            "list",
            |v: &Vec<String>| Ok(v.join(",")),
            |v: &mut Vec<String>, s: &str| {
                *v = s.split(',').map(str::to_string).collect();
                Ok(())
            },
        );
        let mut v = Vec::new();
        f.write_text(&mut v, "x,y").unwrap();
        assert_eq!(v, vec!["x", "y"]);
        assert_eq!(f.type_name(), "list");
    }

    #[test]
    fn test_mk006_encode_decode_defaults() {
        let schema = Pair::schema().unwrap();
        let p = Pair {
            a: "first".to_string(),
            b: "second".to_string(),
        };
        let s = schema.encode(&p, "").unwrap();
        assert_eq!(s, "first#second");
        assert_eq!(schema.decode("", &s).unwrap(), p);
    }

    #[test]
    fn test_mk006_encode_tagged() {
        let schema = Tagged::schema().unwrap();
        let t = Tagged {
            first: "1st".to_string(),
            second: "2nd".to_string(),
            third: "3rd".to_string(),
        };
        assert_eq!(schema.encode(&t, "mkey").unwrap(), "First=1st|Second=2nd|Third=3rd");
        assert_eq!(schema.encode(&t, "alt").unwrap(), "f:1st::s:2nd::t:3rd");
        assert_eq!(schema.decode("alt", "f:1st::s:2nd::t:3rd").unwrap(), t);
    }

    #[test]
    fn test_mk006_unlisted_fields_untouched() {
        let schema = Mixed::schema().unwrap();
        let m = Mixed {
            hidden_a: "value-1".to_string(),
            b: "value-2".to_string(),
            hidden_c: "value-3".to_string(),
            d: "value-4".to_string(),
        };
        let s = schema.encode(&m, "").unwrap();
        assert_eq!(s, "value-2#value-4");

        let mut back = Mixed {
            hidden_a: "keep-a".to_string(),
            hidden_c: "keep-c".to_string(),
            ..Mixed::default()
        };
        schema.decode_into(&mut back, "", &s).unwrap();
        assert_eq!(back.hidden_a, "keep-a");
        assert_eq!(back.hidden_c, "keep-c");
        assert_eq!(back.b, "value-2");
        assert_eq!(back.d, "value-4");
    }

    #[test]
    fn test_mk006_decode_into_with_strict() {
        let schema = Pair::schema().unwrap();
        let mut p = Pair::default();
        let strict = CodecOptions::default().strict();
        assert_eq!(strict.trailing, TrailingInput::Reject);
        // The last field is greedy, so strict mode only matters with a terminated last field.
        schema.decode_into_with(&mut p, &strict, "x#y").unwrap();
        assert_eq!(p.b, "y");
    }

    #[test]
    fn test_mk006_debug_output() {
        let schema = Pair::schema().unwrap();
        let dbg = format!("{:?}", schema);
        assert!(dbg.contains("\"a\""));
        assert!(dbg.contains("string"));
    }
}
