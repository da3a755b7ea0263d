//! MK-001: Core types. Layout instructions, resolved plans, codec options,
//! and the YAML layout-file schema.
//!
//! A plan is the only join key between encode and decode: entries are matched
//! to fields by position, never by name.

use super::error::LayoutError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tag consulted when the caller passes an empty tag name.
pub const DEFAULT_TAG: &str = "mkey";

/// Terminator placed after every field except the last when no instruction overrides it.
pub const DEFAULT_TERMINATOR: &str = "#";

/// Layout-file schema version accepted by the parser.
pub const LAYOUT_VERSION: &str = "1.0";

/// Map an empty tag name to [`DEFAULT_TAG`].
pub fn effective_tag(tag: &str) -> &str {
    if tag.is_empty() {
        DEFAULT_TAG
    } else {
        tag
    }
}

// ============================================================================
// Layout instructions and plans
// ============================================================================

/// A parsed `"<prefix>[ <terminator>]"` instruction.
///
/// `terminator` is `None` when the instruction carried a single token, in
/// which case the positional default applies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayoutInstruction {
    pub prefix: String,
    pub terminator: Option<String>,
}

/// Resolved prefix/terminator pair for one field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlanEntry {
    pub prefix: String,
    pub terminator: String,
}

impl PlanEntry {
    pub fn new(prefix: impl Into<String>, terminator: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            terminator: terminator.into(),
        }
    }

    /// Whether this field swallows the rest of the input on decode.
    pub fn is_greedy(&self) -> bool {
        self.terminator.is_empty()
    }
}

/// Ordered plan for one encode or decode call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Plan {
    pub entries: Vec<PlanEntry>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlanEntry> {
        self.entries.iter()
    }

    /// Index of the first greedy entry that is followed by further entries.
    pub fn first_unreachable_boundary(&self) -> Option<usize> {
        let last = self.entries.len().checked_sub(1)?;
        self.entries[..last].iter().position(PlanEntry::is_greedy)
    }
}

impl fmt::Display for PlanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prefix={:?} terminator={:?}", self.prefix, self.terminator)
    }
}

// ============================================================================
// Codec options
// ============================================================================

/// What decode does with text left over after the last field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingInput {
    /// Leftover text is silently ignored.
    #[default]
    Ignore,
    /// Leftover text is a decode error.
    Reject,
}

/// Per-call codec configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecOptions {
    /// Instruction source consulted for every field
    #[serde(default = "default_tag")]
    pub tag: String,

    /// Trailing-input policy for decode
    #[serde(default)]
    pub trailing: TrailingInput,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            tag: default_tag(),
            trailing: TrailingInput::default(),
        }
    }
}

impl CodecOptions {
    pub fn with_tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn strict(mut self) -> Self {
        self.trailing = TrailingInput::Reject;
        self
    }
}

fn default_tag() -> String {
    DEFAULT_TAG.to_string()
}

// ============================================================================
// Layout file (mkey.yaml)
// ============================================================================

/// Root of a layout file, describing a record type at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutFile {
    /// Schema version (must be "1.0")
    pub version: String,

    /// Human-readable key name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Codec defaults
    #[serde(default)]
    pub options: CodecOptions,

    /// Sub-fields in key order
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl LayoutFile {
    /// Fields that take part in encoding, in declared order.
    pub fn participating(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| !f.skip)
    }
}

/// One sub-field declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name
    pub name: String,

    /// Declared scalar type (see [`ScalarType`])
    #[serde(rename = "type")]
    pub field_type: String,

    /// Layout instructions keyed by tag name
    #[serde(default)]
    pub tags: IndexMap<String, String>,

    /// Excluded from the key (never encoded, never decoded)
    #[serde(default)]
    pub skip: bool,
}

impl FieldSpec {
    /// Resolve the declared type name.
    pub fn scalar_type(&self) -> Result<ScalarType, LayoutError> {
        self.field_type
            .parse()
            .map_err(|_| LayoutError::UnsupportedType {
                field: self.name.clone(),
                type_name: self.field_type.clone(),
            })
    }
}

/// Scalar types a layout-file field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    String,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
}

impl ScalarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::I128 => "i128",
            Self::Isize => "isize",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::U128 => "u128",
            Self::Usize => "usize",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

impl FromStr for ScalarType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "string" => Self::String,
            "i8" => Self::I8,
            "i16" => Self::I16,
            "i32" => Self::I32,
            "i64" | "int" => Self::I64,
            "i128" => Self::I128,
            "isize" => Self::Isize,
            "u8" => Self::U8,
            "u16" => Self::U16,
            "u32" => Self::U32,
            "u64" | "uint" => Self::U64,
            "u128" => Self::U128,
            "usize" => Self::Usize,
            "f32" => Self::F32,
            "f64" | "float" => Self::F64,
            other => return Err(format!("unknown scalar type: {}", other)),
        })
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
