//! MK-008: Records described at runtime by a layout file.

use super::error::{LayoutError, TextError};
use super::schema::{Field, Schema};
use super::text::KeyText;
use super::types::{LayoutFile, ScalarType};
use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

/// A typed scalar value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    String(String),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    Usize(usize),
    F32(f32),
    F64(f64),
}

impl Scalar {
    /// Parse `text` as a value of type `ty`.
    pub fn parse(ty: ScalarType, text: &str) -> Result<Self, TextError> {
        Ok(match ty {
            ScalarType::String => Self::String(String::from_text(text)?),
            ScalarType::I8 => Self::I8(i8::from_text(text)?),
            ScalarType::I16 => Self::I16(i16::from_text(text)?),
            ScalarType::I32 => Self::I32(i32::from_text(text)?),
            ScalarType::I64 => Self::I64(i64::from_text(text)?),
            ScalarType::I128 => Self::I128(i128::from_text(text)?),
            ScalarType::Isize => Self::Isize(isize::from_text(text)?),
            ScalarType::U8 => Self::U8(u8::from_text(text)?),
            ScalarType::U16 => Self::U16(u16::from_text(text)?),
            ScalarType::U32 => Self::U32(u32::from_text(text)?),
            ScalarType::U64 => Self::U64(u64::from_text(text)?),
            ScalarType::U128 => Self::U128(u128::from_text(text)?),
            ScalarType::Usize => Self::Usize(usize::from_text(text)?),
            ScalarType::F32 => Self::F32(f32::from_text(text)?),
            ScalarType::F64 => Self::F64(f64::from_text(text)?),
        })
    }

    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Self::String(_) => ScalarType::String,
            Self::I8(_) => ScalarType::I8,
            Self::I16(_) => ScalarType::I16,
            Self::I32(_) => ScalarType::I32,
            Self::I64(_) => ScalarType::I64,
            Self::I128(_) => ScalarType::I128,
            Self::Isize(_) => ScalarType::Isize,
            Self::U8(_) => ScalarType::U8,
            Self::U16(_) => ScalarType::U16,
            Self::U32(_) => ScalarType::U32,
            Self::U64(_) => ScalarType::U64,
            Self::U128(_) => ScalarType::U128,
            Self::Usize(_) => ScalarType::Usize,
            Self::F32(_) => ScalarType::F32,
            Self::F64(_) => ScalarType::F64,
        }
    }

    pub fn to_text(&self) -> Result<String, TextError> {
        match self {
            Self::String(v) => v.to_text(),
            Self::I8(v) => v.to_text(),
            Self::I16(v) => v.to_text(),
            Self::I32(v) => v.to_text(),
            Self::I64(v) => v.to_text(),
            Self::I128(v) => v.to_text(),
            Self::Isize(v) => v.to_text(),
            Self::U8(v) => v.to_text(),
            Self::U16(v) => v.to_text(),
            Self::U32(v) => v.to_text(),
            Self::U64(v) => v.to_text(),
            Self::U128(v) => v.to_text(),
            Self::Usize(v) => v.to_text(),
            Self::F32(v) => v.to_text(),
            Self::F64(v) => v.to_text(),
        }
    }
}

/// Field values keyed by name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DynamicRecord {
    values: IndexMap<String, Scalar>,
}

impl DynamicRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.values.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Scalar) -> Option<Scalar> {
        self.values.insert(name.into(), value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Scalar> {
        self.values.iter()
    }

    /// Build a record from `name=value` assignments, typed by `layout`.
    pub fn from_assignments<S: AsRef<str>>(
        layout: &LayoutFile,
        assignments: &[S],
    ) -> Result<Self, AssignmentError> {
        let mut record = Self::new();
        for arg in assignments {
            let arg = arg.as_ref();
            let (name, text) = arg
                .split_once('=')
                .ok_or_else(|| AssignmentError::Malformed(arg.to_string()))?;
            let spec = layout
                .participating()
                .find(|f| f.name == name)
                .ok_or_else(|| AssignmentError::UnknownField(name.to_string()))?;
            let ty = spec.scalar_type()?;
            let value = Scalar::parse(ty, text).map_err(|source| AssignmentError::Value {
                field: name.to_string(),
                source,
            })?;
            record.insert(name, value);
        }

        if let Some(missing) = layout.participating().find(|f| record.get(&f.name).is_none()) {
            return Err(AssignmentError::Missing(missing.name.clone()));
        }
        Ok(record)
    }
}

/// Failure turning command-line assignments into a record.
#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("expected NAME=VALUE, got {0:?}")]
    Malformed(String),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("no value given for field '{0}'")]
    Missing(String),

    #[error("field '{field}': {source}")]
    Value {
        field: String,
        #[source]
        source: TextError,
    },

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Build a schema over [`DynamicRecord`] from the participating fields of `layout`.
pub fn schema_from_layout(layout: &LayoutFile) -> Result<Schema<DynamicRecord>, LayoutError> {
    let mut fields = Vec::new();
    for spec in layout.participating() {
        let ty = spec.scalar_type()?;
        let get_name = spec.name.clone();
        let set_name = spec.name.clone();

        let mut field = Field::from_fns(
            spec.name.clone(),
            ty.as_str(),
            move |record: &DynamicRecord| match record.get(&get_name) {
                Some(value) => value.to_text(),
                None => Err(TextError::custom(format!("no value for '{}'", get_name))),
            },
            move |record: &mut DynamicRecord, text: &str| {
                record.insert(set_name.clone(), Scalar::parse(ty, text)?);
                Ok(())
            },
        );
        for (tag, instruction) in &spec.tags {
            field = field.tag(tag.clone(), instruction.clone());
        }
        fields.push(field);
    }
    Schema::new(fields)
}
