//! MK-005: Field-plan resolution.
//!
//! Turns the ordered field list of a record plus a tag name into one
//! prefix/terminator pair per field. Untagged fields get an empty prefix and
//! `"#"` as terminator, except the last field, which gets no terminator.

use super::error::LayoutError;
use super::parser::parse_instruction;
use super::types::*;
use indexmap::IndexMap;

/// Parsed layout metadata for one field, keyed by tag name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldLayout {
    pub name: String,
    pub instructions: IndexMap<String, LayoutInstruction>,
}

impl FieldLayout {
    /// Parse raw `tag -> instruction` pairs.
    pub fn from_raw(name: &str, raw: &IndexMap<String, String>) -> Result<Self, LayoutError> {
        let mut instructions = IndexMap::with_capacity(raw.len());
        for (tag, instruction) in raw {
            instructions.insert(tag.clone(), parse_instruction(name, tag, instruction)?);
        }
        Ok(Self {
            name: name.to_string(),
            instructions,
        })
    }

    pub fn instruction(&self, tag: &str) -> Option<&LayoutInstruction> {
        self.instructions.get(tag)
    }
}

/// Resolve the plan for `fields` under `tag` (empty tag = [`DEFAULT_TAG`]).
pub fn resolve(fields: &[FieldLayout], tag: &str) -> Plan {
    let tag = effective_tag(tag);
    let count = fields.len();

    let entries = fields
        .iter()
        .enumerate()
        .map(|(i, field)| resolve_entry(field.instruction(tag), i, count))
        .collect();

    let plan = Plan { entries };
    tracing::debug!(tag, fields = count, "resolved field plan");
    plan
}

/// Resolve a single position.
pub fn resolve_entry(instruction: Option<&LayoutInstruction>, index: usize, count: usize) -> PlanEntry {
    let default_terminator = if index + 1 < count {
        DEFAULT_TERMINATOR
    } else {
        ""
    };

    match instruction {
        Some(instr) => PlanEntry {
            prefix: instr.prefix.clone(),
            terminator: instr
                .terminator
                .clone()
                .unwrap_or_else(|| default_terminator.to_string()),
        },
        None => PlanEntry::new("", default_terminator),
    }
}
