//! MK-004: Layout-instruction parsing and layout-file validation.
//!
//! Instruction syntax is `"<prefix>[ <terminator>]"`, split on spaces:
//! - one token overrides the prefix only
//! - two tokens override prefix and terminator (either may be empty)
//! - three or more tokens is a declaration error
//!
//! Layout files are validated structurally:
//! - Version must be "1.0"
//! - Field names must be present and unique
//! - Every instruction must parse
//! - Under any declared tag, a greedy (unterminated) field must not be followed by other fields

use super::error::LayoutError;
use super::resolver;
use super::types::*;
use std::collections::HashSet;
use std::path::Path;

/// Parse one layout instruction attached to `field` under `tag`.
pub fn parse_instruction(
    field: &str,
    tag: &str,
    instruction: &str,
) -> Result<LayoutInstruction, LayoutError> {
    let mut tokens = instruction.splitn(3, ' ');
    let prefix = tokens.next().unwrap_or_default().to_string();
    let terminator = tokens.next().map(str::to_string);

    if tokens.next().is_some() {
        return Err(LayoutError::TooManyTokens {
            field: field.to_string(),
            tag: tag.to_string(),
            instruction: instruction.to_string(),
            tokens: instruction.split(' ').count(),
        });
    }

    Ok(LayoutInstruction { prefix, terminator })
}

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse a layout file from disk.
pub fn parse_layout_file(path: &Path) -> Result<LayoutFile, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    parse_layout(&content)
}

/// Parse a layout file from a string.
pub fn parse_layout(yaml: &str) -> Result<LayoutFile, String> {
    serde_yaml_ng::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))
}

/// Validate a parsed layout. Returns a list of errors (empty = valid).
pub fn validate_layout(layout: &LayoutFile) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if layout.version != LAYOUT_VERSION {
        errors.push(ValidationError {
            message: format!(
                "version must be \"{}\", got \"{}\"",
                LAYOUT_VERSION, layout.version
            ),
        });
    }

    if layout.name.is_empty() {
        errors.push(ValidationError {
            message: "name must not be empty".to_string(),
        });
    }

    if layout.participating().next().is_none() {
        errors.push(ValidationError {
            message: "layout has no participating fields".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for (i, field) in layout.fields.iter().enumerate() {
        if field.name.is_empty() {
            errors.push(ValidationError {
                message: LayoutError::EmptyFieldName { position: i }.to_string(),
            });
            continue;
        }
        if !seen.insert(field.name.as_str()) {
            errors.push(ValidationError {
                message: LayoutError::DuplicateField {
                    field: field.name.clone(),
                }
                .to_string(),
            });
        }
        if let Err(e) = field.scalar_type() {
            errors.push(ValidationError {
                message: e.to_string(),
            });
        }
        for (tag, instruction) in &field.tags {
            if let Err(e) = parse_instruction(&field.name, tag, instruction) {
                errors.push(ValidationError {
                    message: e.to_string(),
                });
            }
        }
    }

    if errors.is_empty() {
        errors.extend(unreachable_fields(layout));
    }

    errors
}

/// Report fields that can never be decoded because an earlier field has no terminator.
///
/// Checked under the default tag and every tag any participating field declares.
fn unreachable_fields(layout: &LayoutFile) -> Vec<ValidationError> {
    let fields: Vec<&FieldSpec> = layout.participating().collect();

    let mut layouts = Vec::with_capacity(fields.len());
    for f in &fields {
        match resolver::FieldLayout::from_raw(&f.name, &f.tags) {
            Ok(l) => layouts.push(l),
            Err(_) => return Vec::new(),
        }
    }

    let mut tags = vec![effective_tag(&layout.options.tag)];
    for f in &fields {
        for tag in f.tags.keys() {
            if !tags.contains(&tag.as_str()) {
                tags.push(tag.as_str());
            }
        }
    }

    let mut errors = Vec::new();
    for tag in tags {
        let plan = resolver::resolve(&layouts, tag);
        if let Some(i) = plan.first_unreachable_boundary() {
            errors.push(ValidationError {
                message: format!(
                    "field '{}' has no terminator under tag '{}' but is followed by {} field(s)",
                    fields[i].name,
                    tag,
                    fields.len() - i - 1
                ),
            });
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mk004_prefix_and_terminator() {
        let i = parse_instruction("First", "mkey", "First= |").unwrap();
        assert_eq!(i.prefix, "First=");
        assert_eq!(i.terminator.as_deref(), Some("|"));
    }

    #[test]
    fn test_mk004_prefix_only() {
        let i = parse_instruction("Third", "mkey", "Third=").unwrap();
        assert_eq!(i.prefix, "Third=");
        assert_eq!(i.terminator, None);
    }

    #[test]
    fn test_mk004_empty_prefix_explicit_terminator() {
        let i = parse_instruction("Three", "mkey", " #").unwrap();
        assert_eq!(i.prefix, "");
        assert_eq!(i.terminator.as_deref(), Some("#"));
    }

    #[test]
    fn test_mk004_explicit_empty_terminator() {
        let i = parse_instruction("A", "mkey", "A= ").unwrap();
        assert_eq!(i.prefix, "A=");
        assert_eq!(i.terminator.as_deref(), Some(""));
    }

    #[test]
    fn test_mk004_empty_instruction() {
        let i = parse_instruction("A", "mkey", "").unwrap();
        assert_eq!(i, LayoutInstruction::default());
    }

    #[test]
    fn test_mk004_too_many_tokens() {
        let err = parse_instruction("A", "gsi", "a-term: :: extra").unwrap_err();
        assert_eq!(
            err,
            LayoutError::TooManyTokens {
                field: "A".to_string(),
                tag: "gsi".to_string(),
                instruction: "a-term: :: extra".to_string(),
                tokens: 3,
            }
        );
        assert!(parse_instruction("A", "mkey", "a  ").is_err());
    }

    #[test]
    fn test_mk004_parse_valid_layout() {
        let yaml = r#"
version: "1.0"
name: order-key
fields:
  - name: tenant
    type: string
    tags:
      mkey: "T= |"
  - name: id
    type: u64
"#;
        let layout = parse_layout(yaml).unwrap();
        let errors = validate_layout(&layout);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors.iter().map(|e| &e.message).collect::<Vec<_>>());
    }

    #[test]
    fn test_mk004_bad_version() {
        let yaml = r#"
version: "2.0"
name: k
fields:
  - name: a
    type: string
"#;
        let layout = parse_layout(yaml).unwrap();
        let errors = validate_layout(&layout);
        assert!(errors.iter().any(|e| e.message.contains("version")));
    }

    #[test]
    fn test_mk004_no_fields() {
        let yaml = r#"
version: "1.0"
name: k
fields:
  - name: a
    type: string
    skip: true
"#;
        let layout = parse_layout(yaml).unwrap();
        let errors = validate_layout(&layout);
        assert!(errors.iter().any(|e| e.message.contains("no participating fields")));
    }

    #[test]
    fn test_mk004_duplicate_field() {
        let yaml = r#"
version: "1.0"
name: k
fields:
  - name: a
    type: string
  - name: a
    type: i32
"#;
        let layout = parse_layout(yaml).unwrap();
        let errors = validate_layout(&layout);
        assert!(errors.iter().any(|e| e.message.contains("more than once")));
    }

    #[test]
    fn test_mk004_bad_instruction_and_type() {
        let yaml = r#"
version: "1.0"
name: k
fields:
  - name: a
    type: bool
    tags:
      mkey: "x y z"
"#;
        let layout = parse_layout(yaml).unwrap();
        let errors = validate_layout(&layout);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.message.contains("no text conversion")));
        assert!(errors.iter().any(|e| e.message.contains("bad layout instruction")));
    }

    #[test]
    fn test_mk004_unreachable_field() {
        let yaml = r#"
version: "1.0"
name: k
fields:
  - name: a
    type: string
    tags:
      mkey: "A= "
  - name: b
    type: string
"#;
        let layout = parse_layout(yaml).unwrap();
        let errors = validate_layout(&layout);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("'a' has no terminator"));
    }

    #[test]
    fn test_mk004_unreachable_field_under_secondary_tag() {
        let yaml = r#"
version: "1.0"
name: k
fields:
  - name: a
    type: string
    tags:
      mkey: "A= |"
  - name: b
    type: string
    tags:
      gsi1: "B= "
  - name: c
    type: string
"#;
        let layout = parse_layout(yaml).unwrap();
        let errors = validate_layout(&layout);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("'b' has no terminator under tag 'gsi1'"));
    }

    #[test]
    fn test_mk004_unreachable_reported_per_tag() {
        let yaml = r#"
version: "1.0"
name: k
fields:
  - name: a
    type: string
    tags:
      mkey: "A= "
      gsi1: "a: "
  - name: b
    type: string
"#;
        let layout = parse_layout(yaml).unwrap();
        let errors = validate_layout(&layout);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.message.contains("tag 'mkey'")));
        assert!(errors.iter().any(|e| e.message.contains("tag 'gsi1'")));
    }

    #[test]
    fn test_mk004_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mkey.yaml");
        std::fs::write(&path, r#"
version: "1.0"
name: file-test
fields:
  - name: a
    type: string
"#).unwrap();
        let layout = parse_layout_file(&path).unwrap();
        assert_eq!(layout.name, "file-test");
    }

    #[test]
    fn test_mk004_parse_invalid_yaml() {
        let result = parse_layout("not: [valid: yaml: {{");
        assert!(result.is_err());
    }

    #[test]
    fn test_mk004_parse_missing_file() {
        let result = parse_layout_file(Path::new("/nonexistent/mkey.yaml"));
        assert!(result.unwrap_err().contains("failed to read"));
    }
}
