//! MK-012: CLI subcommands over a layout file.

use crate::core::dynamic::{self, DynamicRecord};
use crate::core::types::{self, CodecOptions, TrailingInput};
use crate::core::{parser, schema::Schema};
use crate::envelope::AttributeValue;
use clap::Subcommand;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter layout file
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Validate a layout file
    Validate {
        /// Path to mkey.yaml
        #[arg(short, long, default_value = "mkey.yaml")]
        file: PathBuf,
    },

    /// Show the resolved prefix/terminator plan
    Plan {
        /// Path to mkey.yaml
        #[arg(short, long, default_value = "mkey.yaml")]
        file: PathBuf,

        /// Instruction tag (default: from layout file)
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Encode NAME=VALUE assignments into a key string
    Encode {
        /// Path to mkey.yaml
        #[arg(short, long, default_value = "mkey.yaml")]
        file: PathBuf,

        /// Instruction tag (default: from layout file)
        #[arg(short, long)]
        tag: Option<String>,

        /// Print the store attribute value JSON instead of the raw string
        #[arg(long)]
        envelope: bool,

        /// Field values, e.g. tenant=acme
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Decode a key string into a JSON object
    Decode {
        /// Path to mkey.yaml
        #[arg(short, long, default_value = "mkey.yaml")]
        file: PathBuf,

        /// Instruction tag (default: from layout file)
        #[arg(short, long)]
        tag: Option<String>,

        /// Input is store attribute value JSON rather than a raw string
        #[arg(long)]
        envelope: bool,

        /// Reject input left over after the last field
        #[arg(long)]
        strict: bool,

        /// Encoded key (may start with '-')
        #[arg(allow_hyphen_values = true)]
        input: String,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Plan { file, tag } => cmd_plan(&file, tag.as_deref()),
        Commands::Encode {
            file,
            tag,
            envelope,
            values,
        } => cmd_encode(&file, tag.as_deref(), envelope, &values),
        Commands::Decode {
            file,
            tag,
            envelope,
            strict,
            input,
        } => cmd_decode(&file, tag.as_deref(), envelope, strict, &input),
    }
}

const LAYOUT_TEMPLATE: &str = r#"version: "1.0"
name: my-key
description: "Composite key managed by mkey"

options:
  tag: mkey
  trailing: ignore

fields:
  - name: tenant
    type: string
    tags:
      mkey: "TENANT# |"
  - name: id
    type: u64
    tags:
      mkey: "ID#"
"#;

fn cmd_init(path: &Path) -> Result<(), String> {
    let layout_path = path.join("mkey.yaml");
    if layout_path.exists() {
        return Err(format!("{} already exists", layout_path.display()));
    }
    std::fs::create_dir_all(path)
        .map_err(|e| format!("cannot create {}: {}", path.display(), e))?;
    std::fs::write(&layout_path, LAYOUT_TEMPLATE)
        .map_err(|e| format!("cannot write {}: {}", layout_path.display(), e))?;

    println!("Initialized mkey layout at {}", path.display());
    println!("  Created: {}", layout_path.display());
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<(), String> {
    let layout = parser::parse_layout_file(file)?;
    let errors = parser::validate_layout(&layout);

    if errors.is_empty() {
        println!(
            "OK: {} ({} fields, {} participating)",
            layout.name,
            layout.fields.len(),
            layout.participating().count()
        );
        Ok(())
    } else {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        Err(format!("{} validation error(s)", errors.len()))
    }
}

/// Parse and validate a layout file, then build its schema.
fn load_schema(file: &Path) -> Result<(types::LayoutFile, Schema<DynamicRecord>), String> {
    let layout = parser::parse_layout_file(file)?;
    let errors = parser::validate_layout(&layout);
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        return Err("validation failed".to_string());
    }
    let schema = dynamic::schema_from_layout(&layout).map_err(|e| e.to_string())?;
    Ok((layout, schema))
}

fn effective_options(layout: &types::LayoutFile, tag: Option<&str>, strict: bool) -> CodecOptions {
    let mut options = layout.options.clone();
    if let Some(tag) = tag {
        options.tag = tag.to_string();
    }
    if strict {
        options.trailing = TrailingInput::Reject;
    }
    options
}

fn cmd_plan(file: &Path, tag: Option<&str>) -> Result<(), String> {
    let (layout, schema) = load_schema(file)?;
    let options = effective_options(&layout, tag, false);
    let plan = schema.plan(&options.tag);

    println!(
        "Plan: {} (tag '{}', {} fields)",
        layout.name,
        types::effective_tag(&options.tag),
        plan.len()
    );
    println!();
    for (field, entry) in schema.fields().iter().zip(plan.iter()) {
        let prefix = format!("{:?}", entry.prefix);
        println!(
            "  {:<16} {:<8} prefix={:<12} terminator={:?}",
            field.name(),
            field.type_name(),
            prefix,
            entry.terminator
        );
    }
    Ok(())
}

fn cmd_encode(file: &Path, tag: Option<&str>, envelope: bool, values: &[String]) -> Result<(), String> {
    let (layout, schema) = load_schema(file)?;
    let options = effective_options(&layout, tag, false);
    let record = DynamicRecord::from_assignments(&layout, values).map_err(|e| e.to_string())?;
    let encoded = schema
        .encode(&record, &options.tag)
        .map_err(|e| e.to_string())?;

    if envelope {
        let json = AttributeValue::S(encoded).to_json().map_err(|e| e.to_string())?;
        println!("{}", json);
    } else {
        println!("{}", encoded);
    }
    Ok(())
}

fn cmd_decode(
    file: &Path,
    tag: Option<&str>,
    envelope: bool,
    strict: bool,
    input: &str,
) -> Result<(), String> {
    let (layout, schema) = load_schema(file)?;
    let options = effective_options(&layout, tag, strict);

    let av;
    let raw = if envelope {
        av = AttributeValue::from_json(input).map_err(|e| e.to_string())?;
        av.as_string().map_err(|e| e.to_string())?
    } else {
        input
    };

    let mut record = DynamicRecord::new();
    schema
        .decode_into_with(&mut record, &options, raw)
        .map_err(|e| e.to_string())?;

    let json = serde_json::to_string_pretty(&record).map_err(|e| format!("JSON error: {}", e))?;
    println!("{}", json);
    Ok(())
}
