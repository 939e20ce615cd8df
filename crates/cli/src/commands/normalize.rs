//! Normalize Command
//!
//! Shows which form control every input field will address, without
//! starting a browser.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};

use auxsync_drivers::Entity;

use super::record::load_input;
use super::EntityArg;
use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Record type
    #[arg(value_enum)]
    pub entity: EntityArg,

    /// YAML file describing the record
    #[arg(short, long)]
    pub input: PathBuf,
}

/// One input path and the control it addresses
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FieldDisplay {
    pub path: String,
    pub kind: &'static str,
    /// Field identifier, or panel id for tables
    pub target: String,
}

impl TableDisplay for FieldDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Path", "Kind", "Target"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.path.clone(), self.kind.to_string(), self.target.clone()]
    }
}

pub fn describe(entity: Entity, input: &Path) -> Result<Vec<FieldDisplay>> {
    let state = load_input(entity, input)?;
    let prepared = entity.spec().prepare(&state)?;

    let mut out: Vec<FieldDisplay> = prepared
        .normalized
        .fields()
        .iter()
        .map(|f| FieldDisplay {
            path: f.path.clone(),
            kind: "field",
            target: f.id.to_string(),
        })
        .collect();

    for (table, (_, panel)) in prepared.normalized.tables().iter().zip(&prepared.tables) {
        out.push(FieldDisplay {
            path: table.path.clone(),
            kind: "table",
            target: panel.to_string(),
        });
    }
    Ok(out)
}

pub fn execute(args: NormalizeArgs, format: OutputFormat) -> Result<()> {
    let fields = describe(args.entity.into(), &args.input)?;
    print_list(&fields, format);
    Ok(())
}
