//! Record Commands

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::warn;

use auxsync_drivers::{AuxConfig, Entity, Outcome, QadScreen, RecordDriver};
use auxsync_engine::DesiredState;

use super::EntityArg;
use crate::output::print_warning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecordState {
    /// Create or update the record
    Present,
    /// Delete the record
    Absent,
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Record type
    #[arg(value_enum)]
    pub entity: EntityArg,

    /// Desired state
    #[arg(value_enum)]
    pub state: RecordState,

    /// YAML file describing the record
    #[arg(short, long)]
    pub input: PathBuf,
}

/// Read the input and warn about fields outside the entity's catalogue
pub fn load_input(entity: Entity, input: &Path) -> Result<DesiredState> {
    let state = DesiredState::from_file(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let spec = entity.spec();
    let prepared = spec.prepare(&state)?;
    for path in spec.unknown_fields(&prepared.normalized) {
        print_warning(&format!("{} has no known field `{}`", spec.name, path));
    }
    Ok(state)
}

pub async fn execute(args: RecordArgs, config: &AuxConfig, check: bool) -> Result<Outcome> {
    let entity = Entity::from(args.entity);
    let spec = entity.spec();
    let state = load_input(entity, &args.input)?;

    if check {
        return Ok(Outcome::unchanged(format!("Check mode: {} input is valid", spec.name)));
    }

    let screen = QadScreen::connect(config, spec).await?;
    let driver = RecordDriver::new(spec, screen);
    let result = match args.state {
        RecordState::Present => driver.ensure_present(&state).await,
        RecordState::Absent => driver.ensure_absent(&state).await,
    };
    if let Err(e) = driver.screen().close().await {
        warn!("Failed to close browser: {}", e);
    }
    Ok(result?)
}
