//! Record driver flow
//!
//! The same present/absent flow serves every entity: find the record in its
//! browse view, reconcile the form, save, then find and reopen the record to
//! verify what the server actually kept.

use tracing::{debug, info};

use auxsync_engine::{apply_fields, reconcile_table, verify_fields, verify_table, DesiredState, EngineError};

use crate::entity::{EntitySpec, PreparedRecord};
use crate::error::{DriverError, DriverResult};
use crate::outcome::Outcome;
use crate::screen::RecordScreen;

/// Drives one entity's screens toward a desired record
pub struct RecordDriver<S> {
    spec: &'static EntitySpec,
    screen: S,
}

impl<S: RecordScreen> RecordDriver<S> {
    pub fn new(spec: &'static EntitySpec, screen: S) -> Self {
        Self { spec, screen }
    }

    pub fn spec(&self) -> &'static EntitySpec {
        self.spec
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    pub fn into_screen(self) -> S {
        self.screen
    }

    /// Create or update the record so it holds `state`
    pub async fn ensure_present(&self, state: &DesiredState) -> DriverResult<Outcome> {
        let record = self.spec.prepare(state)?;
        let name = self.spec.name;

        self.screen.open_browse().await?;
        if self.screen.search(&record.query).await? {
            debug!("{} {} exists, opening", name, record.query);
            self.screen.open_result().await?;
        } else {
            self.screen.new_record().await?;
        }
        self.screen.wait_for_form().await?;

        let mut changed = apply_fields(&record.normalized, &self.screen).await?;
        for (key, panel) in &record.tables {
            let rows = record.normalized.table(key).unwrap_or(&[]);
            changed |= reconcile_table(&self.screen, panel, rows).await?;
        }

        if !changed {
            return Ok(Outcome::unchanged(format!("{} is up to date", name)));
        }

        self.screen.save().await?;
        self.screen.back_to_browse().await?;
        if !self.screen.search(&record.query).await? {
            return Err(DriverError::MissingAfterSave(name.to_string()));
        }
        self.screen.open_result().await?;
        self.screen.wait_for_form().await?;
        self.verify(&record).await?;

        info!("{} {} updated", name, record.query);
        Ok(Outcome::changed(format!("{} has been updated", name)))
    }

    async fn verify(&self, record: &PreparedRecord) -> DriverResult<()> {
        let mismatches = verify_fields(&record.normalized, &self.screen).await?;
        if !mismatches.is_empty() {
            return Err(EngineError::VerificationMismatch(mismatches).into());
        }
        for (key, panel) in &record.tables {
            let rows = record.normalized.table(key).unwrap_or(&[]);
            verify_table(&self.screen, panel, rows).await?;
        }
        Ok(())
    }

    /// Delete the record identified by `state` if it exists
    pub async fn ensure_absent(&self, state: &DesiredState) -> DriverResult<Outcome> {
        let record = self.spec.prepare(state)?;
        let name = self.spec.name;

        self.screen.open_browse().await?;
        if !self.screen.search(&record.query).await? {
            return Ok(Outcome::unchanged(format!("{} does not exist", name)));
        }
        self.screen.open_result().await?;
        self.screen.wait_for_form().await?;
        self.screen.delete().await?;

        self.screen.back_to_browse().await?;
        if self.screen.search(&record.query).await? {
            return Err(DriverError::StillPresentAfterDelete(name.to_string()));
        }

        info!("{} {} deleted", name, record.query);
        Ok(Outcome::changed(format!("{} has been deleted", name)))
    }
}
