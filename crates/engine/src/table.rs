//! Repeating table reconciliation
//!
//! Rendered rows carry no stable identifier, so a desired row matches a live
//! row when every one of its cells equals the live cell text. When the row
//! counts differ no matching is attempted and the whole table is treated as
//! mismatched. Any mismatch rewrites the table from scratch: delete every
//! live row, then add the desired rows in order.

use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::fields::apply_row;
use crate::state::{FieldId, Row, TableId};
use crate::surface::{RowHandle, TableSurface};

/// Outcome of comparing desired rows against a live table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableDiff {
    pub desired_rows: usize,
    pub live_rows: usize,
    /// Desired rows with no content-matching live row
    pub unmatched: Vec<Row>,
}

impl TableDiff {
    pub fn count_differs(&self) -> bool {
        self.desired_rows != self.live_rows
    }

    pub fn needs_rewrite(&self) -> bool {
        self.count_differs() || !self.unmatched.is_empty()
    }
}

/// Query-only comparison; never mutates the table
pub async fn diff_table<S>(surface: &S, table: &TableId, desired: &[Row]) -> EngineResult<TableDiff>
where
    S: TableSurface + ?Sized,
{
    let live = surface.enumerate_rows(table).await?;

    if live.len() != desired.len() {
        debug!(
            table = %table,
            live = live.len(),
            desired = desired.len(),
            "row count differs, skipping row matching"
        );
        return Ok(TableDiff {
            desired_rows: desired.len(),
            live_rows: live.len(),
            unmatched: desired.to_vec(),
        });
    }

    let mut unmatched = Vec::new();
    for row in desired {
        if !any_row_matches(&live, row).await? {
            unmatched.push(row.clone());
        }
    }
    Ok(TableDiff {
        desired_rows: desired.len(),
        live_rows: live.len(),
        unmatched,
    })
}

async fn any_row_matches<R: RowHandle>(live: &[R], desired: &Row) -> EngineResult<bool> {
    for candidate in live {
        if row_matches(candidate, desired).await? {
            return Ok(true);
        }
    }
    Ok(false)
}

async fn row_matches<R: RowHandle>(live: &R, desired: &Row) -> EngineResult<bool> {
    for (name, value) in desired.iter() {
        if live.read_cell(&FieldId::new(name)).await? != value.to_ui_string() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Make the live table hold exactly `desired`, rewriting it only when it
/// does not already match. Returns whether the table was rewritten.
pub async fn reconcile_table<S>(surface: &S, table: &TableId, desired: &[Row]) -> EngineResult<bool>
where
    S: TableSurface + ?Sized,
{
    let diff = diff_table(surface, table, desired).await?;
    if !diff.needs_rewrite() {
        debug!(table = %table, "table already up to date");
        return Ok(false);
    }

    let removed = surface.delete_all_rows(table).await?;
    info!(table = %table, removed, added = desired.len(), "rewriting table");

    for row in desired {
        let form = surface.add_row(table).await?;
        apply_row(row, &form).await?;
    }
    Ok(true)
}

/// Post-commit check: any remaining difference is a verification failure
pub async fn verify_table<S>(surface: &S, table: &TableId, desired: &[Row]) -> EngineResult<()>
where
    S: TableSurface + ?Sized,
{
    let diff = diff_table(surface, table, desired).await?;
    if diff.needs_rewrite() {
        return Err(EngineError::TableMismatch {
            table: table.clone(),
            live: diff.live_rows,
            desired: diff.desired_rows,
            unmatched: diff.unmatched,
        });
    }
    Ok(())
}
