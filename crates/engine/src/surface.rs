//! Capabilities the engine consumes from a live form
//!
//! Handles are resolved fresh for every operation and are never cached, so a
//! save that re-renders the form cannot leave the engine holding stale
//! references.

use async_trait::async_trait;

use crate::error::EngineResult;
use crate::state::{FieldId, TableId};

/// A single control on the form
#[async_trait]
pub trait FieldHandle: Send + Sync {
    /// Current value as rendered by the UI
    async fn read_value(&self) -> EngineResult<String>;

    /// Clear the control and type `value` into it
    async fn write_value(&self, value: &str) -> EngineResult<()>;

    /// Text-entry controls are visible; selection controls render a hidden
    /// input backed by a dropdown list.
    async fn is_visible(&self) -> EngineResult<bool>;

    /// Open the option list and pick the option whose text equals `text`
    async fn select_option(&self, text: &str) -> EngineResult<()>;
}

/// Resolves field identifiers to controls
#[async_trait]
pub trait FormSurface: Send + Sync {
    type Field: FieldHandle;

    async fn resolve_field(&self, id: &FieldId) -> EngineResult<Self::Field>;
}

/// A rendered table row
#[async_trait]
pub trait RowHandle: Send + Sync {
    /// Text of the cell bound to `field`, empty when the row has no such cell
    async fn read_cell(&self, field: &FieldId) -> EngineResult<String>;
}

/// Repeating tables on the form
#[async_trait]
pub trait TableSurface: Send + Sync {
    type Row: RowHandle;

    /// Form scoped to a freshly added row
    type RowForm: FormSurface;

    async fn enumerate_rows(&self, table: &TableId) -> EngineResult<Vec<Self::Row>>;

    /// Delete every row, confirming each deletion. Returns the number removed.
    async fn delete_all_rows(&self, table: &TableId) -> EngineResult<usize>;

    /// Append an empty row and return a form addressing its fields
    async fn add_row(&self, table: &TableId) -> EngineResult<Self::RowForm>;
}
