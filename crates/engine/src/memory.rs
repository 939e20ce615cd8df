//! In-memory form surface
//!
//! Stores every written value faithfully. Used for offline dry runs and as
//! the reference surface in tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{EngineError, EngineResult};
use crate::state::{FieldId, Row, Scalar, TableId};
use crate::surface::{FieldHandle, FormSurface, RowHandle, TableSurface};

type Cells = Vec<(String, String)>;

#[derive(Debug, Clone)]
struct MemoryField {
    value: String,
    /// `Some` for selection controls
    options: Option<Vec<String>>,
}

#[derive(Debug, Default)]
struct Inner {
    fields: BTreeMap<FieldId, MemoryField>,
    tables: BTreeMap<TableId, Vec<Cells>>,
    accept_unknown: bool,
    writes: usize,
    row_deletions: usize,
}

/// A form held entirely in memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryForm {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve unknown identifiers to fresh, empty text fields
    pub fn accept_unknown_fields(self) -> Self {
        self.inner.lock().accept_unknown = true;
        self
    }

    pub fn with_text_field(self, id: &str, value: &str) -> Self {
        self.inner.lock().fields.insert(
            FieldId::new(id),
            MemoryField {
                value: value.to_string(),
                options: None,
            },
        );
        self
    }

    pub fn with_select_field<I, S>(self, id: &str, value: &str, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.lock().fields.insert(
            FieldId::new(id),
            MemoryField {
                value: value.to_string(),
                options: Some(options.into_iter().map(Into::into).collect()),
            },
        );
        self
    }

    pub fn with_table(self, id: &str, rows: &[Row]) -> Self {
        self.set_table(id, rows);
        self
    }

    /// Replace a table's rows without counting them as engine writes
    pub fn set_table(&self, id: &str, rows: &[Row]) {
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|(k, v)| (k.to_string(), v.to_ui_string()))
                    .collect()
            })
            .collect();
        self.inner.lock().tables.insert(TableId::new(id), rows);
    }

    /// Overwrite a value without counting it as an engine write
    pub fn set_value(&self, id: &str, value: &str) {
        if let Some(field) = self.inner.lock().fields.get_mut(&FieldId::new(id)) {
            field.value = value.to_string();
        }
    }

    pub fn value(&self, id: &str) -> Option<String> {
        self.inner
            .lock()
            .fields
            .get(&FieldId::new(id))
            .map(|f| f.value.clone())
    }

    pub fn table_rows(&self, id: &str) -> Vec<Row> {
        let inner = self.inner.lock();
        let Some(rows) = inner.tables.get(&TableId::new(id)) else {
            return Vec::new();
        };
        rows.iter()
            .map(|cells| {
                let mut row = Row::new();
                for (name, value) in cells {
                    row.set(name.as_str(), Scalar::Text(value.clone()));
                }
                row
            })
            .collect()
    }

    /// Values written to fields or cells, including option selections
    pub fn writes(&self) -> usize {
        self.inner.lock().writes
    }

    pub fn row_deletions(&self) -> usize {
        self.inner.lock().row_deletions
    }
}

#[derive(Debug, Clone)]
enum Target {
    Field(FieldId),
    Cell {
        table: TableId,
        row: usize,
        field: FieldId,
    },
}

/// Handle to a field or a cell of a [`MemoryForm`]
#[derive(Debug, Clone)]
pub struct MemoryFieldHandle {
    inner: Arc<Mutex<Inner>>,
    target: Target,
}

impl MemoryFieldHandle {
    fn cells_mut<'a>(inner: &'a mut Inner, table: &TableId, row: usize) -> EngineResult<&'a mut Cells> {
        inner
            .tables
            .get_mut(table)
            .and_then(|rows| rows.get_mut(row))
            .ok_or_else(|| EngineError::Surface(format!("row {} of `{}` no longer exists", row, table)))
    }
}

#[async_trait]
impl FieldHandle for MemoryFieldHandle {
    async fn read_value(&self) -> EngineResult<String> {
        let mut inner = self.inner.lock();
        match &self.target {
            Target::Field(id) => inner
                .fields
                .get(id)
                .map(|f| f.value.clone())
                .ok_or_else(|| EngineError::FieldResolution(id.clone())),
            Target::Cell { table, row, field } => {
                let cells = Self::cells_mut(&mut inner, table, *row)?;
                Ok(cells
                    .iter()
                    .find(|(k, _)| k == field.as_str())
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default())
            }
        }
    }

    async fn write_value(&self, value: &str) -> EngineResult<()> {
        let mut inner = self.inner.lock();
        match &self.target {
            Target::Field(id) => {
                let field = inner
                    .fields
                    .get_mut(id)
                    .ok_or_else(|| EngineError::FieldResolution(id.clone()))?;
                field.value = value.to_string();
            }
            Target::Cell { table, row, field } => {
                let cells = Self::cells_mut(&mut inner, table, *row)?;
                match cells.iter_mut().find(|(k, _)| k == field.as_str()) {
                    Some(cell) => cell.1 = value.to_string(),
                    None => cells.push((field.to_string(), value.to_string())),
                }
            }
        }
        inner.writes += 1;
        Ok(())
    }

    async fn is_visible(&self) -> EngineResult<bool> {
        let inner = self.inner.lock();
        match &self.target {
            Target::Field(id) => Ok(inner
                .fields
                .get(id)
                .map(|f| f.options.is_none())
                .unwrap_or(false)),
            Target::Cell { .. } => Ok(true),
        }
    }

    async fn select_option(&self, text: &str) -> EngineResult<()> {
        let mut inner = self.inner.lock();
        let Target::Field(id) = &self.target else {
            return Err(EngineError::Surface("table cells have no option list".into()));
        };
        let field = inner
            .fields
            .get_mut(id)
            .ok_or_else(|| EngineError::FieldResolution(id.clone()))?;
        let found = field
            .options
            .as_ref()
            .is_some_and(|options| options.iter().any(|o| o == text));
        if !found {
            return Err(EngineError::OptionNotFound {
                field: id.clone(),
                option: text.to_string(),
            });
        }
        field.value = text.to_string();
        inner.writes += 1;
        Ok(())
    }
}

#[async_trait]
impl FormSurface for MemoryForm {
    type Field = MemoryFieldHandle;

    async fn resolve_field(&self, id: &FieldId) -> EngineResult<MemoryFieldHandle> {
        let mut inner = self.inner.lock();
        if !inner.fields.contains_key(id) {
            if !inner.accept_unknown {
                return Err(EngineError::FieldResolution(id.clone()));
            }
            inner.fields.insert(
                id.clone(),
                MemoryField {
                    value: String::new(),
                    options: None,
                },
            );
        }
        Ok(MemoryFieldHandle {
            inner: Arc::clone(&self.inner),
            target: Target::Field(id.clone()),
        })
    }
}

/// Snapshot of a rendered row
#[derive(Debug, Clone)]
pub struct MemoryRow {
    cells: Cells,
}

#[async_trait]
impl RowHandle for MemoryRow {
    async fn read_cell(&self, field: &FieldId) -> EngineResult<String> {
        Ok(self
            .cells
            .iter()
            .find(|(k, _)| k == field.as_str())
            .map(|(_, v)| v.clone())
            .unwrap_or_default())
    }
}

/// Form scoped to one row of a [`MemoryForm`] table
#[derive(Debug, Clone)]
pub struct MemoryRowForm {
    inner: Arc<Mutex<Inner>>,
    table: TableId,
    row: usize,
}

#[async_trait]
impl FormSurface for MemoryRowForm {
    type Field = MemoryFieldHandle;

    async fn resolve_field(&self, id: &FieldId) -> EngineResult<MemoryFieldHandle> {
        Ok(MemoryFieldHandle {
            inner: Arc::clone(&self.inner),
            target: Target::Cell {
                table: self.table.clone(),
                row: self.row,
                field: id.clone(),
            },
        })
    }
}

#[async_trait]
impl TableSurface for MemoryForm {
    type Row = MemoryRow;
    type RowForm = MemoryRowForm;

    async fn enumerate_rows(&self, table: &TableId) -> EngineResult<Vec<MemoryRow>> {
        let inner = self.inner.lock();
        let rows = inner
            .tables
            .get(table)
            .ok_or_else(|| EngineError::TableNotFound(table.clone()))?;
        Ok(rows
            .iter()
            .map(|cells| MemoryRow {
                cells: cells.clone(),
            })
            .collect())
    }

    async fn delete_all_rows(&self, table: &TableId) -> EngineResult<usize> {
        let mut inner = self.inner.lock();
        let rows = inner
            .tables
            .get_mut(table)
            .ok_or_else(|| EngineError::TableNotFound(table.clone()))?;
        let removed = rows.len();
        rows.clear();
        inner.row_deletions += removed;
        Ok(removed)
    }

    async fn add_row(&self, table: &TableId) -> EngineResult<MemoryRowForm> {
        let mut inner = self.inner.lock();
        let rows = inner
            .tables
            .get_mut(table)
            .ok_or_else(|| EngineError::TableNotFound(table.clone()))?;
        rows.push(Vec::new());
        Ok(MemoryRowForm {
            inner: Arc::clone(&self.inner),
            table: table.clone(),
            row: rows.len() - 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_fields_are_created_on_demand() {
        let form = MemoryForm::new().accept_unknown_fields();
        let field = form.resolve_field(&FieldId::new("code")).await.unwrap();
        assert_eq!(field.read_value().await.unwrap(), "");
        assert!(field.is_visible().await.unwrap());
        field.write_value("X1").await.unwrap();
        assert_eq!(form.value("code").as_deref(), Some("X1"));
    }

    #[tokio::test]
    async fn test_selection_fields_are_hidden() {
        let form = MemoryForm::new().with_select_field("taxZone", "", ["NSW", "VIC"]);
        let field = form.resolve_field(&FieldId::new("taxZone")).await.unwrap();
        assert!(!field.is_visible().await.unwrap());
        field.select_option("VIC").await.unwrap();
        assert_eq!(form.value("taxZone").as_deref(), Some("VIC"));
        assert_eq!(form.writes(), 1);
    }

    #[test]
    fn test_set_table_is_seen_by_clones() {
        let form = MemoryForm::new().with_table("T", &[Row::new().with("a", "1")]);
        let view = form.clone();
        form.set_table("T", &[]);
        assert!(view.table_rows("T").is_empty());
        assert_eq!(view.writes(), 0);
    }

    #[tokio::test]
    async fn test_added_rows_keep_fill_order() {
        let form = MemoryForm::new().with_table("T", &[]);
        let row = form.add_row(&TableId::new("T")).await.unwrap();
        row.resolve_field(&FieldId::new("b")).await.unwrap().write_value("2").await.unwrap();
        row.resolve_field(&FieldId::new("a")).await.unwrap().write_value("1").await.unwrap();
        assert_eq!(
            form.table_rows("T"),
            vec![Row::new().with("b", "2").with("a", "1")]
        );
    }
}
