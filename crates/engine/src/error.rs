//! Error types for the record-update engine

use thiserror::Error;

use crate::state::{FieldId, Row, TableId};

/// Result type alias using the engine error
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Field `{0}` does not resolve to any control on the form")]
    FieldResolution(FieldId),

    #[error("No option matching `{option}` for field `{field}`")]
    OptionNotFound { field: FieldId, option: String },

    #[error("Details have not correctly been updated: {}", join_ids(.0))]
    VerificationMismatch(Vec<FieldId>),

    #[error(
        "Table `{table}` rows have not correctly been updated ({live} live, {desired} desired): {}",
        join_rows(.unmatched)
    )]
    TableMismatch {
        table: TableId,
        live: usize,
        desired: usize,
        unmatched: Vec<Row>,
    },

    #[error("Table `{0}` is not visible on the form")]
    TableNotFound(TableId),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Invalid record description: {0}")]
    Schema(String),

    #[error("UI surface error: {0}")]
    Surface(String),
}

impl EngineError {
    /// Timeouts are the only failures where re-running the whole
    /// invocation may succeed; everything else is a schema or UI mismatch.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Timeout(_))
    }
}

fn join_ids(ids: &[FieldId]) -> String {
    ids.iter()
        .map(FieldId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_rows(rows: &[Row]) -> String {
    if rows.is_empty() {
        return "row count differs".to_string();
    }
    rows.iter()
        .map(Row::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Scalar;

    #[test]
    fn test_mismatch_lists_every_field() {
        let err = EngineError::VerificationMismatch(vec![
            FieldId::new("customerCode"),
            FieldId::new("taxZone"),
        ]);
        assert_eq!(
            err.to_string(),
            "Details have not correctly been updated: customerCode, taxZone"
        );
    }

    #[test]
    fn test_table_mismatch_renders_rows() {
        let err = EngineError::TableMismatch {
            table: TableId::new("BankingPanel"),
            live: 1,
            desired: 1,
            unmatched: vec![Row::new().with("currencyCode", Scalar::from("AUD"))],
        };
        assert!(err.to_string().contains("currencyCode: \"AUD\""));
        assert!(!err.is_transient());
        assert!(EngineError::Timeout("toast".into()).is_transient());
    }
}
