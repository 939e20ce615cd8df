//! auxsync Record-Update Engine
//!
//! Generic, UI-agnostic reconciliation of a desired record against a live
//! form. Entity drivers build a [`DesiredState`], normalize it, and hand it to
//! the engine together with a surface implementing [`FormSurface`] and
//! [`TableSurface`].
//!
//! # Data flow
//!
//! ```text
//! ┌──────────────┐  normalize   ┌─────────────────┐
//! │ DesiredState │ ───────────▶ │ NormalizedState │
//! └──────────────┘  (overrides) └────────┬────────┘
//!                                        │
//!          ┌─────────────────────────────┼──────────────────────────┐
//!          ▼                             ▼                          ▼
//!    apply_fields                  reconcile_table            verify_fields
//!    (write if differs)            (diff, full rewrite)       verify_table
//!          │                             │                          │
//!          └──────────────▶ FormSurface / TableSurface ◀────────────┘
//! ```
//!
//! Every operation is idempotent: re-running against a form that already
//! matches issues no writes and reports no change.

pub mod error;
pub mod fields;
pub mod memory;
pub mod normalize;
pub mod state;
pub mod surface;
pub mod table;

pub use error::{EngineError, EngineResult};
pub use fields::{apply_field, apply_fields, apply_row, apply_section, verify_fields, verify_section};
pub use memory::MemoryForm;
pub use normalize::{field_id, normalize, FieldPath, NormalizedState, Overrides};
pub use state::{DesiredState, FieldId, Node, Row, Scalar, Section, TableId};
pub use surface::{FieldHandle, FormSurface, RowHandle, TableSurface};
pub use table::{diff_table, reconcile_table, verify_table, TableDiff};
