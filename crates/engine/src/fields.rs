//! Idempotent scalar fill and read-back verification

use tracing::{debug, info};

use crate::error::EngineResult;
use crate::normalize::NormalizedState;
use crate::state::{FieldId, Row, Section};
use crate::surface::{FieldHandle, FormSurface};

/// Bring one control to `desired`, writing only when the live value differs.
///
/// Returns whether a write was issued.
pub async fn apply_field<S>(surface: &S, id: &FieldId, desired: &str) -> EngineResult<bool>
where
    S: FormSurface + ?Sized,
{
    let field = surface.resolve_field(id).await?;
    let current = field.read_value().await?;
    if current == desired {
        debug!(field = %id, "field already up to date");
        return Ok(false);
    }

    if field.is_visible().await? {
        field.write_value(desired).await?;
    } else {
        field.select_option(desired).await?;
    }
    info!(field = %id, from = %current, to = %desired, "field updated");
    Ok(true)
}

/// Apply every scalar field of a normalized state. Tables are skipped.
pub async fn apply_fields<S>(state: &NormalizedState, surface: &S) -> EngineResult<bool>
where
    S: FormSurface + ?Sized,
{
    apply_section(state.root(), surface).await
}

pub async fn apply_section<S>(section: &Section, surface: &S) -> EngineResult<bool>
where
    S: FormSurface + ?Sized,
{
    let mut changed = false;
    for (id, value) in section.scalar_fields() {
        changed |= apply_field(surface, &id, &value.to_ui_string()).await?;
    }
    Ok(changed)
}

/// Fill the cells of one table row through a form scoped to that row
pub async fn apply_row<S>(row: &Row, surface: &S) -> EngineResult<bool>
where
    S: FormSurface + ?Sized,
{
    let mut changed = false;
    for (name, value) in row.iter() {
        changed |= apply_field(surface, &FieldId::new(name), &value.to_ui_string()).await?;
    }
    Ok(changed)
}

/// Re-read every scalar field and list those whose live value differs.
///
/// Handles are resolved again rather than reused, and the result is built
/// fresh on each call.
pub async fn verify_fields<S>(state: &NormalizedState, surface: &S) -> EngineResult<Vec<FieldId>>
where
    S: FormSurface + ?Sized,
{
    verify_section(state.root(), surface).await
}

pub async fn verify_section<S>(section: &Section, surface: &S) -> EngineResult<Vec<FieldId>>
where
    S: FormSurface + ?Sized,
{
    let mut mismatches = Vec::new();
    for (id, value) in section.scalar_fields() {
        let field = surface.resolve_field(&id).await?;
        let live = field.read_value().await?;
        let desired = value.to_ui_string();
        if live != desired {
            debug!(field = %id, live = %live, desired = %desired, "field mismatch");
            if !mismatches.contains(&id) {
                mismatches.push(id);
            }
        }
    }
    Ok(mismatches)
}
