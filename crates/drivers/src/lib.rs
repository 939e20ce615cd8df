//! auxsync QAD AUX drivers
//!
//! Connects the record-update engine to the QAD web UI:
//! - Entity descriptions (browse view, search, casing overrides, tables)
//! - The present/absent record flow shared by every entity
//! - Login and logout against the saved browser session
//! - Configuration

pub mod config;
pub mod driver;
pub mod entity;
pub mod error;
pub mod outcome;
pub mod screen;
pub mod search;
pub mod session;
mod widgets;

pub use config::AuxConfig;
pub use driver::RecordDriver;
pub use entity::{Entity, EntitySpec, PreparedRecord};
pub use error::{DriverError, DriverResult};
pub use outcome::Outcome;
pub use screen::{QadScreen, RecordScreen};
pub use search::{Filter, SearchQuery};
pub use session::{require_state_file, SessionManager};
