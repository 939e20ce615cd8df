//! auxsync CLI
//!
//! Command-line interface for logging in to QAD AUX and keeping its
//! records in a desired state.

pub mod cli;
pub mod commands;
pub mod output;
