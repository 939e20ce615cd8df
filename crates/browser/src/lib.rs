//! auxsync Playwright bridge
//!
//! Drives one Chromium page through a Node.js Playwright process:
//! - Stages and spawns the bridge script
//! - Speaks a JSON-lines request/response protocol over stdin/stdout
//! - Exposes a typed [`Page`] with serializable [`Locator`] chains
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐   JSON lines   ┌──────────────────────────┐
//! │ Page (Rust)              │ ─────────────▶ │ bridge.js (Node)         │
//! │   goto / click / fill    │                │   chromium.launch()      │
//! │   input_value / count    │ ◀───────────── │   page.locator(...)      │
//! └──────────────────────────┘                └──────────────────────────┘
//! ```

pub mod bridge;
pub mod error;
pub mod locator;
pub mod page;
pub mod protocol;

pub use bridge::{BrowserConfig, PlaywrightBridge};
pub use error::{BrowserError, BrowserResult};
pub use locator::{Locator, LocatorStep};
pub use page::Page;
pub use protocol::WaitState;
