//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (config, store, today, confirmation) plus init/status
//! - `subscriptions` - Record commands (list, show, add, edit, delete)
//! - `reports` - Stats and spending report
//! - `calendar` - Month calendar view
//! - `reminders` - One-shot reminder check and the watch scheduler
//! - `exchange` - Export, import and clear

pub mod calendar;
pub mod core;
pub mod exchange;
pub mod reminders;
pub mod reports;
pub mod subscriptions;

// Re-export command functions for main.rs
pub use calendar::*;
pub use core::*;
pub use exchange::*;
pub use reminders::*;
pub use reports::*;
pub use subscriptions::*;
