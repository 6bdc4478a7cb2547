//! Output formatting for estimation reports.
//!
//! - Terminal: colored summary in a box
//! - JSON: machine-readable serialization

mod json;
mod terminal;

pub use json::{to_json, to_json_pretty};
pub use terminal::format_report;
