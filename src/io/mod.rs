//! I/O module
//!
//! Handles report output.
//!
//! # Components
//!
//! - `report` - Balance report rendering (text lines or CSV table)

pub mod report;

pub use report::{write_report, write_report_csv, write_report_text, ReportFormat};
