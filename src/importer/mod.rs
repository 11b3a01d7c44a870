//! Bulk spreadsheet import for sites.
//!
//! Structural problems (bad upload, unreadable workbook, missing required
//! columns) abort the whole operation; row-level problems are collected as
//! line-numbered messages and never stop the remaining rows.

pub mod error;
pub mod header;
pub mod sheet;
pub mod site_import;

pub use error::ImportError;
pub use site_import::{ImportSummary, SiteDirectory, SiteImporter};
