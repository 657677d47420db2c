//! LeadHub Sheets — spreadsheet import/export and the batch
//! reconciler.
//!
//! The reconciler takes a parsed tabular upload, validates and
//! deduplicates rows against the store, and produces a partial-success
//! report. A single bad row never aborts the batch.

pub mod error;
pub mod export;
pub mod parse;
pub mod reconcile;

pub use error::SheetError;
pub use export::{build_export_workbook, export_filename};
pub use parse::{SheetRow, read_rows};
pub use reconcile::{ImportReport, RowError, RowErrorKind, import_rows};
