//! Spreadsheet error types.

use leadhub_core::error::LeadHubError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    /// The uploaded file could not be opened or parsed as a workbook.
    /// Fatal to the whole request — no partial results.
    #[error("Unable to read spreadsheet: {0}")]
    Malformed(String),

    /// The data table contains no rows at all.
    #[error("Excel file is empty")]
    EmptyBatch,

    /// Workbook construction failed on export.
    #[error("Workbook build failed: {0}")]
    Build(String),
}

impl From<SheetError> for LeadHubError {
    fn from(err: SheetError) -> Self {
        match err {
            SheetError::Malformed(_) | SheetError::EmptyBatch => LeadHubError::Validation {
                message: err.to_string(),
            },
            SheetError::Build(msg) => LeadHubError::Internal(msg),
        }
    }
}
