//! Export: leads → `.xlsx` workbook bytes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_xlsxwriter::Workbook;
use uuid::Uuid;

use leadhub_core::models::lead::Lead;

use crate::error::SheetError;

const HEADERS: [&str; 13] = [
    "Lead ID",
    "Name",
    "Email",
    "Phone",
    "Source",
    "Status",
    "Tags",
    "Assigned To",
    "Assigned To Email",
    "Created By",
    "Created Date",
    "Last Updated",
    "Notes Count",
];

const COLUMN_WIDTHS: [f64; 13] = [
    25.0, 20.0, 25.0, 15.0, 15.0, 12.0, 30.0, 20.0, 25.0, 20.0, 15.0, 15.0, 12.0,
];

/// Filename pattern `leads_export_<unixtime>.xlsx`.
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("leads_export_{}.xlsx", now.timestamp())
}

/// A user's display fields for export columns.
#[derive(Debug, Clone)]
pub struct ExportUserRef {
    pub name: String,
    pub email: String,
}

/// Build a single-sheet `Leads` workbook from the given leads.
///
/// `user_refs` resolves assignee/creator references to display names; a
/// missing assignee renders as `Unassigned`.
pub fn build_export_workbook(
    leads: &[Lead],
    user_refs: &HashMap<Uuid, ExportUserRef>,
) -> Result<Vec<u8>, SheetError> {
    let build = |mut workbook: Workbook| -> Result<Vec<u8>, rust_xlsxwriter::XlsxError> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Leads")?;

        for (col, header) in HEADERS.iter().enumerate() {
            sheet.write_string(0, col as u16, *header)?;
        }
        for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
            sheet.set_column_width(col as u16, *width)?;
        }

        for (idx, lead) in leads.iter().enumerate() {
            let row = (idx + 1) as u32;
            let assigned = lead.assigned_to.and_then(|id| user_refs.get(&id));
            let creator = user_refs.get(&lead.created_by);

            sheet.write_string(row, 0, lead.id.to_string())?;
            sheet.write_string(row, 1, &lead.name)?;
            sheet.write_string(row, 2, &lead.email)?;
            sheet.write_string(row, 3, &lead.phone)?;
            sheet.write_string(row, 4, &lead.source)?;
            sheet.write_string(row, 5, lead.status.as_str())?;
            sheet.write_string(row, 6, lead.tags.join(", "))?;
            sheet.write_string(
                row,
                7,
                assigned.map(|u| u.name.as_str()).unwrap_or("Unassigned"),
            )?;
            sheet.write_string(row, 8, assigned.map(|u| u.email.as_str()).unwrap_or(""))?;
            sheet.write_string(row, 9, creator.map(|u| u.name.as_str()).unwrap_or(""))?;
            sheet.write_string(row, 10, lead.created_at.format("%Y-%m-%d").to_string())?;
            sheet.write_string(row, 11, lead.updated_at.format("%Y-%m-%d").to_string())?;
            sheet.write_number(row, 12, lead.notes.len() as f64)?;
        }

        workbook.save_to_buffer()
    };

    build(Workbook::new()).map_err(|e| SheetError::Build(e.to_string()))
}
