//! Workbook parsing: first worksheet → ordered field records.
//!
//! Row 1 is the header. Header names are normalized (lowercased,
//! non-alphanumerics stripped) so that an exported workbook — whose
//! headers read `Name`, `Assigned To`, … — re-imports cleanly.

use std::collections::BTreeMap;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};

use crate::error::SheetError;

/// One data row of the uploaded table, keyed by normalized header name.
#[derive(Debug, Clone, Default)]
pub struct SheetRow {
    fields: BTreeMap<String, String>,
}

impl SheetRow {
    pub fn new<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (normalize_header(&k.into()), v.into()))
                .collect(),
        }
    }

    /// Field value by normalized key, `None` when absent or blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// All non-blank fields, for error-report echoing.
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}

/// Lowercase and strip everything but letters and digits, so `Name`,
/// `name` and `Assigned To` all key consistently.
fn normalize_header(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            // Spreadsheets hand phone numbers back as floats.
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Read the first worksheet of the workbook at `path` into data rows.
///
/// A file that cannot be opened as a workbook is a [`SheetError::
/// Malformed`] — fatal to the request. Fully blank rows are dropped.
pub fn read_rows(path: &Path) -> Result<Vec<SheetRow>, SheetError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| SheetError::Malformed(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SheetError::Malformed("workbook has no worksheets".into()))?
        .map_err(|e| SheetError::Malformed(e.to_string()))?;

    let mut rows_iter = range.rows();
    let Some(header_row) = rows_iter.next() else {
        return Ok(Vec::new());
    };

    let headers: Vec<String> = header_row.iter().map(|c| {
        let raw = cell_to_string(c);
        normalize_header(&raw)
    }).collect();

    let mut rows = Vec::new();
    for cells in rows_iter {
        let mut fields = BTreeMap::new();
        for (idx, cell) in cells.iter().enumerate() {
            let Some(header) = headers.get(idx) else {
                continue;
            };
            if header.is_empty() {
                continue;
            }
            let value = cell_to_string(cell);
            if !value.is_empty() {
                fields.insert(header.clone(), value);
            }
        }
        if !fields.is_empty() {
            rows.push(SheetRow { fields });
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_normalization() {
        assert_eq!(normalize_header("Name"), "name");
        assert_eq!(normalize_header("Assigned To"), "assignedto");
        assert_eq!(normalize_header("assignedTo"), "assignedto");
        assert_eq!(normalize_header("Notes Count"), "notescount");
    }

    #[test]
    fn blank_fields_read_as_absent() {
        let row = SheetRow::new([("name", "Jane"), ("email", "")]);
        assert_eq!(row.get("name"), Some("Jane"));
        assert_eq!(row.get("email"), None);
        assert_eq!(row.get("phone"), None);
    }

    #[test]
    fn numeric_cells_render_without_fraction() {
        assert_eq!(cell_to_string(&Data::Float(5550100.0)), "5550100");
        assert_eq!(cell_to_string(&Data::Int(42)), "42");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
