// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spreadsheet rows from the first worksheet of an Excel or OpenDocument
//! workbook.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use faxline_core::FaxlineError;

/// Extensions read through [`read_rows`]; anything else is treated as CSV.
pub(crate) const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

pub(crate) fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Every row of the first sheet as trimmed text, header row included.
pub(crate) fn read_rows(path: &Path) -> Result<Vec<Vec<String>>, FaxlineError> {
    let err = |e: calamine::Error| {
        FaxlineError::Resolution(format!("cannot read workbook {}: {e}", path.display()))
    };

    let mut workbook = open_workbook_auto(path).map_err(err)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| {
            FaxlineError::Resolution(format!("workbook {} has no worksheets", path.display()))
        })?
        .map_err(err)?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

/// Numbers typed into a cell come back as floats; whole ones lose the `.0`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workbook_extensions_ignore_case() {
        assert!(is_workbook(Path::new("/srv/fax/senders.xlsx")));
        assert!(is_workbook(Path::new("/srv/fax/SENDERS.XLSX")));
        assert!(is_workbook(Path::new("senders.ods")));
        assert!(!is_workbook(Path::new("senders.csv")));
        assert!(!is_workbook(Path::new("senders")));
    }

    #[test]
    fn whole_floats_render_without_fraction() {
        assert_eq!(cell_text(&Data::Float(312345678.0)), "312345678");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::String("  Acme Co ".into())), "Acme Co");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
