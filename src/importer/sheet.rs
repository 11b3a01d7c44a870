use std::io::Cursor;
use std::path::Path;

use calamine::{Reader, Xlsx};

use crate::importer::error::ImportError;

/// Header row plus data rows of the first worksheet, all cells rendered as
/// trimmed strings. Fully blank rows are dropped.
#[derive(Debug)]
pub struct SheetData {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Decode an uploaded workbook. The filename is only used for the extension
/// check; the bytes are parsed in memory.
pub fn read_workbook(filename: &str, bytes: &[u8]) -> Result<SheetData, ImportError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if ext != "xlsx" {
        return Err(ImportError::UnsupportedFormat(ext));
    }

    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e: calamine::XlsxError| ImportError::Unreadable(e.to_string()))?;

    let sheet_names = workbook.sheet_names();
    if sheet_names.is_empty() {
        return Err(ImportError::Unreadable("workbook has no worksheets".to_string()));
    }

    let sheet_name = sheet_names[0].clone();
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ImportError::Unreadable(e.to_string()))?;

    let mut rows_iter = range.rows();
    let header_row = rows_iter.next().ok_or(ImportError::Empty)?;
    let header: Vec<String> = header_row
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for data_row in rows_iter {
        let cells: Vec<String> = data_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        // Skip fully blank rows (common at the tail of exported sheets)
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }

        rows.push(cells);
    }

    if rows.is_empty() {
        return Err(ImportError::Empty);
    }

    Ok(SheetData { header, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_xlsx_extension() {
        let err = read_workbook("sites.csv", b"a,b,c").unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(ext) if ext == "csv"));
    }

    #[test]
    fn rejects_missing_extension() {
        let err = read_workbook("sites", &[]).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(_)));
    }

    #[test]
    fn rejects_garbage_bytes() {
        let err = read_workbook("sites.xlsx", b"definitely not a zip archive").unwrap_err();
        assert!(matches!(err, ImportError::Unreadable(_)));
    }
}
