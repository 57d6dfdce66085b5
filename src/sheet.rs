//! Spreadsheet decoding: raw xlsx bytes into a DataFrame.
//!
//! Cells are modeled as a small sum type before type harmonization so that
//! mixed columns (numbers and text in one column) survive loading intact.
//! Each source file has a fixed, known layout described by [`SheetLayout`].

use crate::error::{EtlError, Result};
use crate::headers::normalize_headers;
use calamine::{Data, Reader, Xlsx};
use polars::prelude::*;
use std::collections::HashSet;
use std::io::Cursor;
use tracing::warn;

/// A raw spreadsheet cell prior to type harmonization.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Missing,
    Text(String),
    Number(f64),
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty => CellValue::Missing,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Text(b.to_string()),
            Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            Data::DateTimeIso(s) => CellValue::Text(s.clone()),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
            // Excel error cells (#N/A, #DIV/0!, ...) carry no usable value.
            Data::Error(_) => CellValue::Missing,
        }
    }
}

impl CellValue {
    /// Text rendering used for header labels and for mixed-type columns.
    /// Integral numbers render without a decimal point, and missing cells
    /// render as "nan", which the column denylist later removes.
    fn display(&self) -> String {
        match self {
            CellValue::Missing => "nan".to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(f) => render_number(*f),
        }
    }
}

fn render_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// Fixed physical layout of one known export format.
#[derive(Debug, Clone, Copy)]
pub struct SheetLayout {
    /// 0-based row index holding the real header labels.
    pub header_row: usize,
    /// 0-based row index where data starts.
    pub first_data_row: usize,
    /// Leading columns to discard (banner/index columns).
    pub skip_leading_cols: usize,
}

/// Forecast export: header on the first row, data right below.
pub const FORECAST_LAYOUT: SheetLayout = SheetLayout {
    header_row: 0,
    first_data_row: 1,
    skip_leading_cols: 0,
};

/// Sales export: a title banner above the header, real header on row 2,
/// data from row 3, and a spurious first column.
pub const SALES_LAYOUT: SheetLayout = SheetLayout {
    header_row: 2,
    first_data_row: 3,
    skip_leading_cols: 1,
};

/// Decode the first worksheet of an xlsx blob into a DataFrame with
/// normalized headers, honoring the given layout.
pub fn read_sheet(bytes: &[u8], layout: &SheetLayout) -> Result<DataFrame> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| EtlError::Spreadsheet(format!("Failed to open workbook: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| EtlError::Spreadsheet("Workbook has no sheets".to_string()))?
        .map_err(|e| EtlError::Spreadsheet(format!("Failed to read sheet: {e}")))?;

    let grid: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(CellValue::from).collect())
        .collect();

    frame_from_grid(grid, layout)
}

/// Build a DataFrame from a cell grid. Columns where every present cell is
/// numeric become Float64; anything else becomes text. Duplicate canonical
/// header names keep the first occurrence only (polars cannot represent
/// duplicates; in practice the duplicates are the junk "nan" columns).
pub fn frame_from_grid(grid: Vec<Vec<CellValue>>, layout: &SheetLayout) -> Result<DataFrame> {
    let header_cells = grid.get(layout.header_row).ok_or_else(|| {
        EtlError::Spreadsheet(format!(
            "Sheet has {} rows, header expected at row {}",
            grid.len(),
            layout.header_row
        ))
    })?;

    let labels: Vec<String> = header_cells
        .iter()
        .skip(layout.skip_leading_cols)
        .map(CellValue::display)
        .collect();
    let headers = normalize_headers(&labels);

    let data_rows: Vec<&Vec<CellValue>> = grid
        .iter()
        .skip(layout.first_data_row)
        .collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut columns: Vec<Series> = Vec::with_capacity(headers.len());

    for (idx, name) in headers.iter().enumerate() {
        if !seen.insert(name.as_str()) {
            warn!("Dropping duplicate column '{}' (keeping first occurrence)", name);
            continue;
        }
        let cell_idx = idx + layout.skip_leading_cols;
        let cells: Vec<&CellValue> = data_rows
            .iter()
            .map(|row| row.get(cell_idx).unwrap_or(&CellValue::Missing))
            .collect();
        columns.push(build_column(name, &cells));
    }

    Ok(DataFrame::new(columns)?)
}

fn build_column(name: &str, cells: &[&CellValue]) -> Series {
    let all_numeric = cells
        .iter()
        .all(|c| matches!(c, CellValue::Number(_) | CellValue::Missing));

    if all_numeric {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|c| match c {
                CellValue::Number(f) => Some(*f),
                _ => None,
            })
            .collect();
        Series::new(name, values)
    } else {
        let values: Vec<Option<String>> = cells
            .iter()
            .map(|c| match c {
                CellValue::Missing => None,
                other => Some(other.display()),
            })
            .collect();
        Series::new(name, values)
    }
}
