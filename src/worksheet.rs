//! In-memory worksheet: sparse cell grid plus sheet-level layout

use std::collections::BTreeMap;

use crate::error::Result;
use crate::types::{CellRange, CellRef, CellStyle, CellValue, MAX_ROW};
use crate::validation::DataValidation;

/// A value together with its formatting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
}

/// Named grid of cells
///
/// Cells are kept in row-major order so serialisation can stream them
/// row by row without sorting.
#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    cells: BTreeMap<CellRef, Cell>,
    column_widths: BTreeMap<u32, f64>,
    row_heights: BTreeMap<u32, f64>,
    frozen_rows: Option<u32>,
    validations: Vec<DataValidation>,
}

impl Worksheet {
    pub(crate) fn new(name: &str) -> Self {
        Worksheet {
            name: name.to_string(),
            cells: BTreeMap::new(),
            column_widths: BTreeMap::new(),
            row_heights: BTreeMap::new(),
            frozen_rows: None,
            validations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write a value at an A1 address, keeping any existing style
    ///
    /// # Examples
    ///
    /// ```
    /// use dashboard_template::Workbook;
    ///
    /// let mut workbook = Workbook::new();
    /// let sheet = workbook.sheet_mut("Sheet1").unwrap();
    /// sheet.write("B8", "NORMAL").unwrap();
    /// assert_eq!(sheet.value("B8").unwrap().as_string(), "NORMAL");
    /// ```
    pub fn write<V: Into<CellValue>>(&mut self, addr: &str, value: V) -> Result<()> {
        let cell: CellRef = addr.parse()?;
        self.write_at(cell, value);
        Ok(())
    }

    /// Write a value at a cell position
    pub fn write_at<V: Into<CellValue>>(&mut self, cell: CellRef, value: V) {
        let value = value.into();
        if value.is_empty() {
            if let Some(existing) = self.cells.get_mut(&cell) {
                existing.value = CellValue::Empty;
            }
            return;
        }
        self.cells.entry(cell).or_default().value = value;
    }

    /// Write consecutive values into `row`, starting at column A
    pub fn write_row<I, V>(&mut self, row: u32, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        for (idx, value) in values.into_iter().enumerate() {
            let cell = CellRef::new(row, idx as u32 + 1)?;
            self.write_at(cell, value);
        }
        Ok(())
    }

    /// Write values downwards from `start`, one per row
    pub fn write_column<I, V>(&mut self, start: CellRef, values: I) -> Result<u32>
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let mut written = 0;
        for value in values {
            let cell = CellRef::new(start.row + written, start.col)?;
            self.write_at(cell, value);
            written += 1;
        }
        Ok(written)
    }

    /// Replace the style of a cell, creating the cell if needed
    pub fn set_style(&mut self, addr: &str, style: CellStyle) -> Result<()> {
        let cell: CellRef = addr.parse()?;
        self.cells.entry(cell).or_default().style = style;
        Ok(())
    }

    /// Modify the style of a cell in place, creating the cell if needed
    pub fn update_style<F>(&mut self, cell: CellRef, f: F)
    where
        F: FnOnce(&mut CellStyle),
    {
        f(&mut self.cells.entry(cell).or_default().style);
    }

    pub fn cell(&self, addr: &str) -> Option<&Cell> {
        addr.parse().ok().and_then(|c: CellRef| self.cells.get(&c))
    }

    pub fn cell_at(&self, cell: CellRef) -> Option<&Cell> {
        self.cells.get(&cell)
    }

    /// Value at an A1 address, if the cell exists
    pub fn value(&self, addr: &str) -> Option<&CellValue> {
        self.cell(addr).map(|c| &c.value)
    }

    /// All cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (&CellRef, &Cell)> {
        self.cells.iter()
    }

    /// Last row holding a cell (value or style); 0 for an empty sheet
    pub fn max_row(&self) -> u32 {
        self.cells.keys().next_back().map_or(0, |c| c.row)
    }

    /// Last column holding a cell (value or style); 0 for an empty sheet
    pub fn max_column(&self) -> u32 {
        self.cells.keys().map(|c| c.col).max().unwrap_or(0)
    }

    /// Used area, `None` for an empty sheet
    pub fn dimension(&self) -> Option<CellRange> {
        let first_row = self.cells.keys().next()?.row;
        let first_col = self.cells.keys().map(|c| c.col).min()?;
        Some(CellRange {
            start: CellRef {
                row: first_row,
                col: first_col,
            },
            end: CellRef {
                row: self.max_row(),
                col: self.max_column(),
            },
        })
    }

    pub fn set_column_width(&mut self, col: u32, width: f64) {
        self.column_widths.insert(col, width);
    }

    pub fn column_width(&self, col: u32) -> Option<f64> {
        self.column_widths.get(&col).copied()
    }

    pub fn column_widths(&self) -> &BTreeMap<u32, f64> {
        &self.column_widths
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.row_heights.insert(row, height);
    }

    pub fn row_height(&self, row: u32) -> Option<f64> {
        self.row_heights.get(&row).copied()
    }

    /// Keep the first `rows` rows visible while scrolling
    ///
    /// At least one row must stay below the pane, so `rows` is capped at
    /// `MAX_ROW - 1`.
    pub fn freeze_rows(&mut self, rows: u32) {
        self.frozen_rows = (rows > 0).then_some(rows.min(MAX_ROW - 1));
    }

    pub fn frozen_rows(&self) -> Option<u32> {
        self.frozen_rows
    }

    pub fn add_data_validation(&mut self, validation: DataValidation) {
        self.validations.push(validation);
    }

    pub fn data_validations(&self) -> &[DataValidation] {
        &self.validations
    }

    /// Rows that must be emitted: every row with a cell or a custom height
    pub(crate) fn populated_rows(&self) -> Vec<u32> {
        let mut rows: Vec<u32> = self.cells.keys().map(|c| c.row).collect();
        rows.extend(self.row_heights.keys().copied());
        rows.sort_unstable();
        rows.dedup();
        rows
    }

    pub(crate) fn row_cells(&self, row: u32) -> impl Iterator<Item = (&CellRef, &Cell)> {
        let start = CellRef { row, col: 1 };
        let end = CellRef {
            row,
            col: crate::types::MAX_COL,
        };
        self.cells.range(start..=end)
    }
}
