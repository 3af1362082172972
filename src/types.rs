//! Type definitions for cells, addresses and styles

use crate::error::{Result, TemplateError};
use std::fmt;
use std::str::FromStr;

/// Last addressable row of an OOXML worksheet
pub const MAX_ROW: u32 = 1_048_576;
/// Last addressable column of an OOXML worksheet (XFD)
pub const MAX_COL: u32 = 16_384;

/// Represents a single cell value in a worksheet
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Empty cell
    #[default]
    Empty,
    /// String value
    String(String),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Formula value (e.g., "=SUM(A1:A10)")
    /// Stored as text; the spreadsheet application evaluates it on open.
    Formula(String),
}

impl CellValue {
    /// Convert cell value to the text a user would see typed into the cell
    pub fn as_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::String(s) => s.clone(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::Formula(f) => f.clone(),
        }
    }

    /// Check if cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Number of characters in the rendered value, used for column sizing
    pub fn display_len(&self) -> usize {
        match self {
            CellValue::String(s) | CellValue::Formula(s) => s.chars().count(),
            other => other.as_string().chars().count(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::String(s.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::String(s)
        }
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// Convert a 1-based column index to letters (1 -> A, 26 -> Z, 27 -> AA)
pub fn col_to_letter(col: u32) -> String {
    let mut col_str = String::new();
    let mut n = col;
    while n > 0 {
        let rem = (n - 1) % 26;
        col_str.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    col_str
}

/// Parse column letters to a 1-based index (A -> 1, AA -> 27)
pub fn letter_to_col(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut col = 0u32;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    (col <= MAX_COL).then_some(col)
}

/// A cell position, 1-based like the A1 notation it prints as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    /// Row number (1-based)
    pub row: u32,
    /// Column number (1-based)
    pub col: u32,
}

impl CellRef {
    /// Create a cell reference, rejecting coordinates outside the sheet grid
    pub fn new(row: u32, col: u32) -> Result<Self> {
        if row == 0 || row > MAX_ROW || col == 0 || col > MAX_COL {
            return Err(TemplateError::InvalidCell(format!("row {}, column {}", row, col)));
        }
        Ok(CellRef { row, col })
    }

    /// Get Excel-style cell reference (e.g., "A1", "B2")
    pub fn reference(&self) -> String {
        format!("{}{}", col_to_letter(self.col), self.row)
    }

    /// Absolute reference (e.g., "$L$4")
    pub fn absolute(&self) -> String {
        format!("${}${}", col_to_letter(self.col), self.row)
    }
}

impl FromStr for CellRef {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self> {
        let cleaned: String = s.chars().filter(|c| *c != '$').collect();
        let split = cleaned
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| TemplateError::InvalidCell(s.to_string()))?;
        let (letters, digits) = cleaned.split_at(split);
        let col = letter_to_col(letters).ok_or_else(|| TemplateError::InvalidCell(s.to_string()))?;
        let row: u32 = digits
            .parse()
            .map_err(|_| TemplateError::InvalidCell(s.to_string()))?;
        CellRef::new(row, col).map_err(|_| TemplateError::InvalidCell(s.to_string()))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference())
    }
}

/// Rectangular block of cells, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    /// Create a range; `start` must be the top-left corner
    pub fn new(start: CellRef, end: CellRef) -> Result<Self> {
        if start.row > end.row || start.col > end.col {
            return Err(TemplateError::InvalidRange(format!("{}:{}", start, end)));
        }
        Ok(CellRange { start, end })
    }

    /// Range covering a single cell
    pub fn single(cell: CellRef) -> Self {
        CellRange {
            start: cell,
            end: cell,
        }
    }

    /// Vertical run of `len` cells in `col` starting at `start_row`
    pub fn column_span(col: u32, start_row: u32, len: u32) -> Result<Self> {
        if len == 0 {
            return Err(TemplateError::InvalidRange(format!(
                "empty span in column {}",
                col_to_letter(col)
            )));
        }
        let end_row = start_row.checked_add(len - 1).ok_or_else(|| {
            TemplateError::InvalidRange(format!(
                "span of {} rows from {}{} overflows",
                len,
                col_to_letter(col),
                start_row
            ))
        })?;
        CellRange::new(CellRef::new(start_row, col)?, CellRef::new(end_row, col)?)
    }

    /// Whether the range contains the given cell
    pub fn contains(&self, cell: CellRef) -> bool {
        (self.start.row..=self.end.row).contains(&cell.row)
            && (self.start.col..=self.end.col).contains(&cell.col)
    }

    /// Absolute form used in defined names (e.g., "$L$4:$L$8")
    pub fn absolute(&self) -> String {
        format!("{}:{}", self.start.absolute(), self.end.absolute())
    }
}

impl FromStr for CellRange {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((a, b)) => {
                let start: CellRef = a.parse().map_err(|_| TemplateError::InvalidRange(s.to_string()))?;
                let end: CellRef = b.parse().map_err(|_| TemplateError::InvalidRange(s.to_string()))?;
                CellRange::new(start, end)
            }
            None => Ok(CellRange::single(s.parse()?)),
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

/// Opaque RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(u32);

impl Color {
    /// Create from a 0xRRGGBB value
    pub const fn rgb(value: u32) -> Self {
        Color(value & 0x00FF_FFFF)
    }

    /// ARGB hex string as stored in styles.xml (e.g., "FF111827")
    pub fn argb_hex(&self) -> String {
        format!("FF{:06X}", self.0)
    }
}

/// Font properties of a cell
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Font {
    pub name: String,
    /// Size in points
    pub size: u16,
    pub bold: bool,
    pub color: Option<Color>,
}

impl Default for Font {
    fn default() -> Self {
        Font {
            name: "Calibri".to_string(),
            size: 11,
            bold: false,
            color: None,
        }
    }
}

impl Font {
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn size(mut self, size: u16) -> Self {
        self.size = size;
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

/// Background fill of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Fill {
    #[default]
    None,
    Solid(Color),
}

/// Vertical alignment inside a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerticalAlign {
    Top,
    Center,
    Bottom,
}

impl VerticalAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerticalAlign::Top => "top",
            VerticalAlign::Center => "center",
            VerticalAlign::Bottom => "bottom",
        }
    }
}

/// Cell alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Alignment {
    pub vertical: Option<VerticalAlign>,
    pub wrap_text: bool,
}

impl Alignment {
    pub fn is_default(&self) -> bool {
        self.vertical.is_none() && !self.wrap_text
    }
}

/// Complete formatting of one cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CellStyle {
    pub font: Font,
    pub fill: Fill,
    pub alignment: Alignment,
}

impl CellStyle {
    /// Whether this is the workbook default style (xf 0)
    pub fn is_default(&self) -> bool {
        *self == CellStyle::default()
    }
}
