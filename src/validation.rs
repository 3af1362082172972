//! List-type data validation rules

use crate::types::{CellRange, CellRef};

/// Where a dropdown takes its allowed values from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListSource {
    /// A workbook-level defined name, e.g. `ActionTypes`
    Named(String),
    /// A fixed set of values, stored inline as `"A,B,C"`
    Literal(Vec<String>),
}

impl ListSource {
    /// Text of the `<formula1>` element
    pub fn formula(&self) -> String {
        match self {
            ListSource::Named(name) => name.clone(),
            ListSource::Literal(values) => format!("\"{}\"", values.join(",")),
        }
    }
}

/// Dropdown restricting a set of cells to a list of values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataValidation {
    pub source: ListSource,
    pub allow_blank: bool,
    /// Reject values outside the list instead of only offering the dropdown
    pub show_error: bool,
    pub ranges: Vec<CellRange>,
}

impl DataValidation {
    /// Validation sourced from a defined name
    pub fn named_list(name: &str) -> Self {
        Self::new(ListSource::Named(name.to_string()))
    }

    /// Validation with an inline value list
    pub fn literal_list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(ListSource::Literal(
            values.into_iter().map(|v| v.as_ref().to_string()).collect(),
        ))
    }

    fn new(source: ListSource) -> Self {
        DataValidation {
            source,
            allow_blank: false,
            show_error: true,
            ranges: Vec::new(),
        }
    }

    pub fn allow_blank(mut self, allow: bool) -> Self {
        self.allow_blank = allow;
        self
    }

    /// Attach the rule to a range
    pub fn add_range(mut self, range: CellRange) -> Self {
        self.ranges.push(range);
        self
    }

    /// Whether the rule governs the given cell
    pub fn applies_to(&self, cell: CellRef) -> bool {
        self.ranges.iter().any(|r| r.contains(cell))
    }

    /// Space-separated `sqref` attribute value
    pub fn sqref(&self) -> String {
        self.ranges
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
