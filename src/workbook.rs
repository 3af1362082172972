//! Workbook model: ordered sheets, defined names and document properties

use std::path::Path;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Result, TemplateError};
use crate::types::{CellRange, CellRef};
use crate::worksheet::Worksheet;
use crate::xlsx::XlsxWriter;

/// Name of the sheet every fresh workbook starts with
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

const MAX_SHEET_NAME_LEN: usize = 31;
const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Workbook-scoped label bound to a rectangular region of one sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedName {
    pub name: String,
    pub sheet: String,
    pub range: CellRange,
}

impl DefinedName {
    /// Reference text as stored in workbook.xml, e.g. `Config!$L$4:$L$8`
    pub fn formula(&self) -> String {
        format!("{}!{}", quote_sheet_name(&self.sheet), self.range.absolute())
    }
}

/// Quote a sheet name for use in a reference when it needs quoting
///
/// Names that would otherwise read as an A1 or R1C1 reference, or as a
/// boolean literal, are quoted too.
pub fn quote_sheet_name(name: &str) -> String {
    let bare = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !reads_as_reference(name);
    if bare {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

fn reads_as_reference(name: &str) -> bool {
    fn skip_digits(s: &str) -> &str {
        s.trim_start_matches(|c: char| c.is_ascii_digit())
    }

    if name.eq_ignore_ascii_case("TRUE") || name.eq_ignore_ascii_case("FALSE") {
        return true;
    }
    if name.parse::<CellRef>().is_ok() {
        return true;
    }

    // R1C1 forms: R, C, RC, R2, C3, R1C1
    let upper = name.to_ascii_uppercase();
    let mut rest = upper.as_str();
    let mut parts = 0;
    if let Some(after) = rest.strip_prefix('R') {
        rest = skip_digits(after);
        parts += 1;
    }
    if let Some(after) = rest.strip_prefix('C') {
        rest = skip_digits(after);
        parts += 1;
    }
    parts > 0 && rest.is_empty()
}

/// docProps metadata
#[derive(Debug, Clone)]
pub struct DocumentProperties {
    pub creator: String,
    pub title: Option<String>,
    pub created: DateTime<Utc>,
}

impl Default for DocumentProperties {
    fn default() -> Self {
        DocumentProperties {
            creator: env!("CARGO_PKG_NAME").to_string(),
            title: None,
            created: Utc::now(),
        }
    }
}

/// Ordered collection of named sheets
///
/// # Examples
///
/// ```no_run
/// use dashboard_template::Workbook;
///
/// let mut workbook = Workbook::new();
/// workbook.sheet_mut("Sheet1")?.write("A1", "Hello")?;
/// workbook.save("hello.xlsx")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
    defined_names: IndexMap<String, DefinedName>,
    properties: DocumentProperties,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    /// Create a workbook holding the default `Sheet1`
    pub fn new() -> Self {
        Workbook {
            sheets: vec![Worksheet::new(DEFAULT_SHEET_NAME)],
            defined_names: IndexMap::new(),
            properties: DocumentProperties::default(),
        }
    }

    /// Append a new sheet
    pub fn create_sheet(&mut self, name: &str) -> Result<&mut Worksheet> {
        validate_sheet_name(name)?;
        if self.position(name).is_some() {
            return Err(TemplateError::DuplicateSheet(name.to_string()));
        }
        debug!(sheet = name, "created sheet");
        self.sheets.push(Worksheet::new(name));
        let last = self.sheets.len() - 1;
        Ok(&mut self.sheets[last])
    }

    /// Remove a sheet and every defined name pointing into it
    pub fn remove_sheet(&mut self, name: &str) -> Result<Worksheet> {
        let idx = self.position(name).ok_or_else(|| self.not_found(name))?;
        let removed = self.sheets.remove(idx);
        self.defined_names
            .retain(|_, dn| !dn.sheet.eq_ignore_ascii_case(removed.name()));
        Ok(removed)
    }

    pub fn sheet(&self, name: &str) -> Result<&Worksheet> {
        self.position(name)
            .map(|idx| &self.sheets[idx])
            .ok_or_else(|| self.not_found(name))
    }

    pub fn sheet_mut(&mut self, name: &str) -> Result<&mut Worksheet> {
        match self.position(name) {
            Some(idx) => Ok(&mut self.sheets[idx]),
            None => Err(self.not_found(name)),
        }
    }

    pub fn sheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Bind `name` to `range` on `sheet`
    pub fn define_name(&mut self, name: &str, sheet: &str, range: CellRange) -> Result<()> {
        validate_defined_name(name)?;
        if self
            .defined_names
            .keys()
            .any(|existing| existing.eq_ignore_ascii_case(name))
        {
            return Err(TemplateError::InvalidName(format!("'{}' is already defined", name)));
        }
        let sheet = self.sheet(sheet)?.name().to_string();
        self.defined_names.insert(
            name.to_string(),
            DefinedName {
                name: name.to_string(),
                sheet,
                range,
            },
        );
        Ok(())
    }

    pub fn defined_name(&self, name: &str) -> Option<&DefinedName> {
        self.defined_names.get(name)
    }

    /// Defined names in creation order
    pub fn defined_names(&self) -> impl Iterator<Item = &DefinedName> {
        self.defined_names.values()
    }

    pub fn properties(&self) -> &DocumentProperties {
        &self.properties
    }

    pub fn set_properties(&mut self, properties: DocumentProperties) {
        self.properties = properties;
    }

    /// Serialise to `path` with the default compression level
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        XlsxWriter::new().write_file(self, path)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.sheets
            .iter()
            .position(|s| s.name().eq_ignore_ascii_case(name))
    }

    fn not_found(&self, name: &str) -> TemplateError {
        TemplateError::SheetNotFound {
            sheet: name.to_string(),
            available: self.sheet_names().join(", "),
        }
    }
}

fn validate_sheet_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if len == 0
        || len > MAX_SHEET_NAME_LEN
        || name.contains(FORBIDDEN_SHEET_CHARS)
        || name.starts_with('\'')
        || name.ends_with('\'')
    {
        return Err(TemplateError::InvalidSheetName(name.to_string()));
    }
    Ok(())
}

fn validate_defined_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '\\');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    // Names that read as cell references would be ambiguous in formulas
    let looks_like_cell = name.parse::<CellRef>().is_ok();
    if !valid_start || !valid_rest || looks_like_cell {
        return Err(TemplateError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_workbook_has_default_sheet() {
        let workbook = Workbook::new();
        assert_eq!(workbook.sheet_names(), vec!["Sheet1"]);
    }

    #[test]
    fn test_create_and_remove_sheets() {
        let mut workbook = Workbook::new();
        workbook.create_sheet("README").unwrap();
        workbook.create_sheet("Master Dashboard").unwrap();
        workbook.remove_sheet(DEFAULT_SHEET_NAME).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["README", "Master Dashboard"]);

        assert!(matches!(
            workbook.create_sheet("readme"),
            Err(TemplateError::DuplicateSheet(_))
        ));
        assert!(matches!(
            workbook.remove_sheet("Missing"),
            Err(TemplateError::SheetNotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_sheet_names() {
        let mut workbook = Workbook::new();
        let too_long = "x".repeat(32);
        for bad in ["", "a/b", "Q[1]", "'quoted'", too_long.as_str()] {
            assert!(
                matches!(workbook.create_sheet(bad), Err(TemplateError::InvalidSheetName(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_define_name() {
        let mut workbook = Workbook::new();
        workbook.create_sheet("Config").unwrap();
        let range = CellRange::column_span(12, 4, 5).unwrap();
        workbook.define_name("ActionTypes", "Config", range).unwrap();

        let dn = workbook.defined_name("ActionTypes").unwrap();
        assert_eq!(dn.formula(), "Config!$L$4:$L$8");

        assert!(workbook.define_name("actiontypes", "Config", range).is_err());
        assert!(workbook.define_name("B4", "Config", range).is_err());
        assert!(workbook.define_name("1st", "Config", range).is_err());
        assert!(workbook.define_name("Orphan", "Nowhere", range).is_err());
    }

    #[test]
    fn test_removing_sheet_drops_its_names() {
        let mut workbook = Workbook::new();
        workbook.create_sheet("Config").unwrap();
        let range = CellRange::column_span(14, 4, 4).unwrap();
        workbook.define_name("Priorities", "Config", range).unwrap();
        workbook.remove_sheet("Config").unwrap();
        assert_eq!(workbook.defined_names().count(), 0);
    }

    #[test]
    fn test_quote_sheet_name() {
        assert_eq!(quote_sheet_name("Config"), "Config");
        assert_eq!(quote_sheet_name("Action_Queue"), "Action_Queue");
        assert_eq!(quote_sheet_name("Master Dashboard"), "'Master Dashboard'");
        assert_eq!(quote_sheet_name("Bob's"), "'Bob''s'");
        assert_eq!(quote_sheet_name("2024"), "'2024'");
        assert_eq!(quote_sheet_name("Sheet1"), "Sheet1");
    }

    #[test]
    fn test_quote_sheet_name_that_reads_as_reference() {
        assert_eq!(quote_sheet_name("A1"), "'A1'");
        assert_eq!(quote_sheet_name("xfd100"), "'xfd100'");
        assert_eq!(quote_sheet_name("R1C1"), "'R1C1'");
        assert_eq!(quote_sheet_name("RC"), "'RC'");
        assert_eq!(quote_sheet_name("R"), "'R'");
        assert_eq!(quote_sheet_name("C12"), "'C12'");
        assert_eq!(quote_sheet_name("TRUE"), "'TRUE'");
        assert_eq!(quote_sheet_name("false"), "'false'");
        assert_eq!(quote_sheet_name("Rates"), "Rates");
    }
}
