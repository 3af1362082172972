//! Read-back of generated workbooks
//!
//! A small scanner over the package parts this crate writes. It is not a
//! general xlsx reader: it understands shared strings, typed cells, formulas,
//! frozen panes, column widths, list validations, defined names and the
//! bold/fill facts of cell formats, which is enough to check a file against
//! the header contract.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tracing::debug;
use zip::ZipArchive;

use crate::error::{Result, TemplateError};
use crate::template::schema::{
    validation_lists, ACTION_QUEUE, ACTION_QUEUE_HEADERS, CATALOG_HEADERS, CONFIG,
    ENHANCEMENT_REPORTS, ENHANCEMENT_REPORT_HEADERS, MASTER_DASHBOARD, MASTER_DASHBOARD_HEADERS,
    SHEETS,
};
use crate::template::LIST_FIRST_COLUMN;
use crate::types::{CellRange, CellRef, CellValue, MAX_COL};

/// Formatting facts of one cell format
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleFacts {
    pub bold: bool,
    /// ARGB of a solid fill, e.g. `FF111827`
    pub fill_rgb: Option<String>,
}

impl StyleFacts {
    pub fn has_fill(&self) -> bool {
        self.fill_rgb.is_some()
    }
}

/// One `<dataValidation>` as stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFacts {
    pub kind: String,
    pub sqref: String,
    pub formula: String,
}

impl ValidationFacts {
    /// Whether `cell` lies in any of the space-separated ranges
    pub fn covers(&self, cell: CellRef) -> bool {
        self.sqref
            .split_whitespace()
            .filter_map(|r| r.parse::<CellRange>().ok())
            .any(|r| r.contains(cell))
    }
}

/// Everything read from one worksheet part
#[derive(Debug, Clone, Default)]
pub struct SheetSnapshot {
    pub name: String,
    cells: BTreeMap<CellRef, (CellValue, u32)>,
    frozen_rows: Option<u32>,
    column_widths: BTreeMap<u32, f64>,
    validations: Vec<ValidationFacts>,
}

impl SheetSnapshot {
    pub fn value(&self, addr: &str) -> Option<&CellValue> {
        let cell: CellRef = addr.parse().ok()?;
        self.cells.get(&cell).map(|(value, _)| value)
    }

    /// Rendered values of `row` from column A to the last cell in that row
    pub fn row_values(&self, row: u32) -> Vec<String> {
        let start = CellRef { row, col: 1 };
        let end = CellRef {
            row,
            col: MAX_COL,
        };
        let mut values = Vec::new();
        for (cell, (value, _)) in self.cells.range(start..=end) {
            while values.len() + 1 < cell.col as usize {
                values.push(String::new());
            }
            values.push(value.as_string());
        }
        while values.last().is_some_and(|v: &String| v.is_empty()) {
            values.pop();
        }
        values
    }

    pub fn max_row(&self) -> u32 {
        self.cells.keys().next_back().map_or(0, |c| c.row)
    }

    pub fn max_column(&self) -> u32 {
        self.cells.keys().map(|c| c.col).max().unwrap_or(0)
    }

    pub fn frozen_rows(&self) -> Option<u32> {
        self.frozen_rows
    }

    pub fn column_width(&self, col: u32) -> Option<f64> {
        self.column_widths.get(&col).copied()
    }

    pub fn column_widths(&self) -> &BTreeMap<u32, f64> {
        &self.column_widths
    }

    pub fn validations(&self) -> &[ValidationFacts] {
        &self.validations
    }

    /// The validation governing `addr`, if any
    pub fn validation_at(&self, addr: &str) -> Option<&ValidationFacts> {
        let cell: CellRef = addr.parse().ok()?;
        self.validations.iter().find(|v| v.covers(cell))
    }

    fn style_id(&self, addr: &str) -> Option<u32> {
        let cell: CellRef = addr.parse().ok()?;
        self.cells.get(&cell).map(|(_, style)| *style)
    }
}

/// Parsed contents of an xlsx file
#[derive(Debug, Clone)]
pub struct TemplateReader {
    sheets: Vec<SheetSnapshot>,
    defined_names: Vec<(String, String)>,
    styles: Vec<StyleFacts>,
}

impl TemplateReader {
    /// Open and fully parse an xlsx file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;

        let shared_strings = match read_part(&mut archive, "xl/sharedStrings.xml") {
            Ok(xml) => parse_shared_strings(&xml),
            Err(_) => Vec::new(),
        };
        let styles = match read_part(&mut archive, "xl/styles.xml") {
            Ok(xml) => parse_styles(&xml),
            Err(_) => Vec::new(),
        };

        let workbook_xml = read_part(&mut archive, "xl/workbook.xml")?;
        let rels_xml = read_part(&mut archive, "xl/_rels/workbook.xml.rels")?;
        let targets: BTreeMap<String, String> = elements(&rels_xml, "Relationship")
            .into_iter()
            .filter_map(|rel| Some((attr(rel.tag, "Id")?, attr(rel.tag, "Target")?)))
            .collect();

        let mut sheets = Vec::new();
        for sheet in elements(&workbook_xml, "sheet") {
            let name = attr(sheet.tag, "name")
                .ok_or_else(|| TemplateError::ReadError("sheet without a name".into()))?;
            let target = attr(sheet.tag, "r:id")
                .and_then(|rid| targets.get(&rid).cloned())
                .ok_or_else(|| {
                    TemplateError::ReadError(format!("no relationship for sheet '{}'", name))
                })?;
            let part = match target.strip_prefix('/') {
                Some(absolute) => absolute.to_string(),
                None => format!("xl/{}", target),
            };
            let xml = read_part(&mut archive, &part)?;
            sheets.push(parse_sheet(name, &xml, &shared_strings));
        }

        let defined_names = elements(&workbook_xml, "definedName")
            .into_iter()
            .filter_map(|dn| Some((attr(dn.tag, "name")?, decode_xml_entities(dn.inner?))))
            .collect();

        debug!(sheets = sheets.len(), strings = shared_strings.len(), "read workbook");
        Ok(TemplateReader {
            sheets,
            defined_names,
            styles,
        })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn sheet(&self, name: &str) -> Result<&SheetSnapshot> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| TemplateError::SheetNotFound {
                sheet: name.to_string(),
                available: self.sheet_names().join(", "),
            })
    }

    /// `(name, reference)` pairs, e.g. `("Priorities", "Config!$N$4:$N$7")`
    pub fn defined_names(&self) -> &[(String, String)] {
        &self.defined_names
    }

    /// Sheet and range a defined name points at
    pub fn resolve_name(&self, name: &str) -> Result<(String, CellRange)> {
        let (_, reference) = self
            .defined_names
            .iter()
            .find(|(n, _)| n == name)
            .ok_or_else(|| TemplateError::InvalidName(format!("'{}' is not defined", name)))?;
        let (sheet, range) = reference
            .rsplit_once('!')
            .ok_or_else(|| TemplateError::InvalidRange(reference.clone()))?;
        let sheet = match sheet.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
            Some(quoted) => quoted.replace("''", "'"),
            None => sheet.to_string(),
        };
        Ok((sheet, range.parse()?))
    }

    /// Values covered by a defined name, top to bottom, left to right
    pub fn named_values(&self, name: &str) -> Result<Vec<String>> {
        let (sheet, range) = self.resolve_name(name)?;
        let snapshot = self.sheet(&sheet)?;
        let mut values = Vec::new();
        for row in range.start.row..=range.end.row {
            for col in range.start.col..=range.end.col {
                let value = snapshot
                    .cells
                    .get(&CellRef { row, col })
                    .map(|(v, _)| v.as_string())
                    .unwrap_or_default();
                values.push(value);
            }
        }
        Ok(values)
    }

    /// Bold and fill facts of a cell; unstyled or missing cells give the default
    pub fn cell_style(&self, sheet: &str, addr: &str) -> Result<StyleFacts> {
        let id = self.sheet(sheet)?.style_id(addr).unwrap_or(0);
        Ok(self.styles.get(id as usize).cloned().unwrap_or_default())
    }
}

/// Check sheet order, header rows and the dropdown lists of a template file
pub fn verify_contract(reader: &TemplateReader) -> Result<()> {
    let names = reader.sheet_names();
    if names != SHEETS {
        return Err(TemplateError::ContractViolation {
            sheet: "(workbook)".to_string(),
            detail: format!("expected sheets {:?}, found {:?}", SHEETS, names),
        });
    }

    // The Config catalog shares its rows with the dropdown lists from column L on
    let header_rows: [(&str, u32, &[&str], u32); 4] = [
        (MASTER_DASHBOARD, 1, &MASTER_DASHBOARD_HEADERS, MAX_COL),
        (ENHANCEMENT_REPORTS, 1, &ENHANCEMENT_REPORT_HEADERS, MAX_COL),
        (ACTION_QUEUE, 1, &ACTION_QUEUE_HEADERS, MAX_COL),
        (CONFIG, 11, &CATALOG_HEADERS, LIST_FIRST_COLUMN - 1),
    ];
    for (sheet, row, expected, last_col) in header_rows {
        let mut found = reader.sheet(sheet)?.row_values(row);
        found.truncate(last_col as usize);
        while found.last().is_some_and(|v| v.is_empty()) {
            found.pop();
        }
        if found != expected {
            return Err(TemplateError::ContractViolation {
                sheet: sheet.to_string(),
                detail: format!("row {} headers {:?} differ from {:?}", row, found, expected),
            });
        }
    }

    for list in validation_lists() {
        let values = reader.named_values(list.name).map_err(|e| {
            TemplateError::ContractViolation {
                sheet: CONFIG.to_string(),
                detail: format!("named range {}: {}", list.name, e),
            }
        })?;
        if values != list.values {
            return Err(TemplateError::ContractViolation {
                sheet: CONFIG.to_string(),
                detail: format!("named range {} holds {:?}", list.name, values),
            });
        }
    }

    debug!("header contract verified");
    Ok(())
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut part = archive
        .by_name(name)
        .map_err(|e| TemplateError::ReadError(format!("{}: {}", name, e)))?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml)
}

// Decode XML entities (&lt; &gt; &quot; &apos; &amp;)
fn decode_xml_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Start tag text and inner content of one element
struct Element<'a> {
    tag: &'a str,
    inner: Option<&'a str>,
}

/// Every `<name ...>` element in document order; same-name nesting is not supported
fn elements<'a>(xml: &'a str, name: &str) -> Vec<Element<'a>> {
    let open = format!("<{}", name);
    let close = format!("</{}>", name);
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(offset) = xml[pos..].find(&open) {
        let start = pos + offset;
        let after = start + open.len();
        // Skip longer names sharing the prefix, e.g. <fills when looking for <fill
        if !matches!(xml.as_bytes().get(after).copied(), Some(b' ' | b'>' | b'/')) {
            pos = after;
            continue;
        }
        let Some(tag_len) = xml[start..].find('>') else {
            break;
        };
        let tag_end = start + tag_len + 1;
        let tag = &xml[start..tag_end];

        if tag.ends_with("/>") {
            found.push(Element { tag, inner: None });
            pos = tag_end;
            continue;
        }
        match xml[tag_end..].find(&close) {
            Some(inner_len) => {
                found.push(Element {
                    tag,
                    inner: Some(&xml[tag_end..tag_end + inner_len]),
                });
                pos = tag_end + inner_len + close.len();
            }
            None => break,
        }
    }
    found
}

fn attr(tag: &str, name: &str) -> Option<String> {
    let needle = format!(" {}=\"", name);
    let start = tag.find(&needle)? + needle.len();
    let len = tag[start..].find('"')?;
    Some(decode_xml_entities(&tag[start..start + len]))
}

fn parse_shared_strings(xml: &str) -> Vec<String> {
    elements(xml, "si")
        .into_iter()
        .map(|si| {
            // Rich text runs are concatenated
            si.inner
                .map(|inner| {
                    elements(inner, "t")
                        .into_iter()
                        .filter_map(|t| t.inner)
                        .map(decode_xml_entities)
                        .collect::<String>()
                })
                .unwrap_or_default()
        })
        .collect()
}

fn parse_styles(xml: &str) -> Vec<StyleFacts> {
    let section = |name: &str| {
        elements(xml, name)
            .into_iter()
            .next()
            .and_then(|e| e.inner)
            .unwrap_or("")
    };

    let fonts: Vec<bool> = elements(section("fonts"), "font")
        .into_iter()
        .map(|font| font.inner.is_some_and(|inner| !elements(inner, "b").is_empty()))
        .collect();
    let fills: Vec<Option<String>> = elements(section("fills"), "fill")
        .into_iter()
        .map(|fill| {
            let inner = fill.inner?;
            let pattern = elements(inner, "patternFill").into_iter().next()?;
            if attr(pattern.tag, "patternType").as_deref() != Some("solid") {
                return None;
            }
            let fg = elements(pattern.inner?, "fgColor").into_iter().next()?;
            attr(fg.tag, "rgb")
        })
        .collect();

    elements(section("cellXfs"), "xf")
        .into_iter()
        .map(|xf| {
            let index = |name: &str| {
                attr(xf.tag, name)
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(0)
            };
            StyleFacts {
                bold: fonts.get(index("fontId")).copied().unwrap_or(false),
                fill_rgb: fills.get(index("fillId")).cloned().flatten(),
            }
        })
        .collect()
}

fn parse_sheet(name: String, xml: &str, shared_strings: &[String]) -> SheetSnapshot {
    let mut snapshot = SheetSnapshot {
        name,
        ..SheetSnapshot::default()
    };

    if let Some(pane) = elements(xml, "pane").into_iter().next() {
        if attr(pane.tag, "state").as_deref() == Some("frozen") {
            snapshot.frozen_rows = attr(pane.tag, "ySplit").and_then(|v| v.parse().ok());
        }
    }

    for col in elements(xml, "col") {
        let bounds = (
            attr(col.tag, "min").and_then(|v| v.parse::<u32>().ok()),
            attr(col.tag, "max").and_then(|v| v.parse::<u32>().ok()),
            attr(col.tag, "width").and_then(|v| v.parse::<f64>().ok()),
        );
        if let (Some(min), Some(max), Some(width)) = bounds {
            for c in min..=max {
                snapshot.column_widths.insert(c, width);
            }
        }
    }

    for cell in elements(xml, "c") {
        let Some(cell_ref) = attr(cell.tag, "r").and_then(|r| r.parse::<CellRef>().ok()) else {
            continue;
        };
        let style = attr(cell.tag, "s")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let value = cell
            .inner
            .map(|inner| parse_cell_value(cell.tag, inner, shared_strings))
            .unwrap_or_default();
        snapshot.cells.insert(cell_ref, (value, style));
    }

    for dv in elements(xml, "dataValidation") {
        snapshot.validations.push(ValidationFacts {
            kind: attr(dv.tag, "type").unwrap_or_default(),
            sqref: attr(dv.tag, "sqref").unwrap_or_default(),
            formula: dv
                .inner
                .and_then(|inner| elements(inner, "formula1").into_iter().next())
                .and_then(|f| f.inner)
                .map(decode_xml_entities)
                .unwrap_or_default(),
        });
    }

    snapshot
}

fn parse_cell_value(tag: &str, inner: &str, shared_strings: &[String]) -> CellValue {
    let text_of = |name: &str| {
        elements(inner, name)
            .into_iter()
            .next()
            .and_then(|e| e.inner)
            .map(decode_xml_entities)
    };

    if let Some(formula) = text_of("f") {
        return CellValue::Formula(format!("={}", formula));
    }
    let kind = attr(tag, "t");
    if kind.as_deref() == Some("inlineStr") {
        return text_of("t").map(CellValue::String).unwrap_or_default();
    }
    let Some(raw) = text_of("v") else {
        return CellValue::Empty;
    };
    match kind.as_deref() {
        Some("s") => raw
            .parse::<usize>()
            .ok()
            .and_then(|idx| shared_strings.get(idx))
            .map(|s| CellValue::String(s.clone()))
            .unwrap_or_default(),
        Some("b") => CellValue::Bool(raw == "1"),
        Some("str") => CellValue::String(raw),
        _ => match raw.parse::<i64>() {
            Ok(n) => CellValue::Int(n),
            Err(_) => raw.parse::<f64>().map(CellValue::Float).unwrap_or_default(),
        },
    }
}
