//! The Master Automation workbook template
//!
//! [`TemplateBuilder`] lays out six sheets: a README, a Dashboard control
//! panel with dropdown inputs, a Config sheet holding settings, the action
//! catalog and the dropdown source lists, the Action_Queue, and two
//! append-only log sheets. Nothing is executed; the file is the passive half
//! of a workflow run by an external processor.
//!
//! # Examples
//!
//! ```no_run
//! use dashboard_template::{TemplateBuilder, TemplateConfig};
//!
//! let path = TemplateBuilder::new(TemplateConfig::default())?
//!     .save("Master_Automation_Dashboard_Template.xlsx")?;
//! println!("wrote {}", path.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod schema;

pub use schema::SCHEMA_VERSION;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::TemplateConfig;
use crate::error::Result;
use crate::types::{Alignment, CellRange, CellRef, CellValue, Color, Fill, Font, VerticalAlign};
use crate::validation::DataValidation;
use crate::workbook::{DocumentProperties, Workbook};
use crate::worksheet::Worksheet;
use crate::xlsx::XlsxWriter;

use schema::*;

/// Header row background
pub const HEADER_FILL: Color = Color::rgb(0x111827);
/// Header row text
pub const HEADER_FONT_COLOR: Color = Color::rgb(0xF9FAFB);
/// Background of Dashboard input cells
pub const INPUT_FILL: Color = Color::rgb(0xDBEAFE);

/// Column of the first dropdown source list on Config (L)
pub const LIST_FIRST_COLUMN: u32 = 12;
/// Row where every dropdown source list starts
pub const LIST_FIRST_ROW: u32 = 4;

const CATALOG_TITLE_ROW: u32 = 10;
const CATALOG_HEADER_ROW: u32 = CATALOG_TITLE_ROW + 1;
const PARAMS_ROW_HEIGHT: f64 = 60.0;

/// Allocate a workbook holding exactly the template sheets, in order
pub fn create_workbook() -> Result<Workbook> {
    let mut workbook = Workbook::new();
    for name in workbook.sheet_names() {
        workbook.remove_sheet(&name)?;
    }
    for name in SHEETS {
        workbook.create_sheet(name)?;
    }
    Ok(workbook)
}

/// Apply the header look to every cell of `row` up to the sheet's last column
pub fn paint_header_row(sheet: &mut Worksheet, row: u32) -> Result<()> {
    for col in 1..=sheet.max_column() {
        sheet.update_style(CellRef::new(row, col)?, |style| {
            style.fill = Fill::Solid(HEADER_FILL);
            style.font = Font::default().bold().color(HEADER_FONT_COLOR);
            style.alignment.vertical = Some(VerticalAlign::Center);
        });
    }
    Ok(())
}

/// Paint `row` as a header and freeze the pane directly below it
pub fn style_header(sheet: &mut Worksheet, row: u32) -> Result<()> {
    paint_header_row(sheet, row)?;
    sheet.freeze_rows(row);
    Ok(())
}

/// Size every used column from the longest value in its first `sample_rows` rows
///
/// Width is the character count plus two, bounded by `min_width` and `max_width`.
/// Columns with no sampled values get `min_width`.
pub fn autosize_columns(sheet: &mut Worksheet, min_width: f64, max_width: f64, sample_rows: u32) {
    let last_row = sheet.max_row().min(sample_rows);
    let mut longest = vec![0usize; sheet.max_column() as usize];

    for (cell_ref, cell) in sheet.cells() {
        if cell_ref.row > last_row {
            break;
        }
        if cell.value.is_empty() {
            continue;
        }
        let slot = &mut longest[cell_ref.col as usize - 1];
        *slot = (*slot).max(cell.value.display_len());
    }

    for (idx, len) in longest.into_iter().enumerate() {
        let width = (len as f64 + 2.0).min(max_width).max(min_width);
        sheet.set_column_width(idx as u32 + 1, width);
    }
}

fn set_font(sheet: &mut Worksheet, addr: &str, font: Font) -> Result<()> {
    let cell: CellRef = addr.parse()?;
    sheet.update_style(cell, |style| style.font = font);
    Ok(())
}

fn write_header_row(sheet: &mut Worksheet, headers: &[&str]) -> Result<()> {
    sheet.write_row(1, headers.iter().copied())?;
    style_header(sheet, 1)
}

/// Builds the template workbook sheet by sheet
#[derive(Debug)]
pub struct TemplateBuilder {
    workbook: Workbook,
    config: TemplateConfig,
}

impl TemplateBuilder {
    pub fn new(config: TemplateConfig) -> Result<Self> {
        config.validate()?;
        let mut workbook = create_workbook()?;
        workbook.set_properties(DocumentProperties {
            title: Some(TEMPLATE_TITLE.to_string()),
            ..DocumentProperties::default()
        });
        Ok(TemplateBuilder { workbook, config })
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    fn autosize(&mut self, name: &str) -> Result<()> {
        let config = &self.config;
        let sheet = self.workbook.sheet_mut(name)?;
        autosize_columns(
            sheet,
            config.min_column_width,
            config.max_column_width,
            config.autosize_sample_rows,
        );
        Ok(())
    }

    pub fn write_readme(&mut self) -> Result<()> {
        let sheet = self.workbook.sheet_mut(README)?;

        sheet.write("A1", TEMPLATE_TITLE)?;
        set_font(sheet, "A1", Font::default().bold().size(14))?;
        sheet.write("A3", "How to use")?;
        set_font(sheet, "A3", Font::default().bold().size(12))?;
        sheet.write(
            "A4",
            "1) Use the Dashboard sheet to select an ActionType, TargetType, TargetId, and Params JSON.",
        )?;
        sheet.write(
            "A5",
            "2) Set Enqueue = TRUE to request execution (your Apps Script onEdit handler will append to Action_Queue).",
        )?;
        sheet.write(
            "A6",
            "3) A separate processor (time trigger / menu action) should pull queued rows and run actions.",
        )?;
        sheet.write(
            "A7",
            "4) Log all activity to 'Master Dashboard' and write any outputs/results back to the queue row.",
        )?;
        sheet.write(
            "A9",
            "Core design goal: the spreadsheet is the control plane; Apps Script is the execution engine.",
        )?;
        sheet.write("A11", "Sheets in this workbook")?;
        set_font(sheet, "A11", Font::default().bold())?;
        sheet.write_column(
            CellRef::new(12, 1)?,
            SHEETS.iter().map(|name| format!("- {}", name)),
        )?;

        self.autosize(README)?;
        debug!(sheet = README, "wrote sheet");
        Ok(())
    }

    /// Settings, action catalog and the named dropdown source lists
    pub fn write_config(&mut self) -> Result<()> {
        let sheet = self.workbook.sheet_mut(CONFIG)?;

        sheet.write("A1", "Settings")?;
        set_font(sheet, "A1", Font::default().bold().size(12))?;
        sheet.write_row(2, ["key", "value"])?;
        style_header(sheet, 2)?;
        for (idx, (key, value)) in SETTINGS.iter().enumerate() {
            sheet.write_row(3 + idx as u32, [*key, *value])?;
        }

        let title = CellRef::new(CATALOG_TITLE_ROW, 1)?;
        sheet.write_at(title, "Action Catalog");
        sheet.update_style(title, |style| style.font = Font::default().bold().size(12));
        sheet.write_row(CATALOG_HEADER_ROW, CATALOG_HEADERS)?;
        // Painted only; the pane stays frozen under the settings header
        paint_header_row(sheet, CATALOG_HEADER_ROW)?;

        for (idx, entry) in action_catalog().into_iter().enumerate() {
            let row: [CellValue; 8] = [
                entry.action_type.into(),
                entry.description.into(),
                entry.handler_function.into(),
                entry.default_target_type.into(),
                entry.params_schema.to_string().into(),
                entry.enabled.into(),
                entry.requires_auth_scopes.into(),
                entry.notes.into(),
            ];
            sheet.write_row(CATALOG_HEADER_ROW + 1 + idx as u32, row)?;
        }

        sheet.write("L2", "Lists (for data validation)")?;
        set_font(sheet, "L2", Font::default().bold())?;

        let mut spans = Vec::new();
        for (offset, list) in validation_lists().into_iter().enumerate() {
            let col = LIST_FIRST_COLUMN + offset as u32;
            let written =
                sheet.write_column(CellRef::new(LIST_FIRST_ROW, col)?, list.values.iter().copied())?;
            spans.push((list.name, CellRange::column_span(col, LIST_FIRST_ROW, written)?));
        }

        self.autosize(CONFIG)?;
        for (name, range) in spans {
            self.workbook.define_name(name, CONFIG, range)?;
        }
        debug!(sheet = CONFIG, names = self.workbook.defined_names().count(), "wrote sheet");
        Ok(())
    }

    /// Control panel: labelled inputs with dropdowns and formula-driven status
    pub fn write_dashboard(&mut self) -> Result<()> {
        let sheet = self.workbook.sheet_mut(DASHBOARD)?;

        sheet.write("A1", "Dashboard Control Panel")?;
        set_font(sheet, "A1", Font::default().bold().size(14))?;

        let labels = [
            ("A3", "Request ID (auto)"),
            ("A4", "Action Type"),
            ("A5", "Target Type"),
            ("A6", "Target ID / Key"),
            ("A7", "Params (JSON)"),
            ("A8", "Priority"),
            ("A9", "Enqueue (TRUE)"),
            ("A11", "Status"),
            ("A12", "Last Message"),
            ("A13", "Result Link"),
        ];
        for (addr, text) in labels {
            let cell: CellRef = addr.parse()?;
            sheet.write_at(cell, text);
            sheet.update_style(cell, |style| {
                style.font = Font::default().bold();
                style.alignment.vertical = Some(VerticalAlign::Center);
            });
        }

        for row in 4..=9 {
            sheet.update_style(CellRef::new(row, 2)?, |style| {
                style.fill = Fill::Solid(INPUT_FILL)
            });
        }

        sheet.write("B3", CellValue::Formula(REQUEST_ID_FORMULA.into()))?;
        sheet.write("B8", "NORMAL")?;
        sheet.write("B9", false)?;

        // Read-only outputs; B13 (Result Link) stays blank for the processor
        sheet.write("B11", CellValue::Formula(STATUS_FORMULA.into()))?;
        sheet.write("B12", CellValue::Formula(LAST_MESSAGE_FORMULA.into()))?;

        let params: CellRef = "B7".parse()?;
        sheet.update_style(params, |style| {
            style.font = Font::default().name("Consolas");
            style.alignment = Alignment {
                vertical: Some(VerticalAlign::Top),
                wrap_text: true,
            };
        });
        sheet.set_row_height(params.row, PARAMS_ROW_HEIGHT);

        let rules = [
            (DataValidation::named_list(ACTION_TYPES), "B4"),
            (DataValidation::named_list(TARGET_TYPES), "B5"),
            (DataValidation::named_list(PRIORITIES), "B8"),
            (DataValidation::literal_list(["TRUE", "FALSE"]), "B9"),
        ];
        for (rule, addr) in rules {
            sheet.add_data_validation(rule.add_range(addr.parse()?));
        }

        self.autosize(DASHBOARD)?;
        debug!(sheet = DASHBOARD, "wrote sheet");
        Ok(())
    }

    /// Queue header, two example requests and column-wide dropdowns
    pub fn write_action_queue(&mut self) -> Result<()> {
        let last_row = self.config.validation_last_row;
        let sheet = self.workbook.sheet_mut(ACTION_QUEUE)?;
        write_header_row(sheet, &ACTION_QUEUE_HEADERS)?;

        for (idx, request) in example_requests().into_iter().enumerate() {
            let row: [CellValue; 16] = [
                request.queue_id.into(),
                CellValue::Formula(QUEUE_TIMESTAMP_FORMULA.into()),
                request.requested_by.into(),
                request.action_type.into(),
                request.target_type.into(),
                request.target_id.into(),
                request.params.to_string().into(),
                request.priority.into(),
                request.status.into(),
                CellValue::Empty,
                CellValue::Empty,
                CellValue::Empty,
                CellValue::Empty,
                CellValue::Empty,
                CellValue::Empty,
                request.correlation_id.into(),
            ];
            sheet.write_row(2 + idx as u32, row)?;
        }

        let rules = [
            ("action_type", ACTION_TYPES),
            ("target_type", TARGET_TYPES),
            ("priority", PRIORITIES),
            ("status", STATUSES),
        ];
        for (header, list) in rules {
            if let Some(col) = column_of(&ACTION_QUEUE_HEADERS, header) {
                let range = CellRange::new(CellRef::new(2, col)?, CellRef::new(last_row, col)?)?;
                sheet.add_data_validation(DataValidation::named_list(list).add_range(range));
            }
        }

        self.autosize(ACTION_QUEUE)?;
        debug!(sheet = ACTION_QUEUE, "wrote sheet");
        Ok(())
    }

    /// Append-only activity log; header only
    pub fn write_master_dashboard(&mut self) -> Result<()> {
        write_header_row(self.workbook.sheet_mut(MASTER_DASHBOARD)?, &MASTER_DASHBOARD_HEADERS)?;
        self.autosize(MASTER_DASHBOARD)?;
        debug!(sheet = MASTER_DASHBOARD, "wrote sheet");
        Ok(())
    }

    /// Append-only enhancement log; header only
    pub fn write_enhancement_reports(&mut self) -> Result<()> {
        write_header_row(
            self.workbook.sheet_mut(ENHANCEMENT_REPORTS)?,
            &ENHANCEMENT_REPORT_HEADERS,
        )?;
        self.autosize(ENHANCEMENT_REPORTS)?;
        debug!(sheet = ENHANCEMENT_REPORTS, "wrote sheet");
        Ok(())
    }

    /// Run every sheet writer and hand back the finished workbook
    pub fn build(mut self) -> Result<Workbook> {
        self.write_readme()?;
        self.write_config()?;
        self.write_dashboard()?;
        self.write_action_queue()?;
        self.write_master_dashboard()?;
        self.write_enhancement_reports()?;
        Ok(self.workbook)
    }

    /// Build the template and write it to `path`, returning the path written
    pub fn save<P: AsRef<Path>>(self, path: P) -> Result<PathBuf> {
        let path = path.as_ref().to_path_buf();
        let level = self.config.compression_level;
        let workbook = self.build()?;
        XlsxWriter::new()
            .with_compression(level)
            .write_file(&workbook, &path)?;
        info!(path = %path.display(), "template written");
        Ok(path)
    }
}

/// Generate the template at `config.output`
pub fn generate(config: TemplateConfig) -> Result<PathBuf> {
    let output = config.output.clone();
    TemplateBuilder::new(config)?.save(output)
}
