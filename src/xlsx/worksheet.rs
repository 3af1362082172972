//! Worksheet part serialisation

use std::io::Write;

use super::shared_strings::SharedStrings;
use super::styles::StyleTable;
use super::xml_writer::XmlWriter;
use crate::error::Result;
use crate::types::{CellRef, CellValue};
use crate::worksheet::{Cell, Worksheet};

/// Writes one `xl/worksheets/sheetN.xml` part
///
/// Element order follows CT_Worksheet: dimension, sheetViews, sheetFormatPr,
/// cols, sheetData, dataValidations, pageMargins.
pub(crate) struct WorksheetXml<'a> {
    sheet: &'a Worksheet,
    styles: &'a StyleTable,
    selected: bool,
}

impl<'a> WorksheetXml<'a> {
    pub(crate) fn new(sheet: &'a Worksheet, styles: &'a StyleTable, selected: bool) -> Self {
        WorksheetXml {
            sheet,
            styles,
            selected,
        }
    }

    pub(crate) fn write<W: Write>(
        &self,
        xml: &mut XmlWriter<W>,
        strings: &mut SharedStrings,
    ) -> Result<()> {
        xml.declaration()?;
        xml.start_element("worksheet")?;
        xml.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
        )?;
        xml.attribute(
            "xmlns:r",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
        )?;
        xml.close_start_tag()?;

        xml.start_element("dimension")?;
        let dimension = self
            .sheet
            .dimension()
            .map_or_else(|| "A1".to_string(), |range| range.to_string());
        xml.attribute("ref", &dimension)?;
        xml.close_empty()?;

        self.write_sheet_views(xml)?;
        xml.write_str("<sheetFormatPr defaultRowHeight=\"15\"/>")?;
        self.write_cols(xml)?;
        self.write_sheet_data(xml, strings)?;
        self.write_validations(xml)?;

        xml.write_str(
            "<pageMargins left=\"0.7\" right=\"0.7\" top=\"0.75\" bottom=\"0.75\" header=\"0.3\" footer=\"0.3\"/>",
        )?;
        xml.end_element("worksheet")?;
        xml.flush()
    }

    fn write_sheet_views<W: Write>(&self, xml: &mut XmlWriter<W>) -> Result<()> {
        xml.write_str("<sheetViews>")?;
        xml.start_element("sheetView")?;
        if self.selected {
            xml.attribute("tabSelected", "1")?;
        }
        xml.attribute("workbookViewId", "0")?;

        match self.sheet.frozen_rows() {
            None => xml.close_empty()?,
            Some(rows) => {
                xml.close_start_tag()?;
                let top_left = CellRef { row: rows + 1, col: 1 };
                xml.start_element("pane")?;
                xml.attribute_int("ySplit", rows)?;
                xml.attribute("topLeftCell", &top_left.reference())?;
                xml.attribute("activePane", "bottomLeft")?;
                xml.attribute("state", "frozen")?;
                xml.close_empty()?;
                xml.start_element("selection")?;
                xml.attribute("pane", "bottomLeft")?;
                xml.attribute("activeCell", &top_left.reference())?;
                xml.attribute("sqref", &top_left.reference())?;
                xml.close_empty()?;
                xml.end_element("sheetView")?;
            }
        }
        xml.write_str("</sheetViews>")
    }

    fn write_cols<W: Write>(&self, xml: &mut XmlWriter<W>) -> Result<()> {
        let widths = self.sheet.column_widths();
        if widths.is_empty() {
            return Ok(());
        }
        xml.write_str("<cols>")?;
        for (&col, &width) in widths {
            xml.start_element("col")?;
            xml.attribute_int("min", col)?;
            xml.attribute_int("max", col)?;
            xml.attribute_float("width", width)?;
            xml.attribute("customWidth", "1")?;
            xml.close_empty()?;
        }
        xml.write_str("</cols>")
    }

    fn write_sheet_data<W: Write>(
        &self,
        xml: &mut XmlWriter<W>,
        strings: &mut SharedStrings,
    ) -> Result<()> {
        let rows = self.sheet.populated_rows();
        if rows.is_empty() {
            return xml.write_str("<sheetData/>");
        }

        xml.write_str("<sheetData>")?;
        for row in rows {
            xml.start_element("row")?;
            xml.attribute_int("r", row)?;
            if let Some(height) = self.sheet.row_height(row) {
                xml.attribute_float("ht", height)?;
                xml.attribute("customHeight", "1")?;
            }

            let mut cells = self.sheet.row_cells(row).peekable();
            if cells.peek().is_none() {
                xml.close_empty()?;
                continue;
            }
            xml.close_start_tag()?;
            for (cell_ref, cell) in cells {
                self.write_cell(xml, strings, cell_ref, cell)?;
            }
            xml.end_element("row")?;
        }
        xml.write_str("</sheetData>")
    }

    fn write_cell<W: Write>(
        &self,
        xml: &mut XmlWriter<W>,
        strings: &mut SharedStrings,
        cell_ref: &CellRef,
        cell: &Cell,
    ) -> Result<()> {
        xml.start_element("c")?;
        xml.attribute("r", &cell_ref.reference())?;
        let xf = self.styles.xf_id(&cell.style);
        if xf != 0 {
            xml.attribute_int("s", xf)?;
        }

        match &cell.value {
            CellValue::Empty => return xml.close_empty(),
            CellValue::String(s) => {
                let index = strings.add_string(s);
                xml.attribute("t", "s")?;
                xml.close_start_tag()?;
                xml.write_str("<v>")?;
                xml.write_int(index)?;
                xml.write_str("</v>")?;
            }
            CellValue::Int(n) => {
                xml.close_start_tag()?;
                xml.write_str("<v>")?;
                xml.write_int(*n)?;
                xml.write_str("</v>")?;
            }
            CellValue::Float(f) => {
                xml.close_start_tag()?;
                xml.text_element("v", &f.to_string())?;
            }
            CellValue::Bool(b) => {
                xml.attribute("t", "b")?;
                xml.close_start_tag()?;
                xml.write_str(if *b { "<v>1</v>" } else { "<v>0</v>" })?;
            }
            CellValue::Formula(formula) => {
                // No cached value; fullCalcOnLoad makes the application compute it
                xml.close_start_tag()?;
                xml.text_element("f", formula.strip_prefix('=').unwrap_or(formula))?;
            }
        }
        xml.end_element("c")
    }

    fn write_validations<W: Write>(&self, xml: &mut XmlWriter<W>) -> Result<()> {
        let validations = self.sheet.data_validations();
        if validations.is_empty() {
            return Ok(());
        }

        xml.start_element("dataValidations")?;
        xml.attribute_int("count", validations.len())?;
        xml.close_start_tag()?;
        for dv in validations {
            xml.start_element("dataValidation")?;
            xml.attribute("type", "list")?;
            if dv.allow_blank {
                xml.attribute("allowBlank", "1")?;
            }
            if dv.show_error {
                xml.attribute("showErrorMessage", "1")?;
            }
            xml.attribute("sqref", &dv.sqref())?;
            xml.close_start_tag()?;
            xml.text_element("formula1", &dv.source.formula())?;
            xml.end_element("dataValidation")?;
        }
        xml.end_element("dataValidations")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Color, Fill};
    use crate::validation::DataValidation;
    use crate::workbook::Workbook;

    fn render(workbook: &Workbook, name: &str) -> (String, SharedStrings) {
        let styles = StyleTable::build(workbook);
        let mut strings = SharedStrings::new();
        let mut output = Vec::new();
        let mut xml = XmlWriter::new(&mut output);
        WorksheetXml::new(workbook.sheet(name).unwrap(), &styles, true)
            .write(&mut xml, &mut strings)
            .unwrap();
        (String::from_utf8(output).unwrap(), strings)
    }

    #[test]
    fn test_cell_types() {
        let mut workbook = Workbook::new();
        let sheet = workbook.sheet_mut("Sheet1").unwrap();
        sheet.write("A1", "key").unwrap();
        sheet.write("B1", 25i64).unwrap();
        sheet.write("C1", false).unwrap();
        sheet
            .write("D1", CellValue::Formula("=TEXT(NOW(),\"yyyymmdd-hhmmss\")".into()))
            .unwrap();

        let (xml, strings) = render(&workbook, "Sheet1");
        assert_eq!(strings.count(), 1);
        assert!(xml.contains("<c r=\"A1\" t=\"s\"><v>0</v></c>"));
        assert!(xml.contains("<c r=\"B1\"><v>25</v></c>"));
        assert!(xml.contains("<c r=\"C1\" t=\"b\"><v>0</v></c>"));
        assert!(xml.contains(
            "<c r=\"D1\"><f>TEXT(NOW(),&quot;yyyymmdd-hhmmss&quot;)</f></c>"
        ));
        assert!(xml.contains("<dimension ref=\"A1:D1\"/>"));
    }

    #[test]
    fn test_layout_elements() {
        let mut workbook = Workbook::new();
        let sheet = workbook.sheet_mut("Sheet1").unwrap();
        sheet.write("A1", "timestamp_iso_ms").unwrap();
        sheet.update_style("B7".parse().unwrap(), |s| {
            s.fill = Fill::Solid(Color::rgb(0xDBEAFE))
        });
        sheet.set_row_height(7, 60.0);
        sheet.set_column_width(1, 18.0);
        sheet.freeze_rows(1);
        sheet.add_data_validation(
            DataValidation::literal_list(["TRUE", "FALSE"]).add_range("B9".parse().unwrap()),
        );

        let (xml, _) = render(&workbook, "Sheet1");
        assert!(xml.contains(
            "<pane ySplit=\"1\" topLeftCell=\"A2\" activePane=\"bottomLeft\" state=\"frozen\"/>"
        ));
        assert!(xml.contains("<col min=\"1\" max=\"1\" width=\"18\" customWidth=\"1\"/>"));
        assert!(xml.contains("<row r=\"7\" ht=\"60\" customHeight=\"1\"><c r=\"B7\" s=\"1\"/></row>"));
        assert!(xml.contains(
            "<dataValidation type=\"list\" showErrorMessage=\"1\" sqref=\"B9\"><formula1>&quot;TRUE,FALSE&quot;</formula1></dataValidation>"
        ));

        let cols = xml.find("<cols>").unwrap();
        let data = xml.find("<sheetData>").unwrap();
        let validations = xml.find("<dataValidations").unwrap();
        assert!(cols < data && data < validations);
    }

    #[test]
    fn test_pane_below_last_row() {
        let mut workbook = Workbook::new();
        workbook.sheet_mut("Sheet1").unwrap().freeze_rows(u32::MAX);

        let (xml, _) = render(&workbook, "Sheet1");
        assert!(xml.contains("<pane ySplit=\"1048575\" topLeftCell=\"A1048576\""));
    }

    #[test]
    fn test_empty_sheet() {
        let workbook = Workbook::new();
        let (xml, _) = render(&workbook, "Sheet1");
        assert!(xml.contains("<sheetData/>"));
        assert!(xml.contains("<sheetView tabSelected=\"1\" workbookViewId=\"0\"/>"));
    }
}
