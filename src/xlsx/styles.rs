//! styles.xml generation with deduplicated fonts, fills and cell formats

use indexmap::IndexSet;
use std::io::Write;

use super::xml_writer::XmlWriter;
use crate::error::Result;
use crate::types::{CellStyle, Fill, Font};
use crate::workbook::Workbook;

/// Fill ids 0 and 1 are reserved by the format (none, gray125)
const RESERVED_FILLS: u32 = 2;

/// Workbook-wide style table. The position of a style in `xfs` is its `s` attribute.
#[derive(Debug)]
pub(crate) struct StyleTable {
    xfs: IndexSet<CellStyle>,
    fonts: IndexSet<Font>,
    fills: IndexSet<Fill>,
}

impl StyleTable {
    pub(crate) fn build(workbook: &Workbook) -> Self {
        let mut table = StyleTable {
            xfs: IndexSet::new(),
            fonts: IndexSet::new(),
            fills: IndexSet::new(),
        };
        table.register(&CellStyle::default());

        for sheet in workbook.sheets() {
            for (_, cell) in sheet.cells() {
                table.register(&cell.style);
            }
        }
        table
    }

    fn register(&mut self, style: &CellStyle) {
        if self.xfs.contains(style) {
            return;
        }
        self.fonts.insert(style.font.clone());
        if let Fill::Solid(_) = style.fill {
            self.fills.insert(style.fill);
        }
        self.xfs.insert(style.clone());
    }

    /// Cell format index for a style; unknown styles fall back to the default
    pub(crate) fn xf_id(&self, style: &CellStyle) -> u32 {
        self.xfs.get_index_of(style).unwrap_or(0) as u32
    }

    pub(crate) fn xf_count(&self) -> usize {
        self.xfs.len()
    }

    fn font_id(&self, font: &Font) -> u32 {
        self.fonts.get_index_of(font).unwrap_or(0) as u32
    }

    fn fill_id(&self, fill: &Fill) -> u32 {
        match fill {
            Fill::None => 0,
            solid => self
                .fills
                .get_index_of(solid)
                .map_or(0, |idx| idx as u32 + RESERVED_FILLS),
        }
    }

    pub(crate) fn write_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> Result<()> {
        writer.declaration()?;
        writer.start_element("styleSheet")?;
        writer.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
        )?;
        writer.close_start_tag()?;

        writer.start_element("fonts")?;
        writer.attribute_int("count", self.fonts.len())?;
        writer.close_start_tag()?;
        for font in &self.fonts {
            write_font(writer, font)?;
        }
        writer.end_element("fonts")?;

        writer.start_element("fills")?;
        writer.attribute_int("count", self.fills.len() + RESERVED_FILLS as usize)?;
        writer.close_start_tag()?;
        writer.write_str("<fill><patternFill patternType=\"none\"/></fill>")?;
        writer.write_str("<fill><patternFill patternType=\"gray125\"/></fill>")?;
        for fill in &self.fills {
            write_fill(writer, fill)?;
        }
        writer.end_element("fills")?;

        writer.write_str(
            "<borders count=\"1\"><border><left/><right/><top/><bottom/><diagonal/></border></borders>",
        )?;
        writer.write_str(
            "<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>",
        )?;

        writer.start_element("cellXfs")?;
        writer.attribute_int("count", self.xfs.len())?;
        writer.close_start_tag()?;
        for style in &self.xfs {
            self.write_xf(writer, style)?;
        }
        writer.end_element("cellXfs")?;

        writer.write_str(
            "<cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>",
        )?;
        writer.end_element("styleSheet")?;
        writer.flush()
    }

    fn write_xf<W: Write>(&self, writer: &mut XmlWriter<W>, style: &CellStyle) -> Result<()> {
        let font_id = self.font_id(&style.font);
        let fill_id = self.fill_id(&style.fill);

        writer.start_element("xf")?;
        writer.attribute_int("numFmtId", 0u32)?;
        writer.attribute_int("fontId", font_id)?;
        writer.attribute_int("fillId", fill_id)?;
        writer.attribute_int("borderId", 0u32)?;
        writer.attribute_int("xfId", 0u32)?;
        if font_id != 0 {
            writer.attribute("applyFont", "1")?;
        }
        if fill_id != 0 {
            writer.attribute("applyFill", "1")?;
        }
        if style.alignment.is_default() {
            return writer.close_empty();
        }

        writer.attribute("applyAlignment", "1")?;
        writer.close_start_tag()?;
        writer.start_element("alignment")?;
        if let Some(vertical) = style.alignment.vertical {
            writer.attribute("vertical", vertical.as_str())?;
        }
        if style.alignment.wrap_text {
            writer.attribute("wrapText", "1")?;
        }
        writer.close_empty()?;
        writer.end_element("xf")
    }
}

fn write_font<W: Write>(writer: &mut XmlWriter<W>, font: &Font) -> Result<()> {
    writer.write_str("<font>")?;
    if font.bold {
        writer.write_str("<b/>")?;
    }
    writer.start_element("sz")?;
    writer.attribute_int("val", font.size)?;
    writer.close_empty()?;
    if let Some(color) = font.color {
        writer.start_element("color")?;
        writer.attribute("rgb", &color.argb_hex())?;
        writer.close_empty()?;
    }
    writer.start_element("name")?;
    writer.attribute("val", &font.name)?;
    writer.close_empty()?;
    writer.write_str("</font>")
}

fn write_fill<W: Write>(writer: &mut XmlWriter<W>, fill: &Fill) -> Result<()> {
    match fill {
        Fill::None => writer.write_str("<fill><patternFill patternType=\"none\"/></fill>"),
        Fill::Solid(color) => {
            writer.write_str("<fill><patternFill patternType=\"solid\">")?;
            writer.start_element("fgColor")?;
            writer.attribute("rgb", &color.argb_hex())?;
            writer.close_empty()?;
            writer.write_str("<bgColor indexed=\"64\"/></patternFill></fill>")
        }
    }
}
