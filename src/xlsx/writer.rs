//! OOXML package writer

use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

use super::shared_strings::SharedStrings;
use super::styles::StyleTable;
use super::worksheet::WorksheetXml;
use super::xml_writer::XmlWriter;
use crate::error::{Result, TemplateError};
use crate::workbook::Workbook;

/// Deflate level used when none is configured
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Serialises a [`Workbook`] into an xlsx archive
///
/// # Examples
///
/// ```no_run
/// use dashboard_template::{Workbook, XlsxWriter};
///
/// let workbook = Workbook::new();
/// XlsxWriter::new()
///     .with_compression(9)
///     .write_file(&workbook, "empty.xlsx")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct XlsxWriter {
    compression_level: u32,
}

impl Default for XlsxWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl XlsxWriter {
    pub fn new() -> Self {
        XlsxWriter {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }

    /// Set deflate level (0-9); 0 stores parts uncompressed, higher values are capped at 9
    pub fn with_compression(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }

    /// Write the workbook to `path`
    ///
    /// The archive is assembled in a temporary file next to `path` and renamed
    /// over it on success, so an existing file is never left half written.
    pub fn write_file<P: AsRef<Path>>(&self, workbook: &Workbook, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let temp = NamedTempFile::new_in(dir)?;
        let buffered = BufWriter::with_capacity(64 * 1024, temp);
        let buffered = self.write(workbook, buffered)?;
        let temp = buffered.into_inner().map_err(|e| e.into_error())?;
        temp.persist(path)?;

        info!(
            path = %path.display(),
            sheets = workbook.sheet_count(),
            "saved workbook"
        );
        Ok(())
    }

    /// Write the archive into any seekable sink, returning the sink
    pub fn write<W: Write + Seek>(&self, workbook: &Workbook, writer: W) -> Result<W> {
        if workbook.sheet_count() == 0 {
            return Err(TemplateError::WriteError(
                "workbook has no sheets".to_string(),
            ));
        }

        let options = match self.compression_level {
            0 => SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
            level => SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(i64::from(level))),
        };
        let mut zip = ZipWriter::new(writer);
        let sheet_count = workbook.sheet_count();

        zip.start_file("[Content_Types].xml", options)?;
        write_content_types(&mut zip, sheet_count)?;

        zip.start_file("_rels/.rels", options)?;
        write_root_rels(&mut zip)?;

        zip.start_file("docProps/core.xml", options)?;
        write_core_props(&mut zip, workbook)?;

        zip.start_file("docProps/app.xml", options)?;
        write_app_props(&mut zip, workbook)?;

        zip.start_file("xl/workbook.xml", options)?;
        write_workbook_xml(&mut zip, workbook)?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        write_workbook_rels(&mut zip, sheet_count)?;

        let styles = StyleTable::build(workbook);
        zip.start_file("xl/styles.xml", options)?;
        styles.write_xml(&mut XmlWriter::new(&mut zip))?;

        let mut strings = SharedStrings::new();
        for (idx, sheet) in workbook.sheets().iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", idx + 1), options)?;
            WorksheetXml::new(sheet, &styles, idx == 0)
                .write(&mut XmlWriter::new(&mut zip), &mut strings)?;
            debug!(sheet = sheet.name(), cells = sheet.cells().count(), "wrote worksheet");
        }

        // Strings are collected while the worksheets are written
        debug!(
            strings = strings.count(),
            styles = styles.xf_count(),
            "writing shared strings"
        );
        zip.start_file("xl/sharedStrings.xml", options)?;
        strings.write_xml(&mut XmlWriter::new(&mut zip))?;

        Ok(zip.finish()?)
    }
}

fn write_content_types<W: Write>(writer: &mut W, sheet_count: usize) -> Result<()> {
    let mut xml = XmlWriter::new(writer);
    xml.declaration()?;
    xml.write_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
"#,
    )?;
    for idx in 1..=sheet_count {
        xml.start_element("Override")?;
        xml.attribute("PartName", &format!("/xl/worksheets/sheet{}.xml", idx))?;
        xml.attribute(
            "ContentType",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
        )?;
        xml.close_empty()?;
        xml.write_str("\n")?;
    }
    xml.write_str(
        r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
</Types>"#,
    )?;
    xml.flush()
}

fn write_root_rels<W: Write>(writer: &mut W) -> Result<()> {
    let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;
    writer.write_all(xml.as_bytes())?;
    Ok(())
}

fn write_core_props<W: Write>(writer: &mut W, workbook: &Workbook) -> Result<()> {
    let props = workbook.properties();
    let created = props.created.format("%Y-%m-%dT%H:%M:%SZ").to_string();

    let mut xml = XmlWriter::new(writer);
    xml.declaration()?;
    xml.write_str(
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
    )?;
    if let Some(title) = &props.title {
        xml.text_element("dc:title", title)?;
    }
    xml.text_element("dc:creator", &props.creator)?;
    xml.text_element("cp:lastModifiedBy", &props.creator)?;
    xml.write_str("<dcterms:created xsi:type=\"dcterms:W3CDTF\">")?;
    xml.write_str(&created)?;
    xml.write_str("</dcterms:created><dcterms:modified xsi:type=\"dcterms:W3CDTF\">")?;
    xml.write_str(&created)?;
    xml.write_str("</dcterms:modified></cp:coreProperties>")?;
    xml.flush()
}

fn write_app_props<W: Write>(writer: &mut W, workbook: &Workbook) -> Result<()> {
    let mut xml = XmlWriter::new(writer);
    xml.declaration()?;
    xml.write_str(
        "<Properties xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\">",
    )?;
    xml.text_element("Application", env!("CARGO_PKG_NAME"))?;
    xml.write_str("<DocSecurity>0</DocSecurity><ScaleCrop>false</ScaleCrop>")?;
    xml.write_str("<TitlesOfParts><vt:vector xmlns:vt=\"http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes\"")?;
    xml.attribute_int("size", workbook.sheet_count())?;
    xml.write_str(" baseType=\"lpstr\">")?;
    for name in workbook.sheet_names() {
        xml.text_element("vt:lpstr", &name)?;
    }
    xml.write_str("</vt:vector></TitlesOfParts>")?;
    xml.write_str("<LinksUpToDate>false</LinksUpToDate><SharedDoc>false</SharedDoc>")?;
    xml.text_element("AppVersion", env!("CARGO_PKG_VERSION"))?;
    xml.end_element("Properties")?;
    xml.flush()
}

fn write_workbook_xml<W: Write>(writer: &mut W, workbook: &Workbook) -> Result<()> {
    let mut xml = XmlWriter::new(writer);
    xml.declaration()?;
    xml.start_element("workbook")?;
    xml.attribute("xmlns", MAIN_NS)?;
    xml.attribute("xmlns:r", REL_NS)?;
    xml.close_start_tag()?;

    xml.write_str("<bookViews><workbookView activeTab=\"0\"/></bookViews>")?;

    xml.write_str("<sheets>")?;
    for (idx, sheet) in workbook.sheets().iter().enumerate() {
        let sheet_id = idx + 1;
        xml.start_element("sheet")?;
        xml.attribute("name", sheet.name())?;
        xml.attribute_int("sheetId", sheet_id)?;
        xml.attribute("r:id", &format!("rId{}", sheet_id))?;
        xml.close_empty()?;
    }
    xml.write_str("</sheets>")?;

    let mut names = workbook.defined_names().peekable();
    if names.peek().is_some() {
        xml.write_str("<definedNames>")?;
        for dn in names {
            xml.start_element("definedName")?;
            xml.attribute("name", &dn.name)?;
            xml.close_start_tag()?;
            xml.write_escaped(&dn.formula())?;
            xml.end_element("definedName")?;
        }
        xml.write_str("</definedNames>")?;
    }

    // No cached formula results are stored, so ask for a recalculation on open
    xml.write_str("<calcPr calcId=\"191029\" fullCalcOnLoad=\"1\"/>")?;
    xml.end_element("workbook")?;
    xml.flush()
}

fn write_workbook_rels<W: Write>(writer: &mut W, sheet_count: usize) -> Result<()> {
    let mut xml = XmlWriter::new(writer);
    xml.declaration()?;
    xml.start_element("Relationships")?;
    xml.attribute(
        "xmlns",
        "http://schemas.openxmlformats.org/package/2006/relationships",
    )?;
    xml.close_start_tag()?;

    let mut relationship = |id: usize, kind: &str, target: &str| -> Result<()> {
        xml.start_element("Relationship")?;
        xml.attribute("Id", &format!("rId{}", id))?;
        xml.attribute("Type", &format!("{}/{}", REL_NS, kind))?;
        xml.attribute("Target", target)?;
        xml.close_empty()
    };

    for idx in 1..=sheet_count {
        relationship(idx, "worksheet", &format!("worksheets/sheet{}.xml", idx))?;
    }
    relationship(sheet_count + 1, "styles", "styles.xml")?;
    relationship(sheet_count + 2, "sharedStrings", "sharedStrings.xml")?;

    xml.end_element("Relationships")?;
    xml.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellRange;
    use crate::workbook::DocumentProperties;
    use std::io::{Cursor, Read};
    use tempfile::tempdir;

    fn read_part(bytes: Vec<u8>, name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut content = String::new();
        part.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_workbook_parts() {
        let mut workbook = Workbook::new();
        workbook.create_sheet("Config").unwrap();
        workbook
            .sheet_mut("Config")
            .unwrap()
            .write_column("N4".parse().unwrap(), ["LOW", "NORMAL", "HIGH", "URGENT"])
            .unwrap();
        workbook
            .define_name("Priorities", "Config", CellRange::column_span(14, 4, 4).unwrap())
            .unwrap();

        let bytes = XlsxWriter::new()
            .write(&workbook, Cursor::new(Vec::new()))
            .unwrap()
            .into_inner();

        let workbook_xml = read_part(bytes.clone(), "xl/workbook.xml");
        assert!(workbook_xml.contains("<sheet name=\"Sheet1\" sheetId=\"1\" r:id=\"rId1\"/>"));
        assert!(workbook_xml.contains("<sheet name=\"Config\" sheetId=\"2\" r:id=\"rId2\"/>"));
        assert!(workbook_xml
            .contains("<definedName name=\"Priorities\">Config!$N$4:$N$7</definedName>"));
        assert!(workbook_xml.contains("fullCalcOnLoad=\"1\""));

        let content_types = read_part(bytes.clone(), "[Content_Types].xml");
        assert!(content_types.contains("/xl/worksheets/sheet2.xml"));

        let rels = read_part(bytes.clone(), "xl/_rels/workbook.xml.rels");
        assert!(rels.contains("Id=\"rId4\""));

        let strings = read_part(bytes, "xl/sharedStrings.xml");
        assert!(strings.contains("uniqueCount=\"4\""));
    }

    #[test]
    fn test_core_properties_carry_title() {
        let mut workbook = Workbook::new();
        let bytes = XlsxWriter::new()
            .write(&workbook, Cursor::new(Vec::new()))
            .unwrap()
            .into_inner();
        assert!(!read_part(bytes, "docProps/core.xml").contains("<dc:title>"));

        workbook.set_properties(DocumentProperties {
            title: Some("Queue & Logs".to_string()),
            ..DocumentProperties::default()
        });
        let bytes = XlsxWriter::new()
            .write(&workbook, Cursor::new(Vec::new()))
            .unwrap()
            .into_inner();
        assert!(read_part(bytes, "docProps/core.xml")
            .contains("<dc:title>Queue &amp; Logs</dc:title>"));
    }

    #[test]
    fn test_empty_workbook_is_rejected() {
        let mut workbook = Workbook::new();
        workbook.remove_sheet("Sheet1").unwrap();
        let result = XlsxWriter::new().write(&workbook, Cursor::new(Vec::new()));
        assert!(matches!(result, Err(TemplateError::WriteError(_))));
    }

    #[test]
    fn test_write_file_replaces_target() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        std::fs::write(&path, b"stale").unwrap();

        XlsxWriter::new().write_file(&Workbook::new(), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"PK");
        // Only the target remains; the temporary file was renamed onto it
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_file_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.xlsx");
        let result = XlsxWriter::new().write_file(&Workbook::new(), &path);
        assert!(matches!(result, Err(TemplateError::IoError(_))));
        assert!(!path.exists());
    }
}
