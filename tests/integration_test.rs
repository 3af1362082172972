//! Integration tests for dashboard-template

use std::io::Read;
use std::path::Path;

use dashboard_template::inspect::{verify_contract, TemplateReader};
use dashboard_template::template::schema::*;
use dashboard_template::{
    generate, CellValue, TemplateBuilder, TemplateConfig, TemplateError, XlsxWriter,
};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn generate_into(dir: &Path, name: &str) -> TemplateReader {
    let config = TemplateConfig::builder()
        .with_output(dir.join(name))
        .build()
        .unwrap();
    let path = generate(config).unwrap();
    TemplateReader::open(path).unwrap()
}

fn read_parts(path: &Path) -> Vec<(String, String)> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut parts = Vec::new();
    for idx in 0..archive.len() {
        let mut part = archive.by_index(idx).unwrap();
        let mut content = String::new();
        part.read_to_string(&mut content).unwrap();
        parts.push((part.name().to_string(), content));
    }
    parts
}

#[test]
fn test_sheets_in_fixed_order() {
    let dir = tempdir().unwrap();
    let reader = generate_into(dir.path(), "template.xlsx");
    assert_eq!(reader.sheet_names(), SHEETS.to_vec());
}

#[test]
fn test_header_rows_match_contract() {
    let dir = tempdir().unwrap();
    let reader = generate_into(dir.path(), "template.xlsx");

    for (sheet, headers) in [
        (MASTER_DASHBOARD, &MASTER_DASHBOARD_HEADERS[..]),
        (ENHANCEMENT_REPORTS, &ENHANCEMENT_REPORT_HEADERS[..]),
        (ACTION_QUEUE, &ACTION_QUEUE_HEADERS[..]),
    ] {
        assert_eq!(reader.sheet(sheet).unwrap().row_values(1), headers.to_vec());
    }
    assert!(verify_contract(&reader).is_ok());
}

#[test]
fn test_header_style_and_frozen_pane() {
    let dir = tempdir().unwrap();
    let reader = generate_into(dir.path(), "template.xlsx");

    for (sheet, row, width) in [
        (MASTER_DASHBOARD, 1, MASTER_DASHBOARD_HEADERS.len()),
        (ENHANCEMENT_REPORTS, 1, ENHANCEMENT_REPORT_HEADERS.len()),
        (ACTION_QUEUE, 1, ACTION_QUEUE_HEADERS.len()),
        (CONFIG, 2, 2),
    ] {
        assert_eq!(reader.sheet(sheet).unwrap().frozen_rows(), Some(row), "{}", sheet);
        for col in 1..=width as u32 {
            let addr = format!("{}{}", dashboard_template::types::col_to_letter(col), row);
            let style = reader.cell_style(sheet, &addr).unwrap();
            assert!(style.bold, "{}!{} not bold", sheet, addr);
            assert_eq!(style.fill_rgb.as_deref(), Some("FF111827"), "{}!{}", sheet, addr);
        }
    }

    // Catalog header is painted but does not move the pane
    let catalog = reader.cell_style(CONFIG, "H11").unwrap();
    assert!(catalog.bold && catalog.has_fill());
    assert!(!reader.cell_style(CONFIG, "A3").unwrap().has_fill());
}

#[test]
fn test_named_ranges_hold_lists() {
    let dir = tempdir().unwrap();
    let reader = generate_into(dir.path(), "template.xlsx");

    let names: Vec<&str> = reader.defined_names().iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["ActionTypes", "TargetTypes", "Priorities", "Statuses"]);

    for list in validation_lists() {
        let (sheet, range) = reader.resolve_name(list.name).unwrap();
        assert_eq!(sheet, CONFIG);
        assert_eq!(range.start.col, range.end.col, "{} is not a single column", list.name);
        assert_eq!(reader.named_values(list.name).unwrap(), list.values);
    }
    assert_eq!(
        reader.named_values(ACTION_TYPES).unwrap().last().map(String::as_str),
        Some("CUSTOM")
    );
}

#[test]
fn test_dashboard_validations() {
    let dir = tempdir().unwrap();
    let reader = generate_into(dir.path(), "template.xlsx");
    let dashboard = reader.sheet(DASHBOARD).unwrap();

    let formula_at = |addr: &str| dashboard.validation_at(addr).map(|v| v.formula.clone());
    assert_eq!(formula_at("B4").as_deref(), Some("ActionTypes"));
    assert_eq!(formula_at("B5").as_deref(), Some("TargetTypes"));
    assert_eq!(formula_at("B8").as_deref(), Some("Priorities"));
    assert_eq!(formula_at("B9").as_deref(), Some("\"TRUE,FALSE\""));
    assert_eq!(formula_at("B6"), None);
    assert_eq!(formula_at("B7"), None);
    assert!(dashboard.validations().iter().all(|v| v.kind == "list"));

    assert_eq!(dashboard.value("B9"), Some(&CellValue::Bool(false)));
    assert_eq!(
        dashboard.value("B11"),
        Some(&CellValue::Formula(STATUS_FORMULA.to_string()))
    );
    assert_eq!(
        reader.cell_style(DASHBOARD, "B6").unwrap().fill_rgb.as_deref(),
        Some("FFDBEAFE")
    );
}

#[test]
fn test_action_queue_validations_and_examples() {
    let dir = tempdir().unwrap();
    let reader = generate_into(dir.path(), "template.xlsx");
    let queue = reader.sheet(ACTION_QUEUE).unwrap();

    let rules: Vec<(String, String)> = queue
        .validations()
        .iter()
        .map(|v| (v.sqref.clone(), v.formula.clone()))
        .collect();
    assert_eq!(
        rules,
        vec![
            ("D2:D5000".to_string(), "ActionTypes".to_string()),
            ("E2:E5000".to_string(), "TargetTypes".to_string()),
            ("H2:H5000".to_string(), "Priorities".to_string()),
            ("I2:I5000".to_string(), "Statuses".to_string()),
        ]
    );

    assert_eq!(queue.row_values(2)[..9].to_vec(), vec![
        "Q-0001",
        QUEUE_TIMESTAMP_FORMULA,
        "you@domain.com",
        "OPEN_LINK",
        "LINK_KEY",
        "WEBAPP",
        r#"{"key":"WEBAPP"}"#,
        "NORMAL",
        "QUEUED",
    ]);
    assert_eq!(queue.value("P3").unwrap().as_string(), "C-0002");
    assert_eq!(queue.max_row(), 3);
}

#[test]
fn test_generation_is_deterministic() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.xlsx");
    let second = dir.path().join("second.xlsx");
    TemplateBuilder::new(TemplateConfig::default())
        .unwrap()
        .save(&first)
        .unwrap();
    TemplateBuilder::new(TemplateConfig::default())
        .unwrap()
        .save(&second)
        .unwrap();

    // docProps/core.xml carries the creation time; every other part must match
    let strip = |parts: Vec<(String, String)>| -> Vec<(String, String)> {
        parts
            .into_iter()
            .filter(|(name, _)| name != "docProps/core.xml")
            .collect()
    };
    assert_eq!(strip(read_parts(&first)), strip(read_parts(&second)));

    let reader = TemplateReader::open(&second).unwrap();
    assert!(matches!(
        reader.sheet(DASHBOARD).unwrap().value("B3"),
        Some(CellValue::Formula(f)) if f == REQUEST_ID_FORMULA
    ));
    assert!(matches!(
        reader.sheet(ACTION_QUEUE).unwrap().value("B2"),
        Some(CellValue::Formula(_))
    ));
}

#[test]
fn test_autosized_widths_within_bounds() {
    let dir = tempdir().unwrap();
    let reader = generate_into(dir.path(), "template.xlsx");

    for name in SHEETS {
        let sheet = reader.sheet(name).unwrap();
        let last_row = sheet.max_row().min(200);
        for col in 1..=sheet.max_column() {
            let width = sheet
                .column_width(col)
                .unwrap_or_else(|| panic!("{} column {} has no width", name, col));
            assert!((10.0..=70.0).contains(&width), "{} column {} = {}", name, col, width);

            let longest = (1..=last_row)
                .filter_map(|row| {
                    let addr = format!("{}{}", dashboard_template::types::col_to_letter(col), row);
                    sheet.value(&addr).map(|v| v.display_len())
                })
                .max()
                .unwrap_or(0);
            assert!(width >= (longest as f64 + 2.0).min(70.0), "{} column {}", name, col);
        }
    }

    // README prose hits the upper bound
    assert_eq!(reader.sheet(README).unwrap().column_width(1), Some(70.0));
}

#[test]
fn test_tampered_headers_fail_contract() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tampered.xlsx");

    let mut workbook = TemplateBuilder::new(TemplateConfig::default())
        .unwrap()
        .build()
        .unwrap();
    let log = workbook.sheet_mut(MASTER_DASHBOARD).unwrap();
    log.write("A1", "date_local").unwrap();
    log.write("B1", "timestamp_iso_ms").unwrap();
    XlsxWriter::new().write_file(&workbook, &path).unwrap();

    let reader = TemplateReader::open(&path).unwrap();
    match verify_contract(&reader) {
        Err(TemplateError::ContractViolation { sheet, .. }) => assert_eq!(sheet, MASTER_DASHBOARD),
        other => panic!("expected contract violation, got {:?}", other),
    }
}

#[test]
fn test_extra_header_column_fails_contract() {
    let dir = tempdir().unwrap();

    for (sheet, addr) in [
        (ACTION_QUEUE, "Q1"),
        (MASTER_DASHBOARD, "N1"),
        (ENHANCEMENT_REPORTS, "K1"),
        (CONFIG, "I11"),
    ] {
        let path = dir.path().join(format!("{}.xlsx", sheet.replace(' ', "_")));
        let mut workbook = TemplateBuilder::new(TemplateConfig::default())
            .unwrap()
            .build()
            .unwrap();
        workbook.sheet_mut(sheet).unwrap().write(addr, "extra_column").unwrap();
        XlsxWriter::new().write_file(&workbook, &path).unwrap();

        let reader = TemplateReader::open(&path).unwrap();
        match verify_contract(&reader) {
            Err(TemplateError::ContractViolation { sheet: found, .. }) => assert_eq!(found, sheet),
            other => panic!("{}!{}: expected contract violation, got {:?}", sheet, addr, other),
        }
    }
}

#[test]
fn test_overwrites_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("template.xlsx");
    std::fs::write(&path, b"not a workbook").unwrap();

    TemplateBuilder::new(TemplateConfig::default())
        .unwrap()
        .save(&path)
        .unwrap();
    let reader = TemplateReader::open(&path).unwrap();
    assert_eq!(reader.sheet_names().len(), 6);
}

#[test]
fn test_unwritable_destination_leaves_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("template.xlsx");

    let result = TemplateBuilder::new(TemplateConfig::default())
        .unwrap()
        .save(&path);
    assert!(matches!(result, Err(TemplateError::IoError(_))));
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
