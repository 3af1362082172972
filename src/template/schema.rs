//! Fixed sheet names, header contracts, lists and example rows
//!
//! Header rows are the contract with the external processor that appends to
//! the log sheets and drains the queue. Reordering or renaming a column is a
//! breaking change and must bump [`SCHEMA_VERSION`].

use serde_json::{json, Value};

/// Version of the header contract below
pub const SCHEMA_VERSION: u32 = 1;

/// README heading and document title
pub const TEMPLATE_TITLE: &str = "Master Automation — Sheets-Native Dashboard Template";

pub const README: &str = "README";
pub const DASHBOARD: &str = "Dashboard";
pub const CONFIG: &str = "Config";
pub const ACTION_QUEUE: &str = "Action_Queue";
pub const MASTER_DASHBOARD: &str = "Master Dashboard";
pub const ENHANCEMENT_REPORTS: &str = "Enhancement Reports";

/// Sheets in workbook order
pub const SHEETS: [&str; 6] = [
    README,
    DASHBOARD,
    CONFIG,
    ACTION_QUEUE,
    MASTER_DASHBOARD,
    ENHANCEMENT_REPORTS,
];

pub const MASTER_DASHBOARD_HEADERS: [&str; 13] = [
    "timestamp_iso_ms",
    "date_local",
    "time_local",
    "epoch_ms",
    "event_type",
    "action",
    "user",
    "status",
    "duration_ms",
    "remaining_quota_hint",
    "error_message",
    "stack_trace",
    "meta_json",
];

pub const ENHANCEMENT_REPORT_HEADERS: [&str; 10] = [
    "created_iso_ms",
    "created_by",
    "work_product_title",
    "source",
    "word_count",
    "signals_json",
    "analysis_markdown",
    "proposal_markdown",
    "prompt_markdown",
    "ai_response_markdown",
];

pub const ACTION_QUEUE_HEADERS: [&str; 16] = [
    "queue_id",
    "created_iso_ms",
    "requested_by",
    "action_type",
    "target_type",
    "target_id",
    "params_json",
    "priority",
    "status",
    "status_message",
    "result_link",
    "result_id",
    "started_iso_ms",
    "completed_iso_ms",
    "duration_ms",
    "correlation_id",
];

pub const CATALOG_HEADERS: [&str; 8] = [
    "action_type",
    "description",
    "handler_function",
    "default_target_type",
    "params_schema_json",
    "enabled",
    "requires_auth_scopes",
    "notes",
];

pub const ACTION_TYPES: &str = "ActionTypes";
pub const TARGET_TYPES: &str = "TargetTypes";
pub const PRIORITIES: &str = "Priorities";
pub const STATUSES: &str = "Statuses";

/// Catch-all action type appended after the catalog entries
pub const CUSTOM_ACTION: &str = "CUSTOM";

pub const TARGET_TYPE_VALUES: [&str; 10] = [
    "SPREADSHEET",
    "SHEET",
    "RANGE",
    "DOC",
    "GMAIL",
    "DRIVE",
    "SITE",
    "LINK_KEY",
    "TEXT",
    "FILE",
];
pub const PRIORITY_VALUES: [&str; 4] = ["LOW", "NORMAL", "HIGH", "URGENT"];
pub const STATUS_VALUES: [&str; 6] = ["NEW", "QUEUED", "RUNNING", "DONE", "ERROR", "CANCELLED"];

/// Config key/value rows, written from row 3
pub const SETTINGS: [(&str, &str); 5] = [
    ("system_name", "Master Automation Suite"),
    ("timezone", "America/New_York"),
    ("default_priority", "NORMAL"),
    ("queue_processing_mode", "MANUAL"),
    ("max_batch_size", "25"),
];

/// Request id stamped when the Dashboard is opened
pub const REQUEST_ID_FORMULA: &str = r#"=TEXT(NOW(),"yyyymmdd-hhmmss")"#;
pub const STATUS_FORMULA: &str = r#"=IF(B9=TRUE,"QUEUED","(not queued)")"#;
pub const LAST_MESSAGE_FORMULA: &str = r#"=IF(B9=TRUE,"Waiting for processor…","—")"#;
/// UTC-style ISO timestamp with milliseconds, e.g. `2024-05-01T09:30:00.000Z`
pub const QUEUE_TIMESTAMP_FORMULA: &str = r#"=TEXT(NOW(),"yyyy-mm-dd""T""hh:mm:ss.000")&"Z""#;

/// One row of the Action Catalog on the Config sheet
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub action_type: &'static str,
    pub description: &'static str,
    pub handler_function: &'static str,
    pub default_target_type: &'static str,
    pub params_schema: Value,
    pub enabled: bool,
    pub requires_auth_scopes: &'static str,
    pub notes: &'static str,
}

pub fn action_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            action_type: "OPEN_LINK",
            description: "Open a configured link key or URL",
            handler_function: "MASTER_apiOpenLinkKey",
            default_target_type: "LINK_KEY",
            params_schema: json!({ "key": "COLAB|GITHUB|WEBAPP" }),
            enabled: true,
            requires_auth_scopes: "script.container.ui",
            notes: "Uses modeless dialog opener",
        },
        CatalogEntry {
            action_type: "CREATE_PROJECT_FOLDER",
            description: "Create Drive folder structure",
            handler_function: "MASTER_apiCreateProjectFolder",
            default_target_type: "SPREADSHEET",
            params_schema: json!({}),
            enabled: true,
            requires_auth_scopes: "drive",
            notes: "Stores folder id in Document Properties",
        },
        CatalogEntry {
            action_type: "GENERATE_ENHANCEMENT",
            description: "Generate enhancement package from text",
            handler_function: "MASTER_apiGenerateEnhancement",
            default_target_type: "TEXT",
            params_schema: json!({ "title": "", "source": "", "callAi": false }),
            enabled: true,
            requires_auth_scopes: "script.external_request",
            notes: "Optional AI endpoint call",
        },
        CatalogEntry {
            action_type: "OPEN_DASHBOARD",
            description: "Activate Master Dashboard sheet",
            handler_function: "MASTER_openDashboard",
            default_target_type: "SHEET",
            params_schema: json!({}),
            enabled: true,
            requires_auth_scopes: "spreadsheets.currentonly",
            notes: "Navigation helper",
        },
    ]
}

/// Vertical list on the Config sheet bound to a workbook name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedList {
    pub name: &'static str,
    pub values: Vec<&'static str>,
}

/// The four dropdown sources, in column order L, M, N, O
pub fn validation_lists() -> Vec<NamedList> {
    let mut action_types: Vec<&'static str> =
        action_catalog().iter().map(|e| e.action_type).collect();
    action_types.push(CUSTOM_ACTION);

    vec![
        NamedList {
            name: ACTION_TYPES,
            values: action_types,
        },
        NamedList {
            name: TARGET_TYPES,
            values: TARGET_TYPE_VALUES.to_vec(),
        },
        NamedList {
            name: PRIORITIES,
            values: PRIORITY_VALUES.to_vec(),
        },
        NamedList {
            name: STATUSES,
            values: STATUS_VALUES.to_vec(),
        },
    ]
}

/// Sample request seeded into the Action_Queue
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleRequest {
    pub queue_id: &'static str,
    pub requested_by: &'static str,
    pub action_type: &'static str,
    pub target_type: &'static str,
    pub target_id: &'static str,
    pub params: Value,
    pub priority: &'static str,
    pub status: &'static str,
    pub correlation_id: &'static str,
}

pub fn example_requests() -> Vec<ExampleRequest> {
    vec![
        ExampleRequest {
            queue_id: "Q-0001",
            requested_by: "you@domain.com",
            action_type: "OPEN_LINK",
            target_type: "LINK_KEY",
            target_id: "WEBAPP",
            params: json!({ "key": "WEBAPP" }),
            priority: "NORMAL",
            status: "QUEUED",
            correlation_id: "C-0001",
        },
        ExampleRequest {
            queue_id: "Q-0002",
            requested_by: "you@domain.com",
            action_type: "CREATE_PROJECT_FOLDER",
            target_type: "SPREADSHEET",
            target_id: "",
            params: json!({}),
            priority: "NORMAL",
            status: "NEW",
            correlation_id: "C-0002",
        },
    ]
}

/// 1-based column of a header within a header row
pub fn column_of(headers: &[&str], name: &str) -> Option<u32> {
    headers
        .iter()
        .position(|h| *h == name)
        .map(|idx| idx as u32 + 1)
}
