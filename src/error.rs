//! Error types for the dashboard template generator

use thiserror::Error;

/// Result type alias for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Main error type for building, saving and inspecting the template
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The workbook package could not be produced
    #[error("Failed to write workbook: {0}")]
    WriteError(String),

    /// A generated workbook could not be read back
    #[error("Failed to read workbook: {0}")]
    ReadError(String),

    /// Sheet lookup failed
    #[error("Sheet '{sheet}' not found. Available sheets: {available}")]
    SheetNotFound { sheet: String, available: String },

    /// A sheet with the same name (case-insensitive) already exists
    #[error("Sheet '{0}' already exists")]
    DuplicateSheet(String),

    /// Sheet name is empty, too long or contains a forbidden character
    #[error("Invalid sheet name: '{0}'")]
    InvalidSheetName(String),

    /// Invalid cell reference
    #[error("Invalid cell reference: {0}")]
    InvalidCell(String),

    /// Invalid cell range
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    /// Invalid or duplicate defined name
    #[error("Invalid defined name: {0}")]
    InvalidName(String),

    /// Inconsistent generator configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A workbook drifted from the header/sheet contract
    #[error("Contract violation in '{sheet}': {detail}")]
    ContractViolation { sheet: String, detail: String },

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// ZIP container error wrapper
    #[error("ZIP error: {0}")]
    ZipError(#[from] zip::result::ZipError),
}

impl From<tempfile::PersistError> for TemplateError {
    fn from(err: tempfile::PersistError) -> Self {
        TemplateError::IoError(err.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_not_found_message() {
        let err = TemplateError::SheetNotFound {
            sheet: "Queue".to_string(),
            available: "README, Dashboard".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Sheet 'Queue' not found. Available sheets: README, Dashboard"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: TemplateError = io.into();
        assert!(matches!(err, TemplateError::IoError(_)));
        assert!(err.to_string().contains("denied"));
    }
}
