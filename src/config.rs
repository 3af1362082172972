//! Generation settings

use std::path::{Path, PathBuf};

use crate::error::{Result, TemplateError};
use crate::xlsx::DEFAULT_COMPRESSION_LEVEL;

/// File written when no output path is given
pub const DEFAULT_OUTPUT: &str = "Master_Automation_Dashboard_Template.xlsx";

/// Knobs for template generation
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateConfig {
    pub output: PathBuf,
    /// Deflate level 0-9
    pub compression_level: u32,
    pub min_column_width: f64,
    pub max_column_width: f64,
    /// Rows inspected per column when autosizing
    pub autosize_sample_rows: u32,
    /// Last row covered by the Action_Queue dropdowns
    pub validation_last_row: u32,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        TemplateConfig {
            output: PathBuf::from(DEFAULT_OUTPUT),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            min_column_width: 10.0,
            max_column_width: 70.0,
            autosize_sample_rows: 200,
            validation_last_row: 5000,
        }
    }
}

impl TemplateConfig {
    pub fn builder() -> TemplateConfigBuilder {
        TemplateConfigBuilder::default()
    }

    /// Reject settings that cannot produce a sensible template
    pub fn validate(&self) -> Result<()> {
        if self.output.as_os_str().is_empty() {
            return Err(TemplateError::InvalidConfig("output path is empty".into()));
        }
        if self.compression_level > 9 {
            return Err(TemplateError::InvalidConfig(format!(
                "compression level {} is outside 0-9",
                self.compression_level
            )));
        }
        if !(self.min_column_width > 0.0 && self.min_column_width <= self.max_column_width) {
            return Err(TemplateError::InvalidConfig(format!(
                "column width bounds {}..{} are inverted or non-positive",
                self.min_column_width, self.max_column_width
            )));
        }
        if self.autosize_sample_rows == 0 {
            return Err(TemplateError::InvalidConfig(
                "autosize must sample at least one row".into(),
            ));
        }
        // Row 1 is the header, so the rule needs at least one data row
        if self.validation_last_row < 2 {
            return Err(TemplateError::InvalidConfig(format!(
                "validation last row {} leaves no data rows",
                self.validation_last_row
            )));
        }
        Ok(())
    }
}

/// Builder for [`TemplateConfig`]
#[derive(Debug, Default)]
pub struct TemplateConfigBuilder {
    output: Option<PathBuf>,
    compression_level: Option<u32>,
    column_width_bounds: Option<(f64, f64)>,
    autosize_sample_rows: Option<u32>,
    validation_last_row: Option<u32>,
}

impl TemplateConfigBuilder {
    pub fn with_output<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = Some(level);
        self
    }

    /// Set autosize bounds (min, max)
    pub fn with_column_width_bounds(mut self, min: f64, max: f64) -> Self {
        self.column_width_bounds = Some((min, max));
        self
    }

    pub fn with_autosize_sample_rows(mut self, rows: u32) -> Self {
        self.autosize_sample_rows = Some(rows);
        self
    }

    pub fn with_validation_last_row(mut self, row: u32) -> Self {
        self.validation_last_row = Some(row);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<TemplateConfig> {
        let mut config = TemplateConfig::default();

        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(level) = self.compression_level {
            config.compression_level = level;
        }
        if let Some((min, max)) = self.column_width_bounds {
            config.min_column_width = min;
            config.max_column_width = max;
        }
        if let Some(rows) = self.autosize_sample_rows {
            config.autosize_sample_rows = rows;
        }
        if let Some(row) = self.validation_last_row {
            config.validation_last_row = row;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TemplateConfig::default();
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(config.compression_level, 6);
        assert_eq!(config.min_column_width, 10.0);
        assert_eq!(config.max_column_width, 70.0);
        assert_eq!(config.autosize_sample_rows, 200);
        assert_eq!(config.validation_last_row, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = TemplateConfig::builder()
            .with_output("out/template.xlsx")
            .with_compression_level(9)
            .with_column_width_bounds(8.0, 40.0)
            .with_validation_last_row(100)
            .build()
            .unwrap();
        assert_eq!(config.output, PathBuf::from("out/template.xlsx"));
        assert_eq!(config.compression_level, 9);
        assert_eq!(config.max_column_width, 40.0);
        assert_eq!(config.validation_last_row, 100);
        assert_eq!(config.autosize_sample_rows, 200);
    }

    #[test]
    fn test_invalid_configs() {
        let cases = [
            TemplateConfig::builder().with_compression_level(10),
            TemplateConfig::builder().with_column_width_bounds(50.0, 20.0),
            TemplateConfig::builder().with_column_width_bounds(0.0, 20.0),
            TemplateConfig::builder().with_autosize_sample_rows(0),
            TemplateConfig::builder().with_validation_last_row(1),
            TemplateConfig::builder().with_output(""),
        ];
        for builder in cases {
            assert!(matches!(builder.build(), Err(TemplateError::InvalidConfig(_))));
        }
    }
}
