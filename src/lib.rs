//! # dashboard-template
//!
//! Generator for the Master Automation control-plane workbook.
//!
//! ## Features
//!
//! - **Fixed layout**: six sheets in a fixed order with header rows that form the
//!   contract for an external queue processor
//! - **Dropdowns**: list validations backed by workbook-level named ranges
//! - **Styling**: header fills, bold fonts, frozen panes, autosized columns
//! - **Atomic save**: the target file is replaced only once fully written
//! - **Contract check**: re-read a file and verify sheets, headers and lists
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dashboard_template::{generate, TemplateConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TemplateConfig::builder()
//!     .with_output("Master_Automation_Dashboard_Template.xlsx")
//!     .build()?;
//! let path = generate(config)?;
//! println!("Wrote: {}", path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ### Checking an existing file
//!
//! ```rust,no_run
//! use dashboard_template::inspect::{verify_contract, TemplateReader};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = TemplateReader::open("Master_Automation_Dashboard_Template.xlsx")?;
//! verify_contract(&reader)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod inspect;
pub mod logging;
pub mod template;
pub mod types;
pub mod validation;
pub mod workbook;
pub mod worksheet;
pub mod xlsx;

pub use config::TemplateConfig;
pub use error::{Result, TemplateError};
pub use template::{generate, TemplateBuilder};
pub use types::{CellRange, CellRef, CellStyle, CellValue};
pub use validation::DataValidation;
pub use workbook::Workbook;
pub use worksheet::Worksheet;
pub use xlsx::XlsxWriter;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_imports() {
        // Test that all public types are accessible
        let _ = std::marker::PhantomData::<TemplateError>;
        let _ = std::marker::PhantomData::<TemplateBuilder>;
        let _ = std::marker::PhantomData::<XlsxWriter>;
        let _ = std::marker::PhantomData::<inspect::TemplateReader>;
    }
}
