//! xlsx serialisation
//!
//! Turns an in-memory [`Workbook`](crate::Workbook) into an OOXML package:
//! - Direct XML generation through a small buffered writer
//! - Workbook-wide shared strings and a deduplicated style table
//! - Deflate-compressed ZIP written to a temporary file and renamed into place

mod shared_strings;
mod styles;
mod worksheet;
pub mod xml_writer;
mod writer;

pub use writer::{XlsxWriter, DEFAULT_COMPRESSION_LEVEL};
