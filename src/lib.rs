//! Schedule Extractor Library
//!
//! A Rust library for turning loosely-structured university schedule
//! workbooks (one sheet per academic program) into typed subject records.
//!
//! This library provides tools for:
//! - Loading column layouts from JSON definition files
//! - Detecting header rows by marker words and binding them to a layout
//! - Extracting and normalizing dates, times and integers from cell text
//! - Completing missing semesters from per-program subject catalogs
//! - Reading `.xlsx`, `.xls` and `.ods` workbooks through calamine

pub mod catalog;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod extractor;
pub mod fields;
pub mod header;
pub mod layout;
pub mod models;
pub mod normalizer;
pub mod processor;
pub mod reconciler;
pub mod workbook;

// Re-export commonly used types
pub use catalog::{CatalogEntry, CatalogLoader, ProgramCatalog};
pub use config::{ExtractorConfig, SheetPolicy};
pub use error::{ErrorKind, ExtractError, Result};
pub use layout::{Layout, LayoutRegistry};
pub use models::{ExtractedRecord, ExtractionStats, ParsingResult};
pub use processor::ExtractionEngine;
pub use reconciler::{NameReconciler, normalize_name};
pub use workbook::{CalamineWorkbook, MemoryWorkbook, WorkbookReader};
