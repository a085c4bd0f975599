//! Configuration management.
//!
//! Provides the extraction engine settings: where layouts and catalogs live,
//! which words mark a header row, which sheets are not data sheets, and how
//! sheet-level failures are handled.

use crate::constants::{
    APP_DIR_NAME, CATALOGS_DIR_NAME, DEFAULT_HEADER_MARKERS, DEFAULT_IGNORED_SHEET_FRAGMENTS,
    LAYOUTS_DIR_NAME,
};
use crate::reconciler::normalize_name;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What the engine does when a sheet has no usable header row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SheetPolicy {
    /// Fail the whole run with the sheet's layout error
    #[default]
    Abort,
    /// Log the failure and continue with the next sheet
    Skip,
}

/// Settings for one extraction engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Directory holding the layout definition files
    pub layouts_dir: PathBuf,

    /// Directory holding per-program catalog files (no backfill when unset)
    pub catalog_dir: Option<PathBuf>,

    /// Lower-case substrings that identify a header row
    pub header_markers: Vec<String>,

    /// Lower-case sheet name fragments of sheets that are never parsed
    pub ignored_sheet_fragments: Vec<String>,

    /// Handling of sheets whose header cannot be bound to a layout
    pub sheet_policy: SheetPolicy,

    /// Fill missing semesters from the catalog
    pub backfill_semesters: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            layouts_dir: default_data_dir().join(LAYOUTS_DIR_NAME),
            catalog_dir: None,
            header_markers: DEFAULT_HEADER_MARKERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ignored_sheet_fragments: DEFAULT_IGNORED_SHEET_FRAGMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            sheet_policy: SheetPolicy::Abort,
            backfill_semesters: true,
        }
    }
}

impl ExtractorConfig {
    /// Create configuration reading layouts from the given directory
    pub fn new(layouts_dir: impl Into<PathBuf>) -> Self {
        Self {
            layouts_dir: layouts_dir.into(),
            ..Self::default()
        }
    }

    /// Enable catalog backfill from the given directory
    pub fn with_catalog_dir(mut self, catalog_dir: impl Into<PathBuf>) -> Self {
        self.catalog_dir = Some(catalog_dir.into());
        self
    }

    /// Replace the header marker words
    pub fn with_header_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header_markers = markers
            .into_iter()
            .map(|m| m.into().to_lowercase())
            .collect();
        self
    }

    /// Replace the ignored sheet name fragments
    pub fn with_ignored_sheets<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_sheet_fragments = fragments
            .into_iter()
            .map(|f| f.into().to_lowercase())
            .collect();
        self
    }

    /// Set the sheet failure policy
    pub fn with_sheet_policy(mut self, policy: SheetPolicy) -> Self {
        self.sheet_policy = policy;
        self
    }

    /// Disable catalog backfill even when a catalog directory is set
    pub fn without_backfill(mut self) -> Self {
        self.backfill_semesters = false;
        self
    }

    /// Whether a sheet should be left out of extraction based on its name
    ///
    /// Name and fragments are both accent-folded before comparison.
    pub fn is_ignored_sheet(&self, sheet_name: &str) -> bool {
        let name = normalize_name(sheet_name);
        self.ignored_sheet_fragments
            .iter()
            .map(|fragment| normalize_name(fragment))
            .any(|fragment| !fragment.is_empty() && name.contains(&fragment))
    }

    /// Catalog directory, if backfill is active
    pub fn backfill_catalog_dir(&self) -> Option<&Path> {
        if self.backfill_semesters {
            self.catalog_dir.as_deref()
        } else {
            None
        }
    }
}

/// Default base directory for layouts and catalogs
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Default catalogs directory
pub fn default_catalog_dir() -> PathBuf {
    default_data_dir().join(CATALOGS_DIR_NAME)
}
