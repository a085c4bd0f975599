//! Application constants for the schedule extractor
//!
//! Default marker words, ignored sheet names and file locations used when no
//! explicit configuration is given.

// =============================================================================
// Header Detection
// =============================================================================

/// Substrings that flag a row as the column header row of a sheet
pub const DEFAULT_HEADER_MARKERS: &[&str] = &["item", "ítem"];

// =============================================================================
// Sheet Filtering
// =============================================================================

/// Sheet name fragments that identify non-data sheets
///
/// Compared against the lower-cased, accent-folded sheet name, so "codigos"
/// also matches "Códigos" and "CÓDIGOS".
pub const DEFAULT_IGNORED_SHEET_FRAGMENTS: &[&str] =
    &["codigos", "asignaturas", "homologadas", "homologas"];

// =============================================================================
// Files and Directories
// =============================================================================

/// Extension of layout and catalog definition files
pub const DEFINITION_FILE_EXTENSION: &str = "json";

/// Application directory name under the user data directory
pub const APP_DIR_NAME: &str = "schedule-extractor";

/// Default layouts sub-directory
pub const LAYOUTS_DIR_NAME: &str = "layouts";

/// Default catalogs sub-directory
pub const CATALOGS_DIR_NAME: &str = "catalogs";

// =============================================================================
// Value Normalization
// =============================================================================

/// Century prefix applied to two-digit years
pub const TWO_DIGIT_YEAR_PREFIX: &str = "20";

/// Minutes in a day, used to decode fractional-day time cells
pub const MINUTES_PER_DAY: f64 = 24.0 * 60.0;
