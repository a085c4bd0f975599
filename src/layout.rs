//! Layout registry.
//!
//! A layout describes one known column arrangement of the workbook: the
//! expected field order and, per field, the header substrings that confirm
//! the column. Layouts are read once per session from a directory of JSON
//! files such as:
//!
//! ```json
//! { "list": [ { "header": "departamento", "patron": ["depto", "departamento"] } ] }
//! ```
//!
//! Files are loaded in file-name order, which is also the match priority.

use crate::constants::DEFINITION_FILE_EXTENSION;
use crate::error::{ExtractError, Result};
use crate::fields::Field;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One expected column of a layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutColumn {
    /// Identifier as written in the layout file
    pub identifier: String,

    /// Field fed by this column, `None` when the identifier is unknown
    pub field: Option<Field>,

    /// Lower-case substrings, one of which a header cell must contain
    pub patterns: Vec<String>,
}

impl LayoutColumn {
    /// Whether a lower-cased header cell confirms this column
    pub fn accepts(&self, lower_cell: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| lower_cell.contains(pattern.as_str()))
    }
}

/// Known column arrangement of a schedule sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// File stem of the definition file
    pub name: String,
    pub columns: Vec<LayoutColumn>,
}

impl Layout {
    /// Whether this layout accepts a lower-cased, trimmed header row
    ///
    /// Every column must be confirmed, in order, by a non-blank cell. Blank
    /// cells are skipped rather than counted as mismatches.
    pub fn matches(&self, lower_header: &[String]) -> bool {
        let mut columns = self.columns.iter();
        let mut expected = columns.next();

        for cell in lower_header.iter().filter(|c| !c.is_empty()) {
            let Some(column) = expected else {
                break;
            };
            if !column.accepts(cell) {
                return false;
            }
            expected = columns.next();
        }

        expected.is_none()
    }

    /// Number of columns resolving to a known field
    pub fn known_field_count(&self) -> usize {
        self.columns.iter().filter(|c| c.field.is_some()).count()
    }
}

#[derive(Debug, Deserialize)]
struct LayoutFile {
    #[serde(alias = "lista", default)]
    list: Vec<LayoutFileEntry>,
}

#[derive(Debug, Deserialize)]
struct LayoutFileEntry {
    #[serde(alias = "encabezado", default)]
    header: String,
    #[serde(rename = "patron", alias = "patterns", default)]
    patterns: Vec<String>,
}

/// Ordered set of layouts loaded for one parsing session
#[derive(Debug, Clone)]
pub struct LayoutRegistry {
    layouts: Vec<Layout>,
    source_dir: PathBuf,
}

impl LayoutRegistry {
    /// Load every layout definition in a directory
    ///
    /// Invalid files are skipped with a warning. Fails when the directory
    /// cannot be read or no file yields a valid layout.
    pub fn load(layouts_dir: &Path) -> Result<Self> {
        info!("Loading layouts from {}", layouts_dir.display());

        if !layouts_dir.is_dir() {
            return Err(ExtractError::configuration(format!(
                "Layout directory does not exist: {}",
                layouts_dir.display()
            )));
        }

        let escaped_dir = glob::Pattern::escape(&layouts_dir.to_string_lossy());
        let pattern = Path::new(&escaped_dir).join(format!("*.{}", DEFINITION_FILE_EXTENSION));
        let paths = glob::glob(&pattern.to_string_lossy()).map_err(|e| {
            ExtractError::configuration_with(
                format!("Invalid layout directory path: {}", layouts_dir.display()),
                e,
            )
        })?;

        let mut layouts = Vec::new();
        let mut files_seen = 0;

        for entry in paths {
            let path = entry.map_err(|e| {
                ExtractError::configuration_with("Failed to read layout directory entry", e)
            })?;
            files_seen += 1;

            match Self::load_file(&path) {
                Ok(layout) => {
                    debug!(
                        "Loaded layout '{}' with {} columns ({} known fields)",
                        layout.name,
                        layout.columns.len(),
                        layout.known_field_count()
                    );
                    layouts.push(layout);
                }
                Err(e) => warn!("Skipping layout file {}: {}", path.display(), e),
            }
        }

        info!(
            "Layout loading completed: {} of {} files valid",
            layouts.len(),
            files_seen
        );

        if layouts.is_empty() {
            return Err(ExtractError::configuration(format!(
                "No valid layouts found in {}",
                layouts_dir.display()
            )));
        }

        Ok(Self {
            layouts,
            source_dir: layouts_dir.to_path_buf(),
        })
    }

    /// Parse a single layout definition file
    pub fn load_file(path: &Path) -> Result<Layout> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExtractError::configuration_with(format!("Cannot read {}", path.display()), e)
        })?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self::parse_layout(&name, &content)
    }

    /// Parse layout JSON content
    pub fn parse_layout(name: &str, content: &str) -> Result<Layout> {
        let file: LayoutFile = serde_json::from_str(content).map_err(|e| {
            ExtractError::configuration_with(format!("Invalid JSON in layout '{}'", name), e)
        })?;

        if file.list.is_empty() {
            return Err(ExtractError::configuration(format!(
                "Layout '{}' has an empty field list",
                name
            )));
        }

        let mut columns = Vec::with_capacity(file.list.len());
        for (position, entry) in file.list.into_iter().enumerate() {
            let identifier = entry.header.trim().to_string();
            if identifier.is_empty() {
                return Err(ExtractError::configuration(format!(
                    "Layout '{}' has a field without header identifier at position {}",
                    name, position
                )));
            }

            if entry.patterns.is_empty() {
                warn!(
                    "Layout '{}' field '{}' has no header patterns and can never match",
                    name, identifier
                );
            }

            columns.push(LayoutColumn {
                field: Field::from_identifier(&identifier),
                patterns: entry
                    .patterns
                    .iter()
                    .map(|p| p.trim().to_lowercase())
                    .filter(|p| !p.is_empty())
                    .collect(),
                identifier,
            });
        }

        Ok(Layout {
            name: name.to_string(),
            columns,
        })
    }

    /// Build a registry from already parsed layouts, in priority order
    pub fn from_layouts(layouts: Vec<Layout>) -> Result<Self> {
        if layouts.is_empty() {
            return Err(ExtractError::configuration("At least one layout is required"));
        }
        Ok(Self {
            layouts,
            source_dir: PathBuf::new(),
        })
    }

    /// First layout, in priority order, accepting the header row
    pub fn find_match(&self, lower_header: &[String]) -> Option<&Layout> {
        self.layouts.iter().find(|layout| layout.matches(lower_header))
    }

    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }
}
