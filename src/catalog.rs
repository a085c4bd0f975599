//! Per-program subject catalogs.
//!
//! A catalog lists the canonical subjects of one program with their
//! semester and credit count. Catalogs live in one JSON file per program
//! code (`<code>.json`) and are only used to fill fields the workbook leaves
//! out.

use crate::constants::DEFINITION_FILE_EXTENSION;
use crate::error::{ExtractError, Result};
use crate::reconciler::normalize_name;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Canonical subject of a program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Normalized subject name
    pub name: String,
    pub semester: i32,
    pub credits: i32,
}

/// All catalog entries of one program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramCatalog {
    #[serde(rename = "career_code")]
    pub program_code: String,
    #[serde(rename = "career_name", default)]
    pub program_name: String,
    #[serde(rename = "subjects", default)]
    entries: Vec<CatalogEntry>,
}

impl ProgramCatalog {
    pub fn new(
        program_code: impl Into<String>,
        program_name: impl Into<String>,
        entries: Vec<CatalogEntry>,
    ) -> Self {
        let mut catalog = Self {
            program_code: program_code.into(),
            program_name: program_name.into(),
            entries,
        };
        catalog.normalize_entries();
        catalog
    }

    fn normalize_entries(&mut self) {
        for entry in &mut self.entries {
            let normalized = normalize_name(&entry.name);
            if normalized != entry.name {
                debug!(
                    "Catalog '{}': normalized entry '{}' to '{}'",
                    self.program_code, entry.name, normalized
                );
                entry.name = normalized;
            }
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Entry whose name equals an already normalized name
    pub fn find_normalized(&self, normalized_name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.name == normalized_name)
    }

    /// Entry whose name equals the given name, ignoring case and outer spaces
    pub fn find_exact(&self, name: &str) -> Option<&CatalogEntry> {
        let wanted = name.trim().to_lowercase();
        self.entries
            .iter()
            .find(|e| e.name.trim().to_lowercase() == wanted)
    }
}

/// Reads catalog files from a directory
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    catalog_dir: PathBuf,
}

impl CatalogLoader {
    pub fn new(catalog_dir: impl Into<PathBuf>) -> Self {
        Self {
            catalog_dir: catalog_dir.into(),
        }
    }

    pub fn catalog_dir(&self) -> &Path {
        &self.catalog_dir
    }

    /// Path of a program's catalog file
    pub fn catalog_path(&self, program_code: &str) -> PathBuf {
        self.catalog_dir
            .join(format!("{}.{}", program_code, DEFINITION_FILE_EXTENSION))
    }

    /// Load the catalog of one program
    ///
    /// A missing file yields `NotFound`; unreadable or malformed content
    /// yields an `Input` error carrying the cause.
    pub fn load(&self, program_code: &str) -> Result<ProgramCatalog> {
        let path = self.catalog_path(program_code);
        if !path.is_file() {
            return Err(ExtractError::not_found(format!(
                "no catalog for program '{}' at {}",
                program_code,
                path.display()
            )));
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            ExtractError::input_with(format!("Cannot read catalog {}", path.display()), e)
        })?;

        let mut catalog: ProgramCatalog = serde_json::from_str(&content).map_err(|e| {
            ExtractError::input_with(format!("Malformed catalog {}", path.display()), e)
        })?;
        catalog.normalize_entries();

        debug!(
            "Loaded catalog '{}' ({}) with {} subjects",
            catalog.program_code,
            catalog.program_name,
            catalog.entries.len()
        );

        Ok(catalog)
    }

    /// Program codes that have a catalog file, sorted
    pub fn available_programs(&self) -> Result<Vec<String>> {
        if !self.catalog_dir.is_dir() {
            return Err(ExtractError::not_found(format!(
                "catalog directory does not exist: {}",
                self.catalog_dir.display()
            )));
        }

        let mut codes = Vec::new();
        for entry in WalkDir::new(&self.catalog_dir).max_depth(1) {
            let entry = entry.map_err(|e| {
                ExtractError::input_with("Failed to walk catalog directory", e)
            })?;
            let path = entry.path();
            if entry.file_type().is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == DEFINITION_FILE_EXTENSION)
            {
                if let Some(stem) = path.file_stem() {
                    codes.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        codes.sort();
        Ok(codes)
    }
}
