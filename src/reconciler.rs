//! Subject name reconciliation against program catalogs.
//!
//! Workbook subject names are free text ("Electiva 2 - Técnicas de
//! Organización (*)"); catalog names are normalized canonical titles. The
//! reconciler normalizes the workbook name, tries the part before the first
//! dash and then the part after it, and looks for an exact match.
//!
//! Consecutive rows usually repeat the same subject for each section, often
//! with a trailing qualifier, so the last two lookups are kept and a query
//! that is a prefix of a remembered name is answered from memory.

use crate::catalog::{CatalogEntry, CatalogLoader, ProgramCatalog};
use crate::error::{ErrorKind, ExtractError, Result};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Normalize a subject name for catalog comparison
///
/// Lower-cases, replaces accented Latin vowels, `ñ` and `ü` with their plain
/// letters, drops combining accents, `*`, `(` and `)`, collapses whitespace
/// runs and trims.
pub fn normalize_name(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    let mut pending_space = false;

    for c in raw.chars().flat_map(char::to_lowercase) {
        if matches!(c, '*' | '(' | ')' | '\u{300}'..='\u{36f}') {
            continue;
        }
        if c.is_whitespace() {
            pending_space = !normalized.is_empty();
            continue;
        }
        if pending_space {
            normalized.push(' ');
            pending_space = false;
        }
        normalized.push(strip_accent(c));
    }

    normalized
}

fn strip_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        other => other,
    }
}

/// Remembered lookup: program, raw query and its answer
#[derive(Debug, Clone)]
struct RecentLookup {
    program: String,
    raw_name: String,
    entry: Option<CatalogEntry>,
}

impl RecentLookup {
    fn answers(&self, program: &str, raw_name: &str) -> bool {
        self.program == program && self.raw_name.starts_with(raw_name)
    }
}

/// Two-slot most-recently-used lookup cache
#[derive(Debug, Default)]
struct RecentLookups {
    slots: [Option<RecentLookup>; 2],
    hits: usize,
}

impl RecentLookups {
    fn get(&mut self, program: &str, raw_name: &str) -> Option<Option<CatalogEntry>> {
        if let Some(first) = &self.slots[0] {
            if first.answers(program, raw_name) {
                self.hits += 1;
                return Some(first.entry.clone());
            }
        }

        if let Some(second) = &self.slots[1] {
            if second.answers(program, raw_name) {
                self.hits += 1;
                let entry = second.entry.clone();
                self.slots.swap(0, 1);
                return Some(entry);
            }
        }

        None
    }

    fn push(&mut self, program: &str, raw_name: &str, entry: Option<CatalogEntry>) {
        self.slots[1] = self.slots[0].take();
        self.slots[0] = Some(RecentLookup {
            program: program.to_string(),
            raw_name: raw_name.to_string(),
            entry,
        });
    }
}

/// Matches workbook subject names to catalog entries
///
/// Catalogs are loaded on first use per program and kept for the session;
/// a program whose catalog is missing or malformed is remembered as having
/// none.
#[derive(Debug)]
pub struct NameReconciler {
    loader: CatalogLoader,
    catalogs: HashMap<String, Option<ProgramCatalog>>,
    recent: RecentLookups,
}

impl NameReconciler {
    pub fn new(loader: CatalogLoader) -> Self {
        Self {
            loader,
            catalogs: HashMap::new(),
            recent: RecentLookups::default(),
        }
    }

    /// Build a reconciler over catalogs that are already in memory
    pub fn with_catalogs(loader: CatalogLoader, catalogs: Vec<ProgramCatalog>) -> Self {
        let mut reconciler = Self::new(loader);
        for catalog in catalogs {
            reconciler
                .catalogs
                .insert(catalog.program_code.clone(), Some(catalog));
        }
        reconciler
    }

    /// Number of lookups answered from the recent-lookup cache
    pub fn cache_hits(&self) -> usize {
        self.recent.hits
    }

    /// Catalog of a program, loading it on first use
    pub fn catalog(&mut self, program: &str) -> Option<&ProgramCatalog> {
        if !self.catalogs.contains_key(program) {
            let loaded = match self.loader.load(program) {
                Ok(catalog) => Some(catalog),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    warn!("No catalog available for program '{}': {}", program, e);
                    None
                }
                Err(e) => {
                    warn!("Skipping catalog for program '{}': {}", program, e);
                    None
                }
            };
            self.catalogs.insert(program.to_string(), loaded);
        }

        self.catalogs.get(program).and_then(|c| c.as_ref())
    }

    /// Find the catalog entry a free-text subject name refers to
    pub fn find_by_similar_name(&mut self, program: &str, raw_name: &str) -> Result<CatalogEntry> {
        if raw_name.is_empty() {
            return Err(ExtractError::input("subject name cannot be empty"));
        }

        if let Some(cached) = self.recent.get(program, raw_name) {
            debug!(
                "Reconciler cache hit for '{}' ({} hits)",
                raw_name, self.recent.hits
            );
            return cached.ok_or_else(|| subject_not_found(program, raw_name));
        }

        let found = self
            .catalog(program)
            .and_then(|catalog| search_catalog(catalog, raw_name));
        self.recent.push(program, raw_name, found.clone());

        match found {
            Some(entry) => {
                debug!(
                    "Matched '{}' to '{}' (semester {}, {} credits)",
                    raw_name, entry.name, entry.semester, entry.credits
                );
                Ok(entry)
            }
            None => {
                debug!("No catalog match for '{}' in '{}'", raw_name, program);
                Err(subject_not_found(program, raw_name))
            }
        }
    }
}

/// Exact normalized search on the text before the first dash, then after it
fn search_catalog(catalog: &ProgramCatalog, raw_name: &str) -> Option<CatalogEntry> {
    let (head, tail) = match raw_name.split_once('-') {
        Some((head, tail)) => (head, Some(tail)),
        None => (raw_name, None),
    };

    catalog
        .find_normalized(&normalize_name(head))
        .or_else(|| tail.and_then(|tail| catalog.find_normalized(&normalize_name(tail))))
        .cloned()
}

fn subject_not_found(program: &str, raw_name: &str) -> ExtractError {
    ExtractError::not_found(format!(
        "no catalog subject in '{}' matches '{}'",
        program, raw_name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn entry(name: &str, semester: i32, credits: i32) -> CatalogEntry {
        CatalogEntry {
            name: name.to_string(),
            semester,
            credits,
        }
    }

    fn reconciler() -> NameReconciler {
        let catalog = ProgramCatalog::new(
            "IIN",
            "Ingeniería Informática",
            vec![
                entry("algebra lineal", 2, 5),
                entry("calculo i", 1, 6),
                entry("base de datos i", 5, 5),
                entry("tecnicas de organizacion y metodos", 7, 4),
            ],
        );
        NameReconciler::with_catalogs(CatalogLoader::new("unused"), vec![catalog])
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Álgebra Lineal"), "algebra lineal");
        assert_eq!(normalize_name("Cálculo I (*)"), "calculo i");
        assert_eq!(normalize_name("Técnicas (Avanzadas)"), "tecnicas avanzadas");
        assert_eq!(normalize_name("Programación II (**)"), "programacion ii");
        assert_eq!(normalize_name("  Espacios   Extra  "), "espacios extra");
        assert_eq!(normalize_name("Pingüino Ñandú"), "pinguino nandu");
        assert_eq!(normalize_name("Co\u{301}digos"), "codigos");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn test_normalize_name_is_idempotent() {
        for input in [
            "Álgebra Lineal",
            "  Cálculo I (*) ",
            "BASE de Datós\tI",
            "( * )",
            "Electiva 2 - Técnicas",
            "",
        ] {
            let once = normalize_name(input);
            assert_eq!(normalize_name(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_find_by_similar_name() {
        let mut reconciler = reconciler();

        let found = reconciler
            .find_by_similar_name("IIN", "Álgebra Lineal (*)")
            .unwrap();
        assert_eq!(found.name, "algebra lineal");
        assert_eq!(found.semester, 2);
        assert_eq!(found.credits, 5);

        let found = reconciler
            .find_by_similar_name("IIN", "BASE de Datós I")
            .unwrap();
        assert_eq!(found.name, "base de datos i");
    }

    #[test]
    fn test_dash_split_first_and_second_part() {
        let mut reconciler = reconciler();

        let first = reconciler
            .find_by_similar_name("IIN", "Cálculo I - Avanzado")
            .unwrap();
        assert_eq!(first.name, "calculo i");

        let second = reconciler
            .find_by_similar_name("IIN", "Avanzado - Técnicas de Organización y metodos")
            .unwrap();
        assert_eq!(second.name, "tecnicas de organizacion y metodos");
    }

    #[test]
    fn test_not_found_and_empty_name() {
        let mut reconciler = reconciler();

        let missing = reconciler
            .find_by_similar_name("IIN", "Materia Inexistente")
            .unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let empty = reconciler.find_by_similar_name("IIN", "").unwrap_err();
        assert_eq!(empty.kind(), ErrorKind::Input);
    }

    #[test]
    fn test_repeated_query_hits_cache_once() {
        let mut reconciler = reconciler();
        assert_eq!(reconciler.cache_hits(), 0);

        reconciler
            .find_by_similar_name("IIN", "Algebra Lineal")
            .unwrap();
        assert_eq!(reconciler.cache_hits(), 0);

        reconciler
            .find_by_similar_name("IIN", "Algebra Lineal")
            .unwrap();
        assert_eq!(reconciler.cache_hits(), 1);
    }

    #[test]
    fn test_prefix_query_hits_cache() {
        let mut reconciler = reconciler();

        reconciler
            .find_by_similar_name("IIN", "Cálculo I - Turno Noche")
            .unwrap();
        let found = reconciler.find_by_similar_name("IIN", "Cálculo I").unwrap();

        assert_eq!(found.name, "calculo i");
        assert_eq!(reconciler.cache_hits(), 1);
    }

    #[test]
    fn test_second_slot_hit_swaps_slots() {
        let mut reconciler = reconciler();

        reconciler.find_by_similar_name("IIN", "Algebra Lineal").unwrap();
        reconciler.find_by_similar_name("IIN", "Calculo I").unwrap();

        let found = reconciler.find_by_similar_name("IIN", "Algebra Lineal").unwrap();
        assert_eq!(found.name, "algebra lineal");
        assert_eq!(reconciler.cache_hits(), 1);

        // Algebra is now in slot one, Calculo still remembered in slot two
        reconciler.find_by_similar_name("IIN", "Calculo I").unwrap();
        assert_eq!(reconciler.cache_hits(), 2);
        assert_eq!(
            reconciler.recent.slots[0].as_ref().unwrap().raw_name,
            "Calculo I"
        );
    }

    #[test]
    fn test_slot_one_hit_keeps_longer_name() {
        let mut reconciler = reconciler();

        reconciler
            .find_by_similar_name("IIN", "Cálculo I - Turno Noche")
            .unwrap();
        reconciler.find_by_similar_name("IIN", "Cálculo I").unwrap();
        reconciler.find_by_similar_name("IIN", "Cálculo I - Turno").unwrap();

        assert_eq!(reconciler.cache_hits(), 2);
        assert_eq!(
            reconciler.recent.slots[0].as_ref().unwrap().raw_name,
            "Cálculo I - Turno Noche"
        );
        assert!(reconciler.recent.slots[1].is_none());
    }

    #[test]
    fn test_cached_miss_stays_a_miss() {
        let mut reconciler = reconciler();

        assert!(reconciler.find_by_similar_name("IIN", "Optativa X").is_err());
        let again = reconciler.find_by_similar_name("IIN", "Optativa X").unwrap_err();

        assert_eq!(again.kind(), ErrorKind::NotFound);
        assert_eq!(reconciler.cache_hits(), 1);
    }

    #[test]
    fn test_cache_is_scoped_by_program() {
        let mut reconciler = reconciler();

        reconciler.find_by_similar_name("IIN", "Algebra Lineal").unwrap();
        let other = reconciler.find_by_similar_name("IEL", "Algebra Lineal");

        assert!(other.is_err());
        assert_eq!(reconciler.cache_hits(), 0);
    }

    #[test]
    fn test_catalog_loaded_lazily_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("IEL.json"),
            r#"{ "career_code": "IEL", "career_name": "Electrónica",
                 "subjects": [ { "name": "circuitos i", "semester": 3, "credits": 6 } ] }"#,
        )
        .unwrap();

        let mut reconciler = NameReconciler::new(CatalogLoader::new(temp_dir.path()));

        let found = reconciler.find_by_similar_name("IEL", "Circuitos I").unwrap();
        assert_eq!(found.semester, 3);

        let missing = reconciler
            .find_by_similar_name("IMK", "Circuitos I")
            .unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert!(reconciler.catalog("IMK").is_none());
    }
}
