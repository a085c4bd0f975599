//! Extraction engine.
//!
//! Orchestrates one parsing session: the layout registry is loaded once, then
//! every relevant sheet of a workbook goes through header detection, layout
//! binding and row extraction. Records missing a semester are optionally
//! completed from the program catalog.

use crate::catalog::CatalogLoader;
use crate::config::{ExtractorConfig, SheetPolicy};
use crate::error::{ErrorKind, ExtractError, Result};
use crate::extractor::extract_row;
use crate::header::{HeaderMatcher, is_blank_row};
use crate::layout::LayoutRegistry;
use crate::models::{ExtractedRecord, ExtractionStats, ParsingResult};
use crate::normalizer::ValueNormalizer;
use crate::reconciler::NameReconciler;
use crate::workbook::{CalamineWorkbook, RowStream, WorkbookReader};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Turns schedule workbooks into per-sheet record lists
#[derive(Debug)]
pub struct ExtractionEngine {
    config: ExtractorConfig,
    registry: LayoutRegistry,
    normalizer: ValueNormalizer,
    reconciler: Option<NameReconciler>,
    stats: ExtractionStats,
}

impl ExtractionEngine {
    /// Create an engine, loading layouts from the configured directory
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        let registry = LayoutRegistry::load(&config.layouts_dir)?;
        Ok(Self::with_registry(config, registry))
    }

    /// Create an engine over an already loaded registry
    pub fn with_registry(config: ExtractorConfig, registry: LayoutRegistry) -> Self {
        let reconciler = config.backfill_catalog_dir().map(|dir| {
            info!("Semester backfill enabled with catalogs from {}", dir.display());
            NameReconciler::new(CatalogLoader::new(dir))
        });

        Self {
            config,
            registry,
            normalizer: ValueNormalizer::new(),
            reconciler,
            stats: ExtractionStats::default(),
        }
    }

    /// Use the given reconciler for semester backfill
    pub fn with_reconciler(mut self, reconciler: NameReconciler) -> Self {
        self.reconciler = Some(reconciler);
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn registry(&self) -> &LayoutRegistry {
        &self.registry
    }

    /// Counters accumulated over every workbook processed so far
    pub fn stats(&self) -> &ExtractionStats {
        &self.stats
    }

    /// Extract every relevant sheet of a workbook file
    pub fn extract_file(&mut self, path: &Path) -> Result<Vec<ParsingResult>> {
        info!("Extracting schedule workbook {}", path.display());
        let mut workbook = CalamineWorkbook::open(path)?;
        self.extract_workbook(&mut workbook)
    }

    /// Extract every relevant sheet of an open workbook, in sheet order
    ///
    /// Denylisted sheets are left out. A sheet without a usable header either
    /// aborts the run or is skipped, depending on the configured policy.
    pub fn extract_workbook<W: WorkbookReader>(
        &mut self,
        workbook: &mut W,
    ) -> Result<Vec<ParsingResult>> {
        let start_time = Instant::now();
        let mut results = Vec::new();

        for sheet in workbook.sheet_names() {
            self.stats.sheets_seen += 1;

            if self.config.is_ignored_sheet(&sheet) {
                debug!("Ignoring sheet '{}'", sheet);
                self.stats.sheets_ignored += 1;
                continue;
            }

            let rows = workbook.rows(&sheet)?;
            match self.extract_sheet(&sheet, rows) {
                Ok(result) => {
                    info!(
                        "Sheet '{}': {} records extracted",
                        sheet,
                        result.records.len()
                    );
                    self.stats.sheets_parsed += 1;
                    self.stats.records_extracted += result.records.len();
                    results.push(result);
                }
                Err(e) if e.is_sheet_scoped() && self.config.sheet_policy == SheetPolicy::Skip => {
                    warn!("Skipping sheet '{}': {}", sheet, e);
                    self.stats.sheets_skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(reconciler) = &self.reconciler {
            self.stats.reconciler_cache_hits = reconciler.cache_hits();
        }
        self.stats.processing_time_ms += start_time.elapsed().as_millis();

        info!(
            "Workbook done: {} of {} sheets parsed, {} records",
            self.stats.sheets_parsed, self.stats.sheets_seen, self.stats.records_extracted
        );

        Ok(results)
    }

    /// Extract one sheet from its row stream
    ///
    /// Rows before the header are skipped, the first blank row after it
    /// ends the data region. The sheet name is the program code of every
    /// record.
    pub fn extract_sheet(&mut self, sheet: &str, mut rows: RowStream<'_>) -> Result<ParsingResult> {
        let program = sheet.trim();
        let matcher = HeaderMatcher::new(&self.registry, &self.config.header_markers);

        let mut binding = None;
        for row in rows.by_ref() {
            let row = row?;
            if !is_blank_row(&row) && matcher.is_header_row(&row) {
                binding = Some(matcher.bind(sheet, &row)?);
                break;
            }
        }

        let Some(binding) = binding else {
            return Err(ExtractError::layout_match(sheet, "no header row found"));
        };

        let mut records = Vec::new();
        for row in rows {
            let row = row?;
            if is_blank_row(&row) {
                break;
            }
            records.push(extract_row(&binding, &row, program, &mut self.normalizer));
        }

        if let Some(reconciler) = self.reconciler.as_mut() {
            for record in &mut records {
                if backfill_semester(reconciler, record) {
                    self.stats.semesters_backfilled += 1;
                }
            }
        }

        Ok(ParsingResult {
            sheet: sheet.to_string(),
            records,
        })
    }
}

/// Fill a missing semester from the catalog, returning whether it was set
fn backfill_semester(reconciler: &mut NameReconciler, record: &mut ExtractedRecord) -> bool {
    if record.semester != 0 || record.subject_name.trim().is_empty() {
        return false;
    }

    match reconciler.find_by_similar_name(&record.program, &record.subject_name) {
        Ok(entry) => {
            debug!(
                "Backfilled semester {} for '{}' in {}",
                entry.semester, record.subject_name, record.program
            );
            record.semester = entry.semester;
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(
                "No catalog entry for '{}' in {}",
                record.subject_name, record.program
            );
            false
        }
        Err(e) => {
            warn!(
                "Semester lookup failed for '{}' in {}: {}",
                record.subject_name, record.program, e
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogEntry, ProgramCatalog};
    use crate::workbook::MemoryWorkbook;

    const SIMPLE_LAYOUT: &str = r#"{ "list": [
        { "header": "department", "patron": ["depto"] },
        { "header": "subject", "patron": ["materia", "asignatura"] },
        { "header": "semester", "patron": ["nivel", "semestre"] }
    ] }"#;

    const ITEM_LAYOUT: &str = r#"{ "list": [
        { "header": "item", "patron": ["item", "ítem"] },
        { "header": "departamento", "patron": ["depto"] },
        { "header": "asignatura", "patron": ["materia"] },
        { "header": "nivel", "patron": ["nivel"] }
    ] }"#;

    const EXAM_LAYOUT: &str = r#"{ "list": [
        { "header": "item", "patron": ["item", "ítem"] },
        { "header": "departamento", "patron": ["depto"] },
        { "header": "asignatura", "patron": ["materia"] },
        { "header": "nivel", "patron": ["nivel"] },
        { "header": "diaParcial1", "patron": ["parcial"] }
    ] }"#;

    fn registry(content: &str) -> LayoutRegistry {
        let layout = LayoutRegistry::parse_layout("test", content).unwrap();
        LayoutRegistry::from_layouts(vec![layout]).unwrap()
    }

    /// Exam layout first; four-column headers fall through to the item layout
    fn item_engine() -> ExtractionEngine {
        let layouts = vec![
            LayoutRegistry::parse_layout("exam", EXAM_LAYOUT).unwrap(),
            LayoutRegistry::parse_layout("item", ITEM_LAYOUT).unwrap(),
        ];
        ExtractionEngine::with_registry(
            ExtractorConfig::new("unused"),
            LayoutRegistry::from_layouts(layouts).unwrap(),
        )
    }

    #[test]
    fn test_end_to_end_offset_header() {
        let config = ExtractorConfig::new("unused").with_header_markers(["depto"]);
        let mut engine = ExtractionEngine::with_registry(config, registry(SIMPLE_LAYOUT));
        let mut workbook = MemoryWorkbook::new().with_sheet(
            "IIN",
            vec![
                vec!["", "Depto", "Materia", "Nivel"],
                vec!["", "DCB", "Algebra", "2"],
            ],
        );

        let results = engine.extract_workbook(&mut workbook).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].sheet, "IIN");
        let record = &results[0].records[0];
        assert_eq!(record.program, "IIN");
        assert_eq!(record.department, "DCB");
        assert_eq!(record.subject_name, "Algebra");
        assert_eq!(record.semester, 2);
    }

    #[test]
    fn test_blank_row_terminates_data_region() {
        let mut engine = item_engine();
        let mut workbook = MemoryWorkbook::new().with_sheet(
            "IIN",
            vec![
                vec!["Horarios 2do periodo 2024", "", "", ""],
                vec!["", "", "", ""],
                vec!["Item", "Depto", "Materia", "Nivel"],
                vec!["1", "DCB", "Algebra", "2"],
                vec!["2", "DCB", "Calculo I", "1"],
                vec!["3", "DIN", "Programacion", "3"],
                vec!["", "  ", "", ""],
                vec!["4", "DCB", "Fisica", "2"],
                vec!["5", "DCB", "Quimica", "1"],
            ],
        );

        let results = engine.extract_workbook(&mut workbook).unwrap();

        assert_eq!(results[0].records.len(), 3);
        assert_eq!(results[0].records[2].subject_name, "Programacion");
        assert_eq!(engine.stats().records_extracted, 3);
    }

    #[test]
    fn test_leading_blank_columns_offset_extraction() {
        let mut engine = item_engine();
        let mut workbook = MemoryWorkbook::new().with_sheet(
            "IEL",
            vec![
                vec!["", "", "Ítem", "Depto", "Materia", "Nivel", "Parcial 1"],
                vec!["", "", "1", "DEL", "Circuitos", "4", "12/04/24"],
            ],
        );

        let results = engine.extract_workbook(&mut workbook).unwrap();
        let record = &results[0].records[0];

        assert_eq!(record.department, "DEL");
        assert_eq!(record.semester, 4);
        assert_eq!(
            record.midterms[0].date,
            chrono::NaiveDate::from_ymd_opt(2024, 4, 12)
        );
    }

    #[test]
    fn test_ignored_sheets_are_not_parsed() {
        let mut engine = item_engine();
        let mut workbook = MemoryWorkbook::new()
            .with_sheet("Códigos", vec![vec!["Codigo", "Carrera"]])
            .with_sheet(
                "IIN",
                vec![vec!["Item", "Depto", "Materia", "Nivel"], vec!["1", "DCB", "Algebra", "2"]],
            )
            .with_sheet("Asignaturas Homologadas", vec![vec!["x"]])
            .with_sheet("CÓDIGOS DE CARRERA", vec![vec!["Item", "Codigo"]]);

        let results = engine.extract_workbook(&mut workbook).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(engine.stats().sheets_seen, 4);
        assert_eq!(engine.stats().sheets_ignored, 3);
        assert_eq!(engine.stats().sheets_parsed, 1);
    }

    #[test]
    fn test_unmatched_header_aborts_by_default() {
        let mut engine = item_engine();
        let mut workbook = MemoryWorkbook::new()
            .with_sheet("IIN", vec![vec!["Item", "Docente", "Correo"]])
            .with_sheet("IEL", vec![vec!["Item", "Depto", "Materia", "Nivel"]]);

        let error = engine.extract_workbook(&mut workbook).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::LayoutMatch);
        assert!(error.to_string().contains("IIN"));
    }

    #[test]
    fn test_skip_policy_continues_with_next_sheet() {
        let config = ExtractorConfig::new("unused").with_sheet_policy(SheetPolicy::Skip);
        let mut engine = ExtractionEngine::with_registry(config, registry(ITEM_LAYOUT));
        let mut workbook = MemoryWorkbook::new()
            .with_sheet("Portada", vec![vec!["Universidad"], vec!["Horarios"]])
            .with_sheet(
                "IEL",
                vec![vec!["Item", "Depto", "Materia", "Nivel"], vec!["1", "DEL", "Redes", "7"]],
            );

        let results = engine.extract_workbook(&mut workbook).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].sheet, "IEL");
        assert_eq!(engine.stats().sheets_skipped, 1);
    }

    #[test]
    fn test_header_without_data_rows_yields_empty_result() {
        let mut engine = item_engine();
        let mut workbook = MemoryWorkbook::new()
            .with_sheet("IIN", vec![vec!["Item", "Depto", "Materia", "Nivel"]]);

        let results = engine.extract_workbook(&mut workbook).unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].records.is_empty());
    }

    #[test]
    fn test_missing_semester_backfilled_from_catalog() {
        let catalog = ProgramCatalog::new(
            "IIN",
            "Ingenieria Informatica",
            vec![CatalogEntry {
                name: "Cálculo I".to_string(),
                semester: 1,
                credits: 6,
            }],
        );
        let reconciler =
            NameReconciler::with_catalogs(CatalogLoader::new("unused"), vec![catalog]);
        let mut engine = item_engine().with_reconciler(reconciler);
        let mut workbook = MemoryWorkbook::new().with_sheet(
            "IIN",
            vec![
                vec!["Item", "Depto", "Materia", "Nivel"],
                vec!["1", "DCB", "Calculo I (*)", ""],
                vec!["2", "DCB", "Calculo I - Paralelo B", ""],
                vec!["3", "DCB", "Electiva", ""],
                vec!["4", "DCB", "Algebra", "2"],
            ],
        );

        let results = engine.extract_workbook(&mut workbook).unwrap();
        let records = &results[0].records;

        assert_eq!(records[0].semester, 1);
        assert_eq!(records[1].semester, 1);
        assert_eq!(records[2].semester, 0);
        assert_eq!(records[3].semester, 2);
        assert_eq!(engine.stats().semesters_backfilled, 2);
    }

    #[test]
    fn test_missing_layouts_dir_is_configuration_error() {
        let error = ExtractionEngine::new(ExtractorConfig::new("/nonexistent/layouts")).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }
}
