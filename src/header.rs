//! Header row detection and layout binding.
//!
//! Header rows are recognised by marker words rather than position, since
//! the number of title rows above the table changes between releases. The
//! detected row is then bound to the first registered layout that accepts
//! it, together with the column where the table starts.

use crate::error::{ExtractError, Result};
use crate::layout::{Layout, LayoutRegistry};
use tracing::debug;

/// Layout chosen for a sheet and the column its first field sits in
#[derive(Debug, Clone, Copy)]
pub struct HeaderBinding<'a> {
    pub layout: &'a Layout,
    pub starting_column: usize,
}

/// Decides which row is the header and which layout it follows
#[derive(Debug)]
pub struct HeaderMatcher<'a> {
    registry: &'a LayoutRegistry,
    markers: &'a [String],
}

impl<'a> HeaderMatcher<'a> {
    pub fn new(registry: &'a LayoutRegistry, markers: &'a [String]) -> Self {
        Self { registry, markers }
    }

    /// Whether any non-blank cell contains a header marker
    pub fn is_header_row(&self, row: &[String]) -> bool {
        row.iter()
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
            .any(|cell| {
                let lower = cell.to_lowercase();
                self.markers
                    .iter()
                    .any(|marker| lower.contains(marker.as_str()))
            })
    }

    /// Bind a header row to a layout
    pub fn bind(&self, sheet: &str, row: &[String]) -> Result<HeaderBinding<'a>> {
        let lower_header = lower_header(row);
        let starting_column = starting_column(row);

        let layout = self.registry.find_match(&lower_header).ok_or_else(|| {
            ExtractError::layout_match(
                sheet,
                format!(
                    "header row matches none of {} registered layouts: [{}]",
                    self.registry.len(),
                    lower_header
                        .iter()
                        .filter(|c| !c.is_empty())
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )
        })?;

        debug!(
            "Sheet '{}' bound to layout '{}' starting at column {}",
            sheet, layout.name, starting_column
        );

        Ok(HeaderBinding {
            layout,
            starting_column,
        })
    }
}

/// Trimmed, lower-cased projection of a header row
pub fn lower_header(row: &[String]) -> Vec<String> {
    row.iter().map(|cell| cell.trim().to_lowercase()).collect()
}

/// Index of the first non-blank cell, `0` for a blank row
pub fn starting_column(row: &[String]) -> usize {
    row.iter()
        .position(|cell| !is_blank(cell))
        .unwrap_or(0)
}

/// Whether a cell holds only whitespace
pub fn is_blank(cell: &str) -> bool {
    cell.trim().is_empty()
}

/// Whether every cell of a row is blank
pub fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| is_blank(cell))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn registry() -> LayoutRegistry {
        let layout = LayoutRegistry::parse_layout(
            "simple",
            r#"{ "list": [
                { "header": "item", "patron": ["item", "ítem"] },
                { "header": "department", "patron": ["depto"] },
                { "header": "subject", "patron": ["materia", "asignatura"] }
            ] }"#,
        )
        .unwrap();
        LayoutRegistry::from_layouts(vec![layout]).unwrap()
    }

    fn markers() -> Vec<String> {
        vec!["item".to_string(), "ítem".to_string()]
    }

    #[test]
    fn test_header_row_detection() {
        let registry = registry();
        let markers = markers();
        let matcher = HeaderMatcher::new(&registry, &markers);

        assert!(matcher.is_header_row(&row(&["", "  ÍTEM ", "Depto"])));
        assert!(matcher.is_header_row(&row(&["Item", "Depto"])));
        assert!(!matcher.is_header_row(&row(&["Horario de clases", "2do periodo"])));
        assert!(!matcher.is_header_row(&row(&["", "   "])));
    }

    #[test]
    fn test_starting_column_counts_leading_blanks() {
        assert_eq!(starting_column(&row(&["Item", "Depto"])), 0);
        assert_eq!(starting_column(&row(&["", " ", "Item"])), 2);
        assert_eq!(starting_column(&row(&["", "", "", "Item", "", "Depto"])), 3);
        assert_eq!(starting_column(&row(&[])), 0);
    }

    #[test]
    fn test_bind_returns_layout_and_offset() {
        let registry = registry();
        let markers = markers();
        let matcher = HeaderMatcher::new(&registry, &markers);

        let binding = matcher
            .bind("IIN", &row(&["", "", "Ítem", "Depto", "", "Materia"]))
            .unwrap();

        assert_eq!(binding.layout.name, "simple");
        assert_eq!(binding.starting_column, 2);
    }

    #[test]
    fn test_bind_without_matching_layout_fails() {
        let registry = registry();
        let markers = markers();
        let matcher = HeaderMatcher::new(&registry, &markers);

        let error = matcher
            .bind("IIN", &row(&["Item", "Docente", "Materia"]))
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::LayoutMatch);
        assert!(error.to_string().contains("IIN"));
    }

    #[test]
    fn test_blank_row_detection() {
        assert!(is_blank_row(&row(&[])));
        assert!(is_blank_row(&row(&["", "  ", "\t"])));
        assert!(!is_blank_row(&row(&["", "x"])));
    }
}
