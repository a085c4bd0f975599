//! Data row extraction.
//!
//! Once a sheet's header is bound, every following row up to the first blank
//! one is a data row. Each layout column is read at `starting_column + i`
//! and its text handed to the column's field setter.

use crate::header::{HeaderBinding, is_blank};
use crate::models::ExtractedRecord;
use crate::normalizer::ValueNormalizer;

/// Build the record of one data row
///
/// Blank cells and columns without a known field are skipped; a row that
/// feeds no field still yields a (blank) record.
pub fn extract_row(
    binding: &HeaderBinding<'_>,
    row: &[String],
    program: &str,
    normalizer: &mut ValueNormalizer,
) -> ExtractedRecord {
    let mut record = ExtractedRecord::new(program);

    for (offset, column) in binding.layout.columns.iter().enumerate() {
        let Some(cell) = row.get(binding.starting_column + offset) else {
            break;
        };
        if is_blank(cell) {
            continue;
        }
        if let Some(field) = column.field {
            field.apply(&mut record, cell.trim(), normalizer);
        }
    }

    record
}
