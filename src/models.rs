//! Core data structures for schedule extraction.
//!
//! Defines the subject record built for every data row, its nested value
//! groups, the per-sheet result and the run statistics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Instructor assigned to a subject section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    pub title: String,
    pub last_name: String,
    pub first_name: String,
    pub email: String,
}

/// Weekly class slot: time range text and room
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSlot {
    pub time_range: String,
    pub room: String,
}

impl ClassSlot {
    pub fn is_empty(&self) -> bool {
        self.time_range.is_empty() && self.room.is_empty()
    }
}

/// Weekly timetable of a section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub monday: ClassSlot,
    pub tuesday: ClassSlot,
    pub wednesday: ClassSlot,
    pub thursday: ClassSlot,
    pub friday: ClassSlot,
    pub saturday: ClassSlot,

    /// Specific Saturdays the section meets on
    pub saturday_dates: Vec<NaiveDate>,

    /// Saturday dates cell as written in the workbook
    pub saturday_dates_text: String,
}

/// Midterm exam sitting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidtermExam {
    pub date: Option<NaiveDate>,
    pub time: String,
    pub room: String,
}

/// Final exam sitting with its grade review appointment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalExam {
    pub date: Option<NaiveDate>,
    pub time: String,
    pub room: String,
    pub review_date: Option<NaiveDate>,
    pub review_time: String,
}

/// Final exam committee
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committee {
    pub chair: String,
    pub first_member: String,
    pub second_member: String,
}

/// One subject section extracted from a data row
///
/// Fields the row does not provide keep their zero value: empty strings,
/// `None` dates and a semester of `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub program: String,
    pub department: String,
    pub subject_name: String,
    /// Semester number, `0` when absent
    pub semester: i32,
    pub section: String,

    pub instructor: Instructor,
    pub schedule: WeeklySchedule,

    pub midterms: [MidtermExam; 2],
    pub finals: [FinalExam; 2],
    pub committee: Committee,
}

impl ExtractedRecord {
    /// Create a blank record for the given program
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Whether no field other than the program was populated
    pub fn is_empty(&self) -> bool {
        *self == Self::new(self.program.clone())
    }
}

/// Records extracted from one sheet, in row order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsingResult {
    /// Sheet label, the program code of the sheet
    pub sheet: String,
    pub records: Vec<ExtractedRecord>,
}

/// Counters collected over one engine's lifetime
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub sheets_seen: usize,
    pub sheets_parsed: usize,
    pub sheets_ignored: usize,
    pub sheets_skipped: usize,
    pub records_extracted: usize,
    pub semesters_backfilled: usize,
    pub reconciler_cache_hits: usize,
    pub processing_time_ms: u128,
}
