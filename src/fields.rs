//! Field identifiers and their setters.
//!
//! Layout files name their columns with free-text identifiers. Every
//! identifier the engine understands resolves to one [`Field`]; each field
//! knows which normalizer its text goes through and where the value lands in
//! an [`ExtractedRecord`]. Identifiers that resolve to nothing are kept in the
//! layout (they still occupy a column) but their cells are ignored.

use crate::models::{ClassSlot, ExtractedRecord};
use crate::normalizer::ValueNormalizer;

/// Weekdays with class slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

/// Which of the two exam sittings a field belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sitting {
    First,
    Second,
}

impl Sitting {
    fn index(self) -> usize {
        match self {
            Sitting::First => 0,
            Sitting::Second => 1,
        }
    }
}

/// Committee seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    Chair,
    FirstMember,
    SecondMember,
}

/// Every record field a layout column can feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Department,
    SubjectName,
    Semester,
    Section,
    InstructorTitle,
    InstructorLastName,
    InstructorFirstName,
    InstructorEmail,
    ClassTime(Weekday),
    ClassRoom(Weekday),
    SaturdayDates,
    MidtermDate(Sitting),
    MidtermTime(Sitting),
    MidtermRoom(Sitting),
    FinalDate(Sitting),
    FinalTime(Sitting),
    FinalRoom(Sitting),
    FinalReviewDate(Sitting),
    FinalReviewTime(Sitting),
    Committee(Seat),
}

impl Field {
    /// Resolve a layout identifier, `None` for identifiers with no field
    ///
    /// Both the Spanish identifiers used by published layouts and English
    /// equivalents are accepted; matching ignores case.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        use Field::*;
        use Seat::*;
        use Sitting::*;
        use Weekday::*;

        let field = match identifier.trim().to_lowercase().as_str() {
            "departamento" | "department" => Department,
            "asignatura" | "subject" | "subject_name" => SubjectName,
            "nivel" | "semestre" | "semester" | "level" => Semester,
            "seccion" | "sección" | "section" => Section,

            "titulo" | "título" | "title" => InstructorTitle,
            "apellido" | "last_name" => InstructorLastName,
            "nombre" | "first_name" => InstructorFirstName,
            "correo" | "email" => InstructorEmail,

            "horalunes" | "monday" => ClassTime(Monday),
            "aulalunes" | "monday_room" => ClassRoom(Monday),
            "horamartes" | "tuesday" => ClassTime(Tuesday),
            "aulamartes" | "tuesday_room" => ClassRoom(Tuesday),
            "horamiercoles" | "wednesday" => ClassTime(Wednesday),
            "aulamiercoles" | "wednesday_room" => ClassRoom(Wednesday),
            "horajueves" | "thursday" => ClassTime(Thursday),
            "aulajueves" | "thursday_room" => ClassRoom(Thursday),
            "horaviernes" | "friday" => ClassTime(Friday),
            "aulaviernes" | "friday_room" => ClassRoom(Friday),
            "horasabado" | "saturday" => ClassTime(Saturday),
            "aulasabado" | "saturday_room" => ClassRoom(Saturday),
            "fechassabado" | "saturday_dates" => SaturdayDates,

            "diaparcial1" | "midterm1_date" => MidtermDate(First),
            "horaparcial1" | "midterm1_time" => MidtermTime(First),
            "aulaparcial1" | "midterm1_room" => MidtermRoom(First),
            "diaparcial2" | "midterm2_date" => MidtermDate(Second),
            "horaparcial2" | "midterm2_time" => MidtermTime(Second),
            "aulaparcial2" | "midterm2_room" => MidtermRoom(Second),

            "diafinal1" | "final1_date" => FinalDate(First),
            "horafinal1" | "final1_time" => FinalTime(First),
            "aulafinal1" | "final1_room" => FinalRoom(First),
            "revisionfinal1dia" | "final1_review_date" => FinalReviewDate(First),
            "revisionfinal1hora" | "final1_review_time" => FinalReviewTime(First),
            "diafinal2" | "final2_date" => FinalDate(Second),
            "horafinal2" | "final2_time" => FinalTime(Second),
            "aulafinal2" | "final2_room" => FinalRoom(Second),
            "revisionfinal2dia" | "final2_review_date" => FinalReviewDate(Second),
            "revisionfinal2hora" | "final2_review_time" => FinalReviewTime(Second),

            "mesapresidente" | "committee_chair" => Committee(Chair),
            "mesamiembro1" | "committee_member1" => Committee(FirstMember),
            "mesamiembro2" | "committee_member2" => Committee(SecondMember),

            _ => return None,
        };

        Some(field)
    }

    /// Store a trimmed, non-blank cell value into the record
    pub fn apply(self, record: &mut ExtractedRecord, value: &str, normalizer: &mut ValueNormalizer) {
        match self {
            Field::Department => record.department = value.to_string(),
            Field::SubjectName => record.subject_name = value.to_string(),
            Field::Semester => record.semester = normalizer.parse_integer(value),
            Field::Section => record.section = value.to_string(),

            Field::InstructorTitle => record.instructor.title = value.to_string(),
            Field::InstructorLastName => record.instructor.last_name = value.to_string(),
            Field::InstructorFirstName => record.instructor.first_name = value.to_string(),
            Field::InstructorEmail => record.instructor.email = value.to_string(),

            Field::ClassTime(day) => slot_mut(record, day).time_range = value.to_string(),
            Field::ClassRoom(day) => slot_mut(record, day).room = value.to_string(),
            Field::SaturdayDates => {
                record.schedule.saturday_dates = normalizer.parse_date_list(value);
                record.schedule.saturday_dates_text = value.to_string();
            }

            Field::MidtermDate(s) => record.midterms[s.index()].date = normalizer.parse_date(value),
            Field::MidtermTime(s) => record.midterms[s.index()].time = normalizer.parse_time(value),
            Field::MidtermRoom(s) => record.midterms[s.index()].room = value.to_string(),

            Field::FinalDate(s) => record.finals[s.index()].date = normalizer.parse_date(value),
            Field::FinalTime(s) => record.finals[s.index()].time = normalizer.parse_time(value),
            Field::FinalRoom(s) => record.finals[s.index()].room = value.to_string(),
            Field::FinalReviewDate(s) => {
                record.finals[s.index()].review_date = normalizer.parse_date(value)
            }
            Field::FinalReviewTime(s) => {
                record.finals[s.index()].review_time = normalizer.parse_time(value)
            }

            Field::Committee(Seat::Chair) => record.committee.chair = value.to_string(),
            Field::Committee(Seat::FirstMember) => record.committee.first_member = value.to_string(),
            Field::Committee(Seat::SecondMember) => {
                record.committee.second_member = value.to_string()
            }
        }
    }
}

fn slot_mut(record: &mut ExtractedRecord, day: Weekday) -> &mut ClassSlot {
    let schedule = &mut record.schedule;
    match day {
        Weekday::Monday => &mut schedule.monday,
        Weekday::Tuesday => &mut schedule.tuesday,
        Weekday::Wednesday => &mut schedule.wednesday,
        Weekday::Thursday => &mut schedule.thursday,
        Weekday::Friday => &mut schedule.friday,
        Weekday::Saturday => &mut schedule.saturday,
    }
}
