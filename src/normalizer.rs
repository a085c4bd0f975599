//! Cell value normalization.
//!
//! Workbook releases encode the same value in different ways: dates as
//! `dd/mm/yy`, `dd.mm.yyyy` or ISO text, times as `H:MM` text or as a
//! fractional day, numbers with either decimal separator. The
//! [`ValueNormalizer`] turns these into canonical values and never fails:
//! unparseable input yields the zero value of the target type.

use crate::constants::{MINUTES_PER_DAY, TWO_DIGIT_YEAR_PREFIX};
use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

/// Separators allowed between day, month and year; both must be the same
const DATE_SEPARATORS: &[&str] = &["/", r"\.", "-", r"\s+", ""];

/// Value parsers with per-session caches
///
/// One instance belongs to one extraction engine; caches are never shared
/// between engines.
#[derive(Debug)]
pub struct ValueNormalizer {
    date_pattern: Regex,
    iso_date_pattern: Regex,
    non_time_chars: Regex,
    non_numeric_chars: Regex,
    date_cache: HashMap<String, NaiveDate>,
    time_cache: HashMap<String, String>,
}

impl Default for ValueNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueNormalizer {
    pub fn new() -> Self {
        Self {
            date_pattern: Regex::new(&date_pattern_source()).expect("date pattern is valid"),
            iso_date_pattern: Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})")
                .expect("iso date pattern is valid"),
            non_time_chars: Regex::new(r"[^0-9:.]").expect("time filter is valid"),
            non_numeric_chars: Regex::new(r"[^0-9.,\-]").expect("number filter is valid"),
            date_cache: HashMap::new(),
            time_cache: HashMap::new(),
        }
    }

    /// Parse a calendar date, `None` when the text holds no valid date
    pub fn parse_date(&mut self, value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        if let Some(date) = self.date_cache.get(value) {
            return Some(*date);
        }

        let date = self.parse_date_uncached(value)?;
        self.date_cache.insert(value.to_string(), date);
        Some(date)
    }

    fn parse_date_uncached(&self, value: &str) -> Option<NaiveDate> {
        if let Some(caps) = self.iso_date_pattern.captures(value) {
            return calendar_date(&caps[3], &caps[2], &caps[1]);
        }

        let caps = self.date_pattern.captures(value)?;
        let (day, month, year) = date_parts(&caps)?;
        let date = calendar_date(day, month, year);
        if date.is_none() {
            debug!("Rejected invalid calendar date: '{}'", value);
        }
        date
    }

    /// Parse every date occurring in a free-text list, dropping invalid ones
    pub fn parse_date_list(&mut self, value: &str) -> Vec<NaiveDate> {
        let candidates: Vec<String> = self
            .date_pattern
            .find_iter(value)
            .map(|m| m.as_str().to_string())
            .collect();

        candidates
            .iter()
            .filter_map(|candidate| self.parse_date(candidate))
            .collect()
    }

    /// Normalize a time cell to zero-padded `HH:MM`, empty when unparseable
    pub fn parse_time(&mut self, value: &str) -> String {
        if value.is_empty() {
            return String::new();
        }

        if let Some(cached) = self.time_cache.get(value) {
            return cached.clone();
        }

        let cleaned = self.non_time_chars.replace_all(value, "");
        let cleaned = cleaned.trim();

        let result = if cleaned.contains(':') {
            clock_time(cleaned)
        } else {
            fractional_day_time(cleaned)
        };

        match result {
            Some(time) => {
                self.time_cache.insert(value.to_string(), time.clone());
                time
            }
            None => String::new(),
        }
    }

    /// Parse a number and round it to the nearest integer, `0` on failure
    ///
    /// A result of `0` means "absent"; callers cannot tell it from a parsed
    /// zero.
    pub fn parse_integer(&self, value: &str) -> i32 {
        if value.is_empty() {
            return 0;
        }

        let cleaned = self.non_numeric_chars.replace_all(value, "");
        let cleaned = cleaned.replace(',', ".");

        match cleaned.parse::<f64>() {
            Ok(number) if number.is_finite() => number.round() as i32,
            _ => 0,
        }
    }

    /// Number of cached date and time parses
    pub fn cache_sizes(&self) -> (usize, usize) {
        (self.date_cache.len(), self.time_cache.len())
    }
}

/// One `day sep month sep year` alternative per separator
fn date_pattern_source() -> String {
    DATE_SEPARATORS
        .iter()
        .map(|sep| format!(r"(\d{{1,2}}){sep}(\d{{1,2}}){sep}(\d{{4}}|\d{{2}})"))
        .collect::<Vec<_>>()
        .join("|")
}

/// Day, month and year groups of whichever alternative matched
fn date_parts<'h>(caps: &regex::Captures<'h>) -> Option<(&'h str, &'h str, &'h str)> {
    (1..caps.len()).step_by(3).find_map(|i| {
        Some((
            caps.get(i)?.as_str(),
            caps.get(i + 1)?.as_str(),
            caps.get(i + 2)?.as_str(),
        ))
    })
}

/// Build a date from day/month/year digit groups, promoting 2-digit years
fn calendar_date(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    let day: u32 = day.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let year: i32 = if year.len() == 2 {
        format!("{}{}", TWO_DIGIT_YEAR_PREFIX, year).parse().ok()?
    } else {
        year.parse().ok()?
    };

    // from_ymd_opt rejects day 31 in 30-day months and Feb 29 outside leap years
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `H:M` text, clamped into a valid clock time
fn clock_time(cleaned: &str) -> Option<String> {
    let mut segments = cleaned.split(':');
    let hours: i64 = segments.next()?.trim().parse().ok()?;
    let minutes: i64 = segments.next()?.trim().parse().ok()?;

    Some(format_time(hours.clamp(0, 23), minutes.clamp(0, 59)))
}

/// Spreadsheet time encoding: fraction of a day
fn fractional_day_time(cleaned: &str) -> Option<String> {
    let fraction: f64 = cleaned.parse().ok()?;
    fraction.is_finite().then(|| day_fraction_to_clock(fraction))
}

/// Zero-padded `HH:MM` of a fraction of a day, hours wrapping at 24
pub fn day_fraction_to_clock(fraction: f64) -> String {
    let total_minutes = (fraction * MINUTES_PER_DAY).round() as i64;
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;

    format_time(hours, minutes)
}

fn format_time(hours: i64, minutes: i64) -> String {
    format!("{:02}:{:02}", hours, minutes)
}
