// Copyright 2017 Kisio Digital and/or its affiliates.
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see
// <http://www.gnu.org/licenses/>.

//! The per-activity validation record written by the journey finder and the
//! field matcher, and consumed verbatim by the report compiler: field names,
//! error codes and per-field match booleans are a stable contract.

use chrono::NaiveTime;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The six designated fields compared between a live report and its matched
/// scheduled trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MatchedField {
    /// Live `DirectionRef` against the journey pattern's `Direction`.
    Direction,
    /// Live `BlockRef` against `Operational/Block/BlockNumber`.
    Block,
    /// Live `PublishedLineName` against the `LineName` of the trip's line.
    PublishedLineName,
    /// Live `DestinationRef` against the last stop of the last section.
    DestinationRef,
    /// Live `OriginRef` against the first stop of the first section.
    OriginRef,
    /// Live `DestinationName` against the dynamic destination displays.
    DestinationName,
}

impl MatchedField {
    /// All six fields, in reporting order.
    pub const ALL: [MatchedField; 6] = [
        MatchedField::Direction,
        MatchedField::Block,
        MatchedField::PublishedLineName,
        MatchedField::DestinationRef,
        MatchedField::OriginRef,
        MatchedField::DestinationName,
    ];

    /// Stable name used by the report compiler.
    pub fn name(self) -> &'static str {
        match self {
            MatchedField::Direction => "Direction",
            MatchedField::Block => "Block",
            MatchedField::PublishedLineName => "PublishedLineName",
            MatchedField::DestinationRef => "DestinationRef",
            MatchedField::OriginRef => "OriginRef",
            MatchedField::DestinationName => "DestinationName",
        }
    }
}

impl fmt::Display for MatchedField {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.name())
    }
}

/// Stable error codes for the distinguishable resolution-failure reasons that
/// downstream reporting buckets on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCode {
    /// No candidate file has an operating period covering the activity date.
    Code1_2,
    /// No vehicle journey carries the activity's journey code.
    Code2_1,
    /// No journey-code match has an operating profile active on the date.
    Code3_1,
    /// The serviced-organisation day filter emptied the candidate set.
    Code4_1,
    /// The special days-of-non-operation override emptied the candidate set.
    Code4_2,
    /// No journey-code match belongs to the published line.
    Code5_1,
    /// Several journeys in the same file survive every filter.
    Code6_2A,
    /// Surviving journeys span several files but share one service code.
    Code6_2C,
}

impl ErrorCode {
    /// Stable serialized name of the code.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Code1_2 => "CODE_1_2",
            ErrorCode::Code2_1 => "CODE_2_1",
            ErrorCode::Code3_1 => "CODE_3_1",
            ErrorCode::Code4_1 => "CODE_4_1",
            ErrorCode::Code4_2 => "CODE_4_2",
            ErrorCode::Code5_1 => "CODE_5_1",
            ErrorCode::Code6_2A => "CODE_6_2_A",
            ErrorCode::Code6_2C => "CODE_6_2_C",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Category under which an error message is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorCategory {
    /// Journey-resolution errors (stages of the finder pipeline).
    Journey,
    /// Field-comparison errors, one category per field.
    Field(MatchedField),
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Journey => fmt.write_str("Journey"),
            ErrorCategory::Field(field) => fmt.write_str(field.name()),
        }
    }
}

impl Serialize for ErrorCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Outcome of comparing one field between the live report and the schedule.
///
/// Sources are XML element-path locators pointing at where each value was
/// read; they fill the diagnostic slot of the report, not a machine contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldComparison {
    /// Value found in the live report, when any.
    pub live_value: Option<String>,
    /// Locator of the live value inside the SIRI-VM report.
    pub live_source: Option<String>,
    /// Value found in the timetable, when any.
    pub scheduled_value: Option<String>,
    /// Locator of the scheduled value inside the timetable file.
    pub scheduled_source: Option<String>,
    /// Whether both values were present and equivalent.
    pub matched: bool,
}

/// The record produced for one sampled vehicle activity. Created empty,
/// mutated by the finder and the matcher, then handed read-only to the report
/// compiler.
#[derive(Debug, Default, Serialize)]
pub struct ValidationResult {
    fields: BTreeMap<MatchedField, FieldComparison>,
    errors: BTreeMap<ErrorCategory, Vec<String>>,
    error_codes: BTreeSet<ErrorCode>,
    /// Whether the activity was resolved to exactly one scheduled journey.
    pub journey_matched: bool,
    /// Dataset of the matched (or first candidate) file.
    pub dataset_id: Option<i64>,
    /// Filename of the matched file.
    pub filename: Option<String>,
    /// Revision number of the matched (or first candidate) file.
    pub revision_number: Option<u32>,
    /// Scheduled departure time of the matched journey.
    pub departure_time: Option<NaiveTime>,
    /// Journey code looked up during resolution, recorded even on failure.
    pub journey_code: Option<String>,
    /// Filenames of every candidate file touched during resolution.
    pub files_considered: Vec<String>,
    /// Summaries of the operating profiles examined during resolution.
    pub operating_profiles: Vec<String>,
}

impl ValidationResult {
    /// An empty record, ready to accumulate one activity's outcomes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error message under `category`, ignoring exact duplicates.
    pub fn add_error(&mut self, category: ErrorCategory, message: impl Into<String>) {
        let message = message.into();
        let messages = self.errors.entry(category).or_default();
        if !messages.contains(&message) {
            messages.push(message);
        }
    }

    /// Flags a stable error code.
    pub fn set_error_code(&mut self, code: ErrorCode) {
        self.error_codes.insert(code);
    }

    /// Whether `code` has been flagged.
    pub fn has_error_code(&self, code: ErrorCode) -> bool {
        self.error_codes.contains(&code)
    }

    /// All flagged error codes.
    pub fn error_codes(&self) -> impl Iterator<Item = ErrorCode> + '_ {
        self.error_codes.iter().copied()
    }

    /// Messages recorded under `category`.
    pub fn errors(&self, category: ErrorCategory) -> &[String] {
        self.errors.get(&category).map_or(&[], Vec::as_slice)
    }

    /// Whether any error has been recorded, in any category.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Discards every recorded error message and code. Only the ambiguous
    /// multi-service-code resolution outcome uses this; see DESIGN notes.
    pub fn clear_errors(&mut self) {
        self.errors.clear();
        self.error_codes.clear();
    }

    /// Stores the comparison outcome for `field`, replacing any previous one.
    pub fn record_field(&mut self, field: MatchedField, comparison: FieldComparison) {
        self.fields.insert(field, comparison);
    }

    /// Comparison outcome stored for `field`, when the matcher ran.
    pub fn field(&self, field: MatchedField) -> Option<&FieldComparison> {
        self.fields.get(&field)
    }

    /// Remembers that `filename` was considered during resolution.
    pub fn note_file(&mut self, filename: &str) {
        if !self.files_considered.iter().any(|f| f == filename) {
            self.files_considered.push(filename.to_string());
        }
    }

    /// Remembers an operating-profile summary examined during resolution.
    pub fn note_operating_profile(&mut self, summary: String) {
        if !self.operating_profiles.contains(&summary) {
            self.operating_profiles.push(summary);
        }
    }
}
