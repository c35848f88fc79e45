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

//! Small shared objects used across the matching engine.

use serde::Serialize;

/// Calendar date.
pub type Date = chrono::NaiveDate;

/// An inclusive range of calendar dates. An absent end date means the range
/// is open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    /// First date of the range.
    pub start: Date,
    /// Last date of the range, inclusive; `None` for an open-ended range.
    pub end: Option<Date>,
}

impl DateRange {
    /// Builds a range over `[start, end]`, or `[start, ∞)` when `end` is `None`.
    pub fn new(start: Date, end: Option<Date>) -> Self {
        DateRange { start, end }
    }

    /// Whether `date` falls inside the range, boundaries included.
    pub fn contains(&self, date: Date) -> bool {
        date >= self.start && self.end.map_or(true, |end| date <= end)
    }
}
