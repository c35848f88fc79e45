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

//! The `OperatingProfile` rule set determining on which calendar dates a
//! scheduled vehicle journey actually runs.

use crate::{
    minidom_utils::{ChildText, TryOnlyChild},
    objects::{Date, DateRange},
};
use chrono::{Datelike, Weekday};
use minidom::Element;
use std::collections::HashSet;
use tracing::warn;

/// References from a vehicle journey's profile to serviced organisations
/// whose working-day calendars override its normal operating days.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServicedOrganisationDayType {
    /// The journey operates only on working days of these organisations.
    pub days_of_operation_refs: Vec<String>,
    /// The journey does not operate on working days of these organisations.
    pub days_of_non_operation_refs: Vec<String>,
}

/// The day-of-week set, holiday flag, calendar exceptions and
/// serviced-organisation references of one `OperatingProfile` element.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperatingProfile {
    /// Days of the week on which the journey normally operates.
    pub regular_days: HashSet<Weekday>,
    /// `RegularDayType/HolidaysOnly` flag; such journeys are never matched
    /// because the holiday calendar is not modelled.
    pub holidays_only: bool,
    /// Explicit `SpecialDaysOperation/DaysOfOperation` date ranges.
    pub special_days_of_operation: Vec<DateRange>,
    /// Explicit `SpecialDaysOperation/DaysOfNonOperation` date ranges.
    pub special_days_of_non_operation: Vec<DateRange>,
    /// Serviced-organisation overrides, when the journey references any.
    pub serviced_organisation_day_type: Option<ServicedOrganisationDayType>,
}

impl OperatingProfile {
    fn regular_days(days_of_week: &Element) -> HashSet<Weekday> {
        let mut regular_days = HashSet::new();
        use chrono::Weekday::*;
        if days_of_week.children().count() == 0 {
            regular_days.extend([Mon, Tue, Wed, Thu, Fri, Sat, Sun].iter());
        } else {
            for element in days_of_week.children() {
                match element.name() {
                    "Monday" => {
                        regular_days.insert(Mon);
                    }
                    "Tuesday" => {
                        regular_days.insert(Tue);
                    }
                    "Wednesday" => {
                        regular_days.insert(Wed);
                    }
                    "Thursday" => {
                        regular_days.insert(Thu);
                    }
                    "Friday" => {
                        regular_days.insert(Fri);
                    }
                    "Saturday" => {
                        regular_days.insert(Sat);
                    }
                    "Sunday" => {
                        regular_days.insert(Sun);
                    }
                    "MondayToFriday" => {
                        regular_days.extend([Mon, Tue, Wed, Thu, Fri].iter());
                    }
                    "MondayToSaturday" => {
                        regular_days.extend([Mon, Tue, Wed, Thu, Fri, Sat].iter());
                    }
                    "MondayToSunday" => {
                        regular_days.extend([Mon, Tue, Wed, Thu, Fri, Sat, Sun].iter());
                    }
                    "NotSaturday" => {
                        regular_days.extend([Mon, Tue, Wed, Thu, Fri, Sun].iter());
                    }
                    "Weekend" => {
                        regular_days.extend([Sat, Sun].iter());
                    }
                    unknown_tag => warn!("Tag '{}' is not a valid tag for DaysOfWeek", unknown_tag),
                };
            }
        }
        regular_days
    }

    fn date_ranges(days: &Element) -> Vec<DateRange> {
        let mut ranges = Vec::new();
        for element in days.children().filter(|e| e.name() == "DateRange") {
            let start: Option<Date> = element
                .child_text("StartDate")
                .and_then(|text| text.parse().ok());
            let end: Option<Date> = element
                .child_text("EndDate")
                .and_then(|text| text.parse().ok());
            match start {
                Some(start) => ranges.push(DateRange::new(start, end)),
                None => warn!("skipping DateRange with missing or invalid 'StartDate'"),
            }
        }
        ranges
    }

    fn serviced_organisation_refs(days: &Element) -> Vec<String> {
        days.children()
            .filter(|element| element.name() == "WorkingDays")
            .filter_map(|working_days| working_days.child_text("ServicedOrganisationRef"))
            .collect()
    }

    /// Whether `date` is one of the journey's scheduled days: the weekday is
    /// one of the regular days or the date falls in an explicit
    /// special-operation range. Holidays-only journeys have no scheduled
    /// days. Explicit non-operation overrides are not considered here; see
    /// [is_active_on](OperatingProfile::is_active_on).
    pub fn is_scheduled_on(&self, date: Date) -> bool {
        if self.holidays_only {
            return false;
        }
        self.regular_days.contains(&date.weekday())
            || self
                .special_days_of_operation
                .iter()
                .any(|range| range.contains(date))
    }

    /// Whether the journey operates on `date`: `date` must be a scheduled
    /// day and an explicit special-non-operation range always wins.
    pub fn is_active_on(&self, date: Date) -> bool {
        self.is_scheduled_on(date) && !self.is_non_operating_on(date)
    }

    /// Whether `date` falls in an explicit `DaysOfNonOperation` range.
    pub fn is_non_operating_on(&self, date: Date) -> bool {
        self.special_days_of_non_operation
            .iter()
            .any(|range| range.contains(date))
    }

    /// Short human-readable summary, recorded as diagnostic metadata on the
    /// validation result.
    pub fn summary(&self) -> String {
        use chrono::Weekday::*;
        let days: String = [Mon, Tue, Wed, Thu, Fri, Sat, Sun]
            .iter()
            .filter(|day| self.regular_days.contains(day))
            .map(|day| day.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let mut summary = format!("days={{{}}}", days);
        if self.holidays_only {
            summary.push_str(" holidays-only");
        }
        if !self.special_days_of_operation.is_empty() {
            summary.push_str(&format!(
                " special-operation={}",
                self.special_days_of_operation.len()
            ));
        }
        if !self.special_days_of_non_operation.is_empty() {
            summary.push_str(&format!(
                " special-non-operation={}",
                self.special_days_of_non_operation.len()
            ));
        }
        summary
    }
}

impl From<&Element> for OperatingProfile {
    fn from(operating_profile: &Element) -> Self {
        let regular_day_type = operating_profile.try_only_child("RegularDayType").ok();
        let holidays_only = regular_day_type
            .map(|element| element.try_only_child("HolidaysOnly").is_ok())
            .unwrap_or(false);
        let regular_days = regular_day_type
            .and_then(|element| element.try_only_child("DaysOfWeek").ok())
            .map(OperatingProfile::regular_days)
            .unwrap_or_default();
        let special_days = operating_profile.try_only_child("SpecialDaysOperation").ok();
        let special_days_of_operation = special_days
            .and_then(|element| element.try_only_child("DaysOfOperation").ok())
            .map(OperatingProfile::date_ranges)
            .unwrap_or_default();
        let special_days_of_non_operation = special_days
            .and_then(|element| element.try_only_child("DaysOfNonOperation").ok())
            .map(OperatingProfile::date_ranges)
            .unwrap_or_default();
        let serviced_organisation_day_type = operating_profile
            .try_only_child("ServicedOrganisationDayType")
            .ok()
            .map(|element| ServicedOrganisationDayType {
                days_of_operation_refs: element
                    .try_only_child("DaysOfOperation")
                    .map(OperatingProfile::serviced_organisation_refs)
                    .unwrap_or_default(),
                days_of_non_operation_refs: element
                    .try_only_child("DaysOfNonOperation")
                    .map(OperatingProfile::serviced_organisation_refs)
                    .unwrap_or_default(),
            });
        Self {
            regular_days,
            holidays_only,
            special_days_of_operation,
            special_days_of_non_operation,
            serviced_organisation_day_type,
        }
    }
}
