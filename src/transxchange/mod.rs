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

//! Typed model of a published TransXChange timetable file, restricted to the
//! parts the post-publishing check needs: services with their operating
//! period, journey patterns and sections, vehicle journeys with their
//! operating profile, and serviced organisations.

pub mod operating_profile;
pub mod read;

pub use operating_profile::{OperatingProfile, ServicedOrganisationDayType};

use crate::objects::DateRange;
use chrono::NaiveTime;
use std::collections::BTreeMap;

/// A parsed timetable document together with the identity it was published
/// under. Read-only and shared across the whole batch.
#[derive(Debug)]
pub struct ScheduledFile {
    /// Identifier of the dataset the file belongs to.
    pub dataset_id: i64,
    /// Name of the file inside the dataset.
    pub filename: String,
    /// Revision number of the dataset the file belongs to.
    pub revision_number: u32,
    /// The parsed document.
    pub document: TxcDocument,
}

/// The typed content of one TransXChange document.
#[derive(Debug, Default)]
pub struct TxcDocument {
    /// Services declared in the document, usually exactly one.
    pub services: Vec<Service>,
    /// Journey pattern sections, keyed by their `id` attribute.
    pub journey_pattern_sections: BTreeMap<String, JourneyPatternSection>,
    /// Scheduled trips of the document.
    pub vehicle_journeys: Vec<VehicleJourney>,
    /// Serviced organisations, keyed by their organisation code.
    pub serviced_organisations: BTreeMap<String, ServicedOrganisation>,
}

impl TxcDocument {
    /// The main service of the document, when any.
    pub fn service(&self) -> Option<&Service> {
        self.services.first()
    }

    /// `LineName` of the line registered under `line_ref` in any service.
    pub fn line_name(&self, line_ref: &str) -> Option<&str> {
        self.services
            .iter()
            .find_map(|service| service.lines.get(line_ref))
            .map(String::as_str)
    }

    /// Journey pattern registered under `journey_pattern_ref` in any service.
    pub fn journey_pattern(&self, journey_pattern_ref: &str) -> Option<&JourneyPattern> {
        self.services
            .iter()
            .find_map(|service| service.journey_patterns.get(journey_pattern_ref))
    }

    /// Journey pattern section registered under `section_ref`.
    pub fn journey_pattern_section(&self, section_ref: &str) -> Option<&JourneyPatternSection> {
        self.journey_pattern_sections.get(section_ref)
    }

    /// Serviced organisation registered under `organisation_ref`.
    pub fn serviced_organisation(&self, organisation_ref: &str) -> Option<&ServicedOrganisation> {
        self.serviced_organisations.get(organisation_ref)
    }
}

/// A `Service` of the document with the parts needed for candidate filtering.
#[derive(Debug, Default)]
pub struct Service {
    /// Registered `ServiceCode`.
    pub service_code: Option<String>,
    /// Service-level operating period; `None` when missing or malformed.
    pub operating_period: Option<DateRange>,
    /// Lines of the service: line `id` attribute to `LineName`.
    pub lines: BTreeMap<String, String>,
    /// Journey patterns of the standard service, keyed by `id` attribute.
    pub journey_patterns: BTreeMap<String, JourneyPattern>,
    /// Service-level operating profile inherited by journeys without their own.
    pub operating_profile: Option<OperatingProfile>,
}

/// A `JourneyPattern` of a service's `StandardService`.
#[derive(Debug, Default)]
pub struct JourneyPattern {
    /// `Direction` of the pattern (e.g. `outbound`, `inboundAndOutbound`).
    pub direction: Option<String>,
    /// Top-level `DestinationDisplay` of the pattern.
    pub destination_display: Option<String>,
    /// Ordered `JourneyPatternSectionRefs`.
    pub section_refs: Vec<String>,
}

/// An ordered sequence of stop-to-stop timing links.
#[derive(Debug, Default)]
pub struct JourneyPatternSection {
    /// Timing links in document order.
    pub timing_links: Vec<TimingLink>,
}

/// One stop-to-stop `JourneyPatternTimingLink`.
#[derive(Debug, Default)]
pub struct TimingLink {
    /// `StopPointRef` of the `From` end.
    pub from_stop_ref: Option<String>,
    /// `DynamicDestinationDisplay` of the `From` end.
    pub from_destination_display: Option<String>,
    /// `StopPointRef` of the `To` end.
    pub to_stop_ref: Option<String>,
    /// `DynamicDestinationDisplay` of the `To` end.
    pub to_destination_display: Option<String>,
}

/// One scheduled trip (`VehicleJourney` element).
#[derive(Debug, Default)]
pub struct VehicleJourney {
    /// `VehicleJourneyCode` identifying the trip inside the document.
    pub vehicle_journey_code: Option<String>,
    /// Ticket-machine journey code, the day-scoped identifier matched against
    /// a live activity's `DatedVehicleJourneyRef`.
    pub journey_code: Option<String>,
    /// `ServiceRef` of the trip.
    pub service_ref: Option<String>,
    /// `LineRef` of the trip.
    pub line_ref: Option<String>,
    /// `JourneyPatternRef` of the trip.
    pub journey_pattern_ref: Option<String>,
    /// `Operational/Block/BlockNumber` of the trip.
    pub block_number: Option<String>,
    /// Scheduled `DepartureTime`.
    pub departure_time: Option<NaiveTime>,
    /// Trip-level operating profile; absent means the service-level profile
    /// applies.
    pub operating_profile: Option<OperatingProfile>,
}

impl VehicleJourney {
    /// Last segment of the trip's `LineRef` (TransXChange line identifiers
    /// are colon-separated, e.g. `NOC1:PB0002032:24`).
    pub fn line_ref_suffix(&self) -> Option<&str> {
        self.line_ref
            .as_deref()
            .and_then(|line_ref| line_ref.rsplit(':').next())
    }
}

/// A named organisation (e.g. a school) whose working-day calendar can
/// override a vehicle journey's normal operating days.
#[derive(Debug, Default)]
pub struct ServicedOrganisation {
    /// Display name of the organisation.
    pub name: Option<String>,
    /// Working-day date ranges of the organisation.
    pub working_days: Vec<DateRange>,
}

impl ServicedOrganisation {
    /// Whether `date` is one of the organisation's working days.
    pub fn is_working_day(&self, date: crate::objects::Date) -> bool {
        self.working_days.iter().any(|range| range.contains(date))
    }
}
