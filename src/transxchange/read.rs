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

//! Reader from a TransXChange element tree into the typed [TxcDocument]
//! model. Malformed sub-trees are dropped with a warning so that one bad
//! journey or section never fails a whole candidate file.

use crate::{
    minidom_utils::{ChildText, TryAttribute, TryOnlyChild},
    objects::{Date, DateRange},
    transxchange::{
        JourneyPattern, JourneyPatternSection, OperatingProfile, Service, ServicedOrganisation,
        TimingLink, TxcDocument, VehicleJourney,
    },
    Result,
};
use chrono::NaiveTime;
use minidom::Element;
use tracing::warn;

fn load_operating_period(service: &Element) -> Option<DateRange> {
    let operating_period = service.try_only_child("OperatingPeriod").ok()?;
    let start: Date = match operating_period
        .child_text("StartDate")
        .and_then(|text| text.parse().ok())
    {
        Some(start) => start,
        None => {
            warn!("OperatingPeriod with missing or invalid 'StartDate'");
            return None;
        }
    };
    let end = operating_period
        .child_text("EndDate")
        .and_then(|text| text.parse().ok());
    Some(DateRange::new(start, end))
}

fn load_lines(service: &Element) -> std::collections::BTreeMap<String, String> {
    let mut lines = std::collections::BTreeMap::new();
    let elements = match service.try_only_child("Lines") {
        Ok(elements) => elements,
        Err(_) => return lines,
    };
    for line in elements.children().filter(|e| e.name() == "Line") {
        let id: Option<String> = line.attribute("id");
        let name = line.child_text("LineName");
        match (id, name) {
            (Some(id), Some(name)) => {
                lines.insert(id, name);
            }
            _ => warn!("skipping Line with missing 'id' or 'LineName'"),
        }
    }
    lines
}

fn load_journey_pattern(journey_pattern: &Element) -> JourneyPattern {
    let section_refs = journey_pattern
        .children()
        .filter(|element| element.name() == "JourneyPatternSectionRefs")
        .map(|element| element.text().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();
    JourneyPattern {
        direction: journey_pattern.child_text("Direction"),
        destination_display: journey_pattern.child_text("DestinationDisplay"),
        section_refs,
    }
}

fn load_service(service: &Element) -> Service {
    let journey_patterns = service
        .try_only_child("StandardService")
        .map(|standard_service| {
            standard_service
                .children()
                .filter(|element| element.name() == "JourneyPattern")
                .filter_map(|element| {
                    let id: Option<String> = element.attribute("id");
                    match id {
                        Some(id) => Some((id, load_journey_pattern(element))),
                        None => {
                            warn!("skipping JourneyPattern without 'id' attribute");
                            None
                        }
                    }
                })
                .collect()
        })
        .unwrap_or_default();
    Service {
        service_code: service.child_text("ServiceCode"),
        operating_period: load_operating_period(service),
        lines: load_lines(service),
        journey_patterns,
        operating_profile: service
            .try_only_child("OperatingProfile")
            .ok()
            .map(OperatingProfile::from),
    }
}

fn load_timing_link(timing_link: &Element) -> TimingLink {
    let end = |name: &str| timing_link.try_only_child(name).ok();
    let from = end("From");
    let to = end("To");
    TimingLink {
        from_stop_ref: from.and_then(|element| element.child_text("StopPointRef")),
        from_destination_display: from
            .and_then(|element| element.child_text("DynamicDestinationDisplay")),
        to_stop_ref: to.and_then(|element| element.child_text("StopPointRef")),
        to_destination_display: to
            .and_then(|element| element.child_text("DynamicDestinationDisplay")),
    }
}

fn load_journey_pattern_sections(
    root: &Element,
) -> std::collections::BTreeMap<String, JourneyPatternSection> {
    let mut sections = std::collections::BTreeMap::new();
    let elements = match root.try_only_child("JourneyPatternSections") {
        Ok(elements) => elements,
        Err(_) => return sections,
    };
    for section in elements
        .children()
        .filter(|e| e.name() == "JourneyPatternSection")
    {
        let id: Option<String> = section.attribute("id");
        match id {
            Some(id) => {
                let timing_links = section
                    .children()
                    .filter(|element| element.name() == "JourneyPatternTimingLink")
                    .map(load_timing_link)
                    .collect();
                sections.insert(id, JourneyPatternSection { timing_links });
            }
            None => warn!("skipping JourneyPatternSection without 'id' attribute"),
        }
    }
    sections
}

fn load_vehicle_journey(vehicle_journey: &Element) -> VehicleJourney {
    let operational = vehicle_journey.try_only_child("Operational").ok();
    let journey_code = operational
        .and_then(|element| element.try_only_child("TicketMachine").ok())
        .and_then(|element| element.child_text("JourneyCode"));
    let block_number = operational
        .and_then(|element| element.try_only_child("Block").ok())
        .and_then(|element| element.child_text("BlockNumber"));
    let departure_time: Option<NaiveTime> = vehicle_journey
        .child_text("DepartureTime")
        .and_then(|text| text.parse().ok());
    VehicleJourney {
        vehicle_journey_code: vehicle_journey.child_text("VehicleJourneyCode"),
        journey_code,
        service_ref: vehicle_journey.child_text("ServiceRef"),
        line_ref: vehicle_journey.child_text("LineRef"),
        journey_pattern_ref: vehicle_journey.child_text("JourneyPatternRef"),
        block_number,
        departure_time,
        operating_profile: vehicle_journey
            .try_only_child("OperatingProfile")
            .ok()
            .map(OperatingProfile::from),
    }
}

fn load_serviced_organisations(
    root: &Element,
) -> std::collections::BTreeMap<String, ServicedOrganisation> {
    let mut organisations = std::collections::BTreeMap::new();
    let elements = match root.try_only_child("ServicedOrganisations") {
        Ok(elements) => elements,
        Err(_) => return organisations,
    };
    for organisation in elements
        .children()
        .filter(|e| e.name() == "ServicedOrganisation")
    {
        let code = match organisation.child_text("OrganisationCode") {
            Some(code) => code,
            None => {
                warn!("skipping ServicedOrganisation without 'OrganisationCode'");
                continue;
            }
        };
        let working_days = organisation
            .try_only_child("WorkingDays")
            .map(|working_days| {
                working_days
                    .children()
                    .filter(|element| element.name() == "DateRange")
                    .filter_map(|element| {
                        let start: Option<Date> = element
                            .child_text("StartDate")
                            .and_then(|text| text.parse().ok());
                        let end: Option<Date> = element
                            .child_text("EndDate")
                            .and_then(|text| text.parse().ok());
                        match start {
                            Some(start) => Some(DateRange::new(start, end)),
                            None => {
                                warn!("skipping working-day DateRange with invalid 'StartDate'");
                                None
                            }
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        organisations.insert(
            code,
            ServicedOrganisation {
                name: organisation.child_text("Name"),
                working_days,
            },
        );
    }
    organisations
}

/// Reads a TransXChange document from its root element. Fails only when the
/// document declares no `Services/Service` at all; anything else malformed is
/// dropped part by part with a warning.
pub fn document(root: &Element) -> Result<TxcDocument> {
    let services: Vec<Service> = root
        .try_only_child("Services")?
        .children()
        .filter(|element| element.name() == "Service")
        .map(load_service)
        .collect();
    anyhow::ensure!(
        !services.is_empty(),
        "TransXChange document declares no Service"
    );
    let vehicle_journeys = root
        .try_only_child("VehicleJourneys")
        .map(|elements| {
            elements
                .children()
                .filter(|element| element.name() == "VehicleJourney")
                .map(load_vehicle_journey)
                .collect()
        })
        .unwrap_or_default();
    Ok(TxcDocument {
        services,
        journey_pattern_sections: load_journey_pattern_sections(root),
        vehicle_journeys,
        serviced_organisations: load_serviced_organisations(root),
    })
}
