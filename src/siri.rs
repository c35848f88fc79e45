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

//! SIRI-VM live vehicle-location input: one `VehicleActivity` per observed
//! vehicle report, plus a decoder from a `ServiceDelivery` element tree.

use crate::{
    minidom_utils::{ChildText, TryOnlyChild},
    objects::Date,
    Result,
};
use chrono::{DateTime, Utc};
use minidom::Element;
use tracing::warn;

/// Header fields of one SIRI-VM snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiriHeader {
    /// `ResponseTimestamp` of the `ServiceDelivery`.
    pub response_timestamp: Option<DateTime<Utc>>,
    /// `ProducerRef` of the `ServiceDelivery`.
    pub producer_ref: Option<String>,
}

/// One observed position/status report for a vehicle, as decoded from a
/// SIRI-VM `VehicleActivity` element. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleActivity {
    /// When the position was recorded by the vehicle equipment.
    pub recorded_at_time: DateTime<Utc>,
    /// `OperatorRef` of the monitored journey.
    pub operator_ref: Option<String>,
    /// `PublishedLineName` of the monitored journey.
    pub published_line_name: Option<String>,
    /// `DirectionRef` of the monitored journey.
    pub direction_ref: Option<String>,
    /// `BlockRef` of the monitored journey.
    pub block_ref: Option<String>,
    /// `OriginRef` stop reference.
    pub origin_ref: Option<String>,
    /// `OriginName` stop name.
    pub origin_name: Option<String>,
    /// `DestinationRef` stop reference.
    pub destination_ref: Option<String>,
    /// `DestinationName` stop name.
    pub destination_name: Option<String>,
    /// Day-scoped trip identifier (`DatedVehicleJourneyRef`).
    pub dated_vehicle_journey_ref: Option<String>,
    /// `VehicleRef` identifying the vehicle.
    pub vehicle_ref: Option<String>,
    /// Optional `DriverRef`.
    pub driver_ref: Option<String>,
    /// Optional longitude of the vehicle position.
    pub longitude: Option<f64>,
    /// Optional latitude of the vehicle position.
    pub latitude: Option<f64>,
}

impl VehicleActivity {
    /// Calendar date on which the activity was recorded.
    pub fn recorded_date(&self) -> Date {
        self.recorded_at_time.date_naive()
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|datetime| datetime.with_timezone(&Utc))
        .ok()
}

fn load_header(service_delivery: &Element) -> SiriHeader {
    SiriHeader {
        response_timestamp: service_delivery
            .child_text("ResponseTimestamp")
            .as_deref()
            .and_then(parse_timestamp),
        producer_ref: service_delivery.child_text("ProducerRef"),
    }
}

fn load_activity(activity: &Element) -> Option<VehicleActivity> {
    let recorded_at_time = match activity
        .child_text("RecordedAtTime")
        .as_deref()
        .and_then(parse_timestamp)
    {
        Some(recorded_at_time) => recorded_at_time,
        None => {
            warn!("skipping VehicleActivity with missing or invalid 'RecordedAtTime'");
            return None;
        }
    };
    let journey = activity.try_only_child("MonitoredVehicleJourney").ok()?;
    // 'DatedVehicleJourneyRef' may appear directly or inside 'FramedVehicleJourneyRef'
    let dated_vehicle_journey_ref = journey.child_text("DatedVehicleJourneyRef").or_else(|| {
        journey
            .try_only_child("FramedVehicleJourneyRef")
            .ok()
            .and_then(|framed| framed.child_text("DatedVehicleJourneyRef"))
    });
    let location = journey.try_only_child("VehicleLocation").ok();
    let coordinate = |name: &str| {
        location
            .and_then(|location| location.child_text(name))
            .and_then(|text| text.parse().ok())
    };
    Some(VehicleActivity {
        recorded_at_time,
        operator_ref: journey.child_text("OperatorRef"),
        published_line_name: journey.child_text("PublishedLineName"),
        direction_ref: journey.child_text("DirectionRef"),
        block_ref: journey.child_text("BlockRef"),
        origin_ref: journey.child_text("OriginRef"),
        origin_name: journey.child_text("OriginName"),
        destination_ref: journey.child_text("DestinationRef"),
        destination_name: journey.child_text("DestinationName"),
        dated_vehicle_journey_ref,
        vehicle_ref: journey.child_text("VehicleRef"),
        driver_ref: journey.child_text("DriverRef"),
        longitude: coordinate("Longitude"),
        latitude: coordinate("Latitude"),
    })
}

/// Decodes one SIRI-VM snapshot from its `Siri` root element. Activities with
/// a missing or unparsable `RecordedAtTime` or without a
/// `MonitoredVehicleJourney` are dropped with a warning.
pub fn read(siri: &Element) -> Result<(SiriHeader, Vec<VehicleActivity>)> {
    let service_delivery = siri.try_only_child("ServiceDelivery")?;
    let header = load_header(service_delivery);
    let activities = service_delivery
        .try_only_child("VehicleMonitoringDelivery")?
        .children()
        .filter(|element| element.name() == "VehicleActivity")
        .filter_map(load_activity)
        .collect();
    Ok((header, activities))
}

#[cfg(test)]
mod tests {
    use super::*;

    mod read {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn full_snapshot() {
            let xml = r#"<Siri>
                <ServiceDelivery>
                    <ResponseTimestamp>2021-06-16T09:31:00+00:00</ResponseTimestamp>
                    <ProducerRef>ITOWORLD</ProducerRef>
                    <VehicleMonitoringDelivery>
                        <VehicleActivity>
                            <RecordedAtTime>2021-06-16T09:30:21+00:00</RecordedAtTime>
                            <MonitoredVehicleJourney>
                                <OperatorRef>NOC1</OperatorRef>
                                <PublishedLineName>24</PublishedLineName>
                                <DirectionRef>outbound</DirectionRef>
                                <BlockRef>B1</BlockRef>
                                <OriginRef>9990000001</OriginRef>
                                <DestinationRef>9990000009</DestinationRef>
                                <DestinationName>City Centre</DestinationName>
                                <FramedVehicleJourneyRef>
                                    <DataFrameRef>2021-06-16</DataFrameRef>
                                    <DatedVehicleJourneyRef>J100</DatedVehicleJourneyRef>
                                </FramedVehicleJourneyRef>
                                <VehicleLocation>
                                    <Longitude>-1.54</Longitude>
                                    <Latitude>53.79</Latitude>
                                </VehicleLocation>
                                <VehicleRef>BUS_42</VehicleRef>
                            </MonitoredVehicleJourney>
                        </VehicleActivity>
                    </VehicleMonitoringDelivery>
                </ServiceDelivery>
            </Siri>"#;
            let root: Element = xml.parse().unwrap();
            let (header, activities) = read(&root).unwrap();
            assert_eq!(Some(String::from("ITOWORLD")), header.producer_ref);
            assert_eq!(1, activities.len());
            let activity = &activities[0];
            assert_eq!(Some(String::from("NOC1")), activity.operator_ref);
            assert_eq!(Some(String::from("J100")), activity.dated_vehicle_journey_ref);
            assert_eq!(Some(String::from("BUS_42")), activity.vehicle_ref);
            assert_eq!(Some(-1.54), activity.longitude);
            assert_eq!(
                Date::from_ymd_opt(2021, 6, 16).unwrap(),
                activity.recorded_date()
            );
        }

        #[test]
        fn drops_activity_without_recorded_at_time() {
            let xml = r#"<Siri>
                <ServiceDelivery>
                    <VehicleMonitoringDelivery>
                        <VehicleActivity>
                            <MonitoredVehicleJourney>
                                <OperatorRef>NOC1</OperatorRef>
                            </MonitoredVehicleJourney>
                        </VehicleActivity>
                    </VehicleMonitoringDelivery>
                </ServiceDelivery>
            </Siri>"#;
            let root: Element = xml.parse().unwrap();
            let (_, activities) = read(&root).unwrap();
            assert_eq!(0, activities.len());
        }

        #[test]
        #[should_panic(expected = "Failed to find a child 'ServiceDelivery'")]
        fn not_a_siri_document() {
            let xml = r#"<root />"#;
            let root: Element = xml.parse().unwrap();
            read(&root).unwrap();
        }
    }
}
