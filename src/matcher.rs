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

//! Field-by-field comparison of a live vehicle activity against the scheduled
//! vehicle journey it was resolved to.
//!
//! The six comparisons are independent and all always attempted: a mismatch
//! in one field never suppresses evaluation of the others. Each comparison
//! has the same three-way outcome: live value absent, scheduled value absent,
//! or present-and-(un)equal.

use crate::{
    finder::ResolvedJourney,
    siri::VehicleActivity,
    validation::{ErrorCategory, FieldComparison, MatchedField, ValidationResult},
};

const VALID_DIRECTIONS: [&str; 4] = ["outbound", "inbound", "clockwise", "anticlockwise"];

fn directions_equivalent(live: &str, scheduled: &str) -> bool {
    match live {
        "outbound" => matches!(scheduled, "outbound" | "inboundAndOutbound"),
        "inbound" => matches!(scheduled, "inbound" | "inboundAndOutbound"),
        "clockwise" => matches!(scheduled, "clockwise" | "circular"),
        "anticlockwise" => matches!(scheduled, "anticlockwise" | "circular"),
        _ => false,
    }
}

fn compare_field<F>(
    result: &mut ValidationResult,
    field: MatchedField,
    live_value: Option<String>,
    live_source: &str,
    scheduled_value: Option<String>,
    scheduled_source: Option<String>,
    equivalent: F,
) where
    F: Fn(&str, &str) -> bool,
{
    let matched = match (&live_value, &scheduled_value) {
        (None, _) => {
            result.add_error(
                ErrorCategory::Field(field),
                format!("{} not found in the live report", field),
            );
            false
        }
        (Some(_), None) => {
            result.add_error(
                ErrorCategory::Field(field),
                format!("{} not found in the timetable", field),
            );
            false
        }
        (Some(live), Some(scheduled)) => {
            if equivalent(live.as_str(), scheduled.as_str()) {
                true
            } else {
                result.add_error(
                    ErrorCategory::Field(field),
                    format!("{} does not match the timetable", field),
                );
                false
            }
        }
    };
    result.record_field(
        field,
        FieldComparison {
            live_value,
            live_source: Some(live_source.to_string()),
            scheduled_value,
            scheduled_source,
            matched,
        },
    );
}

fn scheduled_source(resolved: &ResolvedJourney, path: &str) -> String {
    format!("{}:{}", resolved.file().filename, path)
}

fn compare_direction(
    activity: &VehicleActivity,
    resolved: &ResolvedJourney,
    result: &mut ValidationResult,
) {
    let live = activity
        .direction_ref
        .as_deref()
        .map(|direction| direction.to_lowercase());
    if let Some(direction) = live.as_deref() {
        if !VALID_DIRECTIONS.contains(&direction) {
            result.add_error(
                ErrorCategory::Field(MatchedField::Direction),
                format!("'{}' is not a valid value for DirectionRef", direction),
            );
        }
    }
    let pattern = resolved.journey_pattern();
    let scheduled = pattern.and_then(|pattern| pattern.direction.clone());
    let source = resolved
        .journey()
        .journey_pattern_ref
        .as_deref()
        .map(|journey_pattern_ref| {
            scheduled_source(
                resolved,
                &format!("JourneyPattern[{}]/Direction", journey_pattern_ref),
            )
        });
    compare_field(
        result,
        MatchedField::Direction,
        live,
        "MonitoredVehicleJourney/DirectionRef",
        scheduled,
        source,
        directions_equivalent,
    );
}

fn compare_block(
    activity: &VehicleActivity,
    resolved: &ResolvedJourney,
    result: &mut ValidationResult,
) {
    compare_field(
        result,
        MatchedField::Block,
        activity.block_ref.clone(),
        "MonitoredVehicleJourney/BlockRef",
        resolved.journey().block_number.clone(),
        Some(scheduled_source(
            resolved,
            "VehicleJourney/Operational/Block/BlockNumber",
        )),
        |live, scheduled| live == scheduled,
    );
}

fn compare_published_line_name(
    activity: &VehicleActivity,
    resolved: &ResolvedJourney,
    result: &mut ValidationResult,
) {
    let scheduled = resolved
        .journey()
        .line_ref
        .as_deref()
        .and_then(|line_ref| resolved.file().document.line_name(line_ref))
        .map(str::to_string);
    let source = resolved.journey().line_ref.as_deref().map(|line_ref| {
        scheduled_source(resolved, &format!("Line[{}]/LineName", line_ref))
    });
    compare_field(
        result,
        MatchedField::PublishedLineName,
        activity.published_line_name.clone(),
        "MonitoredVehicleJourney/PublishedLineName",
        scheduled,
        source,
        |live, scheduled| live == scheduled,
    );
}

// Origin and destination use the outermost boundary links of the referenced
// journey-pattern sections, not per-stop matching.
fn compare_origin_ref(
    activity: &VehicleActivity,
    resolved: &ResolvedJourney,
    result: &mut ValidationResult,
) {
    let document = &resolved.file().document;
    let scheduled = resolved
        .journey_pattern()
        .and_then(|pattern| pattern.section_refs.first())
        .and_then(|section_ref| document.journey_pattern_section(section_ref))
        .and_then(|section| section.timing_links.first())
        .and_then(|link| link.from_stop_ref.clone());
    compare_field(
        result,
        MatchedField::OriginRef,
        activity.origin_ref.clone(),
        "MonitoredVehicleJourney/OriginRef",
        scheduled,
        Some(scheduled_source(
            resolved,
            "JourneyPatternSection/JourneyPatternTimingLink[first]/From/StopPointRef",
        )),
        |live, scheduled| live == scheduled,
    );
}

fn compare_destination_ref(
    activity: &VehicleActivity,
    resolved: &ResolvedJourney,
    result: &mut ValidationResult,
) {
    let document = &resolved.file().document;
    let scheduled = resolved
        .journey_pattern()
        .and_then(|pattern| pattern.section_refs.last())
        .and_then(|section_ref| document.journey_pattern_section(section_ref))
        .and_then(|section| section.timing_links.last())
        .and_then(|link| link.to_stop_ref.clone());
    compare_field(
        result,
        MatchedField::DestinationRef,
        activity.destination_ref.clone(),
        "MonitoredVehicleJourney/DestinationRef",
        scheduled,
        Some(scheduled_source(
            resolved,
            "JourneyPatternSection/JourneyPatternTimingLink[last]/To/StopPointRef",
        )),
        |live, scheduled| live == scheduled,
    );
}

fn compare_destination_name(
    activity: &VehicleActivity,
    resolved: &ResolvedJourney,
    result: &mut ValidationResult,
) {
    let document = &resolved.file().document;
    let pattern = resolved.journey_pattern();
    // Dynamic displays of the first referenced section win; the pattern's
    // top-level DestinationDisplay is the fallback.
    let mut displays: Vec<String> = pattern
        .and_then(|pattern| pattern.section_refs.first())
        .and_then(|section_ref| document.journey_pattern_section(section_ref))
        .map(|section| {
            section
                .timing_links
                .iter()
                .flat_map(|link| {
                    link.from_destination_display
                        .iter()
                        .chain(link.to_destination_display.iter())
                })
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    displays.dedup();
    let source = if displays.is_empty() {
        "JourneyPattern/DestinationDisplay"
    } else {
        "JourneyPatternSection/JourneyPatternTimingLink/DynamicDestinationDisplay"
    };
    if displays.is_empty() {
        displays.extend(pattern.and_then(|pattern| pattern.destination_display.clone()));
    }
    let scheduled = if displays.is_empty() {
        None
    } else {
        Some(displays.join("; "))
    };
    compare_field(
        result,
        MatchedField::DestinationName,
        activity.destination_name.clone(),
        "MonitoredVehicleJourney/DestinationName",
        scheduled,
        Some(scheduled_source(resolved, source)),
        |live, _| displays.iter().any(|display| display == live),
    );
}

/// Compares the six designated fields between `activity` and the scheduled
/// journey it resolved to, recording one [FieldComparison] per field on
/// `result`. All six comparisons run unconditionally.
pub fn compare(
    activity: &VehicleActivity,
    resolved: &ResolvedJourney,
    result: &mut ValidationResult,
) {
    compare_direction(activity, resolved, result);
    compare_block(activity, resolved, result);
    compare_published_line_name(activity, resolved, result);
    compare_destination_ref(activity, resolved, result);
    compare_origin_ref(activity, resolved, result);
    compare_destination_name(activity, resolved, result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finder::tests::{activity, txc_file, wednesday_journey, StubLocator};
    use crate::finder::VehicleJourneyFinder;
    use crate::locator::CandidateFile;
    use pretty_assertions::assert_eq;

    fn resolved_pair(content: String) -> (ResolvedJourney, ValidationResult) {
        let locator = StubLocator {
            files: vec![CandidateFile {
                dataset_id: 7,
                filename: String::from("file1.xml"),
                revision_number: 3,
                content,
            }],
        };
        let mut finder = VehicleJourneyFinder::new(&locator);
        let mut result = ValidationResult::new();
        let resolved = finder.resolve(&activity(), &mut result).unwrap().unwrap();
        (resolved, result)
    }

    fn default_content() -> String {
        txc_file(
            "PB0002032:467",
            "24",
            "<StartDate>2021-01-01</StartDate>",
            &wednesday_journey("J100", "NOC1:PB0002032:24"),
        )
    }

    #[test]
    fn clean_match_outcomes() {
        let (resolved, mut result) = resolved_pair(default_content());
        compare(&activity(), &resolved, &mut result);
        assert!(result.field(MatchedField::Direction).unwrap().matched);
        assert!(result.field(MatchedField::PublishedLineName).unwrap().matched);
        assert!(result.field(MatchedField::OriginRef).unwrap().matched);
        assert!(result.field(MatchedField::DestinationRef).unwrap().matched);
        // the fixture journey has no Block and the activity no BlockRef
        let block = result.field(MatchedField::Block).unwrap();
        assert!(!block.matched);
        assert_eq!(
            result.errors(ErrorCategory::Field(MatchedField::Block)),
            [String::from("Block not found in the live report")]
        );
        // no dynamic display in the fixture: the top-level fallback matches
        let destination_name = result.field(MatchedField::DestinationName).unwrap();
        assert!(destination_name.matched);
        assert_eq!(
            Some(String::from("City Centre")),
            destination_name.scheduled_value
        );
    }

    #[test]
    fn direction_equivalence_covers_bidirectional_patterns() {
        let content = default_content().replace(
            "<Direction>outbound</Direction>",
            "<Direction>inboundAndOutbound</Direction>",
        );
        let (resolved, mut result) = resolved_pair(content);
        compare(&activity(), &resolved, &mut result);
        assert!(result.field(MatchedField::Direction).unwrap().matched);
    }

    #[test]
    fn invalid_direction_value_is_reported_independently() {
        let (resolved, mut result) = resolved_pair(default_content());
        let mut activity = activity();
        activity.direction_ref = Some(String::from("Sideways"));
        compare(&activity, &resolved, &mut result);
        let errors = result.errors(ErrorCategory::Field(MatchedField::Direction));
        assert!(errors
            .iter()
            .any(|message| message.contains("not a valid value")));
        assert!(errors
            .iter()
            .any(|message| message.contains("does not match")));
        assert!(!result.field(MatchedField::Direction).unwrap().matched);
    }

    #[test]
    fn direction_is_normalised_to_lower_case() {
        let (resolved, mut result) = resolved_pair(default_content());
        let mut activity = activity();
        activity.direction_ref = Some(String::from("OUTBOUND"));
        compare(&activity, &resolved, &mut result);
        assert!(result.field(MatchedField::Direction).unwrap().matched);
    }

    #[test]
    fn dynamic_destination_display_wins_over_fallback() {
        let content = default_content().replace(
            "<From><StopPointRef>9990000001</StopPointRef></From>",
            r#"<From>
                <StopPointRef>9990000001</StopPointRef>
                <DynamicDestinationDisplay>Bus Station</DynamicDestinationDisplay>
            </From>"#,
        );
        let (resolved, mut result) = resolved_pair(content);
        let mut activity = activity();
        activity.destination_name = Some(String::from("Bus Station"));
        compare(&activity, &resolved, &mut result);
        assert!(result.field(MatchedField::DestinationName).unwrap().matched);

        // the top-level DestinationDisplay is no longer considered
        let (resolved, mut result) = resolved_pair(default_content());
        compare(&activity, &resolved, &mut result);
        assert!(!result.field(MatchedField::DestinationName).unwrap().matched);
    }

    #[test]
    fn mismatch_does_not_suppress_other_fields() {
        let (resolved, mut result) = resolved_pair(default_content());
        let mut activity = activity();
        activity.published_line_name = Some(String::from("25"));
        activity.origin_ref = Some(String::from("0000000000"));
        compare(&activity, &resolved, &mut result);
        assert!(!result.field(MatchedField::PublishedLineName).unwrap().matched);
        assert!(!result.field(MatchedField::OriginRef).unwrap().matched);
        // the others are still evaluated
        assert!(result.field(MatchedField::Direction).unwrap().matched);
        assert!(result.field(MatchedField::DestinationRef).unwrap().matched);
        assert_eq!(
            result.errors(ErrorCategory::Field(MatchedField::PublishedLineName)),
            [String::from("PublishedLineName does not match the timetable")]
        );
    }

    #[test]
    fn comparison_is_idempotent() {
        let (resolved, mut result) = resolved_pair(default_content());
        compare(&activity(), &resolved, &mut result);
        let first = serde_json::to_value(&result).unwrap();
        compare(&activity(), &resolved, &mut result);
        let second = serde_json::to_value(&result).unwrap();
        assert_eq!(first, second);
    }
}
