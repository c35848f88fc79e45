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

//! Resolution of one live vehicle activity to the single scheduled vehicle
//! journey it corresponds to.
//!
//! The finder narrows the candidate set stage by stage; a stage that empties
//! the set terminates resolution immediately and records a message (and a
//! stable error code where one is defined) on the [ValidationResult]. All
//! failures are data, never `Err`: the only `Err` of [VehicleJourneyFinder::resolve]
//! is a failing candidate lookup.

use crate::{
    locator::{CandidateFile, CandidateFileLocator},
    objects::Date,
    siri::VehicleActivity,
    transxchange::{self, JourneyPattern, OperatingProfile, ScheduledFile, VehicleJourney},
    validation::{ErrorCategory, ErrorCode, ValidationResult},
    Result,
};
use minidom::Element;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// The scheduled trip a live activity was resolved to, with its file context.
#[derive(Debug, Clone)]
pub struct ResolvedJourney {
    file: Arc<ScheduledFile>,
    journey_index: usize,
}

impl ResolvedJourney {
    /// The timetable file containing the journey.
    pub fn file(&self) -> &ScheduledFile {
        &self.file
    }

    /// The matched vehicle journey.
    pub fn journey(&self) -> &VehicleJourney {
        &self.file.document.vehicle_journeys[self.journey_index]
    }

    /// The journey pattern the matched journey references, when resolvable.
    pub fn journey_pattern(&self) -> Option<&JourneyPattern> {
        self.journey()
            .journey_pattern_ref
            .as_deref()
            .and_then(|journey_pattern_ref| self.file.document.journey_pattern(journey_pattern_ref))
    }
}

#[derive(Clone)]
struct Candidate {
    file: Arc<ScheduledFile>,
    journey_index: usize,
}

impl Candidate {
    fn journey(&self) -> &VehicleJourney {
        &self.file.document.vehicle_journeys[self.journey_index]
    }

    // A journey without its own profile inherits the service-level one.
    fn operating_profile(&self) -> Option<&OperatingProfile> {
        self.journey().operating_profile.as_ref().or_else(|| {
            self.file
                .document
                .service()
                .and_then(|service| service.operating_profile.as_ref())
        })
    }

    fn service_code(&self) -> Option<&str> {
        self.journey().service_ref.as_deref().or_else(|| {
            self.file
                .document
                .service()
                .and_then(|service| service.service_code.as_deref())
        })
    }

    fn allowed_by_serviced_organisation(&self, date: Date) -> bool {
        let day_type = match self
            .operating_profile()
            .and_then(|profile| profile.serviced_organisation_day_type.as_ref())
        {
            Some(day_type) => day_type,
            None => return true,
        };
        let document = &self.file.document;
        // Non-operation takes priority over operation.
        for organisation_ref in &day_type.days_of_non_operation_refs {
            match document.serviced_organisation(organisation_ref) {
                Some(organisation) if organisation.is_working_day(date) => return false,
                None => warn!(
                    "vehicle journey references unknown serviced organisation '{}'",
                    organisation_ref
                ),
                _ => {}
            }
        }
        if !day_type.days_of_operation_refs.is_empty() {
            let operates = day_type.days_of_operation_refs.iter().any(|organisation_ref| {
                document
                    .serviced_organisation(organisation_ref)
                    .map_or(false, |organisation| organisation.is_working_day(date))
            });
            if !operates {
                return false;
            }
        }
        true
    }
}

/// Resolves live vehicle activities against published timetable files, one
/// activity at a time, caching parsed files for the duration of the batch.
pub struct VehicleJourneyFinder<'a> {
    locator: &'a dyn CandidateFileLocator,
    cache: HashMap<(i64, String), Arc<ScheduledFile>>,
}

impl<'a> VehicleJourneyFinder<'a> {
    /// A finder with an empty parse cache.
    pub fn new(locator: &'a dyn CandidateFileLocator) -> Self {
        VehicleJourneyFinder {
            locator,
            cache: HashMap::new(),
        }
    }

    fn parse_candidate(&mut self, candidate: CandidateFile) -> Option<Arc<ScheduledFile>> {
        let key = (candidate.dataset_id, candidate.filename.clone());
        if let Some(file) = self.cache.get(&key) {
            return Some(file.clone());
        }
        let root: Element = match candidate.content.parse() {
            Ok(root) => root,
            Err(error) => {
                warn!(
                    "skipping timetable file '{}': invalid XML: {}",
                    candidate.filename, error
                );
                return None;
            }
        };
        match transxchange::read::document(&root) {
            Ok(document) => {
                let file = Arc::new(ScheduledFile {
                    dataset_id: candidate.dataset_id,
                    filename: candidate.filename,
                    revision_number: candidate.revision_number,
                    document,
                });
                self.cache.insert(key, file.clone());
                Some(file)
            }
            Err(error) => {
                warn!("skipping timetable file '{}': {}", candidate.filename, error);
                None
            }
        }
    }

    /// Narrows the published timetables down to exactly one scheduled journey
    /// for `activity`, or records a specific failure reason on `result` and
    /// returns `None`. Either way, diagnostic metadata (files considered,
    /// journey code, operating-profile summaries) is written to `result` as
    /// the stages iterate.
    pub fn resolve(
        &mut self,
        activity: &VehicleActivity,
        result: &mut ValidationResult,
    ) -> Result<Option<ResolvedJourney>> {
        let date = activity.recorded_date();

        // Stage 1: both identifiers must be present on the live report.
        let (operator_code, line_name) = match (
            activity.operator_ref.as_deref(),
            activity.published_line_name.as_deref(),
        ) {
            (Some(operator_code), Some(line_name)) => (operator_code, line_name),
            _ => {
                result.add_error(
                    ErrorCategory::Journey,
                    "OperatorRef or PublishedLineName is missing from the live report",
                );
                return Ok(None);
            }
        };

        // Stage 2: locate and parse the candidate files.
        let candidates = self
            .locator
            .find_candidate_files(operator_code, line_name)?;
        if candidates.is_empty() {
            result.add_error(
                ErrorCategory::Journey,
                format!(
                    "No published timetable file matches operator '{}' and line '{}'",
                    operator_code, line_name
                ),
            );
            return Ok(None);
        }
        // The revision of the first located file is reported whatever happens
        // next; a successful match overwrites it with the matched file's.
        result.revision_number = Some(candidates[0].revision_number);
        let mut files = Vec::new();
        for candidate in candidates {
            result.note_file(&candidate.filename);
            if let Some(file) = self.parse_candidate(candidate) {
                files.push(file);
            }
        }
        if files.is_empty() {
            result.add_error(
                ErrorCategory::Journey,
                "No candidate timetable file could be parsed",
            );
            return Ok(None);
        }

        // Stage 3: the service operating period must bracket the activity date.
        let files: Vec<Arc<ScheduledFile>> = files
            .into_iter()
            .filter(|file| {
                match file
                    .document
                    .service()
                    .and_then(|service| service.operating_period.as_ref())
                {
                    Some(period) => period.contains(date),
                    None => {
                        warn!(
                            "dropping '{}': missing or malformed OperatingPeriod",
                            file.filename
                        );
                        false
                    }
                }
            })
            .collect();
        if files.is_empty() {
            result.add_error(
                ErrorCategory::Journey,
                format!("No timetable file has an operating period covering {}", date),
            );
            result.set_error_code(ErrorCode::Code1_2);
            return Ok(None);
        }

        // Stage 4: ticket-machine journey code.
        let journey_ref = match activity.dated_vehicle_journey_ref.as_deref() {
            Some(journey_ref) => journey_ref,
            None => {
                result.add_error(
                    ErrorCategory::Journey,
                    "DatedVehicleJourneyRef is missing from the live report",
                );
                result.set_error_code(ErrorCode::Code2_1);
                return Ok(None);
            }
        };
        result.journey_code = Some(journey_ref.to_string());
        let mut survivors: Vec<Candidate> = Vec::new();
        for file in &files {
            for (journey_index, journey) in file.document.vehicle_journeys.iter().enumerate() {
                if journey.journey_code.as_deref() == Some(journey_ref) {
                    survivors.push(Candidate {
                        file: file.clone(),
                        journey_index,
                    });
                }
            }
        }
        if survivors.is_empty() {
            result.add_error(
                ErrorCategory::Journey,
                format!("No vehicle journey has the journey code '{}'", journey_ref),
            );
            result.set_error_code(ErrorCode::Code2_1);
            return Ok(None);
        }

        // Stage 5: the journey's own LineRef must belong to the published
        // line; a journey code can be shared across lines in one file.
        survivors.retain(|candidate| candidate.journey().line_ref_suffix() == Some(line_name));
        if survivors.is_empty() {
            result.add_error(
                ErrorCategory::Journey,
                format!(
                    "No vehicle journey with journey code '{}' belongs to line '{}'",
                    journey_ref, line_name
                ),
            );
            result.set_error_code(ErrorCode::Code5_1);
            return Ok(None);
        }

        // Stage 6: the activity date must be a scheduled day of the profile.
        for candidate in &survivors {
            if let Some(profile) = candidate.operating_profile() {
                result.note_operating_profile(format!(
                    "{}: {}",
                    candidate.file.filename,
                    profile.summary()
                ));
            }
        }
        survivors.retain(|candidate| {
            candidate
                .operating_profile()
                .map_or(true, |profile| profile.is_scheduled_on(date))
        });
        if survivors.is_empty() {
            result.add_error(
                ErrorCategory::Journey,
                format!("No matching vehicle journey operates on {}", date),
            );
            result.set_error_code(ErrorCode::Code3_1);
            return Ok(None);
        }

        // Stage 7: keep the highest revision among surviving files, ties kept.
        if let Some(max_revision) = survivors
            .iter()
            .map(|candidate| candidate.file.revision_number)
            .max()
        {
            survivors.retain(|candidate| candidate.file.revision_number == max_revision);
        }

        // Stage 8: serviced-organisation working-day overrides.
        survivors.retain(|candidate| candidate.allowed_by_serviced_organisation(date));
        if survivors.is_empty() {
            result.add_error(
                ErrorCategory::Journey,
                format!(
                    "A serviced organisation's calendar excludes every matching vehicle journey on {}",
                    date
                ),
            );
            result.set_error_code(ErrorCode::Code4_1);
            return Ok(None);
        }

        // Stage 9: explicit days-of-non-operation override. Stage 6 only
        // checks the scheduled days, so a journey whose profile blacklists
        // the date is dropped here, with its own code.
        survivors.retain(|candidate| {
            !candidate
                .operating_profile()
                .map_or(false, |profile| profile.is_non_operating_on(date))
        });
        if survivors.is_empty() {
            result.add_error(
                ErrorCategory::Journey,
                format!(
                    "Every matching vehicle journey is explicitly not operating on {}",
                    date
                ),
            );
            result.set_error_code(ErrorCode::Code4_2);
            return Ok(None);
        }

        // Stage 10: disambiguation.
        if survivors.len() > 1 {
            let distinct_files: HashSet<(i64, &str)> = survivors
                .iter()
                .map(|candidate| (candidate.file.dataset_id, candidate.file.filename.as_str()))
                .collect();
            if distinct_files.len() == 1 {
                let codes: Vec<&str> = survivors
                    .iter()
                    .filter_map(|candidate| candidate.journey().vehicle_journey_code.as_deref())
                    .collect();
                let listing = if codes.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", codes.join(", "))
                };
                result.add_error(
                    ErrorCategory::Journey,
                    format!(
                        "Several vehicle journeys{} with journey code '{}' in the same timetable file match the activity",
                        listing, journey_ref
                    ),
                );
                result.set_error_code(ErrorCode::Code6_2A);
                return Ok(None);
            }
            let service_codes: HashSet<&str> =
                survivors.iter().filter_map(Candidate::service_code).collect();
            if service_codes.len() <= 1 {
                result.add_error(
                    ErrorCategory::Journey,
                    format!(
                        "Vehicle journeys with journey code '{}' span several timetable files of the same registered service",
                        journey_ref
                    ),
                );
                result.set_error_code(ErrorCode::Code6_2C);
                return Ok(None);
            }
            // Matching journeys span several registered services: the
            // documented upstream behavior discards the diagnostics recorded
            // so far and reports no code.
            debug!(
                "journey code '{}' is ambiguous across {} registered services",
                journey_ref,
                service_codes.len()
            );
            result.clear_errors();
            return Ok(None);
        }

        // Stage 11: exactly one journey remains.
        let candidate = match survivors.pop() {
            Some(candidate) => candidate,
            None => return Ok(None),
        };
        result.journey_matched = true;
        result.dataset_id = Some(candidate.file.dataset_id);
        result.filename = Some(candidate.file.filename.clone());
        result.revision_number = Some(candidate.file.revision_number);
        result.departure_time = candidate.journey().departure_time;
        Ok(Some(ResolvedJourney {
            file: candidate.file,
            journey_index: candidate.journey_index,
        }))
    }
}
