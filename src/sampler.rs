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

//! Selection of a bounded random sample of live vehicle activities from one
//! feed snapshot, filtered to in-scope lines and deduplicated against
//! activities already analysed on previous runs of the same report date.

use crate::{
    objects::Date,
    siri::{SiriHeader, VehicleActivity},
    Result,
};
use rand::Rng;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// The identity of one analysed activity. Two reports with the same key are
/// the same observation for deduplication purposes; absent references count
/// as the empty string so that keys are always comparable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActivityKey {
    /// The feed the activity was read from.
    pub feed_id: u64,
    /// `DatedVehicleJourneyRef` of the report, or empty.
    pub journey_ref: String,
    /// `VehicleRef` of the report, or empty.
    pub vehicle_ref: String,
    /// Date part of `RecordedAtTime`.
    pub recorded_date: Date,
}

impl ActivityKey {
    /// The key identifying `activity` within feed `feed_id`.
    pub fn of(feed_id: u64, activity: &VehicleActivity) -> Self {
        ActivityKey {
            feed_id,
            journey_ref: activity
                .dated_vehicle_journey_ref
                .clone()
                .unwrap_or_default(),
            vehicle_ref: activity.vehicle_ref.clone().unwrap_or_default(),
            recorded_date: activity.recorded_date(),
        }
    }
}

/// Source of live vehicle position snapshots.
pub trait VehicleLocationFeed {
    /// The current snapshot of feed `feed_id`.
    fn snapshot(&self, feed_id: u64) -> Result<(SiriHeader, Vec<VehicleActivity>)>;
}

/// The in-season timetable catalogue, keyed by operator and line.
pub trait LineCatalogue {
    /// Whether activities of `line_name` under `operator_code` should be
    /// validated at all.
    fn is_in_scope(&self, operator_code: &str, line_name: &str) -> bool;
}

/// Record of activities analysed by previous runs.
pub trait AnalysedActivityLog {
    /// Keys of every activity of feed `feed_id` already analysed for reports
    /// dated `date`.
    fn analysed_keys(&self, feed_id: u64, date: Date) -> Result<HashSet<ActivityKey>>;
}

/// Draws a bounded uniform sample of eligible activities from one feed.
///
/// Eligible means: the activity names an operator and line the catalogue has
/// in scope, and its key was neither analysed by a previous run for the same
/// report date nor already drawn from the current snapshot.
pub struct ActivitySampler<'a> {
    feed: &'a dyn VehicleLocationFeed,
    catalogue: &'a dyn LineCatalogue,
    log: &'a dyn AnalysedActivityLog,
    analysed: HashMap<(u64, Date), HashSet<ActivityKey>>,
}

impl<'a> ActivitySampler<'a> {
    /// A sampler over the given collaborators, with an empty analysed-key
    /// cache.
    pub fn new(
        feed: &'a dyn VehicleLocationFeed,
        catalogue: &'a dyn LineCatalogue,
        log: &'a dyn AnalysedActivityLog,
    ) -> Self {
        ActivitySampler {
            feed,
            catalogue,
            log,
            analysed: HashMap::new(),
        }
    }

    fn already_analysed(&mut self, key: &ActivityKey) -> Result<bool> {
        let cache_key = (key.feed_id, key.recorded_date);
        if !self.analysed.contains_key(&cache_key) {
            let keys = self.log.analysed_keys(key.feed_id, key.recorded_date)?;
            self.analysed.insert(cache_key, keys);
        }
        Ok(self.analysed[&cache_key].contains(key))
    }

    /// Fetches the current snapshot of `feed_id` and draws at most
    /// `max_count` eligible activities from it, uniformly and without
    /// replacement. An empty draw is `Ok`: the caller treats it as nothing
    /// to validate.
    pub fn sample<R: Rng + ?Sized>(
        &mut self,
        feed_id: u64,
        max_count: usize,
        rng: &mut R,
    ) -> Result<(SiriHeader, Vec<VehicleActivity>)> {
        let (header, activities) = self.feed.snapshot(feed_id)?;
        let total = activities.len();
        let mut seen = HashSet::new();
        let mut eligible = Vec::new();
        for activity in activities {
            let in_scope = match (
                activity.operator_ref.as_deref(),
                activity.published_line_name.as_deref(),
            ) {
                (Some(operator_code), Some(line_name)) => {
                    self.catalogue.is_in_scope(operator_code, line_name)
                }
                _ => false,
            };
            if !in_scope {
                continue;
            }
            let key = ActivityKey::of(feed_id, &activity);
            if self.already_analysed(&key)? || !seen.insert(key) {
                continue;
            }
            eligible.push(activity);
        }
        info!(
            "feed {}: {} of {} activities eligible for sampling",
            feed_id,
            eligible.len(),
            total
        );
        if eligible.len() <= max_count {
            return Ok((header, eligible));
        }
        let mut slots: Vec<Option<VehicleActivity>> = eligible.into_iter().map(Some).collect();
        let sampled = rand::seq::index::sample(rng, slots.len(), max_count)
            .into_iter()
            .filter_map(|index| slots[index].take())
            .collect();
        Ok((header, sampled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};

    struct StubFeed {
        activities: Vec<VehicleActivity>,
    }

    impl VehicleLocationFeed for StubFeed {
        fn snapshot(&self, _feed_id: u64) -> Result<(SiriHeader, Vec<VehicleActivity>)> {
            Ok((
                SiriHeader {
                    producer_ref: Some(String::from("ITOWORLD")),
                    ..Default::default()
                },
                self.activities.clone(),
            ))
        }
    }

    struct OneLineCatalogue;

    impl LineCatalogue for OneLineCatalogue {
        fn is_in_scope(&self, operator_code: &str, line_name: &str) -> bool {
            operator_code == "NOC1" && line_name == "24"
        }
    }

    struct StubLog {
        keys: HashSet<ActivityKey>,
    }

    impl AnalysedActivityLog for StubLog {
        fn analysed_keys(&self, _feed_id: u64, _date: Date) -> Result<HashSet<ActivityKey>> {
            Ok(self.keys.clone())
        }
    }

    fn activity(journey_ref: &str, vehicle_ref: &str) -> VehicleActivity {
        VehicleActivity {
            recorded_at_time: chrono::Utc.with_ymd_and_hms(2021, 6, 16, 9, 30, 0).unwrap(),
            operator_ref: Some(String::from("NOC1")),
            published_line_name: Some(String::from("24")),
            direction_ref: None,
            block_ref: None,
            origin_ref: None,
            origin_name: None,
            destination_ref: None,
            destination_name: None,
            dated_vehicle_journey_ref: Some(journey_ref.to_string()),
            vehicle_ref: Some(vehicle_ref.to_string()),
            driver_ref: None,
            longitude: None,
            latitude: None,
        }
    }

    fn sample_with(
        activities: Vec<VehicleActivity>,
        analysed: HashSet<ActivityKey>,
        max_count: usize,
    ) -> Vec<VehicleActivity> {
        let feed = StubFeed { activities };
        let log = StubLog { keys: analysed };
        let mut sampler = ActivitySampler::new(&feed, &OneLineCatalogue, &log);
        let mut rng = StdRng::seed_from_u64(42);
        let (header, sampled) = sampler.sample(1, max_count, &mut rng).unwrap();
        assert_eq!(Some(String::from("ITOWORLD")), header.producer_ref);
        sampled
    }

    #[test]
    fn out_of_scope_lines_are_discarded() {
        let mut other_line = activity("J2", "BUS_2");
        other_line.published_line_name = Some(String::from("99"));
        let mut no_operator = activity("J3", "BUS_3");
        no_operator.operator_ref = None;
        let sampled = sample_with(
            vec![activity("J1", "BUS_1"), other_line, no_operator],
            HashSet::new(),
            10,
        );
        assert_eq!(1, sampled.len());
        assert_eq!(
            Some(String::from("J1")),
            sampled[0].dated_vehicle_journey_ref
        );
    }

    #[test]
    fn duplicate_keys_within_a_snapshot_are_drawn_once() {
        let sampled = sample_with(
            vec![activity("J1", "BUS_1"), activity("J1", "BUS_1")],
            HashSet::new(),
            10,
        );
        assert_eq!(1, sampled.len());
    }

    #[test]
    fn previously_analysed_activities_are_excluded() {
        let done = activity("J1", "BUS_1");
        let mut analysed = HashSet::new();
        analysed.insert(ActivityKey::of(1, &done));
        let sampled = sample_with(vec![done, activity("J2", "BUS_2")], analysed, 10);
        assert_eq!(1, sampled.len());
        assert_eq!(
            Some(String::from("J2")),
            sampled[0].dated_vehicle_journey_ref
        );
    }

    #[test]
    fn draw_is_capped_and_deterministic_for_a_seeded_rng() {
        let activities: Vec<VehicleActivity> = (0..20)
            .map(|n| activity(&format!("J{}", n), &format!("BUS_{}", n)))
            .collect();
        let first = sample_with(activities.clone(), HashSet::new(), 5);
        let second = sample_with(activities.clone(), HashSet::new(), 5);
        assert_eq!(5, first.len());
        assert_eq!(first, second);
        // without the cap, every activity comes back
        assert_eq!(20, sample_with(activities, HashSet::new(), 20).len());
    }

    #[test]
    fn empty_snapshot_is_ok() {
        let sampled = sample_with(vec![], HashSet::new(), 10);
        assert!(sampled.is_empty());
    }

    #[test]
    fn missing_references_default_to_empty_key_components() {
        let mut bare = activity("J1", "BUS_1");
        bare.dated_vehicle_journey_ref = None;
        bare.vehicle_ref = None;
        let key = ActivityKey::of(1, &bare);
        assert_eq!("", key.journey_ref);
        assert_eq!("", key.vehicle_ref);
    }
}
