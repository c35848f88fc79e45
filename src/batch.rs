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

use crate::{
    finder::VehicleJourneyFinder,
    locator::CandidateFileLocator,
    matcher,
    sampler::{ActivitySampler, AnalysedActivityLog, LineCatalogue, VehicleLocationFeed},
    validation::ValidationResult,
    Result,
};
use rand::Rng;
use tracing::info;

/// Runs one post-publishing check over feed `feed_id`: draws at most
/// `max_count` live activities, resolves each one to its scheduled vehicle
/// journey and compares the designated fields, returning one
/// [ValidationResult] per sampled activity.
///
/// An empty sample is not an error; the batch simply has nothing to validate.
pub fn run_batch<R: Rng + ?Sized>(
    feed_id: u64,
    feed: &dyn VehicleLocationFeed,
    catalogue: &dyn LineCatalogue,
    analysed_log: &dyn AnalysedActivityLog,
    locator: &dyn CandidateFileLocator,
    max_count: usize,
    rng: &mut R,
) -> Result<Vec<ValidationResult>> {
    let mut sampler = ActivitySampler::new(feed, catalogue, analysed_log);
    let (header, activities) = sampler.sample(feed_id, max_count, rng)?;
    if activities.is_empty() {
        info!("feed {}: nothing to validate", feed_id);
        return Ok(Vec::new());
    }
    if let Some(producer_ref) = header.producer_ref.as_deref() {
        info!(
            "feed {}: validating {} activities from producer '{}'",
            feed_id,
            activities.len(),
            producer_ref
        );
    }
    let mut finder = VehicleJourneyFinder::new(locator);
    let mut results = Vec::with_capacity(activities.len());
    for activity in &activities {
        let mut result = ValidationResult::new();
        if let Some(resolved) = finder.resolve(activity, &mut result)? {
            matcher::compare(activity, &resolved, &mut result);
        }
        results.push(result);
    }
    info!(
        "feed {}: {} of {} activities matched a scheduled journey",
        feed_id,
        results.iter().filter(|result| result.journey_matched).count(),
        results.len()
    );
    Ok(results)
}
