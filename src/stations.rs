//! Nearby station resolution
//!
//! The provider only answers "which station is nearest to this point", so a
//! cluster of stations is found by probing a small grid of points around the
//! center and merging whatever comes back.

use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::Result;
use crate::error::ProviderFailure;
use crate::models::{Coordinate, CoordinateDelta, StationReading};
use crate::provider::AirQualityProvider;

/// Result of one probe, tagged with where it was aimed
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    /// Position of the offset in the probe list
    pub offset_index: usize,
    pub query_point: Coordinate,
    pub result: std::result::Result<StationReading, ProviderFailure>,
}

/// Nine probe offsets: the center, four cardinal and four diagonal points
#[must_use]
pub fn probe_grid(delta: f64) -> Vec<CoordinateDelta> {
    vec![
        CoordinateDelta::new(0.0, 0.0),
        CoordinateDelta::new(delta, 0.0),
        CoordinateDelta::new(-delta, 0.0),
        CoordinateDelta::new(0.0, delta),
        CoordinateDelta::new(0.0, -delta),
        CoordinateDelta::new(delta, delta),
        CoordinateDelta::new(-delta, delta),
        CoordinateDelta::new(delta, -delta),
        CoordinateDelta::new(-delta, -delta),
    ]
}

/// Merge probe outcomes, given in completion order, into unique stations.
///
/// When two probes hit the same station the later completion replaces the
/// earlier one, regardless of `observed_at`. Stations keep the position of
/// their first appearance.
#[must_use]
pub fn merge_outcomes(outcomes: Vec<ProbeOutcome>) -> Vec<StationReading> {
    let mut stations: Vec<StationReading> = Vec::with_capacity(outcomes.len());
    let mut positions: HashMap<u64, usize> = HashMap::new();

    for reading in outcomes.into_iter().filter_map(|outcome| outcome.result.ok()) {
        match positions.get(&reading.id) {
            Some(&position) => stations[position] = reading,
            None => {
                positions.insert(reading.id, stations.len());
                stations.push(reading);
            }
        }
    }

    stations
}

/// Resolves the cluster of stations around a coordinate
pub struct StationResolver {
    provider: Arc<dyn AirQualityProvider>,
    offsets: Vec<CoordinateDelta>,
}

impl StationResolver {
    pub fn new(provider: Arc<dyn AirQualityProvider>, offsets: Vec<CoordinateDelta>) -> Self {
        Self { provider, offsets }
    }

    /// Resolver using the default nine-point grid at `delta` degrees
    pub fn with_grid(provider: Arc<dyn AirQualityProvider>, delta: f64) -> Self {
        Self::new(provider, probe_grid(delta))
    }

    /// Unique stations near `center`. Failed probes are dropped; if all of
    /// them fail the result is empty. Only an invalid center is an error.
    #[instrument(skip(self), fields(probes = self.offsets.len()))]
    pub async fn resolve_nearby(&self, center: Coordinate) -> Result<Vec<StationReading>> {
        center.validate()?;

        let outcomes = self.probe(center).await;
        let failures = outcomes.iter().filter(|o| o.result.is_err()).count();
        let stations = merge_outcomes(outcomes);

        info!(
            failures,
            stations = stations.len(),
            "Resolved nearby stations around {}",
            center.format_coordinates()
        );
        Ok(stations)
    }

    /// Issue every probe at once and collect outcomes as they complete
    pub async fn probe(&self, center: Coordinate) -> Vec<ProbeOutcome> {
        let provider = self.provider.as_ref();

        let mut pending: FuturesUnordered<_> = self
            .offsets
            .iter()
            .enumerate()
            .map(|(offset_index, offset)| {
                let query_point = center.offset_by(*offset);
                async move {
                    let result = provider.query_nearest(query_point).await;
                    ProbeOutcome {
                        offset_index,
                        query_point,
                        result,
                    }
                }
            })
            .collect();

        let mut outcomes = Vec::with_capacity(self.offsets.len());
        while let Some(outcome) = pending.next().await {
            if let Err(failure) = &outcome.result {
                debug!(
                    offset = outcome.offset_index,
                    "Probe at {} failed: {}",
                    outcome.query_point.format_coordinates(),
                    failure
                );
            }
            outcomes.push(outcome);
        }
        outcomes
    }
}
