//! Air quality provider boundary
//!
//! The core only talks to the upstream feed through [`AirQualityProvider`].
//! [`WaqiClient`] is the HTTP implementation for the World Air Quality Index
//! feed; tests substitute their own implementations.

use async_trait::async_trait;

use crate::error::ProviderFailure;
use crate::models::{Coordinate, SearchHit, StationFeed, StationReading};

pub mod waqi;

pub use waqi::WaqiClient;

pub type ProviderResult<T> = std::result::Result<T, ProviderFailure>;

#[async_trait]
pub trait AirQualityProvider: Send + Sync {
    /// Reading of the station nearest to `point`
    async fn query_nearest(&self, point: Coordinate) -> ProviderResult<StationReading>;

    /// Full feed (pollutants, provider forecast) for the station nearest to `point`
    async fn feed(&self, point: Coordinate) -> ProviderResult<StationFeed> {
        self.query_nearest(point).await.map(StationFeed::from)
    }

    /// Keyword station search
    async fn search(&self, keyword: &str) -> ProviderResult<Vec<SearchHit>>;
}
