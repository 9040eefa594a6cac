//! Time-stamped sensor readings and the injectable source that supplies them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::variable::PollutantLevels;

/// One record from a monitoring station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub sensor_id: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub pollutants: PollutantLevels,
    /// Meteorological context; carried along but never scored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_direction: Option<f64>,
}

impl SensorReading {
    pub fn new(
        sensor_id: impl Into<String>,
        location: impl Into<String>,
        timestamp: DateTime<Utc>,
        pollutants: PollutantLevels,
    ) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            location: location.into(),
            region: None,
            timestamp,
            pollutants,
            temperature: None,
            humidity: None,
            wind_speed: None,
            wind_direction: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

/// Filter, offset and limit applied when fetching readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingQuery {
    pub sensor_id: Option<String>,
    pub location: Option<String>,
    pub region: Option<String>,
    /// Inclusive lower bound on `timestamp`.
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `timestamp`.
    pub until: Option<DateTime<Utc>>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl ReadingQuery {
    pub fn for_sensor(sensor_id: impl Into<String>) -> Self {
        Self {
            sensor_id: Some(sensor_id.into()),
            ..Self::default()
        }
    }

    pub fn with_window(mut self, since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self.until = Some(until);
        self
    }

    pub fn with_page(mut self, skip: usize, limit: usize) -> Self {
        self.skip = skip;
        self.limit = Some(limit);
        self
    }

    /// Whether `reading` passes every filter (offset and limit excluded).
    pub fn matches(&self, reading: &SensorReading) -> bool {
        let eq = |want: &Option<String>, have: Option<&str>| match want {
            Some(w) => have == Some(w.as_str()),
            None => true,
        };
        eq(&self.sensor_id, Some(reading.sensor_id.as_str()))
            && eq(&self.location, Some(reading.location.as_str()))
            && eq(&self.region, reading.region.as_deref())
            && self.since.map_or(true, |t| reading.timestamp >= t)
            && self.until.map_or(true, |t| reading.timestamp < t)
    }
}

/// Supplier of historical readings.
///
/// Implement this to plug in a database, an HTTP API, or a test fixture.
#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// Readings matching `query`, in source order after offset and limit.
    async fn fetch_readings(&self, query: &ReadingQuery) -> Result<Vec<SensorReading>>;
}

/// Readings held in memory, returned in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReadingSource {
    readings: Vec<SensorReading>,
}

impl InMemoryReadingSource {
    pub fn new(readings: Vec<SensorReading>) -> Self {
        Self { readings }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Synchronous form of [`ReadingSource::fetch_readings`].
    pub fn query(&self, query: &ReadingQuery) -> Vec<SensorReading> {
        self.readings
            .iter()
            .filter(|r| query.matches(r))
            .skip(query.skip)
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ReadingSource for InMemoryReadingSource {
    async fn fetch_readings(&self, query: &ReadingQuery) -> Result<Vec<SensorReading>> {
        Ok(self.query(query))
    }
}
