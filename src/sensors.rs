//! Sensor readings captured alongside audio chunks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One environmental reading taken when a chunk arrived
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    /// Device-reported capture time in milliseconds
    pub timestamp_ms: i64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Size in bytes of the chunk this reading arrived with
    pub chunk_size: usize,
    /// Wall-clock time the reading was recorded server-side
    pub captured_at: DateTime<Utc>,
}

impl SensorReading {
    pub fn new(timestamp_ms: i64, humidity: f64, chunk_size: usize) -> Self {
        Self {
            timestamp_ms,
            humidity,
            chunk_size,
            captured_at: Utc::now(),
        }
    }
}

/// Optional per-chunk annotations supplied by the capture device
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkAnnotation {
    pub humidity: Option<f64>,
    pub timestamp_ms: Option<i64>,
}

impl ChunkAnnotation {
    /// Resolve missing annotations: humidity defaults to 0.0 and the
    /// timestamp to the current wall clock.
    pub fn into_reading(self, chunk_size: usize) -> SensorReading {
        let now = Utc::now();
        SensorReading {
            timestamp_ms: self.timestamp_ms.unwrap_or_else(|| now.timestamp_millis()),
            humidity: self.humidity.unwrap_or(0.0),
            chunk_size,
            captured_at: now,
        }
    }
}

/// Aggregated view over the readings of one recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorStats {
    pub total_readings: usize,
    pub humidity_avg: f64,
    pub humidity_min: f64,
    pub humidity_max: f64,
    /// Span between the first and last reading; 0 with fewer than two readings
    pub recording_duration_ms: i64,
}

impl SensorStats {
    pub fn empty() -> Self {
        Self {
            total_readings: 0,
            humidity_avg: 0.0,
            humidity_min: 0.0,
            humidity_max: 0.0,
            recording_duration_ms: 0,
        }
    }
}

/// Summarize a recording's sensor history. Readings are kept in arrival
/// order, so the duration is taken from the first and last entries.
pub fn aggregate(readings: &[SensorReading]) -> SensorStats {
    if readings.is_empty() {
        return SensorStats::empty();
    }

    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for reading in readings {
        sum += reading.humidity;
        min = min.min(reading.humidity);
        max = max.max(reading.humidity);
    }

    let duration = if readings.len() < 2 {
        0
    } else {
        readings[readings.len() - 1].timestamp_ms - readings[0].timestamp_ms
    };

    SensorStats {
        total_readings: readings.len(),
        humidity_avg: sum / readings.len() as f64,
        humidity_min: min,
        humidity_max: max,
        recording_duration_ms: duration,
    }
}
