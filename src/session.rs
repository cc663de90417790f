//! Recording session state machine

use crate::error::{PipelineError, Result};
use crate::sensors::SensorReading;
use serde::Serialize;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
}

/// Acknowledgement returned for every accepted chunk
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IngestAck {
    pub chunk_count: usize,
    pub reading_count: usize,
    pub total_bytes: usize,
}

/// Payload and readings handed off by a successful finalize
#[derive(Debug)]
pub struct DrainedRecording {
    pub payload: Vec<u8>,
    pub readings: Vec<SensorReading>,
}

/// Accumulates chunks and sensor readings between finalizes. The first
/// accept after Idle starts a fresh recording; finalize drains everything
/// and returns to Idle in one step, so no chunk is ever shared between
/// two recordings.
#[derive(Debug)]
pub struct RecordingSession {
    state: SessionState,
    payload: Vec<u8>,
    readings: Vec<SensorReading>,
    chunk_count: usize,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            payload: Vec::new(),
            readings: Vec::new(),
            chunk_count: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Append a chunk and its reading. Empty chunks are counted and their
    /// readings kept, but add no payload bytes. Chunk order is arrival
    /// order; the payload is a straight concatenation.
    pub fn accept(&mut self, chunk: &[u8], reading: SensorReading) -> IngestAck {
        if self.state == SessionState::Idle {
            self.payload.clear();
            self.readings.clear();
            self.chunk_count = 0;
            self.state = SessionState::Recording;
        }

        if !chunk.is_empty() {
            self.payload.extend_from_slice(chunk);
        }
        self.readings.push(reading);
        self.chunk_count += 1;

        IngestAck {
            chunk_count: self.chunk_count,
            reading_count: self.readings.len(),
            total_bytes: self.payload.len(),
        }
    }

    /// Drain the accumulated payload and readings and reset to Idle.
    /// Fails if nothing was ever accepted, or if the accepted chunks
    /// carried no bytes; the session is left untouched on failure.
    pub fn finalize(&mut self) -> Result<DrainedRecording> {
        if self.state == SessionState::Idle {
            return Err(PipelineError::EmptySession);
        }
        if self.payload.is_empty() {
            return Err(PipelineError::EmptyBuffer);
        }

        let payload = std::mem::take(&mut self.payload);
        let readings = std::mem::take(&mut self.readings);
        self.chunk_count = 0;
        self.state = SessionState::Idle;

        Ok(DrainedRecording { payload, readings })
    }

    /// Readings accumulated since the last successful finalize
    pub fn readings(&self) -> &[SensorReading] {
        &self.readings
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    pub fn total_bytes(&self) -> usize {
        self.payload.len()
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}
