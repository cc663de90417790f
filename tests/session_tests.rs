//! Validation tests for the recording session state machine

use notesense::error::PipelineError;
use notesense::sensors::SensorReading;
use notesense::session::{RecordingSession, SessionState};

fn reading(timestamp_ms: i64, humidity: f64, chunk_size: usize) -> SensorReading {
    SensorReading::new(timestamp_ms, humidity, chunk_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_without_any_chunk_is_empty_session() {
        let mut session = RecordingSession::new();
        match session.finalize() {
            Err(PipelineError::EmptySession) => {}
            other => panic!("expected EmptySession, got {:?}", other),
        }

        // A subsequent accept must start cleanly
        let ack = session.accept(b"abcd", reading(0, 40.0, 4));
        assert_eq!(ack.chunk_count, 1);
        assert_eq!(ack.reading_count, 1);
        assert_eq!(ack.total_bytes, 4);
    }

    #[test]
    fn test_finalize_with_only_empty_chunks_is_empty_buffer() {
        let mut session = RecordingSession::new();
        session.accept(b"", reading(0, 40.0, 0));
        session.accept(b"", reading(100, 41.0, 0));

        match session.finalize() {
            Err(PipelineError::EmptyBuffer) => {}
            other => panic!("expected EmptyBuffer, got {:?}", other),
        }

        // Failure must not wipe the session: the readings are still there
        assert_eq!(session.readings().len(), 2);
        assert_eq!(session.state(), SessionState::Recording);
    }

    #[test]
    fn test_payload_is_concatenation_in_arrival_order() {
        let mut session = RecordingSession::new();
        session.accept(b"ab", reading(0, 40.0, 2));
        session.accept(b"", reading(50, 40.5, 0));
        session.accept(b"cde", reading(100, 41.0, 3));

        let drained = session.finalize().unwrap();
        assert_eq!(drained.payload, b"abcde");
        assert_eq!(drained.readings.len(), 3);
        assert_eq!(drained.readings[0].timestamp_ms, 0);
        assert_eq!(drained.readings[2].timestamp_ms, 100);
    }

    #[test]
    fn test_empty_chunk_counts_but_adds_no_bytes() {
        let mut session = RecordingSession::new();
        let ack = session.accept(b"", reading(0, 40.0, 0));
        assert_eq!(ack.chunk_count, 1);
        assert_eq!(ack.reading_count, 1);
        assert_eq!(ack.total_bytes, 0);

        let ack = session.accept(b"xyz", reading(10, 42.0, 3));
        assert_eq!(ack.chunk_count, 2);
        assert_eq!(ack.total_bytes, 3);
    }

    #[test]
    fn test_finalize_resets_for_a_fresh_recording() {
        let mut session = RecordingSession::new();
        session.accept(b"first", reading(0, 40.0, 5));
        session.accept(b"second", reading(1000, 60.0, 6));

        let drained = session.finalize().unwrap();
        assert_eq!(drained.payload.len(), 11);
        assert_eq!(drained.readings.len(), 2);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.total_bytes(), 0);
        assert!(session.readings().is_empty());

        // No carryover into the next recording
        let ack = session.accept(b"third", reading(0, 50.0, 5));
        assert_eq!(ack.chunk_count, 1);
        assert_eq!(ack.reading_count, 1);
        assert_eq!(ack.total_bytes, 5);

        let drained = session.finalize().unwrap();
        assert_eq!(drained.payload, b"third");
        assert_eq!(drained.readings.len(), 1);
    }

    #[test]
    fn test_accept_transitions_idle_to_recording() {
        let mut session = RecordingSession::new();
        assert_eq!(session.state(), SessionState::Idle);

        session.accept(b"data", reading(0, 40.0, 4));
        assert_eq!(session.state(), SessionState::Recording);

        session.finalize().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_double_finalize_errors_the_second_time() {
        let mut session = RecordingSession::new();
        session.accept(b"data", reading(0, 40.0, 4));
        assert!(session.finalize().is_ok());

        match session.finalize() {
            Err(PipelineError::EmptySession) => {}
            other => panic!("expected EmptySession, got {:?}", other),
        }
    }

    #[test]
    fn test_chunk_sizes_do_not_matter_only_total() {
        let payload: Vec<u8> = (0u8..=255).collect();

        // One big chunk
        let mut one = RecordingSession::new();
        one.accept(&payload, reading(0, 40.0, payload.len()));
        let big = one.finalize().unwrap().payload;

        // Many one-byte chunks
        let mut many = RecordingSession::new();
        for (i, byte) in payload.iter().enumerate() {
            many.accept(&[*byte], reading(i as i64, 40.0, 1));
        }
        let small = many.finalize().unwrap().payload;

        assert_eq!(big, small);
    }
}
