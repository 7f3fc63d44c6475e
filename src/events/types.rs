// Note event types
// Raw events extracted from a score and the clean events the engine produces

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::{is_standard, Ql};

/// A raw note event extracted from a source score.
///
/// Raw events are produced once per piece and read-only afterwards; they may
/// overlap each other and carry arbitrary, non-standard durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Offset from the start of the piece
    pub offset: Ql,

    /// Sounding length; strictly positive after extraction
    pub duration: Ql,

    /// MIDI note number
    pub pitch: u8,
}

impl RawEvent {
    pub fn new(offset: Ql, duration: Ql, pitch: u8) -> Self {
        RawEvent {
            offset,
            duration,
            pitch,
        }
    }

    pub fn end_offset(&self) -> Ql {
        self.offset + self.duration
    }
}

/// A clean note or rest with a standard duration at an exact position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanEvent {
    /// Offset from the start of the piece
    pub offset: Ql,

    /// One of the standard notation durations
    pub duration: Ql,

    /// MIDI note number; `None` exactly when this is a rest
    pub pitch: Option<u8>,

    pub is_rest: bool,
}

impl CleanEvent {
    /// Create a sounding note
    pub fn note(offset: Ql, duration: Ql, pitch: u8) -> Self {
        CleanEvent {
            offset,
            duration,
            pitch: Some(pitch),
            is_rest: false,
        }
    }

    /// Create a rest
    pub fn rest(offset: Ql, duration: Ql) -> Self {
        CleanEvent {
            offset,
            duration,
            pitch: None,
            is_rest: true,
        }
    }

    pub fn end_offset(&self) -> Ql {
        self.offset + self.duration
    }
}

/// Violations reported by [`Timeline::check_invariants`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    #[error("timeline does not start at zero (first event at {0})")]
    NonZeroStart(Ql),

    #[error("coverage break at {at}: previous event ends at {end}")]
    CoverageBreak { at: Ql, end: Ql },

    #[error("non-standard duration {duration} at {at}")]
    NonStandardDuration { at: Ql, duration: Ql },

    #[error("pitch {pitch} at {at} outside range {low}..={high}")]
    PitchOutOfRange { at: Ql, pitch: u8, low: u8, high: u8 },

    #[error("rest/pitch mismatch at {0}")]
    RestPitchMismatch(Ql),
}

/// A fully covered, non-overlapping event sequence for one difficulty tier.
///
/// After gap filling the timeline is gapless: each event ends exactly where
/// the next begins, the first event sits at offset zero, and every duration
/// is a standard notation value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub events: Vec<CleanEvent>,
}

impl Timeline {
    pub fn new(events: Vec<CleanEvent>) -> Self {
        Timeline { events }
    }

    pub fn empty() -> Self {
        Timeline { events: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CleanEvent> {
        self.events.iter()
    }

    /// Number of sounding notes (rests excluded)
    pub fn note_count(&self) -> usize {
        self.events.iter().filter(|e| !e.is_rest).count()
    }

    /// End of the last event, or zero for an empty timeline
    pub fn total_span(&self) -> Ql {
        self.events
            .last()
            .map(CleanEvent::end_offset)
            .unwrap_or(Ql::ZERO)
    }

    /// Verify the clean-timeline invariants: starts at zero, gapless and
    /// non-overlapping coverage, standard durations only, every pitch inside
    /// `pitch_range`, and rests carry no pitch. An empty timeline is valid.
    pub fn check_invariants(&self, pitch_range: (u8, u8)) -> Result<(), TimelineError> {
        let (low, high) = pitch_range;

        if let Some(first) = self.events.first() {
            if first.offset != Ql::ZERO {
                return Err(TimelineError::NonZeroStart(first.offset));
            }
        }

        for pair in self.events.windows(2) {
            if pair[0].end_offset() != pair[1].offset {
                return Err(TimelineError::CoverageBreak {
                    at: pair[1].offset,
                    end: pair[0].end_offset(),
                });
            }
        }

        for event in &self.events {
            if !is_standard(event.duration) {
                return Err(TimelineError::NonStandardDuration {
                    at: event.offset,
                    duration: event.duration,
                });
            }

            if event.is_rest != event.pitch.is_none() {
                return Err(TimelineError::RestPitchMismatch(event.offset));
            }

            if let Some(pitch) = event.pitch {
                if pitch < low || pitch > high {
                    return Err(TimelineError::PitchOutOfRange {
                        at: event.offset,
                        pitch,
                        low,
                        high,
                    });
                }
            }
        }

        Ok(())
    }
}
