// Overlap resolution
// Truncates events that intrude into the next event's start

use serde_json::json;

use crate::events::CleanEvent;
use crate::time::{floor_duration, Ql};
use crate::trace::{Stage, TraceEntry};

/// Resolve overlaps in an offset-sorted note list.
///
/// Left to right: an event whose end crosses the next event's offset is
/// truncated to the intervening span, re-snapped DOWN to the largest standard
/// duration that still fits (truncation must never reintroduce the overlap it
/// removes). An event whose span shrinks below the grid cannot be represented
/// and is dropped; that is a documented lossy edge case, not a failure. The
/// last event is never truncated.
pub fn resolve_overlaps(
    notes: &[CleanEvent],
    grid: Ql,
    trace: &mut Vec<TraceEntry>,
) -> Vec<CleanEvent> {
    if notes.len() <= 1 {
        return notes.to_vec();
    }

    let mut resolved = Vec::with_capacity(notes.len());
    let mut dropped: Vec<f64> = Vec::new();

    for (i, note) in notes.iter().enumerate() {
        let Some(next) = notes.get(i + 1) else {
            resolved.push(*note);
            break;
        };

        if note.end_offset() <= next.offset {
            resolved.push(*note);
            continue;
        }

        let span = next.offset - note.offset;
        match floor_duration(span, grid) {
            Some(duration) => {
                let mut truncated = *note;
                truncated.duration = duration;
                resolved.push(truncated);
            }
            None => {
                // Unrepresentable span: shorter than the grid unit
                dropped.push(note.offset.as_quarters());
            }
        }
    }

    if !dropped.is_empty() {
        log::warn!(
            "dropped {} notes with sub-grid spans after truncation",
            dropped.len()
        );
        trace.push(
            TraceEntry::warning(Stage::Overlap, "Dropped notes with unrepresentable spans")
                .with_data(json!({ "count": dropped.len(), "offsets_ql": dropped })),
        );
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(offset: f64, duration: f64, pitch: u8) -> CleanEvent {
        CleanEvent::note(
            Ql::from_quarters(offset),
            Ql::from_quarters(duration),
            pitch,
        )
    }

    #[test]
    fn test_truncates_overlapping_note() {
        // First note runs two quarters into the second; truncated to end
        // exactly at the second's start
        let mut trace = Vec::new();
        let resolved = resolve_overlaps(
            &[note(0.0, 2.0, 60), note(1.0, 2.0, 64)],
            Ql::EIGHTH,
            &mut trace,
        );

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].duration, Ql::QUARTER);
        assert_eq!(resolved[0].end_offset(), resolved[1].offset);
        assert!(trace.is_empty());
    }

    #[test]
    fn test_non_overlapping_untouched() {
        let input = [note(0.0, 1.0, 60), note(2.0, 1.0, 64)];
        let mut trace = Vec::new();

        assert_eq!(resolve_overlaps(&input, Ql::EIGHTH, &mut trace), input);
    }

    #[test]
    fn test_truncation_rounds_down_to_standard() {
        // Span of 1.5 ql is not dot-free; floor to 1.0, never up to 2.0
        let mut trace = Vec::new();
        let resolved = resolve_overlaps(
            &[note(0.0, 4.0, 60), note(1.5, 1.0, 64)],
            Ql::EIGHTH,
            &mut trace,
        );

        assert_eq!(resolved[0].duration, Ql::QUARTER);
        assert!(resolved[0].end_offset() <= resolved[1].offset);
    }

    #[test]
    fn test_drops_sub_grid_span() {
        // 0.25 ql between starts with an eighth-note grid: unrepresentable
        let mut trace = Vec::new();
        let resolved = resolve_overlaps(
            &[note(0.0, 1.0, 60), note(0.25, 1.0, 64)],
            Ql::EIGHTH,
            &mut trace,
        );

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].pitch, Some(64));
        assert_eq!(trace.len(), 1);
    }

    #[test]
    fn test_last_event_never_truncated() {
        let mut trace = Vec::new();
        let resolved = resolve_overlaps(&[note(0.0, 4.0, 60)], Ql::EIGHTH, &mut trace);

        assert_eq!(resolved[0].duration, Ql::WHOLE);
    }

    #[test]
    fn test_chain_of_overlaps() {
        let mut trace = Vec::new();
        let resolved = resolve_overlaps(
            &[
                note(0.0, 2.0, 60),
                note(1.0, 2.0, 62),
                note(2.0, 2.0, 64),
            ],
            Ql::EIGHTH,
            &mut trace,
        );

        assert_eq!(resolved.len(), 3);
        for pair in resolved.windows(2) {
            assert!(pair[0].end_offset() <= pair[1].offset);
        }
        // Last note keeps its full length
        assert_eq!(resolved[2].duration, Ql::HALF);
    }
}
