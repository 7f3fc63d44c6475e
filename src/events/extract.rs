// Melody extraction
// Reduces an arbitrary note-event stream to a single ordered melodic line

use crate::time::{Ql, TICKS_PER_QUARTER};

use super::types::RawEvent;

/// Events starting within this window of the previous kept event are treated
/// as the same attack (chord members, double-strikes from sloppy input).
/// One hundredth of a quarter note, the same tolerance renderers use.
const SAME_ATTACK_WINDOW: Ql = Ql::from_ticks(TICKS_PER_QUARTER / 100);

/// Duration substituted for non-positive or missing durations
const DEFAULT_DURATION: Ql = Ql::SIXTEENTH;

/// Normalize raw events into a single-voice melodic line.
///
/// Sorts by offset (ascending) then pitch (descending), and keeps only the
/// first event of each attack window, so the highest pitch wins whenever a
/// chord or simultaneity occurs. Non-positive durations are replaced with a
/// sixteenth note. Idempotent: feeding the output back in returns it
/// unchanged.
pub fn melody_line(events: &[RawEvent]) -> Vec<RawEvent> {
    let mut sorted: Vec<RawEvent> = events
        .iter()
        .map(|e| {
            if e.duration.is_positive() {
                *e
            } else {
                RawEvent::new(e.offset, DEFAULT_DURATION, e.pitch)
            }
        })
        .collect();

    sorted.sort_by(|a, b| {
        a.offset
            .cmp(&b.offset)
            .then_with(|| b.pitch.cmp(&a.pitch))
    });

    let mut melody: Vec<RawEvent> = Vec::with_capacity(sorted.len());

    for event in sorted {
        match melody.last() {
            Some(last) if event.offset - last.offset <= SAME_ATTACK_WINDOW => {
                // Same attack; the earlier (higher-pitched) event already won
            }
            _ => melody.push(event),
        }
    }

    if melody.len() < events.len() {
        log::info!(
            "melody extraction collapsed {} events to {}",
            events.len(),
            melody.len()
        );
    }

    melody
}
