// Grid quantization
// Snaps raw events onto the tier's lattices and folds pitches into range

use serde_json::json;

use crate::events::{CleanEvent, RawEvent};
use crate::time::snap_duration;
use crate::trace::{Stage, TraceEntry};

use super::tiers::TierConfig;

/// Quantize, transpose and range-clamp raw events for one tier.
///
/// Per event, in order: snap the offset to the tier's offset lattice, snap
/// the duration to the nearest dot-free standard value at or above the grid,
/// then transpose and fold the pitch into the tier's range. Events landing on
/// the same snapped offset collapse to the first survivor; input order puts
/// the melody (highest) pitch first, so that one wins.
///
/// The result is offset-sorted and duplicate-free but may still overlap.
pub fn quantize_events(
    events: &[RawEvent],
    config: &TierConfig,
    transposition: i32,
    trace: &mut Vec<TraceEntry>,
) -> Vec<CleanEvent> {
    let lattice = config.offset_lattice();
    let mut hard_clamped = 0usize;

    let mut clean: Vec<CleanEvent> = events
        .iter()
        .map(|event| {
            let offset = event.offset.snap_to(lattice);
            let duration = snap_duration(event.duration, config.grid);

            let (pitch, folded_out) =
                constrain_pitch(event.pitch as i32 + transposition, config.pitch_range);
            if folded_out {
                hard_clamped += 1;
            }

            CleanEvent::note(offset, duration, pitch)
        })
        .collect();

    // Stable sort keeps the extraction order within equal snapped offsets
    clean.sort_by_key(|note| note.offset);

    // Snapped offsets are exact lattice points, so duplicate detection is
    // plain equality; keep the first survivor at each offset
    let before = clean.len();
    clean.dedup_by_key(|note| note.offset);

    if before != clean.len() {
        trace.push(
            TraceEntry::info(Stage::Quantize, "Collapsed events sharing a snapped offset")
                .with_data(json!({ "collapsed": before - clean.len() })),
        );
    }

    if hard_clamped > 0 {
        log::warn!(
            "{} pitches could not be octave-folded into {:?} and were hard-clamped",
            hard_clamped,
            config.pitch_range
        );
        trace.push(
            TraceEntry::warning(Stage::Quantize, "Hard-clamped pitches outside foldable range")
                .with_data(json!({ "count": hard_clamped })),
        );
    }

    clean
}

/// Fold a transposed pitch into `[low, high]` by octave shifts.
///
/// Returns the constrained pitch and whether octave folding alone could not
/// reach the range (possible only when the range spans less than an octave;
/// the pitch is then hard-clamped to the nearest bound).
fn constrain_pitch(pitch: i32, pitch_range: (u8, u8)) -> (u8, bool) {
    let (low, high) = (pitch_range.0 as i32, pitch_range.1 as i32);
    let mut p = pitch;

    while p > high {
        p -= 12;
    }
    while p < low {
        p += 12;
    }

    // Raising out of the bottom can overshoot a sub-octave ceiling
    let folded_out = p > high;
    if folded_out {
        p = p.clamp(low, high);
    }

    (p as u8, folded_out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrange::Tier;
    use crate::time::Ql;

    fn ev(offset: f64, duration: f64, pitch: u8) -> RawEvent {
        RawEvent::new(
            Ql::from_quarters(offset),
            Ql::from_quarters(duration),
            pitch,
        )
    }

    #[test]
    fn test_snaps_offset_and_duration() {
        let config = Tier::Intermediate.config();
        let mut trace = Vec::new();

        let clean = quantize_events(&[ev(1.05, 0.9, 64)], &config, 0, &mut trace);

        assert_eq!(clean.len(), 1);
        assert_eq!(clean[0].offset, Ql::QUARTER); // eighth-note lattice
        assert_eq!(clean[0].duration, Ql::QUARTER); // nearest standard
        assert_eq!(clean[0].pitch, Some(64));
        assert!(!clean[0].is_rest);
    }

    #[test]
    fn test_duration_never_below_grid() {
        let config = Tier::Beginner.config(); // eighth-note grid
        let mut trace = Vec::new();

        let clean = quantize_events(&[ev(0.0, 0.1, 64)], &config, 0, &mut trace);

        assert_eq!(clean[0].duration, Ql::EIGHTH);
    }

    #[test]
    fn test_applies_transposition() {
        let config = Tier::Intermediate.config();
        let mut trace = Vec::new();

        let clean = quantize_events(&[ev(0.0, 1.0, 60)], &config, 7, &mut trace);

        assert_eq!(clean[0].pitch, Some(67));
    }

    #[test]
    fn test_octave_folds_out_of_range_pitch() {
        // Pitch 100 against range (54, 84) folds down to 76
        let config = Tier::Advanced.config();
        let mut trace = Vec::new();

        let clean = quantize_events(&[ev(0.0, 1.0, 100)], &config, 0, &mut trace);

        assert_eq!(clean[0].pitch, Some(76));
        assert!(trace.is_empty());
    }

    #[test]
    fn test_same_snapped_offset_keeps_first() {
        let config = Tier::Beginner.config();
        let mut trace = Vec::new();

        // Both snap to offset 0.5; extraction order puts 72 first
        let clean = quantize_events(
            &[ev(0.45, 1.0, 72), ev(0.55, 1.0, 60)],
            &config,
            0,
            &mut trace,
        );

        assert_eq!(clean.len(), 1);
        assert_eq!(clean[0].pitch, Some(72));
        assert_eq!(trace.len(), 1);
    }

    #[test]
    fn test_output_sorted_by_offset() {
        let config = Tier::Intermediate.config();
        let mut trace = Vec::new();

        let clean = quantize_events(
            &[ev(2.0, 1.0, 60), ev(0.0, 1.0, 62), ev(1.0, 1.0, 64)],
            &config,
            0,
            &mut trace,
        );

        for pair in clean.windows(2) {
            assert!(pair[0].offset < pair[1].offset);
        }
    }

    #[test]
    fn test_constrain_pitch_hard_clamps_sub_octave_range() {
        // Misconfigured sub-octave range: folding from below overshoots
        let (pitch, folded_out) = constrain_pitch(95, (60, 65));

        assert!(folded_out);
        assert!(pitch >= 60 && pitch <= 65);
    }

    #[test]
    fn test_constrain_pitch_in_range_untouched() {
        assert_eq!(constrain_pitch(70, (57, 79)), (70, false));
    }
}
