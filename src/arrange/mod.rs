// Arrangement engine - difficulty-tiered quantization pipeline
// Turns a raw melodic line into render-safe clean timelines

pub mod overlap;
pub mod quantize;
pub mod rests;
pub mod tiers;
pub mod transpose;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::events::{melody_line, RawEvent, Timeline};
use crate::time::Ql;
use crate::trace::TraceEntry;

pub use overlap::resolve_overlaps;
pub use quantize::quantize_events;
pub use rests::fill_gaps;
pub use tiers::{ConfigError, Tier, TierConfig};
pub use transpose::calculate_transposition;

/// Errors that abort a single tier's pipeline
#[derive(Debug, Error)]
pub enum ArrangeError {
    #[error("tier configuration invalid: {0}")]
    Config(#[from] ConfigError),

    /// A gap was not an exact multiple of the tier grid. The earlier stages
    /// guarantee grid alignment, so this is an internal invariant violation,
    /// never a property of the input.
    #[error("gap of {gap} at {at} cannot be tiled with standard rests ({remaining} left)")]
    UnfillableGap { at: Ql, gap: Ql, remaining: Ql },
}

/// One tier's finished arrangement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierArrangement {
    pub tier: Tier,

    /// Source tempo scaled by the tier multiplier, integer BPM
    pub tempo_bpm: u32,

    /// Clean, fully covered timeline
    pub timeline: Timeline,

    /// Informational notes recorded by the pipeline stages
    pub trace: Vec<TraceEntry>,
}

/// Result of arranging one piece across all tiers.
///
/// Tiers are independent: a failed tier is carried as its own error and
/// never blocks the others. Callers wanting all-or-nothing semantics use
/// [`ArrangeOutcome::into_result`].
#[derive(Debug)]
pub struct ArrangeOutcome {
    pub run_id: Uuid,

    /// Semitone shift shared by every tier
    pub transposition: i32,

    pub tiers: Vec<Result<TierArrangement, ArrangeError>>,
}

impl ArrangeOutcome {
    /// Get a tier's arrangement if it succeeded
    pub fn tier(&self, tier: Tier) -> Option<&TierArrangement> {
        self.tiers
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .find(|a| a.tier == tier)
    }

    /// All-or-nothing view: the first tier failure fails the whole run
    pub fn into_result(self) -> Result<Vec<TierArrangement>, ArrangeError> {
        self.tiers.into_iter().collect()
    }
}

/// Arrange a piece at every difficulty tier.
///
/// Normalizes the events to a melodic line, computes the shared
/// transposition once, then runs the quantize / overlap / gap-fill pipeline
/// per tier with that tier's grid, range and tempo multiplier.
pub fn arrange(events: &[RawEvent], base_tempo: u32) -> ArrangeOutcome {
    let run_id = Uuid::new_v4();
    let melody = melody_line(events);
    let transposition = calculate_transposition(&melody);

    log::info!(
        "run {}: arranging {} events (transposition {:+})",
        run_id,
        melody.len(),
        transposition
    );

    let tiers = Tier::ALL
        .iter()
        .map(|&tier| arrange_tier(&melody, tier, transposition, base_tempo))
        .collect();

    ArrangeOutcome {
        run_id,
        transposition,
        tiers,
    }
}

/// Run the pipeline for a single tier with its built-in configuration.
pub fn arrange_tier(
    events: &[RawEvent],
    tier: Tier,
    transposition: i32,
    base_tempo: u32,
) -> Result<TierArrangement, ArrangeError> {
    let config = tier.config();
    let mut trace = Vec::new();

    let timeline = run_pipeline(events, &config, transposition, &mut trace)?;

    log::info!(
        "[{}] {} events ({} notes) over {}",
        tier.to_string(),
        timeline.len(),
        timeline.note_count(),
        timeline.total_span()
    );

    Ok(TierArrangement {
        tier,
        tempo_bpm: config.scaled_tempo(base_tempo),
        timeline,
        trace,
    })
}

/// Run the pipeline with a caller-supplied configuration.
///
/// Unlike the built-in tiers the configuration is validated first, so range
/// and grid misconfigurations surface here instead of as degraded output.
pub fn arrange_with_config(
    events: &[RawEvent],
    config: &TierConfig,
    transposition: i32,
) -> Result<Timeline, ArrangeError> {
    config.validate()?;

    let melody = melody_line(events);
    let mut trace = Vec::new();
    run_pipeline(&melody, config, transposition, &mut trace)
}

/// The per-tier stage sequence: quantize, resolve overlaps, fill gaps.
fn run_pipeline(
    events: &[RawEvent],
    config: &TierConfig,
    transposition: i32,
    trace: &mut Vec<TraceEntry>,
) -> Result<Timeline, ArrangeError> {
    let quantized = quantize_events(events, config, transposition, trace);
    let resolved = resolve_overlaps(&quantized, config.grid, trace);
    let timeline = fill_gaps(&resolved, config.grid, trace)?;

    debug_assert_eq!(timeline.check_invariants(config.pitch_range), Ok(()));

    Ok(timeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CleanEvent;

    fn ev(offset: f64, duration: f64, pitch: u8) -> RawEvent {
        RawEvent::new(
            Ql::from_quarters(offset),
            Ql::from_quarters(duration),
            pitch,
        )
    }

    /// Notes on the beat with one quarter gap: the gap takes exactly one
    /// quarter rest and coverage runs 0..4
    #[test]
    fn test_scenario_gap_becomes_rest() {
        let events = [ev(0.0, 1.0, 60), ev(1.0, 1.0, 64), ev(3.0, 1.0, 67)];
        let config = TierConfig {
            grid: Ql::QUARTER,
            pitch_range: (57, 79),
            tempo_multiplier: 1.0,
        };

        let timeline = arrange_with_config(&events, &config, 0).unwrap();

        assert_eq!(timeline.check_invariants((57, 79)), Ok(()));
        assert_eq!(timeline.total_span(), Ql::WHOLE);

        let offsets: Vec<f64> = timeline.iter().map(|e| e.offset.as_quarters()).collect();
        assert_eq!(offsets, vec![0.0, 1.0, 2.0, 3.0]);

        assert!(timeline.events[2].is_rest);
        assert_eq!(timeline.events[2].duration, Ql::QUARTER);
        assert_eq!(timeline.note_count(), 3);
    }

    /// Overlapping notes: the first is truncated to end at the second's
    /// start, and nothing crosses a successor's offset
    #[test]
    fn test_scenario_overlap_truncation() {
        let events = [ev(0.0, 2.0, 60), ev(1.0, 2.0, 64)];
        let config = TierConfig {
            grid: Ql::EIGHTH,
            pitch_range: (57, 79),
            tempo_multiplier: 1.0,
        };

        let timeline = arrange_with_config(&events, &config, 0).unwrap();

        let notes: Vec<&CleanEvent> = timeline.iter().filter(|e| !e.is_rest).collect();
        assert_eq!(notes[0].duration, Ql::QUARTER);
        assert_eq!(notes[0].end_offset(), notes[1].offset);

        for pair in timeline.events.windows(2) {
            assert!(pair[0].end_offset() <= pair[1].offset);
        }
    }

    /// Empty input: neutral transposition and empty timelines on every tier
    #[test]
    fn test_scenario_empty_input() {
        let outcome = arrange(&[], 120);

        assert_eq!(outcome.transposition, 0);
        for tier_result in &outcome.tiers {
            let arrangement = tier_result.as_ref().unwrap();
            assert!(arrangement.timeline.is_empty());
        }
    }

    /// Re-arranging an already-clean timeline with the same configuration
    /// reproduces it exactly
    #[test]
    fn test_quantization_idempotent() {
        let events = [
            ev(0.0, 1.0, 62),
            ev(1.5, 0.5, 64),
            ev(4.0, 2.0, 67),
            ev(6.5, 1.0, 72),
        ];
        let config = Tier::Intermediate.config();

        let first = arrange_with_config(&events, &config, 0).unwrap();

        let round_trip: Vec<RawEvent> = first
            .iter()
            .filter(|e| !e.is_rest)
            .map(|e| RawEvent::new(e.offset, e.duration, e.pitch.unwrap()))
            .collect();

        let second = arrange_with_config(&round_trip, &config, 0).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_all_tiers_satisfy_invariants() {
        // Messy input: overlaps, off-grid offsets, an out-of-range pitch
        let events = [
            ev(0.1, 0.9, 60),
            ev(0.97, 1.4, 96),
            ev(2.0, 3.0, 64),
            ev(3.0, 0.4, 55),
            ev(5.2, 1.0, 67),
        ];

        let outcome = arrange(&events, 120);

        for tier_result in &outcome.tiers {
            let arrangement = tier_result.as_ref().unwrap();
            let config = arrangement.tier.config();
            assert_eq!(
                arrangement.timeline.check_invariants(config.pitch_range),
                Ok(())
            );
        }
    }

    #[test]
    fn test_tier_tempos_scale() {
        let events = [ev(0.0, 1.0, 67)];
        let outcome = arrange(&events, 120);

        assert_eq!(outcome.tier(Tier::Beginner).unwrap().tempo_bpm, 84);
        assert_eq!(outcome.tier(Tier::Intermediate).unwrap().tempo_bpm, 102);
        assert_eq!(outcome.tier(Tier::Advanced).unwrap().tempo_bpm, 120);
    }

    #[test]
    fn test_transposition_shared_across_tiers() {
        // A low piece shifts up; every tier sees the same shift, so the
        // advanced tier (widest range) carries the shifted pitches verbatim
        let events = [ev(0.0, 1.0, 43), ev(1.0, 1.0, 45), ev(2.0, 1.0, 47)];
        let outcome = arrange(&events, 120);

        let advanced = outcome.tier(Tier::Advanced).unwrap();
        let pitches: Vec<u8> = advanced
            .timeline
            .iter()
            .filter_map(|e| e.pitch)
            .collect();

        assert_eq!(
            pitches,
            vec![
                (43 + outcome.transposition) as u8,
                (45 + outcome.transposition) as u8,
                (47 + outcome.transposition) as u8,
            ]
        );
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let config = TierConfig {
            grid: Ql::EIGHTH,
            pitch_range: (60, 64),
            tempo_multiplier: 1.0,
        };

        let result = arrange_with_config(&[ev(0.0, 1.0, 60)], &config, 0);
        assert!(matches!(result, Err(ArrangeError::Config(_))));
    }

    #[test]
    fn test_into_result_all_or_nothing() {
        let events = [ev(0.0, 1.0, 67)];
        let arrangements = arrange(&events, 120).into_result().unwrap();

        assert_eq!(arrangements.len(), 3);
    }
}
