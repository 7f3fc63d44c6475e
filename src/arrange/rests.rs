// Gap filling
// Synthesizes explicit rests so the timeline covers every moment exactly once

use serde_json::json;

use crate::events::{CleanEvent, Timeline};
use crate::time::{floor_duration, Ql};
use crate::trace::{Stage, TraceEntry};

use super::ArrangeError;

/// Upper bound on rests per gap. Greedy tiling of any grid-aligned gap
/// converges far below this; hitting the cap means an upstream stage broke
/// the lattice invariant.
pub const MAX_FILL_ITERATIONS: usize = 50;

/// Fill every gap in an overlap-free note list with explicit rests.
///
/// Walks the notes in offset order, tiling the space between the running
/// cursor and each note's start (including a leading gap before the first
/// note) greedily with the largest dot-free rest that fits. Earlier stages
/// only ever produce offsets and durations on the tier lattice, so each gap
/// is an exact multiple of the grid and the tiling terminates at exactly
/// zero; any residue is an invariant violation and aborts the tier.
///
/// An empty note list yields an empty timeline.
pub fn fill_gaps(
    notes: &[CleanEvent],
    grid: Ql,
    trace: &mut Vec<TraceEntry>,
) -> Result<Timeline, ArrangeError> {
    if notes.is_empty() {
        return Ok(Timeline::empty());
    }

    let mut events: Vec<CleanEvent> = Vec::with_capacity(notes.len());
    let mut current = Ql::ZERO;
    let mut rest_count = 0usize;

    for note in notes {
        if note.offset > current {
            let rests = tile_gap(current, note.offset - current, grid)?;
            rest_count += rests.len();
            events.extend(rests);
        }

        events.push(*note);
        current = note.end_offset();
    }

    if rest_count > 0 {
        trace.push(
            TraceEntry::info(Stage::GapFill, "Inserted rests for uncovered intervals")
                .with_data(json!({ "rests": rest_count })),
        );
    }

    log::info!(
        "gap filling produced {} events ({} rests)",
        events.len(),
        rest_count
    );

    Ok(Timeline::new(events))
}

/// Tile one gap with rests, largest-fit-first.
fn tile_gap(start: Ql, gap: Ql, grid: Ql) -> Result<Vec<CleanEvent>, ArrangeError> {
    let mut rests = Vec::new();
    let mut offset = start;
    let mut remaining = gap;

    for _ in 0..MAX_FILL_ITERATIONS {
        if remaining < grid {
            break;
        }

        let duration = floor_duration(remaining, grid).unwrap_or(grid);
        rests.push(CleanEvent::rest(offset, duration));
        offset += duration;
        remaining = remaining - duration;
    }

    if remaining != Ql::ZERO {
        return Err(ArrangeError::UnfillableGap {
            at: start,
            gap,
            remaining,
        });
    }

    Ok(rests)
}
