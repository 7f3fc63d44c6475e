// Transposition selection
// Picks one whole-piece semitone shift that centers the melody in the
// comfortable trumpet register

use crate::events::RawEvent;

/// Comfortable center pitch for trumpet (G4)
pub const TARGET_CENTER: i32 = 67;

/// Reference range used to score candidate shifts (A3 to G5)
pub const REFERENCE_RANGE: (i32, i32) = (57, 79);

/// Octave perturbations tried around the base shift, in scoring order
const OCTAVE_CANDIDATES: [i32; 5] = [-24, -12, 0, 12, 24];

/// Calculate the semitone shift applied to every tier of a piece.
///
/// The base shift moves the mean pitch onto [`TARGET_CENTER`]; octave
/// perturbations of it are then scored by how well the shifted pitch extremes
/// fit [`REFERENCE_RANGE`]: +20 for an extreme inside its bound, -3 per
/// semitone of shortfall otherwise. Only a strictly greater score replaces
/// the current best, so ties keep the earliest (lowest-octave) candidate.
///
/// An empty piece transposes by 0.
pub fn calculate_transposition(events: &[RawEvent]) -> i32 {
    if events.is_empty() {
        return 0;
    }

    let center =
        events.iter().map(|e| e.pitch as f64).sum::<f64>() / events.len() as f64;
    let low = events.iter().map(|e| e.pitch as i32).min().unwrap_or(0);
    let high = events.iter().map(|e| e.pitch as i32).max().unwrap_or(0);

    let base_shift = (TARGET_CENTER as f64 - center).round() as i32;

    let mut best_shift = base_shift;
    let mut best_score = i32::MIN;

    for octave in OCTAVE_CANDIDATES {
        let shift = base_shift + octave;
        let score = range_fit_score(low + shift, high + shift);

        if score > best_score {
            best_score = score;
            best_shift = shift;
        }
    }

    log::info!(
        "transposition {:+} semitones (mean pitch {:.1}, span {}..={})",
        best_shift,
        center,
        low,
        high
    );

    best_shift
}

/// Score how well a shifted pitch span fits the reference range
fn range_fit_score(shifted_low: i32, shifted_high: i32) -> i32 {
    let (floor, ceiling) = REFERENCE_RANGE;
    let mut score = 0;

    if shifted_low >= floor {
        score += 20;
    } else {
        score -= (floor - shifted_low) * 3;
    }

    if shifted_high <= ceiling {
        score += 20;
    } else {
        score -= (shifted_high - ceiling) * 3;
    }

    score
}
