// Musical time - fixed-point quarter-length arithmetic
// All engine timing is integer ticks at 480 per quarter note

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

/// Ticks per quarter note.
///
/// This doubles as the SMF export resolution (PPQ), so engine offsets convert
/// to wire ticks without rescaling. Every standard duration down to a 32nd
/// note (0.125 ql) is an exact multiple of 60 ticks, which keeps snapping,
/// gap arithmetic and the coverage invariant integer-exact.
pub const TICKS_PER_QUARTER: i64 = 480;

/// A quarter-length offset or duration, stored as integer ticks.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Ql(i64);

impl Ql {
    pub const ZERO: Ql = Ql(0);
    pub const WHOLE: Ql = Ql(4 * TICKS_PER_QUARTER);
    pub const DOTTED_HALF: Ql = Ql(3 * TICKS_PER_QUARTER);
    pub const HALF: Ql = Ql(2 * TICKS_PER_QUARTER);
    pub const DOTTED_QUARTER: Ql = Ql(3 * TICKS_PER_QUARTER / 2);
    pub const QUARTER: Ql = Ql(TICKS_PER_QUARTER);
    pub const DOTTED_EIGHTH: Ql = Ql(3 * TICKS_PER_QUARTER / 4);
    pub const EIGHTH: Ql = Ql(TICKS_PER_QUARTER / 2);
    pub const SIXTEENTH: Ql = Ql(TICKS_PER_QUARTER / 4);
    pub const THIRTY_SECOND: Ql = Ql(TICKS_PER_QUARTER / 8);

    /// Create from raw ticks.
    pub const fn from_ticks(ticks: i64) -> Self {
        Ql(ticks)
    }

    /// Raw tick count.
    pub const fn ticks(self) -> i64 {
        self.0
    }

    /// Convert from floating-point quarter lengths, rounding to the nearest
    /// tick. Used at the input boundary only; inside the engine all values
    /// stay in ticks.
    pub fn from_quarters(quarters: f64) -> Self {
        Ql((quarters * TICKS_PER_QUARTER as f64).round() as i64)
    }

    /// Value in quarter lengths.
    pub fn as_quarters(self) -> f64 {
        self.0 as f64 / TICKS_PER_QUARTER as f64
    }

    /// Snap to the nearest multiple of `lattice` (half-way points round up).
    pub fn snap_to(self, lattice: Ql) -> Ql {
        debug_assert!(lattice.0 > 0);
        let half = lattice.0 / 2;
        Ql((self.0 + half).div_euclid(lattice.0) * lattice.0)
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl Add for Ql {
    type Output = Ql;

    fn add(self, rhs: Ql) -> Ql {
        Ql(self.0 + rhs.0)
    }
}

impl AddAssign for Ql {
    fn add_assign(&mut self, rhs: Ql) {
        self.0 += rhs.0;
    }
}

impl Sub for Ql {
    type Output = Ql;

    fn sub(self, rhs: Ql) -> Ql {
        Ql(self.0 - rhs.0)
    }
}

impl fmt::Display for Ql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ql", self.as_quarters())
    }
}

/// Standard notation durations with their names, largest first.
/// These are the only durations a clean timeline may contain.
pub const STANDARD_DURATIONS: [(Ql, &str); 9] = [
    (Ql::WHOLE, "whole"),
    (Ql::DOTTED_HALF, "dotted-half"),
    (Ql::HALF, "half"),
    (Ql::DOTTED_QUARTER, "dotted-quarter"),
    (Ql::QUARTER, "quarter"),
    (Ql::DOTTED_EIGHTH, "dotted-eighth"),
    (Ql::EIGHTH, "eighth"),
    (Ql::SIXTEENTH, "16th"),
    (Ql::THIRTY_SECOND, "32nd"),
];

/// Dot-free subset used for every synthesized duration, largest first.
/// Snapped note durations and generated rests come from this ladder; dotted
/// values only ever survive when taken directly from input. Each entry is
/// double the next, so greedy tiling of any multiple of the smallest entry
/// terminates at exactly zero.
pub const FILL_DURATIONS: [Ql; 6] = [
    Ql::WHOLE,
    Ql::HALF,
    Ql::QUARTER,
    Ql::EIGHTH,
    Ql::SIXTEENTH,
    Ql::THIRTY_SECOND,
];

/// Notation name for a standard duration, if it is one.
pub fn duration_name(duration: Ql) -> Option<&'static str> {
    STANDARD_DURATIONS
        .iter()
        .find(|(d, _)| *d == duration)
        .map(|(_, name)| *name)
}

/// Whether a duration belongs to the standard set.
pub fn is_standard(duration: Ql) -> bool {
    STANDARD_DURATIONS.iter().any(|(d, _)| *d == duration)
}

/// Snap a duration to the nearest dot-free standard value that is >= `floor`.
/// Equidistant candidates resolve to the larger value. Falls back to `floor`
/// itself when no candidate qualifies (floor above the whole note).
pub fn snap_duration(duration: Ql, floor: Ql) -> Ql {
    let duration = duration.max(floor);

    let mut best: Option<Ql> = None;
    let mut best_distance = i64::MAX;

    for &candidate in FILL_DURATIONS.iter() {
        if candidate < floor {
            continue;
        }
        let distance = (candidate.ticks() - duration.ticks()).abs();
        if distance < best_distance {
            best = Some(candidate);
            best_distance = distance;
        }
    }

    best.unwrap_or(floor)
}

/// Largest dot-free standard value that fits in `span` without going below
/// `floor`. `None` when the span is too small to represent.
pub fn floor_duration(span: Ql, floor: Ql) -> Option<Ql> {
    FILL_DURATIONS
        .iter()
        .copied()
        .find(|&d| d <= span && d >= floor)
}
