// Difficulty tiers - fixed per-tier quantization configuration
// Grid resolution, playable trumpet range, and tempo scaling per level

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::{Ql, FILL_DURATIONS};

/// Difficulty tier for a generated arrangement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Coarse grid, one-octave-plus range, slowed tempo
    Beginner,

    /// Sixteenth-note grid, A3-G5 range
    Intermediate,

    /// Thirty-second-note grid, full playable range, original tempo
    Advanced,
}

impl Tier {
    /// All tiers in generation order
    pub const ALL: [Tier; 3] = [Tier::Beginner, Tier::Intermediate, Tier::Advanced];

    /// Convert from string representation
    pub fn from_string(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "beginner" => Tier::Beginner,
            "intermediate" => Tier::Intermediate,
            "advanced" => Tier::Advanced,
            _ => Tier::Intermediate, // Default
        }
    }

    /// Convert to string representation
    pub fn to_string(&self) -> &'static str {
        match self {
            Tier::Beginner => "beginner",
            Tier::Intermediate => "intermediate",
            Tier::Advanced => "advanced",
        }
    }

    /// Get the fixed configuration for this tier
    pub fn config(&self) -> TierConfig {
        match self {
            Tier::Beginner => TierConfig {
                grid: Ql::EIGHTH,
                pitch_range: (60, 74), // C4 to D5
                tempo_multiplier: 0.70,
            },
            Tier::Intermediate => TierConfig {
                grid: Ql::SIXTEENTH,
                pitch_range: (57, 79), // A3 to G5
                tempo_multiplier: 0.85,
            },
            Tier::Advanced => TierConfig {
                grid: Ql::THIRTY_SECOND,
                pitch_range: (54, 84), // F#3 to C6
                tempo_multiplier: 1.0,
            },
        }
    }
}

/// Configuration defects detected by [`TierConfig::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("grid {0} is not a dot-free standard duration")]
    NonStandardGrid(Ql),

    #[error("pitch range {low}..={high} is inverted")]
    InvertedRange { low: u8, high: u8 },

    #[error("pitch range {low}..={high} spans less than an octave")]
    SubOctaveRange { low: u8, high: u8 },
}

/// Per-tier quantization parameters. Fixed records selected by [`Tier`];
/// never mutated at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Smallest duration this tier may produce
    pub grid: Ql,

    /// Playable range as inclusive MIDI bounds `(low, high)`
    pub pitch_range: (u8, u8),

    /// Factor applied to the source tempo
    pub tempo_multiplier: f64,
}

impl TierConfig {
    /// Lattice used for event offsets. Coarser than note durations so that
    /// bar-relative positions stay legible: quarter-note granularity when the
    /// grid is finer than a sixteenth, eighth-note granularity otherwise.
    pub fn offset_lattice(&self) -> Ql {
        if self.grid < Ql::SIXTEENTH {
            Ql::QUARTER
        } else {
            Ql::EIGHTH
        }
    }

    /// Scaled tempo in beats per minute, rounded to an integer
    pub fn scaled_tempo(&self, base_tempo: u32) -> u32 {
        (base_tempo as f64 * self.tempo_multiplier).round() as u32
    }

    /// Validate a caller-supplied configuration.
    ///
    /// The grid must come from the dot-free duration ladder (gap tiling
    /// terminates exactly only on that lattice), and the pitch range must
    /// span at least an octave so that octave folding can always land a
    /// pitch inside it. The built-in tier configs all pass.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !FILL_DURATIONS.contains(&self.grid) {
            return Err(ConfigError::NonStandardGrid(self.grid));
        }

        let (low, high) = self.pitch_range;
        if low > high {
            return Err(ConfigError::InvertedRange { low, high });
        }
        if high - low < 11 {
            return Err(ConfigError::SubOctaveRange { low, high });
        }

        Ok(())
    }
}
