// Song metadata
// Tempo, key and time-signature information extracted alongside the notes

use serde::{Deserialize, Serialize};

/// Metadata describing a source score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongMetadata {
    /// Source tempo in beats per minute
    pub tempo: u32,

    /// Tonic name, e.g. "C", "F#", "Bbm"
    pub key_signature: String,

    /// e.g. "4/4"
    pub time_signature: String,

    /// Approximate length at the source tempo
    pub duration_seconds: u32,

    /// Note count before melody extraction (chord members included)
    pub total_notes: usize,

    /// Lowest and highest MIDI pitch in the source
    pub pitch_range: (u8, u8),
}

impl Default for SongMetadata {
    fn default() -> Self {
        SongMetadata {
            tempo: 120,
            key_signature: "C".to_string(),
            time_signature: "4/4".to_string(),
            duration_seconds: 0,
            total_notes: 0,
            pitch_range: (60, 72),
        }
    }
}

/// Major keys by accidental count, from 7 flats to 7 sharps
const MAJOR_KEYS: [&str; 15] = [
    "Cb", "Gb", "Db", "Ab", "Eb", "Bb", "F", "C", "G", "D", "A", "E", "B", "F#", "C#",
];

/// Minor keys by accidental count, from 7 flats to 7 sharps
const MINOR_KEYS: [&str; 15] = [
    "Ab", "Eb", "Bb", "F", "C", "G", "D", "A", "E", "B", "F#", "C#", "G#", "D#", "A#",
];

/// Key name from an SMF key-signature meta event (accidental count is
/// negative for flats). Counts outside the writable -7..=7 range clamp to
/// the nearest extreme.
pub fn key_name(accidentals: i8, minor: bool) -> String {
    let index = (accidentals + 7).clamp(0, 14) as usize;

    if minor {
        format!("{}m", MINOR_KEYS[index])
    } else {
        MAJOR_KEYS[index].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_metadata() {
        let meta = SongMetadata::default();
        assert_eq!(meta.tempo, 120);
        assert_eq!(meta.time_signature, "4/4");
        assert_eq!(meta.key_signature, "C");
    }

    #[test]
    fn test_key_names() {
        assert_eq!(key_name(0, false), "C");
        assert_eq!(key_name(2, false), "D");
        assert_eq!(key_name(-3, false), "Eb");
        assert_eq!(key_name(0, true), "Am");
        assert_eq!(key_name(1, true), "Em");
    }

    #[test]
    fn test_out_of_range_accidentals_fall_back() {
        assert_eq!(key_name(13, false), "C#");
        assert_eq!(key_name(-13, true), "Abm");
    }
}
