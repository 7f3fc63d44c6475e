// Backing track generation
// Derives a simple bass accompaniment from the source melody

use crate::events::RawEvent;
use crate::time::Ql;

use super::writer::{write_note_track, MidiWriteOptions, WriteError, GM_ACOUSTIC_BASS};

/// Bass register bounds (C2 to C4)
const BASS_LOW: i32 = 36;
const BASS_HIGH: i32 = 60;

/// Derive a bass line from the melody: every note dropped two octaves and
/// folded into the bass register. Timing is taken verbatim from the source
/// events; the backing track follows the original phrasing, not a tier grid.
pub fn bass_line(events: &[RawEvent]) -> Vec<RawEvent> {
    events
        .iter()
        .map(|event| {
            let mut pitch = event.pitch as i32 - 24;
            while pitch < BASS_LOW {
                pitch += 12;
            }
            while pitch > BASS_HIGH {
                pitch -= 12;
            }
            RawEvent::new(event.offset, event.duration, pitch as u8)
        })
        .collect()
}

/// Serialize a bass backing track to SMF bytes
pub fn write_backing_track(
    events: &[RawEvent],
    tempo_bpm: u32,
    time_signature: (u8, u8),
) -> Result<Vec<u8>, WriteError> {
    let bass = bass_line(events);
    let notes: Vec<(Ql, Ql, u8)> = bass
        .iter()
        .map(|e| (e.offset, e.duration, e.pitch))
        .collect();

    let options = MidiWriteOptions {
        program: GM_ACOUSTIC_BASS,
        ..Default::default()
    };

    write_note_track(&notes, tempo_bpm, time_signature, &options, "BASS")
}
