// MIDI score reading
// Parses Standard MIDI File bytes into a single-voice melodic line

use std::collections::HashMap;

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use thiserror::Error;

use crate::events::{melody_line, RawEvent};
use crate::time::{Ql, TICKS_PER_QUARTER};

use super::metadata::{key_name, SongMetadata};

/// Errors raised while reading a score
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("invalid MIDI data: {0}")]
    Malformed(#[from] midly::Error),

    #[error("SMPTE timing is not supported")]
    UnsupportedTiming,

    #[error("score contains no notes")]
    NoNotes,
}

/// A parsed score: the extracted melodic line plus source metadata
#[derive(Debug, Clone)]
pub struct Score {
    /// Single-voice melody in offset order (highest pitch wins on chords)
    pub events: Vec<RawEvent>,

    pub metadata: SongMetadata,
}

/// Parse SMF bytes into a [`Score`].
///
/// All tracks are merged; note-on/note-off pairs become raw events with
/// quarter-length timing (the source PPQ is rescaled to the engine tick
/// resolution). Chords and simultaneities collapse to the highest pitch
/// during melody extraction. A score without notes parses successfully with
/// an empty event list; use [`validate_score`] to reject that up front.
pub fn parse_score(bytes: &[u8]) -> Result<Score, ScoreError> {
    let smf = Smf::parse(bytes)?;

    let ppq = match smf.header.timing {
        Timing::Metrical(tpq) => tpq.as_int() as i64,
        Timing::Timecode(..) => return Err(ScoreError::UnsupportedTiming),
    };

    let mut notes: Vec<(u64, u64, u8)> = Vec::new();
    let mut tempo: Option<u32> = None;
    let mut time_signature: Option<(u8, u8)> = None;
    let mut key_sig: Option<(i8, bool)> = None;

    for track in &smf.tracks {
        let mut current_tick: u64 = 0;
        // Active notes: (pitch, channel) -> start tick
        let mut active: HashMap<(u8, u8), u64> = HashMap::new();

        for event in track {
            current_tick += event.delta.as_int() as u64;

            match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(us_per_beat)) => {
                    if tempo.is_none() {
                        let us = us_per_beat.as_int().max(1);
                        tempo = Some((60_000_000.0 / us as f64).round() as u32);
                    }
                }
                TrackEventKind::Meta(MetaMessage::TimeSignature(num, den_pow, _, _)) => {
                    if time_signature.is_none() {
                        time_signature = Some((num, 1u8 << den_pow.min(7)));
                    }
                }
                TrackEventKind::Meta(MetaMessage::KeySignature(accidentals, minor)) => {
                    if key_sig.is_none() {
                        key_sig = Some((accidentals, minor));
                    }
                }
                TrackEventKind::Midi { channel, message } => {
                    let ch = channel.as_int();
                    match message {
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            let pitch = key.as_int();
                            // Re-strike: finalize the sounding note first
                            if let Some(start) = active.remove(&(pitch, ch)) {
                                notes.push((start, current_tick - start, pitch));
                            }
                            active.insert((pitch, ch), current_tick);
                        }
                        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                            let pitch = key.as_int();
                            if let Some(start) = active.remove(&(pitch, ch)) {
                                notes.push((start, current_tick - start, pitch));
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        if !active.is_empty() {
            log::warn!("dropping {} unterminated notes", active.len());
        }
    }

    let raw: Vec<RawEvent> = notes
        .iter()
        .map(|&(start, duration, pitch)| {
            RawEvent::new(to_engine_ticks(start, ppq), to_engine_ticks(duration, ppq), pitch)
        })
        .collect();

    let metadata = build_metadata(&raw, tempo, time_signature, key_sig);
    let events = melody_line(&raw);

    log::info!(
        "parsed score: {} notes, {} in melody, tempo {}",
        raw.len(),
        events.len(),
        metadata.tempo
    );

    Ok(Score { events, metadata })
}

/// Parse and require at least one note. Returns the source note count.
pub fn validate_score(bytes: &[u8]) -> Result<usize, ScoreError> {
    let score = parse_score(bytes)?;

    if score.metadata.total_notes == 0 {
        return Err(ScoreError::NoNotes);
    }

    Ok(score.metadata.total_notes)
}

/// Rescale source ticks to the engine resolution, rounding to nearest
fn to_engine_ticks(ticks: u64, ppq: i64) -> Ql {
    let t = ticks as i64;
    Ql::from_ticks((t * TICKS_PER_QUARTER + ppq / 2) / ppq)
}

fn build_metadata(
    raw: &[RawEvent],
    tempo: Option<u32>,
    time_signature: Option<(u8, u8)>,
    key: Option<(i8, bool)>,
) -> SongMetadata {
    let mut meta = SongMetadata::default();

    if let Some(t) = tempo {
        meta.tempo = t.max(1);
    }
    if let Some((num, den)) = time_signature {
        meta.time_signature = format!("{}/{}", num, den);
    }
    if let Some((accidentals, minor)) = key {
        meta.key_signature = key_name(accidentals, minor);
    }

    if !raw.is_empty() {
        meta.total_notes = raw.len();
        let low = raw.iter().map(|e| e.pitch).min().unwrap_or(0);
        let high = raw.iter().map(|e| e.pitch).max().unwrap_or(0);
        meta.pitch_range = (low, high);

        let span = raw
            .iter()
            .map(RawEvent::end_offset)
            .max()
            .unwrap_or(Ql::ZERO);
        meta.duration_seconds = (span.as_quarters() * 60.0 / meta.tempo as f64) as u32;
    }

    meta
}
