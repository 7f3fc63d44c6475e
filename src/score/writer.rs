// MIDI score writing
// Serializes clean timelines to Standard MIDI File bytes

use midly::{
    num::{u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::Timeline;
use crate::time::{Ql, TICKS_PER_QUARTER};

/// General MIDI program numbers
pub const GM_TRUMPET: u8 = 56;
pub const GM_ACOUSTIC_BASS: u8 = 32;

/// Errors that can occur during MIDI serialization
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("MIDI encode error: {0}")]
    Encode(String),
}

impl From<&str> for WriteError {
    fn from(e: &str) -> Self {
        WriteError::Encode(e.to_string())
    }
}

/// MIDI write options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MidiWriteOptions {
    /// Include tempo metadata
    pub include_tempo: bool,

    /// Include time signature metadata
    pub include_time_signature: bool,

    /// Include track names
    pub track_names: bool,

    /// Velocity applied to every note (the engine carries no dynamics)
    pub velocity: u8,

    /// General MIDI program for the melody track
    pub program: u8,
}

impl Default for MidiWriteOptions {
    fn default() -> Self {
        MidiWriteOptions {
            include_tempo: true,
            include_time_signature: true,
            track_names: true,
            velocity: 90,
            program: GM_TRUMPET,
        }
    }
}

/// Serialize a clean timeline to SMF bytes.
///
/// Produces a two-track Format 1 file: a metadata track (tempo, time
/// signature) and the melody track. Rests have no wire representation; they
/// become delta time between the surrounding notes. The engine tick
/// resolution is used as the PPQ, so offsets map 1:1.
pub fn write_midi(
    timeline: &Timeline,
    tempo_bpm: u32,
    time_signature: (u8, u8),
    options: &MidiWriteOptions,
) -> Result<Vec<u8>, WriteError> {
    let notes: Vec<(Ql, Ql, u8)> = timeline
        .iter()
        .filter(|e| !e.is_rest)
        .filter_map(|e| e.pitch.map(|p| (e.offset, e.duration, p)))
        .collect();

    assemble(&notes, tempo_bpm, time_signature, options, "TRUMPET")
}

/// Serialize an arbitrary note list (used for backing tracks).
pub(crate) fn write_note_track(
    notes: &[(Ql, Ql, u8)],
    tempo_bpm: u32,
    time_signature: (u8, u8),
    options: &MidiWriteOptions,
    track_name: &'static str,
) -> Result<Vec<u8>, WriteError> {
    assemble(notes, tempo_bpm, time_signature, options, track_name)
}

fn assemble(
    notes: &[(Ql, Ql, u8)],
    tempo_bpm: u32,
    time_signature: (u8, u8),
    options: &MidiWriteOptions,
    track_name: &'static str,
) -> Result<Vec<u8>, WriteError> {
    let header = Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER as u16)),
    );

    let mut smf = Smf::new(header);
    smf.tracks.push(meta_track(tempo_bpm, time_signature, options));
    smf.tracks.push(note_track(notes, options, track_name));

    let mut bytes = Vec::new();
    smf.write(&mut bytes)?;

    log::info!(
        "wrote {} notes to a {}-byte SMF at {} BPM",
        notes.len(),
        bytes.len(),
        tempo_bpm
    );

    Ok(bytes)
}

/// Track 0: tempo and time signature metadata
fn meta_track(
    tempo_bpm: u32,
    time_signature: (u8, u8),
    options: &MidiWriteOptions,
) -> Track<'static> {
    let mut track = Track::new();

    if options.track_names {
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(b"META")),
        });
    }

    if options.include_tempo {
        let us_per_quarter = 60_000_000 / tempo_bpm.max(1);
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(us_per_quarter))),
        });
    }

    if options.include_time_signature {
        let (numerator, denominator) = time_signature;
        // MIDI wants the denominator as a power of two
        let den_pow = denominator.max(1).ilog2() as u8;
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TimeSignature(numerator, den_pow, 24, 8)),
        });
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    track
}

/// Melody (or bass) track: program change plus note on/off pairs
fn note_track(
    notes: &[(Ql, Ql, u8)],
    options: &MidiWriteOptions,
    track_name: &'static str,
) -> Track<'static> {
    let channel = u4::new(0);
    let mut track = Track::new();

    if options.track_names {
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(track_name.as_bytes())),
        });
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::ProgramChange {
                program: u7::new(options.program.min(127)),
            },
        },
    });

    // Absolute-tick events first, then convert to deltas. Note-offs are
    // pushed before the next note-on, so a shared boundary tick keeps the
    // off/on order after the stable sort.
    let mut events: Vec<(u32, TrackEventKind<'static>)> = Vec::with_capacity(notes.len() * 2);
    let velocity = u7::new(options.velocity.min(127));

    for &(offset, duration, pitch) in notes {
        let tick_on = offset.ticks() as u32;
        let tick_off = (offset + duration).ticks() as u32;
        let key = u7::new(pitch.min(127));

        events.push((
            tick_on,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn { key, vel: velocity },
            },
        ));
        events.push((
            tick_off,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff {
                    key,
                    vel: u7::new(0),
                },
            },
        ));
    }

    events.sort_by_key(|(tick, _)| *tick);

    let mut last_tick = 0u32;
    for (tick, kind) in events {
        let delta = tick.saturating_sub(last_tick);
        track.push(TrackEvent {
            delta: u28::new(delta),
            kind,
        });
        last_tick = tick;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    track
}
