// Score I/O module
// Reading, writing and metadata extraction for Standard MIDI Files

pub mod backing;
pub mod metadata;
pub mod reader;
pub mod writer;

pub use backing::{bass_line, write_backing_track};
pub use metadata::SongMetadata;
pub use reader::{parse_score, validate_score, Score, ScoreError};
pub use writer::{write_midi, MidiWriteOptions, WriteError, GM_ACOUSTIC_BASS, GM_TRUMPET};
