// Clarion - Trumpet song arranger
// Module declarations

pub mod arrange;
pub mod events;
pub mod score;
pub mod time;
pub mod trace;

pub use arrange::{
    arrange, arrange_tier, arrange_with_config, ArrangeError, ArrangeOutcome, Tier,
    TierArrangement, TierConfig,
};
pub use events::{CleanEvent, RawEvent, Timeline};
pub use score::{parse_score, write_midi, Score, SongMetadata};
pub use time::Ql;
