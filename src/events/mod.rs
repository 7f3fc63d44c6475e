// Note event module
// Event data types and melody extraction

pub mod extract;
pub mod types;

pub use extract::melody_line;
pub use types::{CleanEvent, RawEvent, Timeline, TimelineError};
