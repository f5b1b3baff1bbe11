//! Pipeline stages for one watch cycle.
//!
//! - `filter`: optional recency cutoff
//! - `format`: Telegram message rendering
//! - `process`: dedup, gate, deliver, record
//! - `watch`: one full cycle against live collaborators

pub mod filter;
pub mod format;
pub mod process;
pub mod watch;

pub use filter::DateCutoff;
pub use process::{ProcessOutcome, process_batch};
pub use watch::run_watch;
