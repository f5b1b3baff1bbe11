//! Change detection and delivery.
//!
//! Decides which scraped records are new, gates them through the
//! optional date cutoff, renders and delivers a notification for each
//! accepted record and marks it in the seen-state.

use chrono::Local;

use crate::models::{Record, SeenEntry, SeenSet};
use crate::pipeline::filter::{DateCutoff, is_eligible};
use crate::pipeline::format::render_message;
use crate::services::Notifier;

/// Counters summarizing one processing pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Confirmed successful notifications
    pub delivered: usize,
    /// Identities newly written into the seen-state
    pub recorded: usize,
    /// Records skipped because their identity was already known
    pub skipped_seen: usize,
    /// Records skipped by the date cutoff, left unrecorded on purpose
    pub skipped_filtered: usize,
    /// Delivery attempts that failed; still marked seen, never retried
    pub failed: usize,
}

impl ProcessOutcome {
    /// Whether the seen-state changed and needs persisting.
    pub fn state_changed(&self) -> bool {
        self.recorded > 0
    }
}

/// Process one batch of scraped records in input order.
///
/// New records are notified at most once, ever: the identity is recorded
/// even when delivery fails, so a failed send is logged and dropped
/// rather than retried on a later run. Records rejected by the cutoff
/// are not recorded; a later run with a different cutoff may still
/// accept them.
pub async fn process_batch(
    records: &[Record],
    seen: &mut SeenSet,
    cutoff: Option<&DateCutoff>,
    notifier: &dyn Notifier,
) -> ProcessOutcome {
    let mut outcome = ProcessOutcome::default();

    for record in records {
        let identity = record.identity();

        if seen.contains(&identity) {
            outcome.skipped_seen += 1;
            continue;
        }

        if !is_eligible(cutoff, &record.date_text) {
            log::info!("Date cutoff skips '{}'", preview(&record.title));
            outcome.skipped_filtered += 1;
            continue;
        }

        let message = render_message(record, Local::now());
        match notifier.notify(&message).await {
            Ok(()) => {
                log::info!("Notified '{}'", preview(&record.title));
                outcome.delivered += 1;
            }
            Err(e) => {
                log::warn!("Delivery failed for '{}': {e}", preview(&record.title));
                outcome.failed += 1;
            }
        }

        seen.record(identity, SeenEntry::new(record.title.clone()));
        outcome.recorded += 1;
    }

    outcome
}

/// Title clipped for log lines.
fn preview(title: &str) -> String {
    if title.chars().count() > 50 {
        let clipped: String = title.chars().take(50).collect();
        format!("{clipped}…")
    } else {
        title.to_string()
    }
}
