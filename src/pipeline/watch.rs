//! One full watch cycle.

use crate::error::Result;
use crate::pipeline::filter::DateCutoff;
use crate::pipeline::process::{ProcessOutcome, process_batch};
use crate::services::{MessageSource, Notifier};
use crate::storage::StateStore;

/// Run one watch cycle: load the seen-state, fetch the pending messages,
/// process the batch and persist the state if it gained entries.
///
/// A fetch failure aborts before any state is touched. A save failure
/// fails the run; that run's newly recorded identities are lost and the
/// next run starts from the last successfully saved state.
pub async fn run_watch(
    store: &StateStore,
    cutoff: Option<&DateCutoff>,
    source: &dyn MessageSource,
    notifier: &dyn Notifier,
) -> Result<ProcessOutcome> {
    let mut seen = store.load().await?;
    log::info!(
        "Loaded {} known message(s) from {}",
        seen.len(),
        store.path().display()
    );

    if let Some(cutoff) = cutoff {
        log::info!("Date cutoff active: only messages after {cutoff}");
    }

    let records = source.fetch().await?;
    log::info!("Scraped {} message(s)", records.len());

    let outcome = process_batch(&records, &mut seen, cutoff, notifier).await;

    if outcome.state_changed() {
        store.save(&seen).await?;
        log::info!(
            "State saved: {} identities ({} new this run)",
            seen.len(),
            outcome.recorded
        );
    }

    log_summary(&outcome);
    Ok(outcome)
}

fn log_summary(outcome: &ProcessOutcome) {
    if outcome.delivered > 0 {
        log::info!("Delivered {} new notification(s)", outcome.delivered);
    } else {
        log::info!("No new messages");
    }
    if outcome.failed > 0 {
        log::warn!(
            "{} delivery attempt(s) failed and will not be retried",
            outcome.failed
        );
    }
    if outcome.skipped_filtered > 0 {
        log::info!(
            "{} message(s) held back by the date cutoff",
            outcome.skipped_filtered
        );
    }
}
