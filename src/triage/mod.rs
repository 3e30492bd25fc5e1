//! Thread triage: find unanswered senders and reply to each once.
//!
//! The run is strictly sequential. Threads are listed, then each thread is
//! fetched, resolved and its pending replies dispatched one at a time, so
//! that confirmation prompts never interleave.

pub mod dispatcher;
pub mod fetcher;
pub mod prompt;
pub mod resolver;

pub use prompt::{AlwaysSend, ConsolePrompt};

use dispatcher::{DispatchOutcome, Dispatcher};
use fetcher::list_threads;
use prompt::Confirm;
use resolver::resolve;

use crate::config::RunSettings;
use crate::error::TriageError;
use crate::mail::MailService;

/// Totals for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub threads: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunReport {
    fn record(mut self, outcome: &DispatchOutcome) -> Self {
        match outcome {
            DispatchOutcome::Sent => self.sent += 1,
            DispatchOutcome::Skipped => self.skipped += 1,
            DispatchOutcome::Failed(err) => {
                tracing::error!("{}", err);
                self.failed += 1;
            }
        }
        self
    }
}

/// Reply once to every unanswered sender in the threads matching the query.
///
/// Listing or fetching failures and console failures abort the run; a
/// failed send is counted and the run goes on.
pub async fn run<S: MailService, C: Confirm>(
    service: &S,
    settings: &RunSettings,
    confirm: &mut C,
) -> Result<RunReport, TriageError> {
    let profile = service.get_profile().await?;
    let operator = profile.email_address.trim();
    if operator.is_empty() {
        return Err(TriageError::EmptyOperatorAddress);
    }

    let query = settings.query.to_string();
    tracing::debug!("Searching threads with query {:?}", query);
    let thread_ids = list_threads(service, &query).await?;
    tracing::info!("Processing {} threads...", thread_ids.len());

    let mut dispatcher = Dispatcher::new(service, operator, &settings.message, confirm);
    let mut report = RunReport::default();

    for id in &thread_ids {
        let thread = service.get_thread(id).await?;
        let pending = resolve(&thread, operator);
        tracing::debug!(
            "Thread {}: {} messages, {} pending replies",
            id,
            thread.messages.len(),
            pending.len()
        );

        report.threads += 1;
        for reply in pending.values() {
            let outcome = dispatcher.dispatch(reply).await?;
            report = report.record(&outcome);
        }
    }

    tracing::info!(
        "Done: {} threads, {} sent, {} skipped, {} failed",
        report.threads,
        report.sent,
        report.skipped,
        report.failed
    );
    Ok(report)
}
