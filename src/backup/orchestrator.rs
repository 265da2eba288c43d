// repo2s3: Source Repository Backup to Object Storage
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Bounded worker pool driving one backup run.
//!
//! ```text
//! Orchestrator::run()
//!   loop
//!     acquire permit   (cancel -> stop dispatch)
//!     stream.next()    (cancel -> stop dispatch, Err -> stop, None -> done)
//!     filter           (skip -> release permit)
//!     JoinSet::spawn   process -> catch_unwind -> flume tx -> drop permit
//!   drop tx, drain JoinSet
//!   collector: rx -> RunSummary::record
//! ```

use futures_util::FutureExt;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::filter::DescriptorFilter;
use super::processor::Processor;
use super::types::{FailureKind, Outcome, RunSummary};
use crate::error::BackupError;
use crate::source::Enumerator;

/// Spinner showing completed units.
fn spinner_style() -> ProgressStyle {
    static STYLE: OnceLock<ProgressStyle> = OnceLock::new();
    STYLE
        .get_or_init(|| {
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {pos} done {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        })
        .clone()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .map_or_else(
            || "worker panicked".to_string(),
            |m| format!("worker panicked: {m}"),
        )
}

/// Runs every descriptor of an enumerator through a shared [`Processor`].
pub struct Orchestrator {
    enumerator: Arc<dyn Enumerator>,
    processor: Arc<Processor>,
    /// Maximum units in flight.
    workers: usize,
    filter: DescriptorFilter,
    cancel_token: CancellationToken,
    progress: bool,
    dry_run: bool,
}

impl Orchestrator {
    /// Creates an orchestrator with `workers` concurrent units (at least one).
    #[must_use]
    pub fn new(enumerator: Arc<dyn Enumerator>, processor: Arc<Processor>, workers: usize) -> Self {
        Self {
            enumerator,
            processor,
            workers: workers.max(1),
            filter: DescriptorFilter::allow_all(),
            cancel_token: CancellationToken::new(),
            progress: false,
            dry_run: false,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: DescriptorFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Uses an externally owned cancellation token.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    #[must_use]
    pub const fn with_progress(mut self, enable: bool) -> Self {
        self.progress = enable;
        self
    }

    /// Marks the summary as a dry run. Upload skipping itself is the processor's job.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns the cancellation token for sharing with signal handlers.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Stops dispatching new units. Units already running complete normally.
    pub fn interrupt(&self) {
        info!("Interrupt requested, finishing in-flight repositories");
        self.cancel_token.cancel();
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(spinner_style());
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }

    /// Runs the whole pipeline and returns the summary.
    ///
    /// Per-repository failures are part of the summary; they never make
    /// this return `Err`.
    ///
    /// # Errors
    ///
    /// Returns `BackupError::Enumeration` if the enumerator fails. Units
    /// dispatched before the failure still complete and are logged.
    /// Returns `BackupError::Sink` if outcomes go missing.
    pub async fn run(&self) -> Result<RunSummary, BackupError> {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let (tx, rx) = flume::unbounded::<Outcome>();
        let collector = tokio::spawn(collect(rx, self.progress_bar()));

        let mut join_set = JoinSet::new();
        let mut stream = self.enumerator.descriptors();
        let mut fetched = 0usize;
        let mut skipped = 0usize;
        let mut dispatched = 0usize;
        let mut cancelled = false;
        let mut enumeration_error = None;

        info!(
            workers = self.workers,
            dry_run = self.dry_run,
            "starting backup run"
        );

        loop {
            let permit = tokio::select! {
                biased;
                () = self.cancel_token.cancelled() => {
                    cancelled = true;
                    break;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(e) => return Err(BackupError::Sink(e.to_string())),
                },
            };

            let next = tokio::select! {
                biased;
                () = self.cancel_token.cancelled() => {
                    cancelled = true;
                    break;
                }
                next = stream.next() => next,
            };

            let descriptor = match next {
                None => break,
                Some(Err(e)) => {
                    error!(error = %e, "enumeration failed, stopping dispatch");
                    enumeration_error = Some(e);
                    break;
                }
                Some(Ok(descriptor)) => descriptor,
            };
            fetched += 1;

            if let Some(reason) = self.filter.skip_reason(&descriptor) {
                info!(repo = %descriptor.full_name(), %reason, "skipped");
                skipped += 1;
                continue;
            }

            while let Some(result) = join_set.try_join_next() {
                if let Err(e) = result {
                    error!(error = %e, "worker task lost");
                }
            }

            dispatched += 1;
            debug!(repo = %descriptor.full_name(), in_flight = join_set.len() + 1, "dispatching");
            let processor = Arc::clone(&self.processor);
            let tx = tx.clone();
            join_set.spawn(async move {
                let fallback = descriptor.clone();
                let outcome = match AssertUnwindSafe(processor.process(descriptor))
                    .catch_unwind()
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(payload) => {
                        let message = panic_message(&*payload);
                        error!(repo = %fallback.full_name(), %message, "worker aborted");
                        Outcome::Failure {
                            descriptor: fallback,
                            kind: FailureKind::Aborted,
                            message,
                        }
                    }
                };
                if tx.send_async(outcome).await.is_err() {
                    warn!("outcome collector closed early");
                }
                drop(permit);
            });
        }

        drop(stream);
        drop(tx);
        if cancelled {
            warn!(in_flight = join_set.len(), "dispatch stopped by interrupt");
        }
        while let Some(result) = join_set.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "worker task lost");
            }
        }

        let mut summary = collector
            .await
            .map_err(|e| BackupError::Sink(e.to_string()))?;
        summary.fetched = fetched;
        summary.skipped = skipped;
        summary.cancelled = cancelled;
        summary.dry_run = self.dry_run;

        if summary.attempted != dispatched {
            return Err(BackupError::Sink(format!(
                "dispatched {dispatched} repositories but received {} outcomes",
                summary.attempted
            )));
        }

        if let Some(e) = enumeration_error {
            error!(summary = %summary.to_json(), "partial backup summary");
            return Err(BackupError::Enumeration(e));
        }

        info!(summary = %summary.to_json(), "backup run finished");
        Ok(summary)
    }
}

async fn collect(rx: flume::Receiver<Outcome>, pb: ProgressBar) -> RunSummary {
    let mut summary = RunSummary::default();
    while let Ok(outcome) = rx.recv_async().await {
        summary.record(&outcome);
        pb.inc(1);
        pb.set_message(format!(
            "({} failed) {}",
            summary.failed(),
            outcome.descriptor().full_name()
        ));
    }
    pb.finish_and_clear();
    summary
}
