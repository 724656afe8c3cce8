// SPDX-License-Identifier: LGPL-3.0-only
//! Worker pool running blocking resolve and decode steps.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc;

use crate::config::IconCacheConfig;
use crate::error::IconError;
use crate::image::IconImage;
use crate::unit::UnitId;

/// A blocking step producing a unit's result.
pub(crate) type Job = Box<dyn FnOnce() -> Result<IconImage, IconError> + Send + 'static>;

/// Hook invoked after a completion is pushed.
pub(crate) type Wakeup = Box<dyn Fn() + Send + Sync>;

/// Result of one job, sent back to the control thread.
pub(crate) struct Completion {
    pub unit: UnitId,
    pub outcome: Result<IconImage, IconError>,
}

/// Runs jobs on a [tokio] runtime's blocking pool.
///
/// Workers never touch cache state: they only push [`Completion`]s into the
/// channel whose receiver lives on the control thread.
pub(crate) struct WorkerPool {
    rt: Option<Runtime>,
    completions: mpsc::UnboundedSender<Completion>,
    wakeup: Arc<ArcSwapOption<Wakeup>>,
}

impl WorkerPool {
    /// Start the pool. Returns it together with the completion receiver.
    pub fn new(config: &IconCacheConfig) -> std::io::Result<(Self, mpsc::UnboundedReceiver<Completion>)> {
        let rt = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(config.workers.get())
            .thread_stack_size(config.stack_size)
            .thread_name("nptk-icons-worker")
            .build()?;
        let (completions, rx) = mpsc::unbounded_channel();

        log::debug!("Icon worker pool started with {} workers", config.workers);

        Ok((
            Self {
                rt: Some(rt),
                completions,
                wakeup: Arc::new(ArcSwapOption::empty()),
            },
            rx,
        ))
    }

    pub fn set_wakeup(&self, wakeup: Option<Wakeup>) {
        self.wakeup.store(wakeup.map(Arc::new));
    }

    /// Ask the host loop for a dispatch tick.
    pub fn wake(&self) {
        if let Some(wake) = self.wakeup.load_full() {
            (*wake)();
        }
    }

    /// Run `job` for `unit` off the control thread.
    pub fn dispatch(&self, unit: UnitId, job: Job) {
        let Some(rt) = &self.rt else {
            return;
        };
        let completions = self.completions.clone();
        let wakeup = self.wakeup.clone();

        rt.spawn(async move {
            let outcome = match tokio::task::spawn_blocking(job).await {
                Ok(outcome) => outcome,
                Err(e) => Err(IconError::WorkerFailed(format!("Task execution error: {}", e))),
            };

            if completions.send(Completion { unit, outcome }).is_err() {
                log::debug!("Icon cache dropped; discarding result of unit {}", unit);
                return;
            }
            if let Some(wake) = wakeup.load_full() {
                (*wake)();
            }
        });
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Jobs still running finish on their own threads; their results are discarded.
        if let Some(rt) = self.rt.take() {
            rt.shutdown_background();
        }
    }
}
