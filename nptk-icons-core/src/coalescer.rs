// SPDX-License-Identifier: LGPL-3.0-only
//! Batched delivery of finished units.
//!
//! Completions are not delivered one by one: they collect in a
//! [`FinishedList`] and one flush hands all of them to their callbacks, so a
//! burst of small icons costs the caller one redraw.

use crate::cache::{CacheState, IconCache};
use crate::error::IconError;
use crate::image::IconImage;
use crate::request::{Handle, IconCallback};
use crate::resolve;
use crate::unit::{Delivery, DependentSlot, UnitId, UnitState};

pub(crate) struct Finished {
    pub unit: UnitId,
    pub outcome: Result<IconImage, IconError>,
}

/// Units that finished since the last flush, in completion order.
#[derive(Default)]
pub(crate) struct FinishedList {
    entries: Vec<Finished>,
}

impl FinishedList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, unit: UnitId, outcome: Result<IconImage, IconError>) {
        self.entries.push(Finished { unit, outcome });
    }

    pub fn take(&mut self) -> Vec<Finished> {
        std::mem::take(&mut self.entries)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IconCache {
    /// Deliver every finished unit.
    ///
    /// Caches successful results, calls the owner's and then each passenger's
    /// callback if still connected, and releases the units' keys and handles.
    /// Callbacks run after the cache's state is released, so they may submit
    /// new requests. Returns the number of callbacks invoked.
    pub fn flush(&self) -> usize {
        self.collect_completions();

        let deliveries = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let mut deliveries: Vec<(Handle, IconCallback, Option<IconImage>)> = Vec::new();
            let mut delivered_units = 0usize;

            // Dependents may finish their parent within the same flush.
            loop {
                let finished = state.finished.take();
                if finished.is_empty() {
                    break;
                }
                for Finished { unit, outcome } in finished {
                    delivered_units += 1;
                    self.finish_unit(state, unit, outcome, &mut deliveries);
                }
            }

            if delivered_units > 0 {
                state.stats.flushes += 1;
                log::debug!(
                    "Flushed {} icon units with {} callbacks",
                    delivered_units,
                    deliveries.len()
                );
            }

            if state.queue.is_drained() && state.handles.is_empty() {
                state.handles.reset_counter();
            }
            deliveries
        };

        let count = deliveries.len();
        for (handle, callback, image) in deliveries {
            log::trace!("Delivering icon to {} (found: {})", handle, image.is_some());
            callback(image);
        }
        if let Some(waiter) = self.idle_waiter.borrow_mut().take() {
            waiter.wake();
        }
        count
    }

    /// Move completions pushed by workers into the finished list.
    fn collect_completions(&self) {
        let mut completions = self.completions.borrow_mut();
        let mut state = self.state.borrow_mut();
        while let Ok(completion) = completions.try_recv() {
            state.finished.push(completion.unit, completion.outcome);
        }
    }

    fn finish_unit(
        &self,
        state: &mut CacheState,
        unit_id: UnitId,
        outcome: Result<IconImage, IconError>,
        deliveries: &mut Vec<(Handle, IconCallback, Option<IconImage>)>,
    ) {
        let Some(mut unit) = state.queue.remove(unit_id) else {
            log::debug!("Finished unit {} is no longer live", unit_id);
            return;
        };

        let image = match outcome {
            Ok(image) => {
                unit.state = UnitState::Done;
                state.stats.completed += 1;
                if unit.cacheable {
                    if unit.generation == state.results.generation() {
                        state.results.insert(unit.key.clone(), image.clone());
                    } else {
                        log::debug!("Not caching icon {} resolved under a previous theme", unit.key);
                    }
                }
                Some(image)
            },
            Err(err) => {
                unit.state = UnitState::Failed;
                state.stats.failed += 1;
                match &err {
                    IconError::Decode { .. } | IconError::DependentFailure(_) => {
                        log::warn!("Failed to load icon {}: {}", unit.key, err)
                    },
                    _ => log::warn!("Icon {} unavailable: {}", unit.key, err),
                }
                None
            },
        };

        let mut dependents = Vec::new();
        for attachment in unit.into_attachments() {
            state.handles.remove(attachment.handle);
            match attachment.delivery {
                Some(Delivery::Caller(callback)) => deliveries.push((attachment.handle, callback, image.clone())),
                Some(Delivery::Dependent { parent, slot }) => dependents.push((parent, slot)),
                None => log::trace!("Icon handle {} disconnected; skipping delivery", attachment.handle),
            }
        }

        for (parent, slot) in dependents {
            self.resume_parent(state, parent, slot, image.clone());
        }
    }

    /// Feed a dependent's result into its composite parent, dispatching the
    /// composition once every input is in.
    fn resume_parent(&self, state: &mut CacheState, parent: UnitId, slot: DependentSlot, image: Option<IconImage>) {
        let Some(unit) = state.queue.get_mut(parent) else {
            return;
        };
        let Some(composite) = unit.composite.as_mut() else {
            return;
        };

        match (slot, image) {
            (DependentSlot::Base, Some(image)) => composite.base = Some(image),
            (DependentSlot::Base, None) => {
                unit.state = UnitState::Failed;
                let base = composite.annotation.base.clone();
                unit.composite = None;
                state.finished.push(parent, Err(IconError::DependentFailure(base)));
                return;
            },
            (DependentSlot::Emblem, image) => {
                if image.is_none() {
                    log::debug!("Emblem of unit {} unavailable; composing without it", parent);
                }
                composite.emblem = Some(image);
            },
        }

        if !composite.is_ready() {
            return;
        }
        let Some(composite) = unit.composite.take() else {
            return;
        };
        let (Some(base), Some(emblem)) = (composite.base, composite.emblem) else {
            return;
        };
        unit.state = UnitState::Decoding;
        state.stats.dispatched += 1;
        log::debug!("Composing annotated icon {}", unit.key);
        let job = resolve::composite_job(composite.annotation, base, emblem, composite.size, composite.reserve);
        self.worker.dispatch(parent, job);
    }
}
