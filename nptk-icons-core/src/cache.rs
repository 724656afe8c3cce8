// SPDX-License-Identifier: LGPL-3.0-only
//! The icon cache: request intake, queue draining and theme handling.

use std::cell::RefCell;
use std::path::Path;
use std::sync::Arc;
use std::task::{Poll, Waker};
use std::time::Instant;

use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, mpsc};

use crate::coalescer::FinishedList;
use crate::collaborator::{IconResolver, ImageDecoder, ThemeEvent};
use crate::config::IconCacheConfig;
use crate::error::IconError;
use crate::handles::HandleTable;
use crate::image::IconImage;
use crate::queue::RequestQueue;
use crate::request::{Bound, CacheKey, Handle, IconKind, IconRequest};
use crate::resolve::{self, Collaborators, Plan};
use crate::result_cache::ResultCache;
use crate::unit::{Attachment, CompositeState, Delivery, DependentSlot, UnitId, UnitOfWork, UnitState};
use crate::worker::{Completion, WorkerPool};

/// Counters describing what the cache has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IconCacheStats {
    /// Requests passed to [`IconCache::submit`], including rejected ones.
    pub submitted: u64,
    /// Requests refused before queueing.
    pub rejected: u64,
    /// Requests answered from the result cache.
    pub cache_hits: u64,
    /// Requests attached as passengers to a running unit.
    pub coalesced: u64,
    /// Jobs handed to the worker pool.
    pub dispatched: u64,
    /// Units finished with an image.
    pub completed: u64,
    /// Units finished without an image.
    pub failed: u64,
    /// Flushes that delivered at least one unit.
    pub flushes: u64,
}

pub(crate) struct CacheState {
    pub results: ResultCache,
    pub queue: RequestQueue,
    pub handles: HandleTable,
    pub finished: FinishedList,
    pub drain_armed: bool,
    pub stats: IconCacheStats,
}

/// Asynchronous icon-resolution cache.
///
/// Lives on the thread running the application's event loop. Requests return
/// a [`Handle`] immediately; results arrive through callbacks when the loop
/// calls [`dispatch`](Self::dispatch). Equal requests (same identifier and
/// bounds) in flight at the same time share one resolve and decode.
///
/// A typical integration installs a [wakeup](Self::set_wakeup) that schedules
/// a low-priority idle callback, and calls `dispatch` from it:
///
/// ```ignore
/// let cache = IconCache::new(IconCacheConfig::default(), resolver, decoder)?;
/// cache.set_wakeup(move || proxy.send_event(AppEvent::Icons));
/// let handle = cache.load_themed("firefox", 48, 48, |icon| { /* redraw */ });
/// // ... on AppEvent::Icons:
/// cache.dispatch();
/// ```
pub struct IconCache {
    config: IconCacheConfig,
    collaborators: Collaborators,
    pub(crate) state: RefCell<CacheState>,
    pub(crate) completions: RefCell<mpsc::UnboundedReceiver<Completion>>,
    theme_events: RefCell<Option<broadcast::Receiver<ThemeEvent>>>,
    /// Task parked in `run_until_idle`, woken by any flush that delivers.
    pub(crate) idle_waiter: RefCell<Option<Waker>>,
    pub(crate) worker: WorkerPool,
}

impl IconCache {
    /// Create a cache and start its worker pool.
    ///
    /// Subscribes to the resolver's theme events, if it has any.
    pub fn new(
        config: IconCacheConfig,
        resolver: Arc<dyn IconResolver>,
        decoder: Arc<dyn ImageDecoder>,
    ) -> Result<Self, IconError> {
        let (worker, completions) = WorkerPool::new(&config)?;
        let theme_events = resolver.subscribe();

        Ok(Self {
            config,
            collaborators: Collaborators { resolver, decoder },
            state: RefCell::new(CacheState {
                results: ResultCache::new(),
                queue: RequestQueue::new(),
                handles: HandleTable::new(),
                finished: FinishedList::new(),
                drain_armed: false,
                stats: IconCacheStats::default(),
            }),
            completions: RefCell::new(completions),
            theme_events: RefCell::new(theme_events),
            idle_waiter: RefCell::new(None),
            worker,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &IconCacheConfig {
        &self.config
    }

    /// Install the hook called whenever the cache needs a [`dispatch`](Self::dispatch).
    ///
    /// It may be called from worker threads.
    pub fn set_wakeup<F>(&self, wakeup: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.worker.set_wakeup(Some(Box::new(wakeup)));
    }

    /// Remove the wakeup hook.
    pub fn clear_wakeup(&self) {
        self.worker.set_wakeup(None);
    }

    /// Request an icon from the icon theme.
    pub fn load_themed<F>(&self, name: &str, max_width: impl Into<Bound>, max_height: impl Into<Bound>, callback: F) -> Handle
    where
        F: FnOnce(Option<IconImage>) + 'static,
    {
        self.submit(IconRequest::new(IconKind::ThemedName, name, max_width, max_height).with_callback(callback))
    }

    /// Request an icon from a structured descriptor.
    pub fn load_descriptor<F>(
        &self,
        descriptor: &str,
        max_width: impl Into<Bound>,
        max_height: impl Into<Bound>,
        callback: F,
    ) -> Handle
    where
        F: FnOnce(Option<IconImage>) + 'static,
    {
        self.submit(
            IconRequest::new(IconKind::StructuredDescriptor, descriptor, max_width, max_height).with_callback(callback),
        )
    }

    /// Request the image stored in a local file.
    pub fn load_file<F>(
        &self,
        path: impl AsRef<Path>,
        max_width: impl Into<Bound>,
        max_height: impl Into<Bound>,
        callback: F,
    ) -> Handle
    where
        F: FnOnce(Option<IconImage>) + 'static,
    {
        let identifier = path.as_ref().to_string_lossy().into_owned();
        self.submit(IconRequest::new(IconKind::FilePath, identifier, max_width, max_height).with_callback(callback))
    }

    /// Request the image behind a URI.
    pub fn load_uri<F>(&self, uri: &str, max_width: impl Into<Bound>, max_height: impl Into<Bound>, callback: F) -> Handle
    where
        F: FnOnce(Option<IconImage>) + 'static,
    {
        self.submit(IconRequest::new(IconKind::Uri, uri, max_width, max_height).with_callback(callback))
    }

    /// Queue a request.
    ///
    /// Never blocks and never calls the callback directly: even cache hits
    /// are delivered by the next flush. Invalid requests get
    /// [`Handle::INERT`] and no callback.
    pub fn submit(&self, request: IconRequest) -> Handle {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.stats.submitted += 1;

        if let Err(error) = request.validate(self.config.min_icon_size).map_err(IconError::from) {
            state.stats.rejected += 1;
            log::debug!("{} ({:?})", error, request);
            return Handle::INERT;
        }

        let IconRequest {
            kind,
            identifier,
            max_width,
            max_height,
            callback,
        } = request;
        let Some(callback) = callback else {
            return Handle::INERT;
        };

        let handle = self.enqueue(state, kind, &identifier, max_width, max_height, Delivery::Caller(callback));
        drop(guard);
        self.worker.wake();
        handle
    }

    /// Stop delivering to `handle`.
    ///
    /// Work already started keeps running and other requests sharing it still
    /// get their result. Unknown, finished and inert handles are ignored.
    pub fn disconnect(&self, handle: Handle) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let Some(unit_id) = state.handles.unit_of(handle) else {
            return;
        };
        if let Some(attachment) = state.queue.get_mut(unit_id).and_then(|unit| unit.attachment_mut(handle)) {
            log::trace!("Disconnecting icon handle {}", handle);
            attachment.delivery = None;
        }
    }

    /// Drop every cached icon; later requests resolve again.
    ///
    /// Units already running still deliver, but their results are not cached.
    pub fn theme_changed(&self) {
        self.state.borrow_mut().results.clear();
    }

    /// Run everything that is due: theme events, one drain batch and a flush.
    ///
    /// Returns `true` while requests are still outstanding.
    pub fn dispatch(&self) -> bool {
        self.poll_theme_events();
        let armed = self.state.borrow().drain_armed;
        if armed {
            self.drain_step();
        }
        self.flush();
        !self.is_idle()
    }

    /// Dispatch until no request is outstanding, awaiting worker completions in between.
    pub async fn run_until_idle(&self) {
        while self.dispatch() {
            if self.has_due_work() {
                continue;
            }
            // No borrow is held while pending, so the host may dispatch meanwhile.
            let flushes = self.state.borrow().stats.flushes;
            let next = std::future::poll_fn(|cx| {
                if let Poll::Ready(completion) = self.completions.borrow_mut().poll_recv(cx) {
                    return Poll::Ready(Some(completion));
                }
                if self.state.borrow().stats.flushes != flushes {
                    return Poll::Ready(None);
                }
                *self.idle_waiter.borrow_mut() = Some(cx.waker().clone());
                Poll::Pending
            })
            .await;
            match next {
                Some(Some(Completion { unit, outcome })) => self.state.borrow_mut().finished.push(unit, outcome),
                Some(None) => break,
                // Another dispatch delivered in the meantime.
                None => continue,
            }
        }
    }

    /// Dispatch queued units to the worker pool for at most the drain budget.
    ///
    /// Returns whether another batch is needed.
    pub fn drain_step(&self) -> bool {
        let started = Instant::now();
        let budget = self.config.drain_budget();
        let mut dispatched = 0usize;

        loop {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let Some(unit_id) = state.queue.pop_front() else {
                state.drain_armed = false;
                break;
            };
            self.start_unit(state, unit_id);
            dispatched += 1;

            if started.elapsed() >= budget {
                state.drain_armed = !state.queue.is_drained();
                break;
            }
        }

        let armed = self.state.borrow().drain_armed;
        log::debug!("Drained {} icon requests, more pending: {}", dispatched, armed);
        if armed {
            self.worker.wake();
        }
        armed
    }

    /// Whether no request is outstanding.
    pub fn is_idle(&self) -> bool {
        self.state.borrow().queue.is_empty()
    }

    /// Number of live units of work.
    pub fn pending_units(&self) -> usize {
        self.state.borrow().queue.len()
    }

    /// Number of cached icons.
    pub fn cached_len(&self) -> usize {
        self.state.borrow().results.len()
    }

    /// Whether an icon for this key is cached.
    pub fn is_cached(&self, key: &CacheKey) -> bool {
        self.state.borrow().results.contains(key)
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> IconCacheStats {
        self.state.borrow().stats
    }

    /// State of the unit carrying `handle`, while the request is outstanding.
    pub fn unit_state(&self, handle: Handle) -> Option<UnitState> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let unit_id = state.handles.unit_of(handle)?;
        state.queue.get_mut(unit_id).map(|unit| unit.state)
    }

    /// A drain batch or a flush could run without waiting on workers.
    fn has_due_work(&self) -> bool {
        let state = self.state.borrow();
        state.drain_armed || !state.finished.is_empty()
    }

    /// Route one request: cache hit, passenger, or new owner unit.
    pub(crate) fn enqueue(
        &self,
        state: &mut CacheState,
        kind: IconKind,
        identifier: &str,
        max_width: Bound,
        max_height: Bound,
        mut delivery: Delivery,
    ) -> Handle {
        let key = CacheKey::new(identifier, max_width, max_height);

        if let Some(image) = state.results.lookup(&key) {
            state.stats.cache_hits += 1;
            let unit_id = state.queue.next_unit_id();
            let handle = state.handles.allocate(unit_id);
            log::trace!("Icon {} served from cache to {}", key, handle);
            let mut unit = UnitOfWork::new(
                unit_id,
                key,
                kind,
                Attachment {
                    handle,
                    delivery: Some(delivery),
                },
                state.results.generation(),
            );
            unit.state = UnitState::Done;
            unit.cacheable = false;
            state.queue.insert_detached(unit);
            state.finished.push(unit_id, Ok(image));
            return handle;
        }

        if let Some(unit_id) = state.queue.in_flight(&key) {
            let handle = state.handles.allocate(unit_id);
            let attachment = Attachment {
                handle,
                delivery: Some(delivery),
            };
            match state.queue.attach_passenger(unit_id, attachment) {
                Ok(()) => {
                    state.stats.coalesced += 1;
                    log::debug!("Icon {} already in flight; {} rides along", key, handle);
                    return handle;
                },
                Err(rejected) => {
                    state.handles.remove(handle);
                    match rejected.delivery {
                        Some(recovered) => delivery = recovered,
                        None => return Handle::INERT,
                    }
                },
            }
        }

        let unit_id = state.queue.next_unit_id();
        let handle = state.handles.allocate(unit_id);
        log::debug!("Queueing icon {} as unit {} for {}", key, unit_id, handle);
        let unit = UnitOfWork::new(
            unit_id,
            key,
            kind,
            Attachment {
                handle,
                delivery: Some(delivery),
            },
            state.results.generation(),
        );
        state.queue.enqueue(unit);
        state.drain_armed = true;
        handle
    }

    /// Plan a dequeued unit and hand it to a worker, or fail it right away.
    fn start_unit(&self, state: &mut CacheState, unit_id: UnitId) {
        let Some(unit) = state.queue.get_mut(unit_id) else {
            return;
        };
        let (max_width, max_height) = unit.bounds();
        let plan = resolve::plan(
            unit.kind,
            unit.identifier(),
            max_width,
            max_height,
            &self.config,
            &self.collaborators,
        );

        match plan {
            Plan::Fail(err) => {
                unit.state = UnitState::Failed;
                state.finished.push(unit_id, Err(err));
            },
            Plan::Blocking { job, state: running } => {
                unit.state = running;
                state.stats.dispatched += 1;
                self.worker.dispatch(unit_id, job);
            },
            Plan::Composite {
                annotation,
                size,
                reserve,
            } => {
                unit.state = UnitState::AwaitingDependentWork;
                unit.cacheable = false;
                let base = annotation.base.clone();
                let emblem = annotation.emblem().map(str::to_string);
                unit.composite = Some(CompositeState::new(annotation, size, reserve));

                let base_size = size.saturating_sub(reserve).max(1);
                log::debug!("Unit {} waits for base '{}' at {}", unit_id, base, base_size);
                self.enqueue(
                    state,
                    IconKind::StructuredDescriptor,
                    &base,
                    Bound::Px(base_size),
                    Bound::Px(base_size),
                    Delivery::Dependent {
                        parent: unit_id,
                        slot: DependentSlot::Base,
                    },
                );

                if let Some(emblem) = emblem {
                    let emblem_size = (size / 3).max(self.config.min_icon_size).max(1);
                    self.enqueue(
                        state,
                        IconKind::ThemedName,
                        &emblem,
                        Bound::Px(emblem_size),
                        Bound::Px(emblem_size),
                        Delivery::Dependent {
                            parent: unit_id,
                            slot: DependentSlot::Emblem,
                        },
                    );
                }
            },
        }
    }

    fn poll_theme_events(&self) {
        let mut changed = None;
        {
            let mut slot = self.theme_events.borrow_mut();
            let Some(events) = slot.as_mut() else {
                return;
            };
            let mut closed = false;
            loop {
                match events.try_recv() {
                    Ok(ThemeEvent::Changed { theme }) => changed = Some(theme),
                    Err(TryRecvError::Lagged(skipped)) => {
                        log::debug!("Missed {} theme events", skipped);
                        changed.get_or_insert_with(String::new);
                    },
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Closed) => {
                        closed = true;
                        break;
                    },
                }
            }
            if closed {
                log::debug!("Theme event channel closed");
                *slot = None;
            }
        }

        if let Some(theme) = changed {
            log::info!("Icon theme changed to '{}'; clearing icon cache", theme);
            self.theme_changed();
        }
    }
}
