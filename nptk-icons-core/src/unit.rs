// SPDX-License-Identifier: LGPL-3.0-only
//! Units of work: one in-flight resolution shared by every request for a key.

use crate::descriptor::Annotation;
use crate::image::IconImage;
use crate::request::{Bound, CacheKey, Handle, IconCallback, IconKind};

pub(crate) type UnitId = u64;

/// Lifecycle of a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    /// Waiting in the FIFO.
    Queued,
    /// Looking up a concrete reference on a worker.
    ResolvingReference,
    /// Waiting for dependent units (composite icons).
    AwaitingDependentWork,
    /// Fetching, decoding or compositing on a worker.
    Decoding,
    /// Finished with an image.
    Done,
    /// Finished without an image.
    Failed,
}

/// Which input of a composite a dependent unit provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DependentSlot {
    Base,
    Emblem,
}

/// Where a unit's result goes.
pub(crate) enum Delivery {
    Caller(IconCallback),
    Dependent { parent: UnitId, slot: DependentSlot },
}

/// One request riding on a unit. `delivery` is cleared on disconnect.
pub(crate) struct Attachment {
    pub handle: Handle,
    pub delivery: Option<Delivery>,
}

/// Inputs gathered by an annotated unit while its dependents run.
pub(crate) struct CompositeState {
    pub annotation: Annotation,
    pub size: u32,
    pub reserve: u32,
    pub base: Option<IconImage>,
    pub emblem: Option<Option<IconImage>>,
}

impl CompositeState {
    pub fn new(annotation: Annotation, size: u32, reserve: u32) -> Self {
        let emblem = if annotation.emblem().is_some() { None } else { Some(None) };
        Self {
            annotation,
            size,
            reserve,
            base: None,
            emblem,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.base.is_some() && self.emblem.is_some()
    }
}

pub(crate) struct UnitOfWork {
    pub id: UnitId,
    pub key: CacheKey,
    pub kind: IconKind,
    pub state: UnitState,
    /// Annotated icons depend on data outside the key and are never cached.
    pub cacheable: bool,
    /// Result cache generation the unit was created under.
    pub generation: u64,
    pub owner: Attachment,
    pub passengers: Vec<Attachment>,
    pub composite: Option<CompositeState>,
}

impl UnitOfWork {
    pub fn new(id: UnitId, key: CacheKey, kind: IconKind, owner: Attachment, generation: u64) -> Self {
        Self {
            id,
            key,
            kind,
            state: UnitState::Queued,
            cacheable: true,
            generation,
            owner,
            passengers: Vec::new(),
            composite: None,
        }
    }

    pub fn identifier(&self) -> &str {
        self.key.identifier()
    }

    pub fn bounds(&self) -> (Bound, Bound) {
        (self.key.max_width(), self.key.max_height())
    }

    pub fn attachment_mut(&mut self, handle: Handle) -> Option<&mut Attachment> {
        std::iter::once(&mut self.owner)
            .chain(self.passengers.iter_mut())
            .find(|attachment| attachment.handle == handle)
    }

    /// Owner first, then passengers in attach order.
    pub fn into_attachments(self) -> impl Iterator<Item = Attachment> {
        std::iter::once(self.owner).chain(self.passengers)
    }
}
