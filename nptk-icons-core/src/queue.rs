// SPDX-License-Identifier: LGPL-3.0-only
//! Pending units in arrival order, indexed by key for coalescing.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;

use crate::request::CacheKey;
use crate::unit::{Attachment, UnitId, UnitOfWork};

/// Owns every live unit of work.
///
/// `fifo` holds units not yet dispatched, `coalescing` points each key at the
/// unit currently producing it.
#[derive(Default)]
pub(crate) struct RequestQueue {
    units: IndexMap<UnitId, UnitOfWork>,
    coalescing: HashMap<CacheKey, UnitId>,
    fifo: VecDeque<UnitId>,
    last_unit: UnitId,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_unit_id(&mut self) -> UnitId {
        self.last_unit += 1;
        self.last_unit
    }

    /// The unit currently producing `key`, if any.
    pub fn in_flight(&self, key: &CacheKey) -> Option<UnitId> {
        self.coalescing.get(key).copied()
    }

    /// Register a new owner unit and queue it.
    pub fn enqueue(&mut self, unit: UnitOfWork) {
        let id = unit.id;
        self.coalescing.insert(unit.key.clone(), id);
        self.units.insert(id, unit);
        self.fifo.push_back(id);
    }

    /// Register a unit that needs no work (already has its result).
    pub fn insert_detached(&mut self, unit: UnitOfWork) {
        self.units.insert(unit.id, unit);
    }

    pub fn attach_passenger(&mut self, id: UnitId, attachment: Attachment) -> Result<(), Attachment> {
        match self.units.get_mut(&id) {
            Some(unit) => {
                unit.passengers.push(attachment);
                Ok(())
            },
            None => Err(attachment),
        }
    }

    pub fn pop_front(&mut self) -> Option<UnitId> {
        self.fifo.pop_front()
    }

    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut UnitOfWork> {
        self.units.get_mut(&id)
    }

    /// Remove a finished unit, releasing its key for new work.
    pub fn remove(&mut self, id: UnitId) -> Option<UnitOfWork> {
        let unit = self.units.shift_remove(&id)?;
        if self.coalescing.get(&unit.key) == Some(&id) {
            self.coalescing.remove(&unit.key);
        }
        Some(unit)
    }

    /// No unit is waiting for dispatch.
    pub fn is_drained(&self) -> bool {
        self.fifo.is_empty()
    }

    /// Number of live units (queued, running or awaiting flush).
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Bound, Handle, IconKind};

    fn unit(queue: &mut RequestQueue, name: &str) -> UnitOfWork {
        let id = queue.next_unit_id();
        let key = CacheKey::new(name, Bound::Px(16), Bound::Px(16));
        let owner = Attachment {
            handle: Handle(id),
            delivery: None,
        };
        UnitOfWork::new(id, key, IconKind::ThemedName, owner, 0)
    }

    #[test]
    fn test_fifo_order_and_coalescing() {
        let mut queue = RequestQueue::new();
        let a = unit(&mut queue, "a");
        let b = unit(&mut queue, "b");
        let (a_id, b_id) = (a.id, b.id);
        let a_key = a.key.clone();
        queue.enqueue(a);
        queue.enqueue(b);

        assert_eq!(queue.in_flight(&a_key), Some(a_id));
        assert!(queue.attach_passenger(a_id, Attachment { handle: Handle(99), delivery: None }).is_ok());
        assert_eq!(queue.pop_front(), Some(a_id));
        assert_eq!(queue.pop_front(), Some(b_id));
        assert!(queue.is_drained());

        // Dispatched units still coalesce until removed.
        assert_eq!(queue.in_flight(&a_key), Some(a_id));
        let removed = queue.remove(a_id).unwrap();
        assert_eq!(removed.passengers.len(), 1);
        assert_eq!(queue.in_flight(&a_key), None);
        assert_eq!(queue.len(), 1);

        let returned = queue
            .attach_passenger(a_id, Attachment { handle: Handle(100), delivery: None })
            .unwrap_err();
        assert_eq!(returned.handle, Handle(100));
    }

    #[test]
    fn test_detached_units_do_not_coalesce() {
        let mut queue = RequestQueue::new();
        let hit = unit(&mut queue, "a");
        let key = hit.key.clone();
        let id = hit.id;
        queue.insert_detached(hit);
        assert_eq!(queue.in_flight(&key), None);
        assert!(queue.is_drained());
        assert!(queue.remove(id).is_some());
        assert!(queue.is_empty());
    }
}
