// SPDX-License-Identifier: LGPL-3.0-only
//! Handle allocation and lookup.

use std::collections::HashMap;

use crate::request::Handle;
use crate::unit::UnitId;

/// Maps live handles to the unit of work carrying their request.
#[derive(Default)]
pub(crate) struct HandleTable {
    last: u64,
    entries: HashMap<Handle, UnitId>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next handle for a request riding on `unit`.
    pub fn allocate(&mut self, unit: UnitId) -> Handle {
        self.last += 1;
        let handle = Handle(self.last);
        self.entries.insert(handle, unit);
        handle
    }

    pub fn unit_of(&self, handle: Handle) -> Option<UnitId> {
        self.entries.get(&handle).copied()
    }

    pub fn remove(&mut self, handle: Handle) {
        self.entries.remove(&handle);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Restart numbering. Only valid while no handle is live.
    pub fn reset_counter(&mut self) {
        debug_assert!(self.entries.is_empty());
        if self.last != 0 {
            log::trace!("Resetting handle counter after {} handles", self.last);
        }
        self.last = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_increase_and_reset() {
        let mut table = HandleTable::new();
        let a = table.allocate(7);
        let b = table.allocate(7);
        assert!(b > a);
        assert!(!a.is_inert());
        assert_eq!(table.unit_of(b), Some(7));

        table.remove(a);
        table.remove(b);
        assert!(table.is_empty());
        assert_eq!(table.unit_of(a), None);

        table.reset_counter();
        assert_eq!(table.allocate(9), a);
    }
}
