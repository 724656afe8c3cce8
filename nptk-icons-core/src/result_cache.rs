// SPDX-License-Identifier: LGPL-3.0-only
//! In-memory storage of decoded icons.

use std::collections::HashMap;

use crate::image::IconImage;
use crate::request::CacheKey;

/// Unbounded map from request key to decoded icon.
///
/// Only successful decodes are stored. The whole map is dropped when the icon
/// theme changes; `generation` counts those clears so results computed under
/// an older theme can be recognised.
#[derive(Default)]
pub(crate) struct ResultCache {
    entries: HashMap<CacheKey, IconImage>,
    generation: u64,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, key: &CacheKey) -> Option<IconImage> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: CacheKey, image: IconImage) {
        self.entries.insert(key, image);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn clear(&mut self) {
        log::debug!("Dropping {} cached icons", self.entries.len());
        self.entries.clear();
        self.generation += 1;
    }
}
