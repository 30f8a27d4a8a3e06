// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cross-transaction correlation between display items and layers.
//!
//! The registry remembers, for every item key seen in the previous
//! transaction, which layer the item was placed in and what it looked like.
//! The builder consults it to recycle layers and to diff geometry; items
//! that stop appearing are swept and their last footprint is discarded from
//! the layer that held them.
//!
//! Entry life cycle within one [`LayerManager`] transaction:
//!
//! ```text
//!   (unused) ──begin_update──► (used, staged) ──end_update──► (unused, committed)
//!       │
//!       └──sweep──► removed
//! ```

use alloc::boxed::Box;
use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::Vec2;

use crate::item::{FrameId, ItemClip, ItemGeometry, ItemKey};
use crate::layer::{LayerId, LayerTree};
use crate::manager::LayerManager;
use crate::region::Region;

/// What the builder recorded about an item the last time it was committed.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryState {
    /// The layer the item was placed in.
    pub layer: LayerId,
    /// Geometry snapshot, in container space.
    pub geometry: ItemGeometry,
    /// Clip snapshot, in container space.
    pub clip: ItemClip,
    /// Offset of the item's animated geometry root at save time.
    pub agr_offset: Vec2,
    /// Pixels the item covered, in container pixels.
    pub footprint: Region,
}

/// One registry slot.
#[derive(Debug)]
pub struct CorrelationEntry {
    key: ItemKey,
    committed: Option<EntryState>,
    staged: Option<EntryState>,
    used: bool,
    inactive: Option<Box<LayerManager<LayerTree>>>,
}

impl CorrelationEntry {
    /// The item key.
    #[must_use]
    pub fn key(&self) -> ItemKey {
        self.key
    }

    /// The state committed by the last finished transaction.
    #[must_use]
    pub fn committed(&self) -> Option<&EntryState> {
        self.committed.as_ref()
    }

    /// Whether the current transaction already placed the item.
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.used
    }
}

/// Arena of [`CorrelationEntry`] values indexed by [`ItemKey`].
#[derive(Debug, Default)]
pub struct CorrelationRegistry {
    entries: Vec<Option<CorrelationEntry>>,
    free: Vec<u32>,
    index: HashMap<ItemKey, u32>,
}

impl CorrelationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns whether no entries are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns the entry for `key`, if any.
    #[must_use]
    pub fn entry(&self, key: ItemKey) -> Option<&CorrelationEntry> {
        let slot = *self.index.get(&key)?;
        self.entries[slot as usize].as_ref()
    }

    /// Returns what was committed for `key` last time. `None` means the item
    /// is new.
    #[must_use]
    pub fn lookup(&self, key: ItemKey) -> Option<&EntryState> {
        self.entry(key).and_then(CorrelationEntry::committed)
    }

    /// Iterates over live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &CorrelationEntry> {
        self.entries.iter().flatten()
    }

    /// Marks `key` as used in this transaction and stages its new state.
    ///
    /// # Panics
    ///
    /// Panics if `key` was already staged in this transaction.
    pub fn begin_update(&mut self, key: ItemKey, state: EntryState) {
        let slot = self.slot_for(key);
        let Some(entry) = self.entries[slot as usize].as_mut() else {
            unreachable!("indexed slot {slot} is vacant");
        };
        assert!(!entry.used, "duplicate item key {key:?} in one transaction");
        entry.used = true;
        entry.staged = Some(state);
    }

    /// Removes every entry that was not used this transaction and returns
    /// the layer and footprint each one last occupied.
    pub fn sweep(&mut self) -> Vec<(ItemKey, EntryState)> {
        let mut swept = Vec::new();
        for slot in 0..self.entries.len() {
            if self.entries[slot].as_ref().is_some_and(|e| !e.used)
                && let Some(pair) = self.remove_slot(slot)
            {
                swept.push(pair);
            }
        }
        swept
    }

    /// Commits staged state and resets the `used` flags.
    pub fn end_update(&mut self) {
        for entry in self.entries.iter_mut().flatten() {
            if entry.used {
                entry.committed = entry.staged.take().or(entry.committed.take());
                entry.used = false;
            }
        }
    }

    /// Removes every entry produced by `frame`, returning their last state.
    pub fn remove_frame(&mut self, frame: FrameId) -> Vec<(ItemKey, EntryState)> {
        let mut removed = Vec::new();
        for slot in 0..self.entries.len() {
            if self.entries[slot].as_ref().is_some_and(|e| e.key.frame == frame)
                && let Some(pair) = self.remove_slot(slot)
            {
                removed.push(pair);
            }
        }
        removed
    }

    /// Detaches the private layer manager of an inactive item.
    pub fn take_inactive(&mut self, key: ItemKey) -> Option<Box<LayerManager<LayerTree>>> {
        let slot = *self.index.get(&key)?;
        self.entries[slot as usize].as_mut()?.inactive.take()
    }

    /// Stores the private layer manager of an inactive item.
    pub fn set_inactive(&mut self, key: ItemKey, manager: Box<LayerManager<LayerTree>>) {
        let slot = self.slot_for(key);
        if let Some(entry) = self.entries[slot as usize].as_mut() {
            entry.inactive = Some(manager);
        }
    }

    /// Returns the private layer manager of an inactive item.
    pub fn inactive_mut(&mut self, key: ItemKey) -> Option<&mut LayerManager<LayerTree>> {
        let slot = *self.index.get(&key)?;
        self.entries[slot as usize].as_mut()?.inactive.as_deref_mut()
    }

    fn slot_for(&mut self, key: ItemKey) -> u32 {
        if let Some(&slot) = self.index.get(&key) {
            return slot;
        }
        let entry = CorrelationEntry {
            key,
            committed: None,
            staged: None,
            used: false,
            inactive: None,
        };
        let slot = if let Some(slot) = self.free.pop() {
            self.entries[slot as usize] = Some(entry);
            slot
        } else {
            let Ok(slot) = u32::try_from(self.entries.len()) else {
                panic!("correlation registry is full");
            };
            self.entries.push(Some(entry));
            slot
        };
        self.index.insert(key, slot);
        slot
    }

    fn remove_slot(&mut self, slot: usize) -> Option<(ItemKey, EntryState)> {
        let entry = self.entries[slot].take()?;
        self.index.remove(&entry.key);
        #[expect(clippy::cast_possible_truncation, reason = "slots are created from u32 indices")]
        self.free.push(slot as u32);
        entry.committed.map(|state| (entry.key, state))
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;
    use crate::item::PaintSignature;

    fn state(layer: u32) -> EntryState {
        EntryState {
            layer: LayerId::from_raw(layer, 0),
            geometry: ItemGeometry {
                bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
                paint: PaintSignature::Generic,
            },
            clip: ItemClip::NONE,
            agr_offset: Vec2::ZERO,
            footprint: Region::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0)),
        }
    }

    #[test]
    fn staged_state_is_visible_after_end_update() {
        let mut reg = CorrelationRegistry::new();
        let key = ItemKey::new(1, 0);
        reg.begin_update(key, state(3));
        assert!(reg.lookup(key).is_none(), "new items have no committed state");
        reg.end_update();
        assert_eq!(reg.lookup(key).map(|s| s.layer), Some(LayerId::from_raw(3, 0)));
        assert!(!reg.entry(key).unwrap().is_used());
    }

    #[test]
    fn unused_entries_are_swept() {
        let mut reg = CorrelationRegistry::new();
        let a = ItemKey::new(1, 0);
        let b = ItemKey::new(1, 1);
        reg.begin_update(a, state(1));
        reg.begin_update(b, state(2));
        reg.end_update();

        reg.begin_update(a, state(1));
        let swept = reg.sweep();
        reg.end_update();
        assert_eq!(swept.len(), 1);
        assert_eq!(swept[0].0, b);
        assert_eq!(reg.len(), 1);
        assert!(reg.lookup(b).is_none());
    }

    #[test]
    #[should_panic(expected = "duplicate item key")]
    fn duplicate_key_in_one_transaction_panics() {
        let mut reg = CorrelationRegistry::new();
        let key = ItemKey::new(1, 0);
        reg.begin_update(key, state(1));
        reg.begin_update(key, state(2));
    }

    #[test]
    fn remove_frame_drops_only_that_frame() {
        let mut reg = CorrelationRegistry::new();
        reg.begin_update(ItemKey::new(1, 0), state(1));
        reg.begin_update(ItemKey::new(1, 1), state(1));
        reg.begin_update(ItemKey::new(2, 0), state(2));
        reg.end_update();
        let removed = reg.remove_frame(FrameId(1));
        assert_eq!(removed.len(), 2);
        assert_eq!(reg.len(), 1);
        reg.begin_update(ItemKey::new(3, 0), state(4));
        assert_eq!(reg.len(), 2, "freed slots are reused");
    }
}
