// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rounded-rectangle clip masks shared across layers.
//!
//! A painted layer whose items all share leading rounded-rectangle clip
//! segments gets those segments applied as a mask instead of baking them into
//! its pixels. Masks are keyed by their geometry in layer pixels so layers
//! with identical clips share one backend mask, and a mask survives a few
//! unused transactions before it is released.

use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::RoundedRect;

use crate::backend::LayerBackend;
use crate::layer::MaskId;

/// The shape of a mask: the intersection of rounded rectangles, in layer
/// pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct MaskGeometry {
    /// Segments, outermost first.
    pub rects: Vec<RoundedRect>,
}

impl MaskGeometry {
    /// Creates a geometry from segments.
    #[must_use]
    pub fn new(rects: Vec<RoundedRect>) -> Self {
        Self { rects }
    }

    /// Bit-exact hashable key.
    fn key(&self) -> Vec<u64> {
        let mut key = Vec::with_capacity(self.rects.len() * 8);
        for rr in &self.rects {
            let r = rr.rect();
            let radii = rr.radii();
            key.extend(
                [
                    r.x0,
                    r.y0,
                    r.x1,
                    r.y1,
                    radii.top_left,
                    radii.top_right,
                    radii.bottom_right,
                    radii.bottom_left,
                ]
                .map(f64::to_bits),
            );
        }
        key
    }
}

#[derive(Debug)]
struct CachedMask {
    id: MaskId,
    /// Transactions since the mask was last requested.
    age: u32,
}

/// Cache of backend masks keyed by geometry.
#[derive(Debug, Default)]
pub struct MaskCache {
    entries: HashMap<Vec<u64>, CachedMask>,
}

impl MaskCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of cached masks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a mask with the given geometry, creating it through the
    /// backend if needed. `None` if the backend fails to allocate.
    pub fn get_or_create<B: LayerBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        geometry: &MaskGeometry,
    ) -> Option<MaskId> {
        let key = geometry.key();
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.age = 0;
            return Some(entry.id);
        }
        let id = backend.create_mask(geometry)?;
        self.entries.insert(key, CachedMask { id, age: 0 });
        Some(id)
    }

    /// Ages every entry and releases masks unused for more than `max_age`
    /// transactions. Returns how many were released.
    pub fn end_transaction<B: LayerBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        max_age: u32,
    ) -> usize {
        let mut released = 0;
        self.entries.retain(|_, entry| {
            entry.age += 1;
            if entry.age > max_age {
                backend.release_mask(entry.id);
                released += 1;
                false
            } else {
                true
            }
        });
        released
    }
}
