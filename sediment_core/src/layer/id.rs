// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer identity and kind types.

use core::fmt;

/// Sentinel value indicating "no layer" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a retained layer.
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a layer is destroyed and the slot is reused. The
/// builder only ever refers to layers through these handles.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId {
    /// Slot index into the tree's arrays.
    pub(crate) idx: u32,
    /// Generation counter; must match the tree's generation for this slot.
    pub(crate) generation: u32,
}

impl LayerId {
    /// Creates a handle from raw parts.
    ///
    /// Backends other than [`LayerTree`](super::LayerTree) use this to mint
    /// their own handles.
    #[inline]
    #[must_use]
    pub const fn from_raw(idx: u32, generation: u32) -> Self {
        Self { idx, generation }
    }

    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerId({}@gen{})", self.idx, self.generation)
    }
}

/// A handle to a clip mask owned by a backend.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaskId(pub u32);

impl fmt::Debug for MaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MaskId({})", self.0)
    }
}

/// What a layer holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Groups child layers; draws nothing itself.
    Container,
    /// A retained raster surface painted by the embedder.
    Painted,
    /// A uniform color fill.
    Color,
    /// A single image.
    Image,
}
