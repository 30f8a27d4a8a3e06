// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identity types shared between the producer of display lists and the
//! layer builder.

use core::fmt;

/// Identifies the source node (layout frame) that produced display items.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u32);

impl fmt::Debug for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameId({})", self.0)
    }
}

/// Stable identity of a display item across frames.
///
/// A source node may produce several items per frame; `index` tells them
/// apart (typically the item type plus a per-type counter). Two items with
/// the same key in consecutive transactions are treated as the same logical
/// paint operation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    /// The producing source node.
    pub frame: FrameId,
    /// Per-node discriminator.
    pub index: u32,
}

impl ItemKey {
    /// Creates a key.
    #[inline]
    #[must_use]
    pub const fn new(frame: u32, index: u32) -> Self {
        Self {
            frame: FrameId(frame),
            index,
        }
    }
}

impl fmt::Debug for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemKey({}:{})", self.frame.0, self.index)
    }
}

/// Identifies an animated geometry root: the ancestor whose movement a set of
/// items follows.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgrId(pub u32);

impl fmt::Debug for AgrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgrId({})", self.0)
    }
}

/// Identifies a scrollable region whose metadata is attached to layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScrollId(pub u64);

/// An opaque reference to decoded image content owned by the embedder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageKey(pub u64);
