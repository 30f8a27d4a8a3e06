// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animated geometry roots.
//!
//! Items move with an *animated geometry root* (AGR): typically a scroll frame
//! or an element with an active transform. Items sharing a root can share a
//! retained raster surface because they move together; the surface is simply
//! re-positioned when the root moves.
//!
//! Roots form a forest through their `parent` links. The layer builder uses
//! the chain up to a container's root to decide nesting, clipping, and which
//! scroll metadata to attach.

use hashbrown::HashMap;
use kurbo::{Rect, Vec2};

use super::id::{AgrId, ScrollId};

/// Properties of one animated geometry root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationRoot {
    /// The enclosing root, or `None` for a top-level root.
    pub parent: Option<AgrId>,
    /// Accumulated offset of this root in container space.
    ///
    /// Scrolling a root by `d` moves its items by `d` and changes this offset
    /// by `d`; the builder subtracts offset deltas before diffing geometry.
    pub offset: Vec2,
    /// Clip applied to everything moving with this root relative to its
    /// parent (a scroll port), in container space.
    pub clip: Option<Rect>,
    /// Scroll metadata to attach to layers under this root.
    pub scroll: Option<ScrollId>,
}

impl AnimationRoot {
    /// A top-level root with no offset, clip, or scroll metadata.
    pub const TOP: Self = Self {
        parent: None,
        offset: Vec2::ZERO,
        clip: None,
        scroll: None,
    };

    /// A child root with the given offset.
    #[must_use]
    pub const fn child_of(parent: AgrId, offset: Vec2) -> Self {
        Self {
            parent: Some(parent),
            offset,
            clip: None,
            scroll: None,
        }
    }

    /// Returns `self` with a clip rectangle.
    #[must_use]
    pub const fn with_clip(mut self, clip: Rect) -> Self {
        self.clip = Some(clip);
        self
    }

    /// Returns `self` with scroll metadata.
    #[must_use]
    pub const fn with_scroll(mut self, scroll: ScrollId) -> Self {
        self.scroll = Some(scroll);
        self
    }
}

/// The table of animated geometry roots referenced by a display list.
///
/// Roots missing from the table behave like [`AnimationRoot::TOP`].
#[derive(Clone, Debug, Default)]
pub struct AnimationRoots {
    roots: HashMap<AgrId, AnimationRoot>,
}

impl AnimationRoots {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a root.
    pub fn insert(&mut self, id: AgrId, root: AnimationRoot) {
        self.roots.insert(id, root);
    }

    /// Returns the root's properties, if present.
    #[must_use]
    pub fn get(&self, id: AgrId) -> Option<&AnimationRoot> {
        self.roots.get(&id)
    }

    /// Returns the parent of `id`.
    #[must_use]
    pub fn parent(&self, id: AgrId) -> Option<AgrId> {
        self.roots.get(&id).and_then(|r| r.parent)
    }

    /// Returns the accumulated offset of `id`.
    #[must_use]
    pub fn offset(&self, id: AgrId) -> Vec2 {
        self.roots.get(&id).map_or(Vec2::ZERO, |r| r.offset)
    }

    /// Returns the clip of `id` relative to its parent.
    #[must_use]
    pub fn clip(&self, id: AgrId) -> Option<Rect> {
        self.roots.get(&id).and_then(|r| r.clip)
    }

    /// Returns whether `ancestor` is `id` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: AgrId, id: AgrId) -> bool {
        self.chain(id).any(|a| a == ancestor)
    }

    /// Iterates from `id` up through its ancestors (inclusive).
    pub fn chain(&self, id: AgrId) -> Chain<'_> {
        Chain {
            roots: self,
            next: Some(id),
            // A malformed table with a parent cycle must not loop forever.
            budget: self.roots.len() + 1,
        }
    }
}

/// Iterator over a root and its ancestors, created by
/// [`AnimationRoots::chain`].
#[derive(Debug)]
pub struct Chain<'a> {
    roots: &'a AnimationRoots,
    next: Option<AgrId>,
    budget: usize,
}

impl Iterator for Chain<'_> {
    type Item = AgrId;

    fn next(&mut self) -> Option<AgrId> {
        let current = self.next?;
        if self.budget == 0 {
            self.next = None;
            return None;
        }
        self.budget -= 1;
        self.next = self.roots.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn chain_walks_to_top() {
        let mut roots = AnimationRoots::new();
        roots.insert(AgrId(0), AnimationRoot::TOP);
        roots.insert(AgrId(1), AnimationRoot::child_of(AgrId(0), Vec2::ZERO));
        roots.insert(AgrId(2), AnimationRoot::child_of(AgrId(1), Vec2::new(0.0, 5.0)));
        let chain: Vec<_> = roots.chain(AgrId(2)).collect();
        assert_eq!(chain, [AgrId(2), AgrId(1), AgrId(0)]);
        assert!(roots.is_ancestor_or_self(AgrId(0), AgrId(2)));
        assert!(!roots.is_ancestor_or_self(AgrId(2), AgrId(0)));
    }

    #[test]
    fn unknown_root_is_top_level() {
        let roots = AnimationRoots::new();
        assert_eq!(roots.parent(AgrId(7)), None);
        assert_eq!(roots.offset(AgrId(7)), Vec2::ZERO);
        assert_eq!(roots.chain(AgrId(7)).count(), 1);
    }

    #[test]
    fn parent_cycle_terminates() {
        let mut roots = AnimationRoots::new();
        roots.insert(AgrId(1), AnimationRoot::child_of(AgrId(2), Vec2::ZERO));
        roots.insert(AgrId(2), AnimationRoot::child_of(AgrId(1), Vec2::ZERO));
        assert!(roots.chain(AgrId(1)).count() <= 3);
    }
}
