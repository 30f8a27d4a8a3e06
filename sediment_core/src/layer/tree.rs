// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays retained layer storage.

use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::Rect;
use understory_dirty::{Channel, CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{INVALID, LayerId, LayerKind, MaskId};
use super::traverse::Children;
use crate::color::Color;
use crate::dirty;
use crate::item::{ImageKey, ScrollId};
use crate::mask::MaskGeometry;
use crate::region::Region;
use crate::transform::Transform3d;

/// Struct-of-arrays storage for a retained layer tree.
///
/// Layers are addressed by [`LayerId`] handles. Each layer occupies a slot in
/// parallel arrays; destroyed layers are recycled via a free list and
/// generation counters reject stale handles.
///
/// Raster layers ([`LayerKind::Painted`]) additionally track a *valid* region
/// (pixels that hold up-to-date content) and an *invalid* region (pixels
/// invalidated since the last paint). [`region_to_draw`](Self::region_to_draw)
/// is everything visible that is not valid.
#[derive(Debug)]
pub struct LayerTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Local properties (set by the builder) --
    pub(crate) kind: Vec<LayerKind>,
    pub(crate) local_transform: Vec<Transform3d>,
    pub(crate) local_opacity: Vec<f32>,
    pub(crate) clip: Vec<Option<Rect>>,
    pub(crate) visible: Vec<Region>,
    pub(crate) content_opaque: Vec<bool>,
    pub(crate) color: Vec<Color>,
    pub(crate) image: Vec<Option<ImageKey>>,
    pub(crate) content_rect: Vec<Rect>,
    pub(crate) mask: Vec<Option<MaskId>>,
    pub(crate) scroll: Vec<Vec<ScrollId>>,
    pub(crate) background: Vec<Color>,

    // -- Raster bookkeeping --
    pub(crate) valid: Vec<Region>,
    pub(crate) invalid: Vec<Region>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
    live: usize,
    budget: Option<usize>,

    // -- Masks --
    masks: HashMap<MaskId, MaskGeometry>,
    next_mask: u32,

    // -- Dirty tracking --
    dirty: DirtyTracker<u32>,

    // -- Invalidation log --
    invalidations: Vec<(LayerId, Region)>,
}

impl Default for LayerTree {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerTree {
    /// Creates an empty tree with no allocation budget.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            kind: Vec::new(),
            local_transform: Vec::new(),
            local_opacity: Vec::new(),
            clip: Vec::new(),
            visible: Vec::new(),
            content_opaque: Vec::new(),
            color: Vec::new(),
            image: Vec::new(),
            content_rect: Vec::new(),
            mask: Vec::new(),
            scroll: Vec::new(),
            background: Vec::new(),
            valid: Vec::new(),
            invalid: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            live: 0,
            budget: None,
            masks: HashMap::new(),
            next_mask: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            invalidations: Vec::new(),
        }
    }

    /// Limits the number of simultaneously live layers.
    ///
    /// Once the limit is reached, [`create_layer`](Self::create_layer)
    /// returns `None`. `None` removes the limit.
    pub fn set_allocation_budget(&mut self, budget: Option<usize>) {
        self.budget = budget;
    }

    // -- Allocation API --

    /// Creates a new layer and returns its handle, or `None` when the
    /// allocation budget is exhausted.
    ///
    /// The layer starts detached with an identity transform, full opacity,
    /// no clip and an empty visible region.
    pub fn create_layer(&mut self, kind: LayerKind) -> Option<LayerId> {
        if self.budget.is_some_and(|b| self.live >= b) {
            return None;
        }
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.kind[i] = kind;
            self.local_transform[i] = Transform3d::IDENTITY;
            self.local_opacity[i] = 1.0;
            self.clip[i] = None;
            self.visible[i].clear();
            self.content_opaque[i] = false;
            self.color[i] = Color::TRANSPARENT;
            self.image[i] = None;
            self.content_rect[i] = Rect::ZERO;
            self.mask[i] = None;
            self.scroll[i].clear();
            self.background[i] = Color::TRANSPARENT;
            self.valid[i].clear();
            self.invalid[i].clear();
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.kind.push(kind);
            self.local_transform.push(Transform3d::IDENTITY);
            self.local_opacity.push(1.0);
            self.clip.push(None);
            self.visible.push(Region::new());
            self.content_opaque.push(false);
            self.color.push(Color::TRANSPARENT);
            self.image.push(None);
            self.content_rect.push(Rect::ZERO);
            self.mask.push(None);
            self.scroll.push(Vec::new());
            self.background.push(Color::TRANSPARENT);
            self.valid.push(Region::new());
            self.invalid.push(Region::new());
            self.generation.push(0);
            idx
        };

        self.live += 1;
        self.dirty.mark(idx, dirty::TOPOLOGY);

        Some(LayerId {
            idx,
            generation: self.generation[idx as usize],
        })
    }

    /// Destroys a layer, freeing its slot for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the layer has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy_layer(&mut self, id: LayerId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy layer with children"
        );

        if self.parent[idx as usize] != INVALID {
            self.unlink_from_parent(idx);
        }
        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        self.invalidations.retain(|(l, _)| *l != id);

        self.live -= 1;
        self.free_list.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Returns whether the given handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: LayerId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Returns the number of live layers.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live
    }

    // -- Topology API --

    /// Replaces the child list of `parent` with `children`, in order.
    ///
    /// Children attached elsewhere are moved. Former children not in the new
    /// list are detached but stay alive. Setting an identical list is a
    /// no-op.
    ///
    /// # Panics
    ///
    /// Panics if any handle is stale.
    pub fn set_children(&mut self, parent: LayerId, children: &[LayerId]) {
        self.validate(parent);
        if self.children(parent).eq(children.iter().copied()) {
            return;
        }
        let p = parent.idx;
        let mut kept = Vec::new();
        let mut child = self.first_child[p as usize];
        while child != INVALID {
            let next = self.next_sibling[child as usize];
            if children.iter().any(|c| c.idx == child) {
                self.unlink_from_parent(child);
                kept.push(child);
            } else {
                self.detach_idx(child);
            }
            child = next;
        }
        for &c in children {
            self.validate(c);
            if self.parent[c.idx as usize] != INVALID {
                self.detach_idx(c.idx);
            }
            self.link_last(p, c.idx);
            if !kept.contains(&c.idx) {
                let _ = self.dirty.add_dependency(c.idx, p, dirty::TRANSFORM);
                let _ = self.dirty.add_dependency(c.idx, p, dirty::OPACITY);
                self.mark_subtree_inherited_dirty(c.idx);
            }
        }
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Removes `child` from its parent, if it has one.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn detach(&mut self, child: LayerId) {
        self.validate(child);
        if self.parent[child.idx as usize] != INVALID {
            self.detach_idx(child.idx);
        }
    }

    /// Returns the parent of a layer, if any.
    #[must_use]
    pub fn parent(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| LayerId {
            idx: p,
            generation: self.generation[p as usize],
        })
    }

    /// Returns an iterator over the direct children of a layer.
    #[must_use]
    pub fn children(&self, id: LayerId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the live layers with no parent.
    #[must_use]
    pub fn roots(&self) -> Vec<LayerId> {
        (0..self.len)
            .filter(|&idx| self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx))
            .map(|idx| LayerId {
                idx,
                generation: self.generation[idx as usize],
            })
            .collect()
    }

    // -- Property getters (read-only, no dirty marking) --

    /// Returns the kind of a layer.
    #[must_use]
    pub fn kind(&self, id: LayerId) -> LayerKind {
        self.validate(id);
        self.kind[id.idx as usize]
    }

    /// Returns the local transform of a layer.
    #[must_use]
    pub fn local_transform(&self, id: LayerId) -> Transform3d {
        self.validate(id);
        self.local_transform[id.idx as usize]
    }

    /// Returns the local opacity of a layer.
    #[must_use]
    pub fn local_opacity(&self, id: LayerId) -> f32 {
        self.validate(id);
        self.local_opacity[id.idx as usize]
    }

    /// Returns the clip rectangle of a layer, in its parent's space.
    #[must_use]
    pub fn clip(&self, id: LayerId) -> Option<Rect> {
        self.validate(id);
        self.clip[id.idx as usize]
    }

    /// Returns the visible region of a layer, in its own space.
    #[must_use]
    pub fn visible_region(&self, id: LayerId) -> &Region {
        self.validate(id);
        &self.visible[id.idx as usize]
    }

    /// Returns whether the layer's content covers its visible region opaquely.
    #[must_use]
    pub fn content_opaque(&self, id: LayerId) -> bool {
        self.validate(id);
        self.content_opaque[id.idx as usize]
    }

    /// Returns the fill color of a color layer.
    #[must_use]
    pub fn color(&self, id: LayerId) -> Color {
        self.validate(id);
        self.color[id.idx as usize]
    }

    /// Returns the image of an image layer.
    #[must_use]
    pub fn image(&self, id: LayerId) -> Option<ImageKey> {
        self.validate(id);
        self.image[id.idx as usize]
    }

    /// Returns the destination rectangle of a color or image layer.
    #[must_use]
    pub fn content_rect(&self, id: LayerId) -> Rect {
        self.validate(id);
        self.content_rect[id.idx as usize]
    }

    /// Returns the mask attached to a layer.
    #[must_use]
    pub fn mask(&self, id: LayerId) -> Option<MaskId> {
        self.validate(id);
        self.mask[id.idx as usize]
    }

    /// Returns the scroll metadata attached to a layer, innermost first.
    #[must_use]
    pub fn scroll_metadata(&self, id: LayerId) -> &[ScrollId] {
        self.validate(id);
        &self.scroll[id.idx as usize]
    }

    /// Returns the background color hint of a layer.
    #[must_use]
    pub fn background_color(&self, id: LayerId) -> Color {
        self.validate(id);
        self.background[id.idx as usize]
    }

    /// Returns the pixels of a raster layer holding up-to-date content.
    #[must_use]
    pub fn valid_region(&self, id: LayerId) -> &Region {
        self.validate(id);
        &self.valid[id.idx as usize]
    }

    /// Returns the pixels invalidated since the layer was last painted.
    #[must_use]
    pub fn invalid_region(&self, id: LayerId) -> &Region {
        self.validate(id);
        &self.invalid[id.idx as usize]
    }

    // -- Mutation API (auto-marks dirty, skips no-op writes) --

    /// Sets the local transform of a layer.
    pub fn set_transform(&mut self, id: LayerId, transform: Transform3d) {
        self.validate(id);
        if self.local_transform[id.idx as usize] == transform {
            return;
        }
        self.local_transform[id.idx as usize] = transform;
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the local opacity of a layer.
    pub fn set_opacity(&mut self, id: LayerId, opacity: f32) {
        self.validate(id);
        if self.local_opacity[id.idx as usize] == opacity {
            return;
        }
        self.local_opacity[id.idx as usize] = opacity;
        self.dirty.mark_with(id.idx, dirty::OPACITY, &EagerPolicy);
    }

    /// Sets the clip rectangle of a layer.
    pub fn set_clip(&mut self, id: LayerId, clip: Option<Rect>) {
        self.validate(id);
        if self.clip[id.idx as usize] == clip {
            return;
        }
        self.clip[id.idx as usize] = clip;
        self.dirty.mark(id.idx, dirty::CLIP);
    }

    /// Sets the visible region of a layer.
    ///
    /// Valid pixels outside the new visible region are discarded.
    pub fn set_visible_region(&mut self, id: LayerId, region: &Region) {
        self.validate(id);
        let i = id.idx as usize;
        if self.visible[i] == *region {
            return;
        }
        self.visible[i] = region.clone();
        self.valid[i].intersect(region);
        self.dirty.mark(id.idx, dirty::VISIBLE);
    }

    /// Marks whether the layer's content is opaque.
    pub fn set_content_opaque(&mut self, id: LayerId, opaque: bool) {
        self.validate(id);
        if self.content_opaque[id.idx as usize] == opaque {
            return;
        }
        self.content_opaque[id.idx as usize] = opaque;
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Sets the fill of a color layer.
    pub fn set_color(&mut self, id: LayerId, color: Color, rect: Rect) {
        self.validate(id);
        let i = id.idx as usize;
        if self.color[i] == color && self.content_rect[i] == rect {
            return;
        }
        self.color[i] = color;
        self.content_rect[i] = rect;
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Sets the content of an image layer.
    pub fn set_image(&mut self, id: LayerId, image: ImageKey, rect: Rect) {
        self.validate(id);
        let i = id.idx as usize;
        if self.image[i] == Some(image) && self.content_rect[i] == rect {
            return;
        }
        self.image[i] = Some(image);
        self.content_rect[i] = rect;
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Attaches or detaches a mask.
    pub fn set_mask(&mut self, id: LayerId, mask: Option<MaskId>) {
        self.validate(id);
        if self.mask[id.idx as usize] == mask {
            return;
        }
        self.mask[id.idx as usize] = mask;
        self.dirty.mark(id.idx, dirty::CLIP);
    }

    /// Replaces the scroll metadata of a layer.
    pub fn set_scroll_metadata(&mut self, id: LayerId, scroll: &[ScrollId]) {
        self.validate(id);
        let i = id.idx as usize;
        if self.scroll[i] == scroll {
            return;
        }
        self.scroll[i].clear();
        self.scroll[i].extend_from_slice(scroll);
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Sets the background color hint of a layer.
    pub fn set_background_color(&mut self, id: LayerId, color: Color) {
        self.validate(id);
        if self.background[id.idx as usize] == color {
            return;
        }
        self.background[id.idx as usize] = color;
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    // -- Raster bookkeeping --

    /// Marks `region` (layer pixels) of a raster layer as needing repaint.
    pub fn invalidate_region(&mut self, id: LayerId, region: &Region) {
        self.validate(id);
        if region.is_empty() {
            return;
        }
        let i = id.idx as usize;
        self.valid[i].subtract(region);
        self.invalid[i].union(region);
        self.invalidations.push((id, region.clone()));
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Marks the whole visible region of a raster layer as needing repaint.
    pub fn invalidate_all(&mut self, id: LayerId) {
        self.validate(id);
        let i = id.idx as usize;
        self.valid[i].clear();
        let visible = self.visible[i].clone();
        self.invalid[i].union(&visible);
        if !visible.is_empty() {
            self.invalidations.push((id, visible));
        }
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Returns the pixels a painter must draw: visible but not valid.
    #[must_use]
    pub fn region_to_draw(&self, id: LayerId) -> Region {
        self.validate(id);
        let i = id.idx as usize;
        let mut r = self.visible[i].clone();
        r.subtract(&self.valid[i]);
        r
    }

    /// Records that the whole visible region now holds fresh content.
    pub fn mark_painted(&mut self, id: LayerId) {
        self.validate(id);
        let i = id.idx as usize;
        self.valid[i] = self.visible[i].clone();
        self.invalid[i].clear();
    }

    /// Returns and clears the log of invalidations since the last call.
    ///
    /// Each entry is one `invalidate_region` or `invalidate_all` call that
    /// touched a non-empty area. Entries for destroyed layers are dropped.
    pub fn take_invalidations(&mut self) -> Vec<(LayerId, Region)> {
        core::mem::take(&mut self.invalidations)
    }

    // -- Change tracking --

    /// Drains the live layers whose `channel` properties changed since the
    /// last drain of that channel, in slot order.
    ///
    /// A transform or opacity change also reports every descendant of the
    /// changed layer.
    pub fn take_changed(&mut self, channel: Channel) -> Vec<LayerId> {
        let slots: Vec<u32> = self
            .dirty
            .drain(channel)
            .affected()
            .deterministic()
            .run()
            .collect();
        slots
            .into_iter()
            .filter(|idx| !self.free_list.contains(idx))
            .map(|idx| LayerId {
                idx,
                generation: self.generation[idx as usize],
            })
            .collect()
    }

    // -- Masks --

    /// Allocates a mask for the given geometry.
    pub fn create_mask(&mut self, geometry: &MaskGeometry) -> Option<MaskId> {
        let id = MaskId(self.next_mask);
        self.next_mask = self.next_mask.checked_add(1)?;
        self.masks.insert(id, geometry.clone());
        Some(id)
    }

    /// Frees a mask. Layers still referencing it keep a dangling id.
    pub fn release_mask(&mut self, mask: MaskId) {
        self.masks.remove(&mask);
    }

    /// Returns the geometry of a live mask.
    #[must_use]
    pub fn mask_geometry(&self, mask: MaskId) -> Option<&MaskGeometry> {
        self.masks.get(&mask)
    }

    /// Returns the number of live masks.
    #[must_use]
    pub fn mask_count(&self) -> usize {
        self.masks.len()
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    fn validate(&self, id: LayerId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale LayerId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Appends `c` as the last child of `p`. `c` must be unlinked.
    fn link_last(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;
        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
    }

    /// Unlinks `idx` from its parent and drops the inherited dependencies.
    fn detach_idx(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        self.unlink_from_parent(idx);
        self.dirty.remove_dependency(idx, p, dirty::TRANSFORM);
        self.dirty.remove_dependency(idx, p, dirty::OPACITY);
        self.mark_subtree_inherited_dirty(idx);
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Marks the subtree rooted at `idx` dirty for inherited channels.
    fn mark_subtree_inherited_dirty(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::TRANSFORM, &EagerPolicy);
        self.dirty.mark_with(idx, dirty::OPACITY, &EagerPolicy);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn tree_with(kind: LayerKind) -> (LayerTree, LayerId) {
        let mut tree = LayerTree::new();
        let id = tree.create_layer(kind).unwrap();
        (tree, id)
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut tree = LayerTree::new();
        let id1 = tree.create_layer(LayerKind::Painted).unwrap();
        tree.destroy_layer(id1);
        let id2 = tree.create_layer(LayerKind::Color).unwrap();
        assert!(!tree.is_alive(id1));
        assert!(tree.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
        assert_eq!(tree.kind(id2), LayerKind::Color);
    }

    #[test]
    fn budget_limits_live_layers() {
        let mut tree = LayerTree::new();
        tree.set_allocation_budget(Some(1));
        let a = tree.create_layer(LayerKind::Painted).unwrap();
        assert!(tree.create_layer(LayerKind::Painted).is_none());
        tree.destroy_layer(a);
        assert!(tree.create_layer(LayerKind::Painted).is_some());
    }

    #[test]
    fn set_children_orders_and_detaches() {
        let mut tree = LayerTree::new();
        let p = tree.create_layer(LayerKind::Container).unwrap();
        let a = tree.create_layer(LayerKind::Painted).unwrap();
        let b = tree.create_layer(LayerKind::Painted).unwrap();
        let c = tree.create_layer(LayerKind::Painted).unwrap();

        tree.set_children(p, &[a, b, c]);
        assert_eq!(tree.children(p).collect::<Vec<_>>(), vec![a, b, c]);

        tree.set_children(p, &[c, a]);
        assert_eq!(tree.children(p).collect::<Vec<_>>(), vec![c, a]);
        assert_eq!(tree.parent(b), None);
        assert!(tree.is_alive(b));
    }

    #[test]
    fn set_children_moves_between_parents() {
        let mut tree = LayerTree::new();
        let p1 = tree.create_layer(LayerKind::Container).unwrap();
        let p2 = tree.create_layer(LayerKind::Container).unwrap();
        let child = tree.create_layer(LayerKind::Painted).unwrap();
        tree.set_children(p1, &[child]);
        tree.set_children(p2, &[child]);
        assert_eq!(tree.parent(child), Some(p2));
        assert!(tree.children(p1).next().is_none());
    }

    #[test]
    #[should_panic(expected = "cannot destroy layer with children")]
    fn destroy_with_children_panics() {
        let mut tree = LayerTree::new();
        let parent = tree.create_layer(LayerKind::Container).unwrap();
        let child = tree.create_layer(LayerKind::Painted).unwrap();
        tree.set_children(parent, &[child]);
        tree.destroy_layer(parent);
    }

    #[test]
    #[should_panic(expected = "stale LayerId")]
    fn destroyed_handle_panics_on_set_transform() {
        let (mut tree, id) = tree_with(LayerKind::Painted);
        tree.destroy_layer(id);
        tree.set_transform(id, Transform3d::IDENTITY);
    }

    #[test]
    fn invalidation_shrinks_valid_region() {
        let (mut tree, id) = tree_with(LayerKind::Painted);
        let visible = Region::from_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        tree.set_visible_region(id, &visible);
        assert_eq!(tree.region_to_draw(id), visible);

        tree.mark_painted(id);
        assert!(tree.region_to_draw(id).is_empty());

        let dirty = Region::from_rect(Rect::new(10.0, 10.0, 20.0, 20.0));
        tree.invalidate_region(id, &dirty);
        assert_eq!(tree.region_to_draw(id), dirty);
        assert_eq!(tree.invalid_region(id), &dirty);
        assert_eq!(tree.take_invalidations(), vec![(id, dirty)]);
        assert!(tree.take_invalidations().is_empty());
    }

    #[test]
    fn shrinking_visible_region_discards_valid_pixels() {
        let (mut tree, id) = tree_with(LayerKind::Painted);
        tree.set_visible_region(id, &Region::from_rect(Rect::new(0.0, 0.0, 100.0, 100.0)));
        tree.mark_painted(id);
        tree.set_visible_region(id, &Region::from_rect(Rect::new(0.0, 0.0, 50.0, 100.0)));
        tree.set_visible_region(id, &Region::from_rect(Rect::new(0.0, 0.0, 100.0, 100.0)));
        assert_eq!(
            tree.region_to_draw(id),
            Region::from_rect(Rect::new(50.0, 0.0, 100.0, 100.0))
        );
    }

    #[test]
    fn masks_are_allocated_and_released() {
        let mut tree = LayerTree::new();
        let geometry = MaskGeometry::new(Vec::new());
        let m = tree.create_mask(&geometry).unwrap();
        assert_eq!(tree.mask_count(), 1);
        assert!(tree.mask_geometry(m).is_some());
        tree.release_mask(m);
        assert_eq!(tree.mask_count(), 0);
    }

    #[test]
    fn transform_change_reports_descendants() {
        let mut tree = LayerTree::new();
        let parent = tree.create_layer(LayerKind::Container).unwrap();
        let child = tree.create_layer(LayerKind::Painted).unwrap();
        tree.set_children(parent, &[child]);
        let _ = tree.take_changed(dirty::TRANSFORM);
        let _ = tree.take_changed(dirty::OPACITY);

        tree.set_transform(parent, Transform3d::from_translation(4.0, 0.0, 0.0));
        assert_eq!(tree.take_changed(dirty::TRANSFORM), vec![parent, child]);
        assert!(tree.take_changed(dirty::TRANSFORM).is_empty(), "drained");

        tree.set_transform(parent, Transform3d::from_translation(4.0, 0.0, 0.0));
        tree.set_clip(child, Some(Rect::new(0.0, 0.0, 8.0, 8.0)));
        assert!(tree.take_changed(dirty::TRANSFORM).is_empty(), "same transform");
        assert_eq!(tree.take_changed(dirty::CLIP), vec![child]);
    }

    #[test]
    fn destroyed_layers_are_not_reported() {
        let (mut tree, id) = tree_with(LayerKind::Color);
        tree.set_color(id, Color::BLACK, Rect::new(0.0, 0.0, 1.0, 1.0));
        tree.destroy_layer(id);
        assert!(tree.take_changed(dirty::CONTENT).is_empty());
        assert!(tree.take_changed(dirty::TOPOLOGY).is_empty());
    }
}
