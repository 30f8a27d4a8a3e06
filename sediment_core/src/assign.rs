// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Assignment of mergeable items to painted-layer accumulators.
//!
//! The tree has one node per animated geometry root seen in the container.
//! Each node owns a bottom-to-top stack of accumulators for items moving
//! with that root, and child nodes for descendant roots. A child node's
//! content is drawn above everything its parent has accumulated so far, so
//! when a node is finished its parent records that fact: a clipped child
//! adds its clip to the parent's visible-above region, an unclipped one makes
//! the parent's whole stack unmergeable.
//!
//! Finished accumulators are queued in [`AssignmentTree::finished`] together
//! with the opaque color known to be behind them; the builder turns them
//! into layers.

use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::{Rect, Vec2};

use crate::accumulator::PaintedLayerAccumulator;
use crate::color::Color;
use crate::item::{AgrId, AnimationRoots};
use crate::region::{Region, rects_overlap, scale_rect_round_out};

/// An accumulator that can no longer receive items.
#[derive(Debug)]
pub(crate) struct FinishedAccumulator {
    pub(crate) acc: PaintedLayerAccumulator,
    /// Opaque color behind the accumulator's visible region, or transparent.
    pub(crate) background: Color,
}

#[derive(Debug)]
struct Node {
    agr: AgrId,
    parent: Option<usize>,
    children: Vec<usize>,
    stack: Vec<PaintedLayerAccumulator>,
    /// Clip relative to the parent root, in container pixels.
    clip: Option<Rect>,
    /// Something unclipped was drawn above this node's background.
    all_drawing_above_background: bool,
    visible_above_background: Region,
}

/// Per-container tree of accumulator stacks keyed by animated geometry root.
#[derive(Debug)]
pub(crate) struct AssignmentTree<'r> {
    roots: &'r AnimationRoots,
    root_agr: AgrId,
    scale: Vec2,
    background: Color,
    max_visible_above_rects: usize,
    nodes: Vec<Option<Node>>,
    by_agr: HashMap<AgrId, usize>,
    top: Vec<usize>,
    pub(crate) finished: Vec<FinishedAccumulator>,
}

impl<'r> AssignmentTree<'r> {
    pub(crate) fn new(
        roots: &'r AnimationRoots,
        root_agr: AgrId,
        scale: Vec2,
        background: Color,
        max_visible_above_rects: usize,
    ) -> Self {
        Self {
            roots,
            root_agr,
            scale,
            background: if background.is_opaque() {
                background
            } else {
                Color::TRANSPARENT
            },
            max_visible_above_rects,
            nodes: Vec::new(),
            by_agr: HashMap::new(),
            top: Vec::new(),
            finished: Vec::new(),
        }
    }

    /// Returns the accumulator an item with `visible` pixels under `agr`
    /// should join, creating one with `make` if none is usable.
    pub(crate) fn find_or_create(
        &mut self,
        agr: AgrId,
        visible: Rect,
        fixed_anchor: Option<AgrId>,
        make: impl FnOnce() -> PaintedLayerAccumulator,
    ) -> &mut PaintedLayerAccumulator {
        self.finish_potentially_intersecting(agr, Some(visible));
        let n = self.ensure_node(agr);
        if fixed_anchor.is_some()
            && self.node(n).stack.last().is_none_or(|top| top.fixed_anchor != fixed_anchor)
        {
            self.set_all_drawing_above(n);
        }

        let node = self.node(n);
        let mut lowest_usable = None;
        for (i, acc) in node.stack.iter().enumerate().rev() {
            if acc.visible_above.intersects_rect(visible) {
                break;
            }
            if acc.fixed_anchor == fixed_anchor {
                lowest_usable = Some(i);
            }
            if acc.visible.intersects_rect(visible) {
                break;
            }
        }
        let stack = &mut self.node_mut(n).stack;
        let i = match lowest_usable {
            Some(i) => i,
            None => {
                stack.push(make());
                stack.len() - 1
            }
        };
        &mut stack[i]
    }

    /// Records that a layer not managed by this tree is drawn at this point
    /// in z-order, covering `rect` (or everything when `None`).
    ///
    /// Returns the opaque color known to be behind `rect` when
    /// `want_background` is set, transparent otherwise.
    pub(crate) fn adding_own_layer(
        &mut self,
        agr: AgrId,
        rect: Option<Rect>,
        want_background: bool,
    ) -> Color {
        self.finish_potentially_intersecting(agr, rect);
        let n = self.ensure_node(agr);
        match rect {
            Some(r) => {
                let color = if want_background {
                    let under = self.node(n).stack.len();
                    self.opaque_background_color(n, &Region::from_rect(r), under)
                } else {
                    Color::TRANSPARENT
                };
                self.add_to_visible_above(n, r);
                color
            }
            None => {
                let color = if want_background {
                    self.opaque_background_covering_everything(n)
                } else {
                    Color::TRANSPARENT
                };
                self.set_all_drawing_above(n);
                color
            }
        }
    }

    /// Finishes every node, children before parents.
    pub(crate) fn finish(&mut self) {
        for n in core::mem::take(&mut self.top) {
            self.finish_node(n, false);
        }
    }

    // -- Nodes --

    fn node(&self, n: usize) -> &Node {
        match &self.nodes[n] {
            Some(node) => node,
            None => unreachable!("finished node {n} still referenced"),
        }
    }

    fn node_mut(&mut self, n: usize) -> &mut Node {
        match &mut self.nodes[n] {
            Some(node) => node,
            None => unreachable!("finished node {n} still referenced"),
        }
    }

    /// The parent of `agr` within this container.
    fn parent_agr(&self, agr: AgrId) -> Option<AgrId> {
        if agr == self.root_agr {
            None
        } else {
            self.roots.parent(agr)
        }
    }

    fn clip_px(&self, agr: AgrId) -> Option<Rect> {
        if agr == self.root_agr {
            return None;
        }
        self.roots.clip(agr).map(|c| scale_rect_round_out(c, self.scale))
    }

    fn ensure_node(&mut self, agr: AgrId) -> usize {
        // Collect the missing part of the chain, then create top-down.
        let mut missing = Vec::new();
        let mut parent = None;
        let mut cursor = Some(agr);
        let mut budget = self.nodes.len() + 64;
        while let Some(a) = cursor {
            if let Some(&n) = self.by_agr.get(&a) {
                parent = Some(n);
                break;
            }
            if budget == 0 || missing.contains(&a) {
                break;
            }
            budget -= 1;
            missing.push(a);
            cursor = self.parent_agr(a);
        }
        for a in missing.into_iter().rev() {
            let clip = self.clip_px(a);
            let n = self.nodes.len();
            if let Some(p) = parent {
                debug_assert!(
                    self.node(p).children.iter().all(|&c| {
                        match (self.node(c).clip, clip) {
                            (Some(x), Some(y)) => !rects_overlap(x, y),
                            _ => false,
                        }
                    }),
                    "sibling clip rects must be disjoint"
                );
                self.node_mut(p).children.push(n);
            } else {
                self.top.push(n);
            }
            self.nodes.push(Some(Node {
                agr: a,
                parent,
                children: Vec::new(),
                stack: Vec::new(),
                clip,
                all_drawing_above_background: false,
                visible_above_background: Region::new(),
            }));
            self.by_agr.insert(a, n);
            parent = Some(n);
        }
        match parent {
            Some(n) => n,
            None => unreachable!("ensure_node created no node"),
        }
    }

    /// Finishes nodes that could overlap content about to be added under
    /// `agr` within `rect`, so that content stays above them.
    fn finish_potentially_intersecting(&mut self, agr: AgrId, rect: Option<Rect>) {
        let mut child_of_common = None;
        let mut ancestor = None;
        let mut cursor = Some(agr);
        let mut budget = self.nodes.len() + 64;
        while let Some(a) = cursor {
            if let Some(&n) = self.by_agr.get(&a) {
                ancestor = Some(n);
                break;
            }
            if budget == 0 {
                break;
            }
            budget -= 1;
            child_of_common = Some(a);
            cursor = self.parent_agr(a);
        }

        let Some(n) = ancestor else {
            // A new top-level root: everything so far is below it.
            for n in core::mem::take(&mut self.top) {
                self.finish_node(n, false);
            }
            return;
        };
        if self.node(n).agr == agr {
            match rect {
                Some(r) => self.finish_children_intersecting(n, r),
                None => self.finish_all_children(n),
            }
            return;
        }
        let clip = child_of_common.and_then(|c| self.clip_px(c));
        match clip {
            Some(c) => self.finish_children_intersecting(n, c),
            None => self.finish_all_children(n),
        }
    }

    fn finish_children_intersecting(&mut self, n: usize, rect: Rect) {
        for c in self.node(n).children.clone() {
            if self.node(c).clip.is_none_or(|clip| rects_overlap(clip, rect)) {
                self.finish_node(c, true);
            }
        }
    }

    fn finish_all_children(&mut self, n: usize) {
        for c in self.node(n).children.clone() {
            self.finish_node(c, true);
        }
    }

    fn finish_node(&mut self, n: usize, parent_needs_visible_above: bool) {
        for c in self.node(n).children.clone() {
            self.finish_node(c, false);
        }
        self.pop_all(n);
        let (agr, parent, clip) = {
            let node = self.node(n);
            (node.agr, node.parent, node.clip)
        };
        if let Some(p) = parent {
            if parent_needs_visible_above {
                match clip {
                    Some(c) => self.add_to_visible_above(p, c),
                    None => self.set_all_drawing_above(p),
                }
            }
            self.node_mut(p).children.retain(|&c| c != n);
        } else {
            self.top.retain(|&t| t != n);
        }
        self.by_agr.remove(&agr);
        self.nodes[n] = None;
    }

    // -- Stack maintenance --

    fn pop_all(&mut self, n: usize) {
        while let Some(i) = self.node(n).stack.len().checked_sub(1) {
            let background = {
                let target = &self.node(n).stack[i].visible;
                self.opaque_background_color(n, target, i)
            };
            if let Some(acc) = self.node_mut(n).stack.pop() {
                self.finished.push(FinishedAccumulator { acc, background });
            }
        }
    }

    fn set_all_drawing_above(&mut self, n: usize) {
        self.pop_all(n);
        let node = self.node_mut(n);
        node.all_drawing_above_background = true;
        node.visible_above_background.clear();
    }

    fn add_to_visible_above(&mut self, n: usize, rect: Rect) {
        let max = self.max_visible_above_rects;
        let node = self.node_mut(n);
        let region = match node.stack.last_mut() {
            Some(top) => &mut top.visible_above,
            None => &mut node.visible_above_background,
        };
        region.union_rect(rect);
        region.simplify_outward(max);
    }

    // -- Background color search --

    /// Finds the opaque color behind `target`, looking only at accumulators
    /// below index `under` and then at ancestors.
    fn opaque_background_color(&self, n: usize, target: &Region, under: usize) -> Color {
        let node = self.node(n);
        for acc in node.stack[..under].iter().rev() {
            if acc.visible_above.intersects(target) {
                return Color::TRANSPARENT;
            }
            if !acc.visible.intersects(target) {
                continue;
            }
            return acc.color_under(target.bounds());
        }
        if node.all_drawing_above_background || node.visible_above_background.intersects(target) {
            return Color::TRANSPARENT;
        }
        self.opaque_background_in_parent(n)
    }

    fn opaque_background_in_parent(&self, n: usize) -> Color {
        let node = self.node(n);
        match node.parent {
            Some(p) => match node.clip {
                Some(clip) => {
                    let under = self.node(p).stack.len();
                    self.opaque_background_color(p, &Region::from_rect(clip), under)
                }
                None => self.opaque_background_covering_everything(p),
            },
            None => self.background,
        }
    }

    fn opaque_background_covering_everything(&self, n: usize) -> Color {
        let node = self.node(n);
        if !node.stack.is_empty()
            || node.all_drawing_above_background
            || !node.visible_above_background.is_empty()
        {
            return Color::TRANSPARENT;
        }
        self.opaque_background_in_parent(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::AssignedItem;
    use crate::config::BuilderConfig;
    use crate::item::{AnimationRoot, DisplayItem, ItemKey};

    const ONE: Vec2 = Vec2::new(1.0, 1.0);

    fn roots() -> AnimationRoots {
        let mut roots = AnimationRoots::new();
        roots.insert(AgrId(0), AnimationRoot::TOP);
        let clipped = |clip: Rect| AnimationRoot::child_of(AgrId(0), Vec2::ZERO).with_clip(clip);
        roots.insert(AgrId(1), clipped(Rect::new(0.0, 0.0, 50.0, 50.0)));
        roots.insert(AgrId(2), clipped(Rect::new(60.0, 0.0, 100.0, 50.0)));
        roots.insert(AgrId(3), AnimationRoot::child_of(AgrId(0), Vec2::ZERO));
        roots
    }

    /// Places `item` and returns the slot of the accumulator it joined.
    fn place(tree: &mut AssignmentTree<'_>, slots: &mut usize, item: &DisplayItem) -> usize {
        let visible = item.clipped_visible();
        let next = *slots;
        let acc = tree.find_or_create(item.agr, visible, item.fixed_anchor, || {
            PaintedLayerAccumulator::new(item.agr, item.fixed_anchor, next)
        });
        if acc.slot == next {
            *slots += 1;
        }
        let slot = acc.slot;
        acc.accumulate(
            AssignedItem::new(0, item, visible, ONE),
            item,
            &item.opaque_region(),
            &BuilderConfig::new(),
        );
        slot
    }

    fn generic(index: u32, r: Rect, agr: u32) -> DisplayItem {
        DisplayItem::generic(ItemKey::new(1, index), r, AgrId(agr))
    }

    #[test]
    fn non_overlapping_items_share_an_accumulator() {
        let roots = roots();
        let mut tree = AssignmentTree::new(&roots, AgrId(0), ONE, Color::TRANSPARENT, 8);
        let mut slots = 0;
        let a = place(&mut tree, &mut slots, &generic(0, Rect::new(0.0, 0.0, 10.0, 10.0), 0));
        let b = place(&mut tree, &mut slots, &generic(1, Rect::new(20.0, 0.0, 30.0, 10.0), 0));
        assert_eq!(a, b);
    }

    #[test]
    fn own_layer_in_between_forces_new_accumulator() {
        let roots = roots();
        let mut tree = AssignmentTree::new(&roots, AgrId(0), ONE, Color::TRANSPARENT, 8);
        let mut slots = 0;
        let a = place(&mut tree, &mut slots, &generic(0, Rect::new(0.0, 0.0, 100.0, 100.0), 0));
        let _ = tree.adding_own_layer(AgrId(0), Some(Rect::new(10.0, 10.0, 20.0, 20.0)), false);
        let b = place(&mut tree, &mut slots, &generic(1, Rect::new(15.0, 15.0, 25.0, 25.0), 0));
        let c = place(&mut tree, &mut slots, &generic(2, Rect::new(50.0, 50.0, 60.0, 60.0), 0));
        assert_ne!(a, b, "must stay above the own layer");
        assert_eq!(a, c, "unaffected area may still merge below");
    }

    #[test]
    fn fixed_item_seals_the_stack_below() {
        let roots = roots();
        let mut tree = AssignmentTree::new(&roots, AgrId(0), ONE, Color::TRANSPARENT, 8);
        let mut slots = 0;
        let bottom = place(&mut tree, &mut slots, &generic(0, Rect::new(0.0, 0.0, 10.0, 10.0), 0));
        let fixed = generic(1, Rect::new(0.0, 0.0, 10.0, 10.0), 0).fixed_to(AgrId(0));
        let top = place(&mut tree, &mut slots, &fixed);
        let again = place(&mut tree, &mut slots, &generic(2, Rect::new(40.0, 40.0, 50.0, 50.0), 0));
        assert_ne!(bottom, top);
        assert_ne!(again, bottom, "fixed content made the bottom stack unmergeable");
    }

    #[test]
    fn clipped_child_finish_keeps_parent_mergeable_elsewhere() {
        let roots = roots();
        let mut tree = AssignmentTree::new(&roots, AgrId(0), ONE, Color::TRANSPARENT, 8);
        let mut slots = 0;
        let bg = place(&mut tree, &mut slots, &generic(0, Rect::new(0.0, 0.0, 200.0, 200.0), 0));
        let _ = place(&mut tree, &mut slots, &generic(1, Rect::new(0.0, 0.0, 40.0, 40.0), 1));
        // Unclipped sibling root finishes the clipped child first.
        let _ = place(&mut tree, &mut slots, &generic(2, Rect::new(0.0, 0.0, 40.0, 40.0), 3));
        let far = generic(3, Rect::new(150.0, 150.0, 160.0, 160.0), 0);
        let outside = place(&mut tree, &mut slots, &far);
        assert_ne!(outside, bg, "unclipped child covers the parent");
        tree.finish();
        assert_eq!(tree.finished.len(), slots);
    }

    #[test]
    fn background_color_found_through_parent() {
        let roots = roots();
        let mut tree = AssignmentTree::new(&roots, AgrId(0), ONE, Color::WHITE, 8);
        let c = tree.adding_own_layer(AgrId(1), Some(Rect::new(0.0, 0.0, 10.0, 10.0)), true);
        assert_eq!(c, Color::WHITE);

        let mut slots = 0;
        let bg = DisplayItem::solid_color(
            ItemKey::new(2, 0),
            Rect::new(0.0, 0.0, 200.0, 200.0),
            Color::BLACK,
            AgrId(0),
        );
        let _ = place(&mut tree, &mut slots, &bg);
        let c = tree.adding_own_layer(AgrId(0), Some(Rect::new(100.0, 100.0, 110.0, 110.0)), true);
        assert_eq!(c, Color::BLACK);
        let c = tree.adding_own_layer(AgrId(0), None, true);
        assert_eq!(c, Color::TRANSPARENT);
    }
}
