// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Occlusion culling over a container's committed layers.
//!
//! Layers are visited from the top of the paint order down. Within a group of
//! layers that move together (same animated geometry root and fixed-position
//! anchor) the opaque area of everything above a layer is removed from its
//! visible region. Layers in different groups can move relative to each
//! other, so they never occlude each other, except that an opaque layer
//! covering the whole container hides everything below it.

use alloc::vec::Vec;

use kurbo::{Rect, Vec2};

use crate::backend::LayerBackend;
use crate::item::{AgrId, AnimationRoots, ScrollId};
use crate::layer::LayerId;
use crate::region::{Region, scale_rect_round_out};

/// A layer placed in a container, awaiting culling.
#[derive(Clone, Debug)]
pub(crate) struct LayerEntry {
    pub(crate) layer: LayerId,
    pub(crate) agr: AgrId,
    pub(crate) fixed_anchor: Option<AgrId>,
    /// Clip rectangle in container pixels.
    pub(crate) clip: Option<Rect>,
    /// Visible region in container pixels.
    pub(crate) visible: Region,
    /// Opaque region in container pixels.
    pub(crate) opaque: Region,
    /// Offset from container pixels to layer space, when the layer's
    /// transform is a translation.
    pub(crate) origin: Option<Vec2>,
    /// Layer-space visible region used when `origin` is `None`.
    pub(crate) layer_visible: Region,
    /// Scroll metadata carried by the item itself.
    pub(crate) own_scroll: Option<ScrollId>,
}

impl LayerEntry {
    /// An entry whose layer space is container pixels shifted by `origin`.
    pub(crate) fn translated(
        layer: LayerId,
        agr: AgrId,
        fixed_anchor: Option<AgrId>,
        origin: Vec2,
    ) -> Self {
        Self {
            layer,
            agr,
            fixed_anchor,
            clip: None,
            visible: Region::new(),
            opaque: Region::new(),
            origin: Some(origin),
            layer_visible: Region::new(),
            own_scroll: None,
        }
    }
}

/// Container-wide inputs of the occlusion pass.
#[derive(Debug)]
pub(crate) struct OcclusionParams<'a> {
    pub(crate) roots: &'a AnimationRoots,
    pub(crate) root_agr: AgrId,
    pub(crate) scale: Vec2,
    /// Container bounds in pixels.
    pub(crate) bounds_px: Rect,
    /// Run culling; when off, visible regions are applied unchanged.
    pub(crate) cull: bool,
}

/// Intersection of the clips of `agr` and its ancestors below `root_agr`, in
/// container pixels.
pub(crate) fn chain_clip_px(
    roots: &AnimationRoots,
    agr: AgrId,
    root_agr: AgrId,
    scale: Vec2,
) -> Option<Rect> {
    roots
        .chain(agr)
        .take_while(|&a| a != root_agr)
        .filter_map(|a| roots.clip(a))
        .map(|c| scale_rect_round_out(c, scale))
        .reduce(|a, b| a.intersect(b))
}

/// Culls `entries` (in paint order), writes the final visible regions and
/// scroll metadata to the backend, and returns the opaque region of the
/// container's own root group.
pub(crate) fn cull_and_apply<B: LayerBackend + ?Sized>(
    entries: &mut [LayerEntry],
    params: &OcclusionParams<'_>,
    backend: &mut B,
) -> Region {
    let mut groups: Vec<((AgrId, Option<AgrId>), Region)> = Vec::new();
    let mut hide_all = false;

    for e in entries.iter_mut().rev() {
        let group = (e.agr, e.fixed_anchor);
        if params.cull {
            if hide_all {
                e.visible.clear();
            } else if let Some((_, above)) = groups.iter().find(|(g, _)| *g == group) {
                e.visible.subtract(above);
            }

            // Fixed content that is also clipped may be moved by the
            // compositor relative to its clip.
            let occludes = !(e.fixed_anchor.is_some() && e.clip.is_some());
            if occludes && !e.opaque.is_empty() {
                let mut clipped = e.opaque.clone();
                if let Some(c) = e.clip {
                    clipped.intersect_rect(c);
                }
                let mut within_scroll_clips = clipped.clone();
                if let Some(c) = chain_clip_px(params.roots, e.agr, params.root_agr, params.scale) {
                    within_scroll_clips.intersect_rect(c);
                }
                if within_scroll_clips.contains_rect(params.bounds_px) {
                    hide_all = true;
                }
                match groups.iter_mut().find(|(g, _)| *g == group) {
                    Some((_, region)) => region.union(&clipped),
                    None => groups.push((group, clipped)),
                }
            }
        }

        let layer_visible = match e.origin {
            Some(origin) => e.visible.translated(-origin),
            None if e.visible.is_empty() => Region::new(),
            None => e.layer_visible.clone(),
        };
        backend.set_visible_region(e.layer, &layer_visible);

        let scroll: Vec<ScrollId> = e
            .own_scroll
            .into_iter()
            .chain(
                params
                    .roots
                    .chain(e.agr)
                    .take_while(|&a| a != params.root_agr)
                    .filter_map(|a| params.roots.get(a).and_then(|r| r.scroll)),
            )
            .collect();
        backend.set_scroll_metadata(e.layer, &scroll);
    }

    groups
        .into_iter()
        .find(|(g, _)| *g == (params.root_agr, None))
        .map(|(_, r)| r)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::AnimationRoot;
    use crate::layer::{LayerKind, LayerTree};

    const ONE: Vec2 = Vec2::new(1.0, 1.0);
    const BOUNDS: Rect = Rect::new(0.0, 0.0, 100.0, 100.0);

    fn entry(tree: &mut LayerTree, agr: u32, visible: Rect, opaque: Option<Rect>) -> LayerEntry {
        let layer = tree.create_layer(LayerKind::Painted).unwrap();
        let mut e = LayerEntry::translated(layer, AgrId(agr), None, Vec2::ZERO);
        e.visible = Region::from_rect(visible);
        e.opaque = opaque.map(Region::from_rect).unwrap_or_default();
        e
    }

    fn params(roots: &AnimationRoots) -> OcclusionParams<'_> {
        OcclusionParams {
            roots,
            root_agr: AgrId(0),
            scale: ONE,
            bounds_px: BOUNDS,
            cull: true,
        }
    }

    #[test]
    fn opaque_cover_empties_background() {
        let roots = AnimationRoots::new();
        let mut tree = LayerTree::new();
        let top = Rect::new(0.0, 0.0, 100.0, 50.0);
        let bottom = Rect::new(0.0, 50.0, 100.0, 100.0);
        let mut entries = alloc::vec![
            entry(&mut tree, 0, BOUNDS, Some(BOUNDS)),
            entry(&mut tree, 0, top, Some(top)),
            entry(&mut tree, 0, bottom, Some(bottom)),
        ];
        let opaque = cull_and_apply(&mut entries, &params(&roots), &mut tree);
        assert!(entries[0].visible.is_empty());
        assert!(tree.visible_region(entries[0].layer).is_empty());
        assert!(!entries[1].visible.is_empty());
        assert!(opaque.contains_rect(BOUNDS));
    }

    #[test]
    fn different_roots_do_not_occlude() {
        let mut roots = AnimationRoots::new();
        roots.insert(AgrId(1), AnimationRoot::child_of(AgrId(0), Vec2::ZERO));
        let mut tree = LayerTree::new();
        let small = Rect::new(0.0, 0.0, 50.0, 50.0);
        let mut entries = alloc::vec![
            entry(&mut tree, 0, small, None),
            entry(&mut tree, 1, small, Some(small)),
        ];
        let _ = cull_and_apply(&mut entries, &params(&roots), &mut tree);
        assert_eq!(entries[0].visible, Region::from_rect(small));
    }

    #[test]
    fn covered_area_stays_covered() {
        let roots = AnimationRoots::new();
        let mut tree = LayerTree::new();
        let cover = Rect::new(20.0, 20.0, 60.0, 60.0);
        let mut entries = alloc::vec![
            entry(&mut tree, 0, BOUNDS, None),
            entry(&mut tree, 0, cover, Some(cover)),
        ];
        let _ = cull_and_apply(&mut entries, &params(&roots), &mut tree);
        let mut union = entries[0].visible.clone();
        union.union(&entries[1].visible);
        union.union(&entries[1].opaque);
        assert!(union.contains_rect(BOUNDS));
        assert!(!entries[0].visible.intersects_rect(Rect::new(30.0, 30.0, 40.0, 40.0)));
    }

    #[test]
    fn scroll_metadata_follows_root_chain() {
        let mut roots = AnimationRoots::new();
        roots.insert(
            AgrId(1),
            AnimationRoot::child_of(AgrId(0), Vec2::ZERO).with_scroll(ScrollId(7)),
        );
        roots.insert(
            AgrId(2),
            AnimationRoot::child_of(AgrId(1), Vec2::ZERO).with_scroll(ScrollId(8)),
        );
        let mut tree = LayerTree::new();
        let mut entries = alloc::vec![entry(&mut tree, 2, BOUNDS, None)];
        let _ = cull_and_apply(&mut entries, &params(&roots), &mut tree);
        assert_eq!(tree.scroll_metadata(entries[0].layer), &[ScrollId(8), ScrollId(7)]);
    }
}
