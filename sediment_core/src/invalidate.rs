// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-item invalidation for recycled raster layers.
//!
//! Regions are computed in container space and converted to a layer's pixel
//! space with [`to_layer_pixels`]. Before diffing, the old snapshot is moved
//! by however much the item's animated geometry root moved, because the
//! layer moved with it: a pure scroll repaints nothing.

use kurbo::Vec2;

use crate::item::DisplayItem;
use crate::region::Region;
use crate::registry::EntryState;

/// Area to repaint for an item placed in a layer for the first time.
pub(crate) fn first_paint_region(item: &DisplayItem) -> Region {
    Region::from_rect(item.clipped_bounds())
}

/// Area to repaint for an item that was in the same layer last time.
///
/// `offset` is the current offset of the item's animated geometry root.
pub(crate) fn item_invalid_region(old: &EntryState, item: &DisplayItem, offset: Vec2) -> Region {
    let shift = offset - old.agr_offset;
    let old_geometry = old.geometry.translated(shift);
    let old_clip = old.clip.translated(shift);

    if item.flags.invalid {
        let mut combined = Region::from_rect(old_clip.apply_to_rect(old_geometry.bounds));
        combined.union_rect(item.clipped_bounds());
        return combined;
    }

    let mut combined = item.geometry().diff(&old_geometry);
    combined.union(&item.clip.difference(&old_clip, old_geometry.bounds, item.bounds));
    if let Some(extra) = item.extra_invalid {
        combined.union_rect(extra);
    }
    if let (Some(a), Some(b)) = (old_clip.rect, item.clip.rect) {
        let mut clips = Region::from_rect(a);
        clips.union_rect(b);
        combined.intersect(&clips);
    }
    combined
}

/// Converts a container-space region to the pixels of a layer whose origin
/// sits at `origin` container pixels.
pub(crate) fn to_layer_pixels(region: &Region, scale: Vec2, origin: Vec2) -> Region {
    region.scale_round_out(scale).translated(-origin)
}
