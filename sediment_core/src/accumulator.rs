// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transient state of one candidate painted layer.

use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::{Rect, Vec2};

use crate::color::Color;
use crate::config::BuilderConfig;
use crate::item::{AgrId, DisplayItem, ImageKey, ItemClip, ItemKind, LayerState};
use crate::layer::LayerTree;
use crate::manager::LayerManager;
use crate::region::{
    Region, rect_contains, rects_overlap, scale_rect_round_in, scale_rect_round_out,
};

/// One item placed in an accumulator.
#[derive(Debug)]
pub(crate) struct AssignedItem {
    /// Index into the container's merged item list.
    pub(crate) index: usize,
    /// Visible rect in container pixels.
    pub(crate) visible_px: Rect,
    /// Unclipped bounds in container pixels, rounded out.
    pub(crate) bounds_px: Rect,
    /// Uniform fill color and the whole pixels it covers.
    pub(crate) uniform: Option<(Color, Rect)>,
    pub(crate) layer_state: LayerState,
    /// Private manager of an inactive item, carried to the registry.
    pub(crate) inactive: Option<Box<LayerManager<LayerTree>>>,
    /// Area the private manager repainted, in container space.
    pub(crate) inactive_invalid: Region,
}

impl AssignedItem {
    pub(crate) fn new(index: usize, item: &DisplayItem, visible_px: Rect, scale: Vec2) -> Self {
        let uniform = item
            .uniform_color()
            .map(|c| (c, scale_rect_round_in(item.clipped_bounds(), scale)));
        Self {
            index,
            visible_px,
            bounds_px: scale_rect_round_out(item.bounds, scale),
            uniform,
            layer_state: item.layer_state(),
            inactive: None,
            inactive_invalid: Region::new(),
        }
    }
}

/// Collapses a whole accumulator into a single color, while possible.
#[derive(Clone, Copy, Debug, PartialEq)]
enum SolidState {
    Empty,
    Color(Color),
    Mixed,
}

/// A painted layer under construction.
///
/// Regions are in container pixels. `opaque` is always contained in
/// `visible`.
#[derive(Debug)]
pub(crate) struct PaintedLayerAccumulator {
    pub(crate) agr: AgrId,
    pub(crate) fixed_anchor: Option<AgrId>,
    /// Position reserved in the container's child list.
    pub(crate) slot: usize,
    pub(crate) visible: Region,
    pub(crate) opaque: Region,
    /// Area drawn above this accumulator by layers that are not part of it.
    pub(crate) visible_above: Region,
    pub(crate) items: Vec<AssignedItem>,
    solid: SolidState,
    image: Option<(ImageKey, Rect)>,
    common_clip_count: Option<usize>,
    first_clip: Option<ItemClip>,
}

impl PaintedLayerAccumulator {
    pub(crate) fn new(agr: AgrId, fixed_anchor: Option<AgrId>, slot: usize) -> Self {
        Self {
            agr,
            fixed_anchor,
            slot,
            visible: Region::new(),
            opaque: Region::new(),
            visible_above: Region::new(),
            items: Vec::new(),
            solid: SolidState::Empty,
            image: None,
            common_clip_count: None,
            first_clip: None,
        }
    }

    /// Adds an item on top of everything accumulated so far.
    ///
    /// `visible_px` is the item's clipped visible rect and `opaque_px` its
    /// clipped opaque region, both in container pixels.
    pub(crate) fn accumulate(
        &mut self,
        entry: AssignedItem,
        item: &DisplayItem,
        opaque_px: &Region,
        config: &BuilderConfig,
    ) {
        let visible_px = entry.visible_px;
        self.update_common_clip_prefix(&item.clip);

        if !matches!(self.solid, SolidState::Color(_))
            && self.image.is_none()
            && self.opaque.contains_rect(visible_px)
            && self.visible.contains_rect(visible_px)
        {
            // Drawn entirely over content this layer already paints opaquely.
            self.items.push(entry);
            return;
        }

        self.image = match item.kind {
            ItemKind::Image { image, .. }
                if rect_contains(visible_px, self.visible.bounds())
                    && opaque_px.contains_rect(visible_px) =>
            {
                Some((image, entry.bounds_px))
            }
            _ => None,
        };

        let uniform = item.uniform_color();
        if uniform.is_none_or(|c| !c.is_transparent()) {
            let covering = entry
                .uniform
                .filter(|(_, covered)| rect_contains(*covered, visible_px))
                .map(|(c, _)| c);
            self.solid = match (self.solid, covering) {
                (_, Some(c)) if self.visible.is_empty() => SolidState::Color(c),
                (SolidState::Color(below), Some(c))
                    if self.visible == Region::from_rect(visible_px) =>
                {
                    SolidState::Color(c.over(below))
                }
                _ => SolidState::Mixed,
            };
            self.visible.union_rect(visible_px);
            self.visible.simplify_outward(config.max_visible_rects);
        }

        let mut opaque = opaque_px.clone();
        opaque.intersect_rect(visible_px);
        for &r in opaque.rects() {
            let mut grown = self.opaque.clone();
            grown.union_rect(r);
            if grown.rect_count() <= config.max_opaque_rects {
                self.opaque = grown;
            }
        }
        debug_assert!(self.visible.contains(&self.opaque), "opaque region escaped visible region");

        self.items.push(entry);
    }

    /// Shrinks the number of leading rounded clip segments shared by every
    /// item.
    pub(crate) fn update_common_clip_prefix(&mut self, clip: &ItemClip) {
        match (&self.first_clip, self.common_clip_count) {
            (Some(first), Some(count)) => {
                self.common_clip_count = Some(clip.common_rounded_rect_count(first, count));
            }
            _ => {
                self.common_clip_count = Some(clip.rounded.len());
                self.first_clip = Some(clip.clone());
            }
        }
    }

    /// Returns the shared clip prefix.
    ///
    /// # Panics
    ///
    /// Panics if no item was ever accumulated.
    pub(crate) fn common_clip(&self) -> (usize, &ItemClip) {
        assert!(
            self.common_clip_count.is_some(),
            "finalized accumulator without clip-prefix count"
        );
        (
            self.common_clip_count.unwrap_or_default(),
            self.first_clip.as_ref().unwrap_or(&ItemClip::NONE),
        )
    }

    /// Returns the color the whole visible region reduces to, if any.
    pub(crate) fn solid_color(&self) -> Option<Color> {
        match self.solid {
            SolidState::Color(c) if !self.visible.is_empty() => Some(c),
            _ => None,
        }
    }

    /// Returns the single image the layer reduces to and its destination
    /// rect in container pixels, if any.
    pub(crate) fn single_image(&self) -> Option<(ImageKey, Rect)> {
        if self.items.len() == 1 { self.image } else { None }
    }

    /// Returns the opaque color known to cover `target` from this
    /// accumulator's items, scanning from the top.
    pub(crate) fn color_under(&self, target: Rect) -> Color {
        for it in self.items.iter().rev() {
            if !rects_overlap(it.visible_px, target) {
                continue;
            }
            return match it.uniform {
                Some((c, covered)) if c.is_opaque() && rect_contains(covered, target) => c,
                _ => Color::TRANSPARENT,
            };
        }
        Color::TRANSPARENT
    }
}

#[cfg(test)]
mod tests {
    use kurbo::RoundedRect;

    use super::*;
    use crate::item::ItemKey;

    const ONE: Vec2 = Vec2::new(1.0, 1.0);

    fn push(acc: &mut PaintedLayerAccumulator, index: usize, item: &DisplayItem) {
        let visible = item.clipped_visible();
        let opaque = item.clip.approximate_intersect_inward(&item.opaque_region());
        let entry = AssignedItem::new(index, item, visible, ONE);
        acc.accumulate(entry, item, &opaque, &BuilderConfig::new());
    }

    fn solid(index: u32, r: Rect, c: Color) -> DisplayItem {
        DisplayItem::solid_color(ItemKey::new(1, index), r, c, AgrId(0))
    }

    #[test]
    fn opaque_stays_inside_visible() {
        let mut acc = PaintedLayerAccumulator::new(AgrId(0), None, 0);
        let item = solid(0, Rect::new(0.0, 0.0, 100.0, 100.0), Color::BLACK)
            .with_visible(Rect::new(0.0, 0.0, 50.0, 50.0));
        push(&mut acc, 0, &item);
        assert!(acc.visible.contains(&acc.opaque));
        assert_eq!(acc.opaque, Region::from_rect(Rect::new(0.0, 0.0, 50.0, 50.0)));
    }

    #[test]
    fn exact_overlay_blends_colors() {
        let mut acc = PaintedLayerAccumulator::new(AgrId(0), None, 0);
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        push(&mut acc, 0, &solid(0, r, Color::from_rgb8(255, 0, 0)));
        push(&mut acc, 1, &solid(1, r, Color::from_rgb8(0, 0, 255)));
        assert_eq!(acc.solid_color(), Some(Color::from_rgb8(0, 0, 255)));
    }

    #[test]
    fn partial_overlay_is_not_solid() {
        let mut acc = PaintedLayerAccumulator::new(AgrId(0), None, 0);
        push(&mut acc, 0, &solid(0, Rect::new(0.0, 0.0, 10.0, 10.0), Color::BLACK));
        push(&mut acc, 1, &solid(1, Rect::new(5.0, 0.0, 20.0, 10.0), Color::BLACK));
        assert_eq!(acc.solid_color(), None);
    }

    #[test]
    fn generic_item_breaks_solid_color() {
        let mut acc = PaintedLayerAccumulator::new(AgrId(0), None, 0);
        push(&mut acc, 0, &solid(0, Rect::new(0.0, 0.0, 100.0, 100.0), Color::WHITE));
        let text_bounds = Rect::new(10.0, 10.0, 30.0, 20.0);
        let text = DisplayItem::generic(ItemKey::new(2, 0), text_bounds, AgrId(0));
        push(&mut acc, 1, &text);
        assert_eq!(acc.items.len(), 2);
        assert_eq!(acc.visible, Region::from_rect(Rect::new(0.0, 0.0, 100.0, 100.0)));
        assert_eq!(acc.solid_color(), None);
    }

    #[test]
    fn single_opaque_image_reduces() {
        let mut acc = PaintedLayerAccumulator::new(AgrId(0), None, 0);
        let item = DisplayItem::new(
            ItemKey::new(1, 0),
            ItemKind::Image {
                image: ImageKey(9),
                opaque: true,
            },
            Rect::new(0.0, 0.0, 64.0, 64.0),
            AgrId(0),
        );
        push(&mut acc, 0, &item);
        assert_eq!(acc.single_image(), Some((ImageKey(9), Rect::new(0.0, 0.0, 64.0, 64.0))));
    }

    #[test]
    fn partly_visible_image_keeps_its_full_destination() {
        let mut acc = PaintedLayerAccumulator::new(AgrId(0), None, 0);
        let item = DisplayItem::new(
            ItemKey::new(1, 0),
            ItemKind::Image {
                image: ImageKey(9),
                opaque: true,
            },
            Rect::new(0.0, 0.0, 64.0, 64.0),
            AgrId(0),
        )
        .with_visible(Rect::new(0.0, 0.0, 32.0, 64.0));
        push(&mut acc, 0, &item);
        assert_eq!(acc.visible, Region::from_rect(Rect::new(0.0, 0.0, 32.0, 64.0)));
        assert_eq!(
            acc.single_image(),
            Some((ImageKey(9), Rect::new(0.0, 0.0, 64.0, 64.0))),
            "destination is the image bounds, not its visible part"
        );
    }

    #[test]
    fn common_clip_prefix_converges() {
        let seg = |x: f64| RoundedRect::new(x, 0.0, x + 100.0, 100.0, 4.0);
        let shared = ItemClip::NONE.with_rounded(seg(0.0)).with_rounded(seg(1.0));
        let a = shared.clone().with_rounded(seg(2.0));
        let b = shared.with_rounded(seg(3.0));
        let mut acc = PaintedLayerAccumulator::new(AgrId(0), None, 0);
        acc.update_common_clip_prefix(&a);
        assert_eq!(acc.common_clip().0, 3);
        acc.update_common_clip_prefix(&b);
        assert_eq!(acc.common_clip().0, 2);
        acc.update_common_clip_prefix(&a);
        assert_eq!(acc.common_clip().0, 2);
    }

    #[test]
    #[should_panic(expected = "finalized accumulator without clip-prefix count")]
    fn empty_accumulator_has_no_clip_prefix() {
        let acc = PaintedLayerAccumulator::new(AgrId(0), None, 0);
        let _ = acc.common_clip();
    }

    #[test]
    fn color_under_finds_covering_item() {
        let mut acc = PaintedLayerAccumulator::new(AgrId(0), None, 0);
        push(&mut acc, 0, &solid(0, Rect::new(0.0, 0.0, 100.0, 100.0), Color::WHITE));
        assert_eq!(acc.color_under(Rect::new(10.0, 10.0, 20.0, 20.0)), Color::WHITE);
        let text_bounds = Rect::new(10.0, 10.0, 30.0, 20.0);
        let text = DisplayItem::generic(ItemKey::new(2, 0), text_bounds, AgrId(0));
        push(&mut acc, 1, &text);
        assert_eq!(acc.color_under(Rect::new(10.0, 10.0, 20.0, 20.0)), Color::TRANSPARENT);
        assert_eq!(acc.color_under(Rect::new(50.0, 50.0, 60.0, 60.0)), Color::WHITE);
    }
}
