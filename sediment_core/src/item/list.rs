// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display items and display lists.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::Rect;

use super::clip::ItemClip;
use super::geometry::{ItemGeometry, PaintSignature};
use super::id::{AgrId, ImageKey, ItemKey, ScrollId};
use super::roots::AnimationRoots;
use crate::color::Color;
use crate::region::{Region, rect_is_empty};
use crate::transform::Transform3d;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How an item wants to be turned into layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerState {
    /// Painted into a shared raster layer.
    None,
    /// Painted into a shared raster layer through a private nested layer
    /// manager.
    Inactive,
    /// Gets its own layer.
    Active,
    /// Gets its own layer that draws no pixels (metadata carriers).
    ActiveEmpty,
}

/// The effect applied by a wrapper item to its children.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WrapperEffect {
    /// Group opacity in `0.0..=1.0`.
    Opacity(f32),
    /// Transform from the children's space to the parent's container space.
    Transform(Transform3d),
}

/// A wrapper item: an effect applied to a nested list of items.
#[derive(Clone, Debug, PartialEq)]
pub struct WrapperItem {
    /// The effect.
    pub effect: WrapperEffect,
    /// Children in paint order, in the wrapper's inner space.
    pub children: Vec<DisplayItem>,
}

/// What a display item paints.
#[derive(Clone, Debug, PartialEq)]
pub enum ItemKind {
    /// Fills its bounds with a color.
    SolidColor {
        /// Fill color.
        color: Color,
    },
    /// Strokes its bounds.
    Border {
        /// Stroke color.
        color: Color,
        /// Stroke width.
        width: f64,
    },
    /// Draws an image scaled to its bounds.
    Image {
        /// Image content.
        image: ImageKey,
        /// Whether every pixel of the image is opaque.
        opaque: bool,
    },
    /// Anything else; painted by the embedder.
    Generic {
        /// Area known to be painted opaque, in container space.
        opaque: Option<Rect>,
    },
    /// Applies an effect to child items.
    Wrapper(Box<WrapperItem>),
    /// Carries scroll metadata; draws nothing.
    Metadata {
        /// The scrollable region described.
        scroll: ScrollId,
    },
}

impl ItemKind {
    /// Returns the paint signature used for geometry diffing.
    #[must_use]
    pub fn signature(&self) -> PaintSignature {
        match self {
            Self::SolidColor { color } => PaintSignature::SolidColor(*color),
            Self::Border { color, width } => PaintSignature::Border {
                color: *color,
                width: *width,
            },
            Self::Image { image, .. } => PaintSignature::Image(*image),
            Self::Generic { .. } => PaintSignature::Generic,
            Self::Wrapper(w) => match w.effect {
                WrapperEffect::Opacity(o) => PaintSignature::Opacity(o),
                WrapperEffect::Transform(t) => PaintSignature::Transform(t),
            },
            Self::Metadata { .. } => PaintSignature::Empty,
        }
    }
}

// ---------------------------------------------------------------------------
// DisplayItem
// ---------------------------------------------------------------------------

/// Per-item flags set by the producer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ItemFlags {
    /// The item's content changed in a way geometry cannot show.
    pub invalid: bool,
    /// Build a dedicated layer even when nothing is visible.
    pub build_when_empty: bool,
    /// May be merged with an adjacent compatible item.
    pub mergeable: bool,
    /// Requests a dedicated layer.
    pub active: bool,
    /// Position or content may change without a new transaction.
    pub animated: bool,
}

/// One paint instruction of a display list.
///
/// All geometry is in the space of the list's container.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayItem {
    /// Stable identity across frames.
    pub key: ItemKey,
    /// What the item paints.
    pub kind: ItemKind,
    /// Painted extent.
    pub bounds: Rect,
    /// Part of `bounds` that needs to be drawn this frame.
    pub visible: Rect,
    /// Clip applied to the item.
    pub clip: ItemClip,
    /// The animated geometry root the item moves with.
    pub agr: AgrId,
    /// The viewport root a fixed-position item is anchored to.
    pub fixed_anchor: Option<AgrId>,
    /// Producer flags.
    pub flags: ItemFlags,
    /// Extra area the producer wants repainted this frame.
    pub extra_invalid: Option<Rect>,
}

impl DisplayItem {
    /// Creates an unclipped item whose visible rect equals its bounds.
    #[must_use]
    pub fn new(key: ItemKey, kind: ItemKind, bounds: Rect, agr: AgrId) -> Self {
        Self {
            key,
            kind,
            bounds,
            visible: bounds,
            clip: ItemClip::NONE,
            agr,
            fixed_anchor: None,
            flags: ItemFlags::default(),
            extra_invalid: None,
        }
    }

    /// Shorthand for a solid color item.
    #[must_use]
    pub fn solid_color(key: ItemKey, bounds: Rect, color: Color, agr: AgrId) -> Self {
        Self::new(key, ItemKind::SolidColor { color }, bounds, agr)
    }

    /// Shorthand for a generic item with no opaque area.
    #[must_use]
    pub fn generic(key: ItemKey, bounds: Rect, agr: AgrId) -> Self {
        Self::new(key, ItemKind::Generic { opaque: None }, bounds, agr)
    }

    /// Shorthand for a wrapper item whose bounds cover its children.
    #[must_use]
    pub fn wrapper(key: ItemKey, effect: WrapperEffect, children: Vec<Self>, agr: AgrId) -> Self {
        let inner = children
            .iter()
            .map(|c| c.bounds)
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO);
        let bounds = match effect {
            WrapperEffect::Opacity(_) => inner,
            WrapperEffect::Transform(t) => t.transform_rect_bbox(inner).unwrap_or(inner),
        };
        Self::new(
            key,
            ItemKind::Wrapper(Box::new(WrapperItem { effect, children })),
            bounds,
            agr,
        )
    }

    /// Returns `self` with a clip.
    #[must_use]
    pub fn with_clip(mut self, clip: ItemClip) -> Self {
        self.clip = clip;
        self
    }

    /// Returns `self` with a different visible rect.
    #[must_use]
    pub fn with_visible(mut self, visible: Rect) -> Self {
        self.visible = visible;
        self
    }

    /// Returns `self` anchored to a viewport root.
    #[must_use]
    pub fn fixed_to(mut self, anchor: AgrId) -> Self {
        self.fixed_anchor = Some(anchor);
        self
    }

    /// Returns `self` with the given flags.
    #[must_use]
    pub fn with_flags(mut self, flags: ItemFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Returns `self` requesting a dedicated layer.
    #[must_use]
    pub fn active(mut self) -> Self {
        self.flags.active = true;
        self
    }

    /// Returns `self` marked invalid.
    #[must_use]
    pub fn invalid(mut self) -> Self {
        self.flags.invalid = true;
        self
    }

    /// Returns `self` marked mergeable.
    #[must_use]
    pub fn mergeable(mut self) -> Self {
        self.flags.mergeable = true;
        self
    }

    /// Classifies the item.
    ///
    /// Metadata items are always [`LayerState::ActiveEmpty`]. A wrapper is
    /// active when requested or when any child is; otherwise it is
    /// [`LayerState::Inactive`]. Other items are active only on request.
    #[must_use]
    pub fn layer_state(&self) -> LayerState {
        match &self.kind {
            ItemKind::Metadata { .. } => LayerState::ActiveEmpty,
            _ if self.flags.active => LayerState::Active,
            ItemKind::Wrapper(w) => {
                let child_active = w.children.iter().any(|c| {
                    matches!(c.layer_state(), LayerState::Active | LayerState::ActiveEmpty)
                });
                if child_active {
                    LayerState::Active
                } else {
                    LayerState::Inactive
                }
            }
            _ => LayerState::None,
        }
    }

    /// Returns the snapshot used for diffing.
    #[must_use]
    pub fn geometry(&self) -> ItemGeometry {
        ItemGeometry {
            bounds: self.bounds,
            paint: self.kind.signature(),
        }
    }

    /// Returns the color the item fills its bounds with, if uniform.
    #[must_use]
    pub fn uniform_color(&self) -> Option<Color> {
        match self.kind {
            ItemKind::SolidColor { color } if self.clip.rounded.is_empty() => Some(color),
            _ => None,
        }
    }

    /// Returns the opaque area of the item before clipping.
    #[must_use]
    pub fn opaque_region(&self) -> Region {
        let rect = match &self.kind {
            ItemKind::SolidColor { color } if color.is_opaque() => Some(self.bounds),
            ItemKind::Image { opaque: true, .. } => Some(self.bounds),
            ItemKind::Generic { opaque: Some(r) } => Some(r.intersect(self.bounds)),
            _ => None,
        };
        rect.map_or_else(Region::new, Region::from_rect)
    }

    /// Returns the visible rect restricted to the clip.
    #[must_use]
    pub fn clipped_visible(&self) -> Rect {
        self.clip.apply_to_rect(self.visible.intersect(self.bounds))
    }

    /// Returns the bounds restricted to the clip.
    #[must_use]
    pub fn clipped_bounds(&self) -> Rect {
        self.clip.apply_to_rect(self.bounds)
    }

    /// Returns whether `next`, painted directly after `self`, can be folded
    /// into `self`.
    #[must_use]
    pub fn can_merge_with(&self, next: &Self) -> bool {
        if !(self.flags.mergeable && next.flags.mergeable)
            || self.flags.active
            || next.flags.active
            || self.agr != next.agr
            || self.fixed_anchor != next.fixed_anchor
            || self.clip != next.clip
        {
            return false;
        }
        match (&self.kind, &next.kind) {
            (
                ItemKind::Border { color, width },
                ItemKind::Border {
                    color: c2,
                    width: w2,
                },
            ) => color == c2 && width == w2,
            (ItemKind::Wrapper(a), ItemKind::Wrapper(b)) => match (a.effect, b.effect) {
                (WrapperEffect::Opacity(x), WrapperEffect::Opacity(y)) => x == y,
                _ => false,
            },
            _ => false,
        }
    }

    /// Folds `next` into `self`, keeping `self`'s key.
    ///
    /// Callers check [`can_merge_with`](Self::can_merge_with) first.
    pub fn merge(&mut self, next: &Self) {
        self.bounds = self.bounds.union(next.bounds);
        self.visible = if rect_is_empty(self.visible) {
            next.visible
        } else if rect_is_empty(next.visible) {
            self.visible
        } else {
            self.visible.union(next.visible)
        };
        self.flags.invalid |= next.flags.invalid;
        self.extra_invalid = match (self.extra_invalid, next.extra_invalid) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        };
        if let (ItemKind::Wrapper(a), ItemKind::Wrapper(b)) = (&mut self.kind, &next.kind) {
            a.children.extend(b.children.iter().cloned());
        }
    }
}

/// Folds runs of mergeable adjacent items into single items.
///
/// Unmerged items are borrowed; merged runs are owned copies.
pub(crate) fn merge_adjacent(items: &[DisplayItem]) -> Vec<Cow<'_, DisplayItem>> {
    let mut out: Vec<Cow<'_, DisplayItem>> = Vec::with_capacity(items.len());
    for item in items {
        if let Some(last) = out.last_mut()
            && last.can_merge_with(item)
        {
            last.to_mut().merge(item);
            continue;
        }
        out.push(Cow::Borrowed(item));
    }
    out
}

// ---------------------------------------------------------------------------
// DisplayList
// ---------------------------------------------------------------------------

/// One frame's display items for a container, plus the animated geometry
/// roots they reference.
#[derive(Clone, Debug, Default)]
pub struct DisplayList {
    /// Items in paint order (back to front).
    pub items: Vec<DisplayItem>,
    /// Animated geometry roots.
    pub roots: AnimationRoots,
    /// Document generation the list was built from.
    pub generation: u64,
}

impl DisplayList {
    /// Creates an empty list over the given roots.
    #[must_use]
    pub fn new(roots: AnimationRoots) -> Self {
        Self {
            items: Vec::new(),
            roots,
            generation: 0,
        }
    }

    /// Appends an item on top.
    pub fn push(&mut self, item: DisplayItem) {
        self.items.push(item);
    }

    /// Returns `self` tagged with a document generation.
    #[must_use]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn border(index: u32, x: f64) -> DisplayItem {
        DisplayItem::new(
            ItemKey::new(1, index),
            ItemKind::Border {
                color: Color::BLACK,
                width: 1.0,
            },
            Rect::new(x, 0.0, x + 10.0, 10.0),
            AgrId(0),
        )
        .mergeable()
    }

    #[test]
    fn adjacent_borders_merge_keeping_first_key() {
        let items = vec![border(0, 0.0), border(1, 10.0), border(2, 20.0)];
        let merged = merge_adjacent(&items);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].key, ItemKey::new(1, 0));
        assert_eq!(merged[0].bounds, Rect::new(0.0, 0.0, 30.0, 10.0));
    }

    #[test]
    fn different_styles_do_not_merge() {
        let mut second = border(1, 10.0);
        second.kind = ItemKind::Border {
            color: Color::WHITE,
            width: 1.0,
        };
        let items = vec![border(0, 0.0), second];
        assert_eq!(merge_adjacent(&items).len(), 2);
    }

    #[test]
    fn opacity_wrappers_merge_children() {
        let child =
            |i| DisplayItem::generic(ItemKey::new(2, i), Rect::new(0.0, 0.0, 5.0, 5.0), AgrId(0));
        let a = DisplayItem::wrapper(
            ItemKey::new(3, 0),
            WrapperEffect::Opacity(0.5),
            vec![child(0)],
            AgrId(0),
        )
        .mergeable();
        let b = DisplayItem::wrapper(
            ItemKey::new(3, 1),
            WrapperEffect::Opacity(0.5),
            vec![child(1)],
            AgrId(0),
        )
        .mergeable();
        let items = vec![a, b];
        let merged = merge_adjacent(&items);
        assert_eq!(merged.len(), 1);
        let ItemKind::Wrapper(w) = &merged[0].kind else {
            panic!("expected wrapper");
        };
        assert_eq!(w.children.len(), 2);
    }

    #[test]
    fn layer_state_classification() {
        let unit = Rect::new(0.0, 0.0, 1.0, 1.0);
        let generic = DisplayItem::generic(ItemKey::new(1, 0), unit, AgrId(0));
        assert_eq!(generic.layer_state(), LayerState::None);
        assert_eq!(generic.clone().active().layer_state(), LayerState::Active);

        let meta = DisplayItem::new(
            ItemKey::new(1, 1),
            ItemKind::Metadata { scroll: ScrollId(9) },
            Rect::ZERO,
            AgrId(0),
        );
        assert_eq!(meta.layer_state(), LayerState::ActiveEmpty);

        let inactive = DisplayItem::wrapper(
            ItemKey::new(1, 2),
            WrapperEffect::Opacity(0.5),
            vec![generic.clone()],
            AgrId(0),
        );
        assert_eq!(inactive.layer_state(), LayerState::Inactive);

        let promoted = DisplayItem::wrapper(
            ItemKey::new(1, 3),
            WrapperEffect::Opacity(0.5),
            vec![generic.active()],
            AgrId(0),
        );
        assert_eq!(promoted.layer_state(), LayerState::Active);
    }

    #[test]
    fn opaque_region_follows_kind() {
        let bounds = Rect::new(0.0, 0.0, 10.0, 10.0);
        let opaque = DisplayItem::solid_color(ItemKey::new(1, 0), bounds, Color::WHITE, AgrId(0));
        assert_eq!(opaque.opaque_region(), Region::from_rect(bounds));
        let translucent = DisplayItem::solid_color(
            ItemKey::new(1, 1),
            bounds,
            Color::from_rgba8(0, 0, 0, 10),
            AgrId(0),
        );
        assert!(translucent.opaque_region().is_empty());
    }
}
