// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-item clips: an optional rectangle plus a chain of rounded rectangles.

use alloc::vec::Vec;

use kurbo::{Rect, RoundedRect, Vec2};

use crate::region::{Region, rect_is_empty};

/// The clip applied to one display item, in container space.
///
/// The effective clip is the intersection of `rect` and every entry of
/// `rounded`. Rounded segments are ordered from the outermost ancestor to the
/// innermost; items nested in the same rounded containers share a prefix.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemClip {
    /// Axis-aligned clip, or `None` when unclipped.
    pub rect: Option<Rect>,
    /// Rounded-rectangle clip segments.
    pub rounded: Vec<RoundedRect>,
}

impl ItemClip {
    /// No clipping.
    pub const NONE: Self = Self {
        rect: None,
        rounded: Vec::new(),
    };

    /// A plain rectangular clip.
    #[must_use]
    pub const fn from_rect(rect: Rect) -> Self {
        Self {
            rect: Some(rect),
            rounded: Vec::new(),
        }
    }

    /// Appends a rounded segment.
    #[must_use]
    pub fn with_rounded(mut self, rounded: RoundedRect) -> Self {
        self.rounded.push(rounded);
        self
    }

    /// Returns whether the clip restricts anything.
    #[must_use]
    pub fn is_clipped(&self) -> bool {
        self.rect.is_some() || !self.rounded.is_empty()
    }

    /// Returns the axis-aligned bounds of the clip, or `None` when unclipped.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        let mut out = self.rect;
        for rr in &self.rounded {
            let r = rr.rect();
            out = Some(out.map_or(r, |o| o.intersect(r)));
        }
        out
    }

    /// Restricts `rect` to the clip bounds.
    #[must_use]
    pub fn apply_to_rect(&self, rect: Rect) -> Rect {
        match self.bounds() {
            Some(b) => {
                let r = rect.intersect(b);
                if rect_is_empty(r) { Rect::ZERO } else { r }
            }
            None => rect,
        }
    }

    /// Restricts an opaque region to the area the clip certainly leaves
    /// untouched.
    ///
    /// Rounded segments contribute their inner rectangle (inset by the
    /// largest corner radius), so the result never over-reports opacity.
    #[must_use]
    pub fn approximate_intersect_inward(&self, region: &Region) -> Region {
        let mut out = region.clone();
        if let Some(r) = self.rect {
            out.intersect_rect(r);
        }
        for rr in &self.rounded {
            let radii = rr.radii();
            let inset = radii
                .top_left
                .max(radii.top_right)
                .max(radii.bottom_left)
                .max(radii.bottom_right);
            let inner = rr.rect().inset(-inset);
            if rect_is_empty(inner) {
                out.clear();
                return out;
            }
            out.intersect_rect(inner);
        }
        out
    }

    /// Returns how many leading rounded segments `self` and `other` share,
    /// never counting past `limit`.
    #[must_use]
    pub fn common_rounded_rect_count(&self, other: &Self, limit: usize) -> usize {
        self.rounded
            .iter()
            .zip(&other.rounded)
            .take(limit)
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Returns the clip moved by `delta`.
    #[must_use]
    pub fn translated(&self, delta: Vec2) -> Self {
        Self {
            rect: self.rect.map(|r| r + delta),
            rounded: self
                .rounded
                .iter()
                .map(|rr| RoundedRect::from_rect(rr.rect() + delta, rr.radii()))
                .collect(),
        }
    }

    /// Returns the area whose rendering differs between `old` and `self`
    /// for content with the given bounds.
    ///
    /// Identical clips produce an empty region. When only the rectangle
    /// changed, the symmetric difference of the clipped bounds is returned.
    /// Any change to the rounded segments repaints both clipped extents.
    #[must_use]
    pub fn difference(&self, old: &Self, old_bounds: Rect, new_bounds: Rect) -> Region {
        if self == old {
            return Region::new();
        }
        let old_clipped = old.apply_to_rect(old_bounds);
        let new_clipped = self.apply_to_rect(new_bounds);
        if self.rounded == old.rounded {
            Region::xor_rects(old_clipped, new_clipped)
        } else {
            let mut r = Region::from_rect(old_clipped);
            r.union_rect(new_clipped);
            r
        }
    }
}
