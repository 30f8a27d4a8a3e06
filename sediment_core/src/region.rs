// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle-list regions.
//!
//! A [`Region`] is a set of pairwise disjoint, non-empty axis-aligned
//! rectangles. The same type is used in two coordinate spaces:
//!
//! - **container space**: fractional layout coordinates, used while diffing
//!   item geometry;
//! - **pixel space**: integral coordinates produced by
//!   [`scale_round_out`](Region::scale_round_out) /
//!   [`scale_round_in`](Region::scale_round_in), used for visible, opaque and
//!   invalid regions of layers.
//!
//! Integral values are exactly representable in `f64`, so pixel regions
//! combine without rounding drift.
//!
//! Rect counts are kept small by [`simplify_outward`](Region::simplify_outward)
//! (grows the region, used for visible regions) and
//! [`simplify_inward`](Region::simplify_inward) (shrinks it, used for opaque
//! regions). Both only trade precision for a bounded rect count.

use alloc::vec::Vec;

use kurbo::{Rect, Vec2};

/// Returns whether `r` covers no area.
///
/// NaN coordinates are treated as empty.
#[inline]
#[must_use]
pub fn rect_is_empty(r: Rect) -> bool {
    !(r.x0 < r.x1 && r.y0 < r.y1)
}

/// Returns whether two rectangles share a non-empty interior.
#[inline]
#[must_use]
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

/// Returns whether `outer` fully contains `inner`.
///
/// An empty `inner` is contained by anything.
#[inline]
#[must_use]
pub fn rect_contains(outer: Rect, inner: Rect) -> bool {
    rect_is_empty(inner)
        || (outer.x0 <= inner.x0
            && outer.y0 <= inner.y0
            && inner.x1 <= outer.x1
            && inner.y1 <= outer.y1)
}

/// Scales `r` by `(sx, sy)` and rounds each edge outward to whole pixels.
#[inline]
#[must_use]
pub fn scale_rect_round_out(r: Rect, scale: Vec2) -> Rect {
    if rect_is_empty(r) {
        return Rect::ZERO;
    }
    Rect::new(r.x0 * scale.x, r.y0 * scale.y, r.x1 * scale.x, r.y1 * scale.y).expand()
}

/// Scales `r` by `(sx, sy)` and rounds each edge inward to whole pixels.
///
/// The result may be empty when `r` spans less than one whole pixel.
#[inline]
#[must_use]
pub fn scale_rect_round_in(r: Rect, scale: Vec2) -> Rect {
    if rect_is_empty(r) {
        return Rect::ZERO;
    }
    let snapped = Rect::new(r.x0 * scale.x, r.y0 * scale.y, r.x1 * scale.x, r.y1 * scale.y).trunc();
    if rect_is_empty(snapped) {
        Rect::ZERO
    } else {
        snapped
    }
}

/// Pushes the parts of `a` not covered by `b` onto `out`.
fn subtract_into(a: Rect, b: Rect, out: &mut Vec<Rect>) {
    if !rects_overlap(a, b) {
        out.push(a);
        return;
    }
    let y0 = a.y0.max(b.y0);
    let y1 = a.y1.min(b.y1);
    if a.y0 < b.y0 {
        out.push(Rect::new(a.x0, a.y0, a.x1, b.y0));
    }
    if a.x0 < b.x0 {
        out.push(Rect::new(a.x0, y0, b.x0, y1));
    }
    if b.x1 < a.x1 {
        out.push(Rect::new(b.x1, y0, a.x1, y1));
    }
    if b.y1 < a.y1 {
        out.push(Rect::new(a.x0, b.y1, a.x1, a.y1));
    }
}

fn area(r: Rect) -> f64 {
    (r.x1 - r.x0) * (r.y1 - r.y0)
}

/// A set of disjoint axis-aligned rectangles.
#[derive(Clone, Debug, Default)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    /// Creates an empty region.
    #[must_use]
    pub const fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// Creates a region covering a single rectangle.
    #[must_use]
    pub fn from_rect(r: Rect) -> Self {
        let mut rects = Vec::new();
        if !rect_is_empty(r) {
            rects.push(r);
        }
        Self { rects }
    }

    /// Creates a region covering the union of `rects`.
    #[must_use]
    pub fn from_rects(rects: impl IntoIterator<Item = Rect>) -> Self {
        let mut region = Self::new();
        for r in rects {
            region.union_rect(r);
        }
        region
    }

    /// Returns whether the region covers no area.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Returns the disjoint rectangles making up the region.
    #[inline]
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Returns the number of rectangles in the region.
    #[inline]
    #[must_use]
    pub fn rect_count(&self) -> usize {
        self.rects.len()
    }

    /// Returns the bounding box, or [`Rect::ZERO`] when empty.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        let mut iter = self.rects.iter();
        let Some(first) = iter.next() else {
            return Rect::ZERO;
        };
        iter.fold(*first, |acc, r| acc.union(*r))
    }

    /// Returns the covered area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.rects.iter().map(|r| area(*r)).sum()
    }

    /// Removes everything from the region.
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Adds `r` to the region.
    pub fn union_rect(&mut self, r: Rect) {
        if rect_is_empty(r) {
            return;
        }
        let mut pieces = Vec::new();
        pieces.push(r);
        let mut scratch = Vec::new();
        for existing in &self.rects {
            if pieces.is_empty() {
                return;
            }
            scratch.clear();
            for piece in pieces.drain(..) {
                subtract_into(piece, *existing, &mut scratch);
            }
            core::mem::swap(&mut pieces, &mut scratch);
        }
        if pieces.is_empty() {
            return;
        }
        self.rects.extend(pieces);
        self.coalesce();
    }

    /// Adds every rectangle of `other` to the region.
    pub fn union(&mut self, other: &Self) {
        for r in &other.rects {
            self.union_rect(*r);
        }
    }

    /// Removes `r` from the region.
    pub fn subtract_rect(&mut self, r: Rect) {
        if rect_is_empty(r) || self.rects.is_empty() {
            return;
        }
        let mut out = Vec::with_capacity(self.rects.len() + 3);
        for existing in &self.rects {
            subtract_into(*existing, r, &mut out);
        }
        self.rects = out;
        self.coalesce();
    }

    /// Removes every rectangle of `other` from the region.
    pub fn subtract(&mut self, other: &Self) {
        for r in &other.rects {
            if self.rects.is_empty() {
                return;
            }
            self.subtract_rect(*r);
        }
    }

    /// Restricts the region to `r`.
    pub fn intersect_rect(&mut self, r: Rect) {
        if rect_is_empty(r) {
            self.rects.clear();
            return;
        }
        self.rects.retain_mut(|existing| {
            *existing = existing.intersect(r);
            !rect_is_empty(*existing)
        });
    }

    /// Restricts the region to `other`.
    pub fn intersect(&mut self, other: &Self) {
        let mut out = Vec::new();
        for a in &self.rects {
            for b in &other.rects {
                let i = a.intersect(*b);
                if !rect_is_empty(i) {
                    out.push(i);
                }
            }
        }
        self.rects = out;
        self.coalesce();
    }

    /// Returns whether the region shares area with `r`.
    #[must_use]
    pub fn intersects_rect(&self, r: Rect) -> bool {
        !rect_is_empty(r) && self.rects.iter().any(|e| rects_overlap(*e, r))
    }

    /// Returns whether the region shares area with `other`.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        other.rects.iter().any(|r| self.intersects_rect(*r))
    }

    /// Returns whether `r` lies entirely inside the region.
    #[must_use]
    pub fn contains_rect(&self, r: Rect) -> bool {
        if rect_is_empty(r) {
            return true;
        }
        let mut remaining = Vec::new();
        remaining.push(r);
        let mut scratch = Vec::new();
        for existing in &self.rects {
            scratch.clear();
            for piece in remaining.drain(..) {
                subtract_into(piece, *existing, &mut scratch);
            }
            core::mem::swap(&mut remaining, &mut scratch);
            if remaining.is_empty() {
                return true;
            }
        }
        remaining.is_empty()
    }

    /// Returns whether `other` lies entirely inside the region.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.rects.iter().all(|r| self.contains_rect(*r))
    }

    /// Offsets every rectangle by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        if delta == Vec2::ZERO {
            return;
        }
        for r in &mut self.rects {
            *r = *r + delta;
        }
    }

    /// Returns a copy offset by `delta`.
    #[must_use]
    pub fn translated(&self, delta: Vec2) -> Self {
        let mut out = self.clone();
        out.translate(delta);
        out
    }

    /// Returns the pixel region covering every pixel the region touches at
    /// the given scale.
    #[must_use]
    pub fn scale_round_out(&self, scale: Vec2) -> Self {
        Self::from_rects(self.rects.iter().map(|r| scale_rect_round_out(*r, scale)))
    }

    /// Returns the pixel region of pixels fully covered by the region at the
    /// given scale.
    ///
    /// Each rectangle is snapped on its own, so seams between rectangles may
    /// lose a pixel column; the result is always a subset.
    #[must_use]
    pub fn scale_round_in(&self, scale: Vec2) -> Self {
        Self::from_rects(self.rects.iter().map(|r| scale_rect_round_in(*r, scale)))
    }

    /// Returns the symmetric difference of two rectangles.
    #[must_use]
    pub fn xor_rects(a: Rect, b: Rect) -> Self {
        let mut out = Self::from_rect(a);
        out.union_rect(b);
        if rects_overlap(a, b) {
            out.subtract_rect(a.intersect(b));
        }
        out
    }

    /// Grows the region until it has at most `max_rects` rectangles.
    ///
    /// The result is always a superset of the input.
    pub fn simplify_outward(&mut self, max_rects: usize) {
        if self.rects.len() <= max_rects.max(1) {
            return;
        }
        if max_rects <= 1 {
            let bounds = self.bounds();
            self.rects.clear();
            self.rects.push(bounds);
            return;
        }
        // Merge into horizontal bands ordered by top edge.
        let mut sorted = core::mem::take(&mut self.rects);
        sorted.sort_by(|a, b| a.y0.total_cmp(&b.y0).then(a.x0.total_cmp(&b.x0)));
        let per_band = sorted.len().div_ceil(max_rects);
        let mut merged = Self::new();
        for band in sorted.chunks(per_band) {
            let bounds = band.iter().skip(1).fold(band[0], |acc, r| acc.union(*r));
            merged.union_rect(bounds);
        }
        if merged.rects.len() > max_rects {
            let bounds = merged.bounds();
            merged.rects.clear();
            merged.rects.push(bounds);
        }
        *self = merged;
    }

    /// Shrinks the region until it has at most `max_rects` rectangles by
    /// keeping the largest ones.
    ///
    /// The result is always a subset of the input.
    pub fn simplify_inward(&mut self, max_rects: usize) {
        if self.rects.len() <= max_rects {
            return;
        }
        self.rects.sort_by(|a, b| area(*b).total_cmp(&area(*a)));
        self.rects.truncate(max_rects);
    }

    /// Merges rectangles sharing a full edge.
    fn coalesce(&mut self) {
        let mut changed = true;
        while changed {
            changed = false;
            'outer: for i in 0..self.rects.len() {
                for j in (i + 1)..self.rects.len() {
                    let a = self.rects[i];
                    let b = self.rects[j];
                    let horizontal = a.y0 == b.y0 && a.y1 == b.y1 && (a.x1 == b.x0 || b.x1 == a.x0);
                    let vertical = a.x0 == b.x0 && a.x1 == b.x1 && (a.y1 == b.y0 || b.y1 == a.y0);
                    if horizontal || vertical {
                        self.rects[i] = a.union(b);
                        self.rects.swap_remove(j);
                        changed = true;
                        break 'outer;
                    }
                }
            }
        }
    }
}

impl PartialEq for Region {
    /// Regions are equal when they cover the same area, regardless of how
    /// that area is split into rectangles.
    fn eq(&self, other: &Self) -> bool {
        self.contains(other) && other.contains(self)
    }
}

impl From<Rect> for Region {
    fn from(r: Rect) -> Self {
        Self::from_rect(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect {
        Rect::new(x0, y0, x1, y1)
    }

    #[test]
    fn union_of_overlapping_rects_is_disjoint() {
        let mut region = Region::from_rect(r(0.0, 0.0, 10.0, 10.0));
        region.union_rect(r(5.0, 5.0, 15.0, 15.0));
        assert!((region.area() - 175.0).abs() < 1e-9);
        for (i, a) in region.rects().iter().enumerate() {
            for b in &region.rects()[i + 1..] {
                assert!(!rects_overlap(*a, *b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn adjacent_rects_coalesce() {
        let mut region = Region::from_rect(r(0.0, 0.0, 10.0, 10.0));
        region.union_rect(r(10.0, 0.0, 20.0, 10.0));
        assert_eq!(region.rect_count(), 1);
        assert_eq!(region.bounds(), r(0.0, 0.0, 20.0, 10.0));
    }

    #[test]
    fn subtract_punches_hole() {
        let mut region = Region::from_rect(r(0.0, 0.0, 30.0, 30.0));
        region.subtract_rect(r(10.0, 10.0, 20.0, 20.0));
        assert!((region.area() - 800.0).abs() < 1e-9);
        assert!(!region.intersects_rect(r(11.0, 11.0, 19.0, 19.0)));
        assert!(region.contains_rect(r(0.0, 0.0, 30.0, 10.0)));
    }

    #[test]
    fn contains_rect_across_pieces() {
        let region = Region::from_rects([r(0.0, 0.0, 10.0, 20.0), r(10.0, 0.0, 20.0, 10.0)]);
        assert!(region.contains_rect(r(5.0, 0.0, 15.0, 10.0)));
        assert!(!region.contains_rect(r(5.0, 0.0, 15.0, 11.0)));
    }

    #[test]
    fn xor_of_shifted_rects() {
        let x = Region::xor_rects(r(0.0, 0.0, 10.0, 10.0), r(0.0, 0.0, 12.0, 10.0));
        assert_eq!(x, Region::from_rect(r(10.0, 0.0, 12.0, 10.0)));
    }

    #[test]
    fn semantic_equality_ignores_split() {
        let a = Region::from_rects([r(0.0, 0.0, 5.0, 10.0), r(5.0, 0.0, 10.0, 10.0)]);
        let b = Region::from_rect(r(0.0, 0.0, 10.0, 10.0));
        assert_eq!(a, b);
    }

    #[test]
    fn round_out_and_in() {
        let scale = Vec2::new(1.0, 1.0);
        assert_eq!(
            scale_rect_round_out(r(0.5, 0.5, 9.5, 9.5), scale),
            r(0.0, 0.0, 10.0, 10.0)
        );
        assert_eq!(
            scale_rect_round_in(r(0.5, 0.5, 9.5, 9.5), scale),
            r(1.0, 1.0, 9.0, 9.0)
        );
        assert!(rect_is_empty(scale_rect_round_in(
            r(0.2, 0.2, 0.8, 0.8),
            scale
        )));
    }

    #[test]
    fn simplify_outward_is_superset() {
        let original = Region::from_rects((0..10).map(|i| {
            let x = f64::from(i) * 20.0;
            r(x, 0.0, x + 10.0, 10.0 + f64::from(i))
        }));
        let mut simplified = original.clone();
        simplified.simplify_outward(4);
        assert!(simplified.rect_count() <= 4);
        assert!(simplified.contains(&original));
    }

    #[test]
    fn simplify_inward_is_subset() {
        let original = Region::from_rects((0..6).map(|i| {
            let x = f64::from(i) * 20.0;
            r(x, 0.0, x + 10.0 + f64::from(i), 10.0)
        }));
        let mut simplified = original.clone();
        simplified.simplify_inward(2);
        assert_eq!(simplified.rect_count(), 2);
        assert!(original.contains(&simplified));
        // The two largest rects survive.
        assert!(simplified.contains_rect(r(100.0, 0.0, 115.0, 10.0)));
    }

    #[test]
    fn intersect_regions() {
        let mut a = Region::from_rect(r(0.0, 0.0, 10.0, 10.0));
        let b = Region::from_rects([r(5.0, 5.0, 20.0, 20.0), r(-5.0, -5.0, 1.0, 1.0)]);
        a.intersect(&b);
        assert_eq!(
            a,
            Region::from_rects([r(5.0, 5.0, 10.0, 10.0), r(0.0, 0.0, 1.0, 1.0)])
        );
    }
}
