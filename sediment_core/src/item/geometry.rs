// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry snapshots used to diff an item against its previous frame.

use kurbo::{Rect, Vec2};

use super::id::ImageKey;
use crate::color::Color;
use crate::region::Region;
use crate::transform::Transform3d;

/// What an item paints, reduced to the properties that affect its pixels
/// beyond its bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PaintSignature {
    /// A uniform color fill.
    SolidColor(Color),
    /// A border stroke.
    Border {
        /// Stroke color.
        color: Color,
        /// Stroke width.
        width: f64,
    },
    /// An image.
    Image(ImageKey),
    /// Content only the producer can compare; changes are reported through
    /// the item's invalid flag.
    Generic,
    /// A group with uniform opacity.
    Opacity(f32),
    /// A group with a transform.
    Transform(Transform3d),
    /// Paints nothing.
    Empty,
}

/// Immutable record of an item's geometry at commit time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ItemGeometry {
    /// Item bounds in container space.
    pub bounds: Rect,
    /// What the item paints.
    pub paint: PaintSignature,
}

impl ItemGeometry {
    /// Returns the snapshot moved by `delta`.
    #[must_use]
    pub fn translated(&self, delta: Vec2) -> Self {
        Self {
            bounds: self.bounds + delta,
            paint: self.paint,
        }
    }

    /// Returns the area that must be repainted when the item goes from `old`
    /// to `self` (both in the same coordinate space).
    ///
    /// A solid color that keeps its color only repaints the area it gained or
    /// lost. Every other change repaints both extents.
    #[must_use]
    pub fn diff(&self, old: &Self) -> Region {
        match (self.paint, old.paint) {
            (PaintSignature::SolidColor(new), PaintSignature::SolidColor(prev)) if new == prev => {
                if self.bounds == old.bounds {
                    Region::new()
                } else {
                    Region::xor_rects(old.bounds, self.bounds)
                }
            }
            _ if self == old => Region::new(),
            _ => {
                let mut r = Region::from_rect(old.bounds);
                r.union_rect(self.bounds);
                r
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(bounds: Rect, color: Color) -> ItemGeometry {
        ItemGeometry {
            bounds,
            paint: PaintSignature::SolidColor(color),
        }
    }

    #[test]
    fn growing_solid_color_repaints_only_the_strip() {
        let old = solid(Rect::new(0.0, 0.0, 10.0, 10.0), Color::BLACK);
        let new = solid(Rect::new(0.0, 0.0, 10.0, 14.0), Color::BLACK);
        assert_eq!(new.diff(&old), Region::from_rect(Rect::new(0.0, 10.0, 10.0, 14.0)));
    }

    #[test]
    fn recolored_solid_color_repaints_everything() {
        let old = solid(Rect::new(0.0, 0.0, 10.0, 10.0), Color::BLACK);
        let new = solid(Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE);
        assert_eq!(new.diff(&old), Region::from_rect(old.bounds));
    }

    #[test]
    fn moved_border_repaints_both_extents() {
        let paint = PaintSignature::Border {
            color: Color::BLACK,
            width: 1.0,
        };
        let old = ItemGeometry {
            bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
            paint,
        };
        let new = old.translated(Vec2::new(20.0, 0.0));
        let diff = new.diff(&old);
        assert!(diff.contains_rect(old.bounds));
        assert!(diff.contains_rect(new.bounds));
        assert!(old.diff(&old).is_empty());
    }
}
