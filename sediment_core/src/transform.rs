// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column-major 4×4 transform for wrapper items and container layers.
//!
//! Wrapper items may carry arbitrary 3-D transforms. The builder only needs to
//! know whether a transform is representable in 2-D (so its contents can be
//! flattened into a parent painted layer) and, if so, how it maps rectangles.
//! Everything 2-D is delegated to [`kurbo::Affine`].

use core::ops::Mul;

use kurbo::{Affine, Rect, Vec2};
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// A column-major 4×4 affine transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a transform from four column arrays.
    #[inline]
    #[must_use]
    pub const fn from_cols(col0: [f64; 4], col1: [f64; 4], col2: [f64; 4], col3: [f64; 4]) -> Self {
        Self {
            cols: [col0, col1, col2, col3],
        }
    }

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    /// Creates a non-uniform scale transform.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            cols: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, sz, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the X axis (radians).
    ///
    /// Any rotation that is not a multiple of a half turn tilts the plane and
    /// therefore is not 2-D representable.
    #[inline]
    #[must_use]
    pub fn from_rotation_x(radians: f64) -> Self {
        let (s, c) = (radians.sin(), radians.cos());
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, c, s, 0.0],
                [0.0, -s, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Embeds a 2-D affine transform.
    #[inline]
    #[must_use]
    pub fn from_affine(affine: Affine) -> Self {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        Self {
            cols: [
                [a, b, 0.0, 0.0],
                [c, d, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [e, f, 0.0, 1.0],
            ],
        }
    }

    /// Returns whether the transform keeps the z = 0 plane flat and has no
    /// perspective, so it can be expressed as a 2-D affine transform.
    #[must_use]
    pub fn is_2d(&self) -> bool {
        let c = &self.cols;
        c[0][2] == 0.0
            && c[0][3] == 0.0
            && c[1][2] == 0.0
            && c[1][3] == 0.0
            && c[2][0] == 0.0
            && c[2][1] == 0.0
            && c[2][2] == 1.0
            && c[2][3] == 0.0
            && c[3][2] == 0.0
            && c[3][3] == 1.0
    }

    /// Returns the 2-D part of the transform, or `None` when it is not
    /// [2-D representable](Self::is_2d).
    #[must_use]
    pub fn to_affine(&self) -> Option<Affine> {
        if !self.is_2d() {
            return None;
        }
        let c = &self.cols;
        Some(Affine::new([c[0][0], c[0][1], c[1][0], c[1][1], c[3][0], c[3][1]]))
    }

    /// Returns the x/y translation components.
    #[inline]
    #[must_use]
    pub fn translation(&self) -> Vec2 {
        Vec2::new(self.cols[3][0], self.cols[3][1])
    }

    /// Returns whether the transform is a 2-D translation by whole pixels.
    #[must_use]
    pub fn is_integer_translation(&self) -> bool {
        let c = &self.cols;
        self.is_2d()
            && c[0][0] == 1.0
            && c[0][1] == 0.0
            && c[1][0] == 0.0
            && c[1][1] == 1.0
            && c[3][0] == c[3][0].round()
            && c[3][1] == c[3][1].round()
    }

    /// Maps `rect` through the 2-D part of the transform and returns its
    /// bounding box, or `None` when the transform is not 2-D representable.
    #[must_use]
    pub fn transform_rect_bbox(&self, rect: Rect) -> Option<Rect> {
        self.to_affine().map(|a| a.transform_rect_bbox(rect))
    }

    /// Is this transform [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform3d {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        let mut j = 0;
        while j < 4 {
            let mut i = 0;
            while i < 4 {
                out[j][i] =
                    a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
                i += 1;
            }
            j += 1;
        }
        Self { cols: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        assert_eq!(Transform3d::default(), Transform3d::IDENTITY);
        assert!(Transform3d::IDENTITY.is_integer_translation());
    }

    #[test]
    fn translation_composition() {
        let a = Transform3d::from_translation(1.0, 0.0, 0.0);
        let b = Transform3d::from_translation(0.0, 2.0, 0.0);
        assert_eq!((a * b).translation(), Vec2::new(1.0, 2.0));
    }

    #[test]
    fn affine_round_trip() {
        let affine = Affine::scale(2.0).then_translate(Vec2::new(3.0, 4.0));
        let t = Transform3d::from_affine(affine);
        assert!(t.is_2d());
        assert_eq!(t.to_affine(), Some(affine));
    }

    #[test]
    fn tilted_plane_is_not_2d() {
        let t = Transform3d::from_rotation_x(0.5);
        assert!(!t.is_2d());
        assert_eq!(t.transform_rect_bbox(Rect::new(0.0, 0.0, 1.0, 1.0)), None);
    }

    #[test]
    fn z_translation_is_not_2d() {
        assert!(!Transform3d::from_translation(0.0, 0.0, 5.0).is_2d());
    }

    #[test]
    fn fractional_translation_is_not_integer() {
        assert!(Transform3d::from_translation(3.0, -2.0, 0.0).is_integer_translation());
        assert!(!Transform3d::from_translation(0.5, 0.0, 0.0).is_integer_translation());
        assert!(!Transform3d::from_scale(2.0, 2.0, 1.0).is_integer_translation());
    }

    #[test]
    fn rect_bbox_through_scale() {
        let t = Transform3d::from_scale(2.0, 3.0, 1.0);
        assert_eq!(
            t.transform_rect_bbox(Rect::new(1.0, 1.0, 2.0, 2.0)),
            Some(Rect::new(2.0, 3.0, 4.0, 6.0))
        );
    }

    #[test]
    fn nan_is_not_finite() {
        let mut t = Transform3d::IDENTITY;
        t.cols[2][1] = f64::NAN;
        assert!(!t.is_finite());
    }
}
