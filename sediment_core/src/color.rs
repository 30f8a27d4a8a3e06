// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 8-bit RGBA colors with source-over composition.

use core::fmt;

/// A non-premultiplied 8-bit RGBA color.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel; `255` is fully opaque.
    pub a: u8,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::from_rgba8(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::from_rgba8(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::from_rgba8(255, 255, 255, 255);

    /// Creates a color from its four channels.
    #[inline]
    #[must_use]
    pub const fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color.
    #[inline]
    #[must_use]
    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Returns whether the color fully hides what is behind it.
    #[inline]
    #[must_use]
    pub const fn is_opaque(self) -> bool {
        self.a == 255
    }

    /// Returns whether the color draws nothing.
    #[inline]
    #[must_use]
    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Composites `self` on top of `backdrop` with the source-over operator.
    #[must_use]
    pub fn over(self, backdrop: Self) -> Self {
        if self.is_opaque() || backdrop.is_transparent() {
            return self;
        }
        if self.is_transparent() {
            return backdrop;
        }
        let fa = u32::from(self.a);
        let ba = u32::from(backdrop.a);
        // Alpha scaled by 255 to keep the blend in integers.
        let back_weight = ba * (255 - fa);
        let out_a255 = fa * 255 + back_weight;
        #[expect(
            clippy::cast_possible_truncation,
            reason = "weighted average of two u8 channels stays within u8"
        )]
        let blend = |f: u8, b: u8| -> u8 {
            let num = u32::from(f) * fa * 255 + u32::from(b) * back_weight;
            ((num + out_a255 / 2) / out_a255) as u8
        };
        #[expect(
            clippy::cast_possible_truncation,
            reason = "composited alpha is at most 255"
        )]
        let a = ((out_a255 + 127) / 255) as u8;
        Self {
            r: blend(self.r, backdrop.r),
            g: blend(self.g, backdrop.g),
            b: blend(self.b, backdrop.b),
            a,
        }
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.r, self.g, self.b, self.a
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_over_anything_is_itself() {
        let red = Color::from_rgb8(255, 0, 0);
        assert_eq!(red.over(Color::WHITE), red);
        assert_eq!(red.over(Color::TRANSPARENT), red);
    }

    #[test]
    fn transparent_over_backdrop_is_backdrop() {
        assert_eq!(Color::TRANSPARENT.over(Color::WHITE), Color::WHITE);
    }

    #[test]
    fn half_black_over_white_is_grey_and_opaque() {
        let half = Color::from_rgba8(0, 0, 0, 128);
        let out = half.over(Color::WHITE);
        assert!(out.is_opaque());
        assert!((126..=128).contains(&out.r), "got {out:?}");
        assert_eq!(out.r, out.g);
        assert_eq!(out.g, out.b);
    }

    #[test]
    fn two_translucent_layers_accumulate_alpha() {
        let a = Color::from_rgba8(255, 0, 0, 128);
        let out = a.over(a);
        assert!(out.a > 128 && out.a < 255);
        assert_eq!(out.r, 255);
    }
}
