// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tuning knobs for the layer builder.

/// Configuration for a [`LayerManager`](crate::manager::LayerManager).
///
/// Rect-count limits trade invalidation precision for bookkeeping cost;
/// the feature switches exist mainly so tests and debugging tools can force
/// every item through the shared-raster path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Maximum rectangles kept in an accumulator's visible region before it
    /// is simplified outward.
    pub max_visible_rects: usize,
    /// Maximum rectangles kept in an accumulator's opaque region. Unions that
    /// would exceed it are dropped, shrinking the opaque region.
    pub max_opaque_rects: usize,
    /// Maximum rectangles kept in a node's visible-above regions.
    pub max_visible_above_rects: usize,
    /// Number of transactions a mask may go unused before it is released.
    pub mask_cache_max_age: u32,
    /// Collapse accumulators that reduce to one uniform color into color
    /// layers.
    pub solid_color_layers: bool,
    /// Collapse accumulators that hold exactly one image into image layers.
    pub image_layers: bool,
    /// Run the occlusion pass on each container.
    pub occlusion_culling: bool,
}

impl BuilderConfig {
    /// The default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_visible_rects: 4,
            max_opaque_rects: 4,
            max_visible_above_rects: 8,
            mask_cache_max_age: 3,
            solid_color_layers: true,
            image_layers: true,
            occlusion_culling: true,
        }
    }

    /// Every reduction and the occlusion pass disabled.
    ///
    /// Each accumulator becomes a painted layer and visible regions are left
    /// as requested.
    #[must_use]
    pub const fn conservative() -> Self {
        Self {
            solid_color_layers: false,
            image_layers: false,
            occlusion_culling: false,
            ..Self::new()
        }
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conservative_keeps_limits() {
        let c = BuilderConfig::conservative();
        assert_eq!(c.max_visible_rects, BuilderConfig::new().max_visible_rects);
        assert!(!c.occlusion_culling, "occlusion disabled");
        assert!(!c.solid_color_layers, "color layers disabled");
    }
}
