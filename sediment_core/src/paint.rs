// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Painting retained raster layers.
//!
//! After a transaction, every painted layer remembers which items it holds
//! and where its pixel grid sits. [`LayerManager::paint_layer`] hands those
//! items to an [`ItemPainter`] together with the region that actually needs
//! pixels; the painter draws and the layer's valid region grows to cover its
//! visible region.
//!
//! Coordinates: item geometry is in container space. Multiply by
//! [`PaintContext::scale`] and subtract [`PaintContext::origin`] to get layer
//! pixels.
//!
//! [`LayerManager::paint_layer`]: crate::manager::LayerManager::paint_layer

use alloc::vec::Vec;

use kurbo::{Rect, Vec2};

use crate::color::Color;
use crate::item::{AgrId, DisplayItem, ItemKey};
use crate::layer::{LayerId, LayerTree};
use crate::manager::LayerManager;
use crate::region::Region;
use crate::registry::CorrelationRegistry;

/// One item held by a painted layer.
#[derive(Clone, Debug)]
pub struct PaintedItem {
    /// The item as placed, after merging with its neighbors.
    pub item: DisplayItem,
    /// Visible rect in container pixels.
    pub visible_px: Rect,
}

/// What the builder knows about one painted layer.
#[derive(Clone, Debug)]
pub struct PaintedLayerData {
    /// Whole-pixel position of the layer's origin in container pixels.
    pub origin: Vec2,
    /// Sub-pixel part of the animated geometry root's offset, in pixels.
    pub residual: Vec2,
    /// Container resolution the layer was built at.
    pub scale: Vec2,
    /// The animated geometry root the layer moves with.
    pub agr: AgrId,
    /// Items in paint order.
    pub items: Vec<PaintedItem>,
    /// Opaque color to paint under the items, or transparent.
    pub background: Color,
    /// Leading rounded clip segments applied through the layer mask instead
    /// of per item.
    pub common_clip_count: usize,
    pub(crate) top_level: bool,
}

/// State passed to an [`ItemPainter`] for one layer.
pub struct PaintContext<'a> {
    pub(crate) layer: LayerId,
    pub(crate) region: &'a Region,
    pub(crate) data: &'a PaintedLayerData,
    pub(crate) registry: &'a mut CorrelationRegistry,
}

impl core::fmt::Debug for PaintContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PaintContext")
            .field("layer", &self.layer)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl PaintContext<'_> {
    /// The layer being painted.
    #[must_use]
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// The area to paint, in layer pixels.
    #[must_use]
    pub fn region(&self) -> &Region {
        self.region
    }

    /// Position of the layer's pixel grid in container pixels.
    #[must_use]
    pub fn origin(&self) -> Vec2 {
        self.data.origin
    }

    /// Sub-pixel offset to apply when drawing.
    #[must_use]
    pub fn residual(&self) -> Vec2 {
        self.data.residual
    }

    /// Container resolution.
    #[must_use]
    pub fn scale(&self) -> Vec2 {
        self.data.scale
    }

    /// Opaque color known to be behind the layer, or transparent.
    #[must_use]
    pub fn background(&self) -> Color {
        self.data.background
    }

    /// How many leading rounded clip segments the layer mask already applies.
    #[must_use]
    pub fn common_clip_count(&self) -> usize {
        self.data.common_clip_count
    }

    /// Returns the private layer manager of an inactive item, so its layer
    /// tree can be painted into this layer.
    pub fn inactive_manager(&mut self, key: ItemKey) -> Option<&mut LayerManager<LayerTree>> {
        self.registry.inactive_mut(key)
    }
}

/// Draws items into a raster layer.
pub trait ItemPainter {
    /// Called once per layer before its items, typically to clear
    /// [`PaintContext::region`] to [`PaintContext::background`].
    fn begin_layer(&mut self, cx: &PaintContext<'_>) {
        _ = cx;
    }

    /// Paints one item, restricted to [`PaintContext::region`].
    fn paint_item(&mut self, cx: &mut PaintContext<'_>, item: &PaintedItem);
}
