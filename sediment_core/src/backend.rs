// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contract between the layer builder and the retained layer objects.
//!
//! The builder never owns layers. It creates, configures, reuses and
//! destroys them through [`LayerBackend`], holding only [`LayerId`] handles.
//! [`LayerTree`] is the in-crate implementation; embedders with their own
//! compositor objects implement the trait for those.
//!
//! # Crate boundaries
//!
//! `sediment_core` owns the display-item model, the builder and this
//! contract. Rasterization happens in the embedder, driven by
//! [`LayerManager::paint_layer`](crate::manager::LayerManager::paint_layer).
//! Composition is out of scope: a compositor reads the committed tree, and
//! [`LayerTree::take_changed`] reports which layers a transaction touched.

use alloc::vec::Vec;

use kurbo::Rect;

use crate::color::Color;
use crate::item::{ImageKey, ScrollId};
use crate::layer::{LayerId, LayerKind, LayerTree, MaskId};
use crate::mask::MaskGeometry;
use crate::region::Region;
use crate::transform::Transform3d;

/// Retained layer storage driven by the builder.
///
/// Handles passed to any method other than
/// [`create_layer`](Self::create_layer) must be alive; implementations may
/// panic on stale handles. All regions are in the layer's own pixel space.
pub trait LayerBackend {
    // -- Lifecycle --

    /// Allocates a detached layer, or returns `None` on allocation failure.
    fn create_layer(&mut self, kind: LayerKind) -> Option<LayerId>;

    /// Destroys a layer that has no children.
    fn destroy_layer(&mut self, layer: LayerId);

    /// Returns whether `layer` still refers to a live layer.
    fn is_alive(&self, layer: LayerId) -> bool;

    /// Returns the kind a layer was created with.
    fn kind(&self, layer: LayerId) -> LayerKind;

    // -- Topology --

    /// Returns the children of a layer in paint order.
    fn children(&self, layer: LayerId) -> Vec<LayerId>;

    /// Replaces the children of `parent`. Layers dropped from the list stay
    /// alive, detached.
    fn set_children(&mut self, parent: LayerId, children: &[LayerId]);

    /// Detaches a layer from its parent.
    fn detach(&mut self, layer: LayerId);

    // -- Properties --

    /// Sets the region of the layer that may be shown.
    fn set_visible_region(&mut self, layer: LayerId, region: &Region);

    /// Sets the clip rectangle, in the parent's space.
    fn set_clip_rect(&mut self, layer: LayerId, clip: Option<Rect>);

    /// Sets the transform from layer space to the parent's space.
    fn set_transform(&mut self, layer: LayerId, transform: Transform3d);

    /// Sets the group opacity.
    fn set_opacity(&mut self, layer: LayerId, opacity: f32);

    /// Declares that the content covers the visible region opaquely.
    fn set_content_opaque(&mut self, layer: LayerId, opaque: bool);

    /// Sets the fill of a color layer.
    fn set_color(&mut self, layer: LayerId, color: Color, rect: Rect);

    /// Sets the content of an image layer.
    fn set_image(&mut self, layer: LayerId, image: ImageKey, rect: Rect);

    /// Attaches or detaches a mask.
    fn set_mask(&mut self, layer: LayerId, mask: Option<MaskId>);

    /// Attaches scroll metadata, innermost scroll frame first.
    fn set_scroll_metadata(&mut self, layer: LayerId, scroll: &[ScrollId]);

    /// Hints the color known to be behind a layer.
    fn set_background_color(&mut self, layer: LayerId, color: Color) {
        _ = (layer, color);
    }

    // -- Raster content --

    /// Discards the contents of `region` in a painted layer.
    fn invalidate_region(&mut self, layer: LayerId, region: &Region);

    /// Discards every pixel of a painted layer.
    fn invalidate_all(&mut self, layer: LayerId);

    /// Returns the pixels that must be drawn before the layer is composited.
    fn region_to_draw(&self, layer: LayerId) -> Region;

    /// Records that [`region_to_draw`](Self::region_to_draw) has been drawn.
    fn mark_painted(&mut self, layer: LayerId);

    // -- Masks --

    /// Allocates a mask, or returns `None` on allocation failure.
    fn create_mask(&mut self, geometry: &MaskGeometry) -> Option<MaskId>;

    /// Releases a mask no longer referenced by the builder.
    fn release_mask(&mut self, mask: MaskId) {
        _ = mask;
    }
}

impl LayerBackend for LayerTree {
    fn create_layer(&mut self, kind: LayerKind) -> Option<LayerId> {
        self.create_layer(kind)
    }

    fn destroy_layer(&mut self, layer: LayerId) {
        self.destroy_layer(layer);
    }

    fn is_alive(&self, layer: LayerId) -> bool {
        self.is_alive(layer)
    }

    fn kind(&self, layer: LayerId) -> LayerKind {
        self.kind(layer)
    }

    fn children(&self, layer: LayerId) -> Vec<LayerId> {
        self.children(layer).collect()
    }

    fn set_children(&mut self, parent: LayerId, children: &[LayerId]) {
        self.set_children(parent, children);
    }

    fn detach(&mut self, layer: LayerId) {
        self.detach(layer);
    }

    fn set_visible_region(&mut self, layer: LayerId, region: &Region) {
        self.set_visible_region(layer, region);
    }

    fn set_clip_rect(&mut self, layer: LayerId, clip: Option<Rect>) {
        self.set_clip(layer, clip);
    }

    fn set_transform(&mut self, layer: LayerId, transform: Transform3d) {
        self.set_transform(layer, transform);
    }

    fn set_opacity(&mut self, layer: LayerId, opacity: f32) {
        self.set_opacity(layer, opacity);
    }

    fn set_content_opaque(&mut self, layer: LayerId, opaque: bool) {
        self.set_content_opaque(layer, opaque);
    }

    fn set_color(&mut self, layer: LayerId, color: Color, rect: Rect) {
        self.set_color(layer, color, rect);
    }

    fn set_image(&mut self, layer: LayerId, image: ImageKey, rect: Rect) {
        self.set_image(layer, image, rect);
    }

    fn set_mask(&mut self, layer: LayerId, mask: Option<MaskId>) {
        self.set_mask(layer, mask);
    }

    fn set_scroll_metadata(&mut self, layer: LayerId, scroll: &[ScrollId]) {
        self.set_scroll_metadata(layer, scroll);
    }

    fn set_background_color(&mut self, layer: LayerId, color: Color) {
        self.set_background_color(layer, color);
    }

    fn invalidate_region(&mut self, layer: LayerId, region: &Region) {
        self.invalidate_region(layer, region);
    }

    fn invalidate_all(&mut self, layer: LayerId) {
        self.invalidate_all(layer);
    }

    fn region_to_draw(&self, layer: LayerId) -> Region {
        self.region_to_draw(layer)
    }

    fn mark_painted(&mut self, layer: LayerId) {
        self.mark_painted(layer);
    }

    fn create_mask(&mut self, geometry: &MaskGeometry) -> Option<MaskId> {
        self.create_mask(geometry)
    }

    fn release_mask(&mut self, mask: MaskId) {
        self.release_mask(mask);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn drive<B: LayerBackend>(backend: &mut B) -> LayerId {
        let root = backend.create_layer(LayerKind::Container).unwrap();
        let child = backend.create_layer(LayerKind::Painted).unwrap();
        backend.set_children(root, &[child]);
        backend.set_visible_region(child, &Region::from_rect(Rect::new(0.0, 0.0, 8.0, 8.0)));
        child
    }

    #[test]
    fn layer_tree_behaves_as_backend() {
        let mut tree = LayerTree::new();
        let child = drive(&mut tree);
        assert_eq!(LayerBackend::kind(&tree, child), LayerKind::Painted);
        assert_eq!(
            LayerBackend::region_to_draw(&tree, child),
            Region::from_rect(Rect::new(0.0, 0.0, 8.0, 8.0))
        );
        let root = tree.parent(child).unwrap();
        assert_eq!(LayerBackend::children(&tree, root), vec![child]);
    }
}
