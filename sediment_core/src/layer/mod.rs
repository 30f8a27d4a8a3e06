// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained layer tree.
//!
//! A *layer* is a node in a compositing tree. Each layer has:
//!
//! - An identity ([`LayerId`]): a generational handle that becomes stale when
//!   the layer is destroyed.
//! - A [`LayerKind`] fixed at creation.
//! - Topology: parent, first-child and sibling links forming an ordered tree.
//!   Children are replaced wholesale with [`LayerTree::set_children`].
//! - **Local properties** written by the builder: transform, opacity, clip
//!   rectangle, visible region, content-opaque flag, color or image content,
//!   mask, scroll metadata and a background color hint.
//! - **Raster state** for painted layers: the valid and invalid regions, in
//!   layer pixels.
//!
//! # Dirty tracking
//!
//! Property mutations mark the corresponding dirty channel (see
//! [`dirty`](crate::dirty)) and [`LayerTree::take_changed`] drains them.
//! TRANSFORM and OPACITY propagate to descendants; the remaining channels
//! are local to the modified layer.

mod id;
mod traverse;
mod tree;

pub use id::{INVALID, LayerId, LayerKind, MaskId};
pub use traverse::Children;
pub use tree::LayerTree;
