// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display item model.
//!
//! A [`DisplayList`] is the per-frame input to the layer builder: an ordered
//! list of [`DisplayItem`]s (back to front) plus the [`AnimationRoots`] they
//! reference. Each item has a stable [`ItemKey`] so the builder can recognize
//! it in the next frame, and a closed [`ItemKind`] describing what it paints.
//!
//! [`ItemGeometry`] is the immutable snapshot the builder keeps per item to
//! diff against the next frame.

mod clip;
mod geometry;
mod id;
mod list;
mod roots;

pub use clip::ItemClip;
pub use geometry::{ItemGeometry, PaintSignature};
pub use id::{AgrId, FrameId, ImageKey, ItemKey, ScrollId};
pub(crate) use list::merge_adjacent;
pub use list::{
    DisplayItem, DisplayList, ItemFlags, ItemKind, LayerState, WrapperEffect, WrapperItem,
};
pub use roots::{AnimationRoot, AnimationRoots, Chain};
