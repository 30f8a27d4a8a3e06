// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants for [`LayerTree`](crate::layer::LayerTree).
//!
//! Multi-channel dirty tracking (via [`understory_dirty`]) records which
//! layers a transaction touched so compositors can apply incremental updates.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`TRANSFORM`] and [`OPACITY`] use
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and have dependency
//!   edges from child to parent. A layer's on-screen transform and opacity
//!   depend on its ancestors, so marking a parent marks every descendant.
//!
//! - **Local-only**: [`CLIP`], [`CONTENT`] and [`VISIBLE`] are marked with the
//!   default policy. Only the explicitly marked layer appears in the drain
//!   output.
//!
//! - **Structural**: [`TOPOLOGY`] is marked on child-list changes and layer
//!   creation.
//!
//! # Consumption
//!
//! [`LayerTree::take_changed`](crate::layer::LayerTree::take_changed)
//! drains one channel at a time.

use understory_dirty::Channel;

/// Transform changed; descendants move with it.
pub const TRANSFORM: Channel = Channel::new(0);

/// Opacity changed; descendants fade with it.
pub const OPACITY: Channel = Channel::new(1);

/// Clip rectangle or mask changed.
pub const CLIP: Channel = Channel::new(2);

/// Raster content, color, image or invalid region changed.
pub const CONTENT: Channel = Channel::new(3);

/// Visible region changed.
pub const VISIBLE: Channel = Channel::new(4);

/// Tree topology changed.
pub const TOPOLOGY: Channel = Channel::new(5);
