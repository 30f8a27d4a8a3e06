// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compiles display lists into a retained layer tree with incremental
//! invalidation.
//!
//! `sediment_core` takes one frame's flat, back-to-front list of display
//! items and decides which retained layer each item lands in: most items
//! share raster ("painted") layers, some get dedicated layers, and a few
//! collapse into color or image layers. Across frames it recycles layers,
//! diffs item geometry, and invalidates only the pixels that actually
//! changed. It is `no_std` compatible (with `alloc`).
//!
//! # Architecture
//!
//! ```text
//!   DisplayList ──► LayerManager::build_container
//!                        │
//!                        ├─ merge adjacent items
//!                        ├─ assign items to accumulators (z-order graph)
//!                        ├─ recycle or create layers ──► LayerBackend
//!                        ├─ diff against CorrelationRegistry ──► invalidate
//!                        └─ occlusion culling ──► visible regions
//!                        │
//!   end_transaction ──► sweep stale items, destroy orphan layers
//!                        │
//!   paint_layer ──► ItemPainter
//! ```
//!
//! **[`item`]** — Display items, clips, geometry snapshots and animated
//! geometry roots.
//!
//! **[`layer`]** — Struct-of-arrays layer tree with generational handles,
//! the reference [`LayerBackend`](backend::LayerBackend).
//!
//! **[`dirty`]** — Dirty channels used by the layer tree via
//! `understory_dirty`.
//!
//! **[`manager`]** — [`LayerManager`](manager::LayerManager) and the
//! transaction lifecycle.
//!
//! **[`registry`]** — Per-item correlation state kept between transactions.
//!
//! **[`paint`]** — The [`ItemPainter`](paint::ItemPainter) trait and paint
//! data for raster layers.
//!
//! **[`mask`]** — Rounded-rect mask cache.
//!
//! **[`region`]** — Integer-friendly rectangle sets.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! transaction instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-item
//!   assignment and per-rect invalidation events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
pub mod color;
pub mod config;
pub mod dirty;
pub mod item;
pub mod layer;
pub mod manager;
pub mod mask;
pub mod paint;
pub mod region;
pub mod registry;
pub mod trace;
pub mod transform;

mod accumulator;
mod assign;
mod builder;
mod invalidate;
mod occlusion;

pub use manager::{
    ContainerOutput, ContainerParameters, LayerManager, MutationCheck, TransactionContext,
};
