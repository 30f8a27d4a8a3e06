// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layer manager: transactions over a retained layer backend.
//!
//! A [`LayerManager`] owns everything that survives between frames: the
//! backend, the [`CorrelationRegistry`], the [`MaskCache`] and per-layer
//! paint data. Each frame is one transaction:
//!
//! ```text
//!   begin_transaction ──► build_container ──► end_transaction ──► paint_layer*
//!                              │                    │
//!                     layers recycled,       swept items discarded,
//!                     items invalidated      orphan layers destroyed,
//!                                            unused masks released
//! ```
//!
//! ```
//! use kurbo::Rect;
//! use sediment_core::color::Color;
//! use sediment_core::item::{AgrId, DisplayItem, DisplayList, ItemKey};
//! use sediment_core::layer::LayerTree;
//! use sediment_core::manager::{ContainerParameters, LayerManager, TransactionContext};
//!
//! let mut list = DisplayList::default();
//! list.push(DisplayItem::solid_color(
//!     ItemKey::new(1, 0),
//!     Rect::new(0.0, 0.0, 100.0, 100.0),
//!     Color::WHITE,
//!     AgrId(0),
//! ));
//! list.push(DisplayItem::generic(
//!     ItemKey::new(2, 0),
//!     Rect::new(10.0, 10.0, 50.0, 20.0),
//!     AgrId(0),
//! ));
//!
//! let mut manager = LayerManager::new(LayerTree::new());
//! let mut cx = TransactionContext::new();
//! manager.begin_transaction(&mut cx);
//! let params = ContainerParameters::new(Rect::new(0.0, 0.0, 100.0, 100.0));
//! let root = manager.build_container(&list, &params, &mut cx).map(|out| out.layer);
//! let summary = manager.end_transaction(&mut cx);
//!
//! assert!(root.is_some());
//! assert_eq!(summary.items, 2);
//! ```

use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};
use kurbo::{Rect, Vec2};

use crate::backend::LayerBackend;
use crate::builder::{self, BuildContext, invalidate_footprint};
use crate::color::Color;
use crate::config::BuilderConfig;
use crate::item::{AgrId, AnimationRoots, DisplayItem, DisplayList, FrameId, ItemKey};
use crate::layer::{LayerId, LayerKind, LayerTree};
use crate::mask::MaskCache;
use crate::paint::{ItemPainter, PaintContext, PaintedLayerData};
use crate::region::{Region, scale_rect_round_out};
use crate::registry::CorrelationRegistry;
use crate::trace::{LayerAllocationFailedEvent, TransactionBeginEvent, TransactionSummary, Tracer};
use crate::transform::Transform3d;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Describes the container a display list is built into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContainerParameters {
    /// Container bounds in container space.
    pub bounds: Rect,
    /// Pixels per container unit on each axis. Both must be positive.
    pub scale: Vec2,
    /// The animated geometry root the container itself moves with.
    pub root_agr: AgrId,
    /// Opaque color known to be behind the whole container, or transparent.
    pub background: Color,
}

impl ContainerParameters {
    /// Unscaled parameters rooted at `AgrId(0)` over a transparent
    /// background.
    #[must_use]
    pub const fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            scale: Vec2::new(1.0, 1.0),
            root_agr: AgrId(0),
            background: Color::TRANSPARENT,
        }
    }

    /// Returns `self` with a different resolution.
    #[must_use]
    pub const fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Returns `self` rooted at a different animated geometry root.
    #[must_use]
    pub const fn with_root(mut self, root_agr: AgrId) -> Self {
        self.root_agr = root_agr;
        self
    }

    /// Returns `self` with a background color.
    #[must_use]
    pub const fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }
}

/// The result of [`LayerManager::build_container`].
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerOutput {
    /// The container layer.
    pub layer: LayerId,
    /// Area the container paints opaquely, in container pixels.
    pub opaque: Region,
}

/// Reports the current document generation so a transaction can stop when
/// the document changes underneath it.
pub trait MutationCheck {
    /// The generation the document is at now.
    fn current_generation(&self) -> u64;
}

/// Per-transaction inputs supplied by the caller.
pub struct TransactionContext<'a> {
    /// Receives trace events.
    pub tracer: Tracer<'a>,
    /// Consulted before each item; `None` never aborts.
    pub mutation_check: Option<&'a dyn MutationCheck>,
}

impl core::fmt::Debug for TransactionContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TransactionContext")
            .field("tracer", &self.tracer)
            .field("mutation_check", &self.mutation_check.is_some())
            .finish()
    }
}

impl Default for TransactionContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TransactionContext<'a> {
    /// A context with no tracing and no mutation check.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tracer: Tracer::none(),
            mutation_check: None,
        }
    }

    /// A context that traces to `tracer`.
    #[must_use]
    pub fn with_tracer(tracer: Tracer<'a>) -> Self {
        Self {
            tracer,
            mutation_check: None,
        }
    }

    /// Returns `self` with a mutation check.
    #[must_use]
    pub fn with_mutation_check(mut self, check: &'a dyn MutationCheck) -> Self {
        self.mutation_check = Some(check);
        self
    }
}

/// Bookkeeping for the transaction in progress.
#[derive(Debug, Default)]
pub(crate) struct TransactionState {
    pub(crate) active: bool,
    pub(crate) aborted: bool,
    /// Layers kept or created this transaction.
    pub(crate) claimed: HashSet<LayerId>,
    /// Layers dropped from their container this transaction.
    pub(crate) orphans: Vec<LayerId>,
    pub(crate) summary: TransactionSummary,
    /// Area repainted in top-level layers, in container pixels.
    pub(crate) invalid_area: Region,
}

// ---------------------------------------------------------------------------
// LayerManager
// ---------------------------------------------------------------------------

/// Compiles display lists into a retained layer tree, one transaction per
/// frame.
#[derive(Debug)]
pub struct LayerManager<B: LayerBackend = LayerTree> {
    backend: B,
    config: BuilderConfig,
    registry: CorrelationRegistry,
    masks: MaskCache,
    painted: HashMap<LayerId, PaintedLayerData>,
    root: Option<LayerId>,
    transaction: u64,
    txn: TransactionState,
}

impl<B: LayerBackend> LayerManager<B> {
    /// Creates a manager over `backend` with the default configuration.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, BuilderConfig::new())
    }

    /// Creates a manager over `backend`.
    #[must_use]
    pub fn with_config(backend: B, config: BuilderConfig) -> Self {
        Self {
            backend,
            config,
            registry: CorrelationRegistry::new(),
            masks: MaskCache::new(),
            painted: HashMap::new(),
            root: None,
            transaction: 0,
            txn: TransactionState::default(),
        }
    }

    /// The backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend, mutably. Changing layers the manager created between
    /// transactions is allowed but may be overwritten by the next one.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// The correlation registry.
    #[must_use]
    pub fn registry(&self) -> &CorrelationRegistry {
        &self.registry
    }

    /// The top-level container layer, once built.
    #[must_use]
    pub fn root(&self) -> Option<LayerId> {
        self.root
    }

    /// The layer an item was committed to by the last transaction.
    #[must_use]
    pub fn layer_for_item(&self, key: ItemKey) -> Option<LayerId> {
        self.registry.lookup(key).map(|s| s.layer)
    }

    /// Paint data of a painted layer.
    #[must_use]
    pub fn painted_layer(&self, layer: LayerId) -> Option<&PaintedLayerData> {
        self.painted.get(&layer)
    }

    /// Area repainted in the top-level container by the last transaction, in
    /// container pixels.
    #[must_use]
    pub fn invalid_area(&self) -> &Region {
        &self.txn.invalid_area
    }

    /// The private layer manager of an inactive item.
    pub fn inactive_manager(&mut self, key: ItemKey) -> Option<&mut LayerManager<LayerTree>> {
        self.registry.inactive_mut(key)
    }

    // -- Transactions --

    /// Starts a transaction.
    ///
    /// # Panics
    ///
    /// Panics if a transaction is already in progress.
    pub fn begin_transaction(&mut self, cx: &mut TransactionContext<'_>) {
        assert!(!self.txn.active, "transaction already in progress");
        self.transaction += 1;
        self.txn = TransactionState {
            active: true,
            ..TransactionState::default()
        };
        cx.tracer.transaction_begin(&TransactionBeginEvent {
            transaction: self.transaction,
        });
    }

    /// Builds `list` into the top-level container.
    ///
    /// Call once per transaction. Returns `None` when the backend cannot
    /// allocate the container layer.
    ///
    /// # Panics
    ///
    /// Panics outside a transaction, on a non-positive scale, or when an
    /// item key appears twice in the list.
    pub fn build_container(
        &mut self,
        list: &DisplayList,
        params: &ContainerParameters,
        cx: &mut TransactionContext<'_>,
    ) -> Option<ContainerOutput> {
        self.build_items(&list.items, &list.roots, list.generation, params, cx)
    }

    pub(crate) fn build_items(
        &mut self,
        items: &[DisplayItem],
        roots: &AnimationRoots,
        generation: u64,
        params: &ContainerParameters,
        cx: &mut TransactionContext<'_>,
    ) -> Option<ContainerOutput> {
        assert!(self.txn.active, "build_container outside a transaction");
        assert!(
            params.scale.x > 0.0 && params.scale.y > 0.0,
            "container scale must be positive"
        );

        let root = match self.root.filter(|&r| self.backend.is_alive(r)) {
            Some(r) => r,
            None => {
                let Some(r) = self.backend.create_layer(LayerKind::Container) else {
                    cx.tracer.allocation_failed(&LayerAllocationFailedEvent {
                        transaction: self.transaction,
                        kind: Some(LayerKind::Container),
                        item: None,
                    });
                    return None;
                };
                self.root = Some(r);
                self.txn.summary.layers_created += 1;
                r
            }
        };
        self.txn.claimed.insert(root);
        self.backend.set_transform(
            root,
            Transform3d::from_scale(1.0 / params.scale.x, 1.0 / params.scale.y, 1.0),
        );
        self.backend.set_visible_region(
            root,
            &Region::from_rect(scale_rect_round_out(params.bounds, params.scale)),
        );

        let mut bcx = BuildContext {
            backend: &mut self.backend,
            registry: &mut self.registry,
            masks: &mut self.masks,
            painted: &mut self.painted,
            txn: &mut self.txn,
            config: &self.config,
            tx: cx,
            transaction: self.transaction,
        };
        let opaque =
            builder::build_container(&mut bcx, items, roots, generation, params, root, true);
        Some(ContainerOutput { layer: root, opaque })
    }

    /// Finishes the transaction and returns its counters.
    ///
    /// Items that were not built are removed from the registry and their
    /// last footprint is discarded from the layer that held them, unless
    /// the transaction was aborted. Layers no container kept are destroyed.
    ///
    /// # Panics
    ///
    /// Panics outside a transaction.
    pub fn end_transaction(&mut self, cx: &mut TransactionContext<'_>) -> TransactionSummary {
        assert!(self.txn.active, "end_transaction outside a transaction");

        if !self.txn.aborted {
            let swept = self.registry.sweep();
            self.txn.summary.entries_swept = swept.len();
            for (_, state) in swept {
                invalidate_footprint(
                    &mut self.backend,
                    &self.painted,
                    &mut self.txn,
                    state.layer,
                    &state.footprint,
                );
            }
        }
        self.registry.end_update();

        for layer in core::mem::take(&mut self.txn.orphans) {
            self.destroy_subtree(layer);
        }
        self.txn.summary.masks_released = self
            .masks
            .end_transaction(&mut self.backend, self.config.mask_cache_max_age);

        self.txn.active = false;
        self.txn.summary.transaction = self.transaction;
        self.txn.summary.aborted = self.txn.aborted;
        let summary = self.txn.summary;
        cx.tracer.transaction_summary(&summary);
        summary
    }

    /// Forgets every item produced by `frame` and discards their last
    /// footprints right away.
    pub fn frame_destroyed(&mut self, frame: FrameId) {
        for (_, state) in self.registry.remove_frame(frame) {
            invalidate_footprint(
                &mut self.backend,
                &self.painted,
                &mut self.txn,
                state.layer,
                &state.footprint,
            );
        }
    }

    fn destroy_subtree(&mut self, layer: LayerId) {
        let mut stack = Vec::from([layer]);
        let mut order = Vec::new();
        while let Some(l) = stack.pop() {
            if self.txn.claimed.contains(&l) || !self.backend.is_alive(l) {
                continue;
            }
            order.push(l);
            stack.extend(self.backend.children(l));
        }
        // Children before parents.
        for l in order.into_iter().rev() {
            for child in self.backend.children(l) {
                self.backend.detach(child);
            }
            self.backend.detach(l);
            self.backend.destroy_layer(l);
            self.painted.remove(&l);
            self.txn.summary.layers_destroyed += 1;
        }
    }

    // -- Painting --

    /// Paints the part of `layer` that is visible but not yet valid.
    ///
    /// Returns whether anything was painted.
    pub fn paint_layer(&mut self, layer: LayerId, painter: &mut impl ItemPainter) -> bool {
        let Some(data) = self.painted.get(&layer) else {
            return false;
        };
        if !self.backend.is_alive(layer) {
            return false;
        }
        let region = self.backend.region_to_draw(layer);
        if region.is_empty() {
            return false;
        }
        let mut cx = PaintContext {
            layer,
            region: &region,
            data,
            registry: &mut self.registry,
        };
        painter.begin_layer(&cx);
        for item in &data.items {
            let local = item.visible_px - data.origin;
            if region.intersects_rect(local) {
                painter.paint_item(&mut cx, item);
            }
        }
        self.backend.mark_painted(layer);
        true
    }

    /// Paints every painted layer that needs it, in layer order. Returns how
    /// many were painted.
    pub fn paint_all(&mut self, painter: &mut impl ItemPainter) -> usize {
        let mut layers: Vec<LayerId> = self.painted.keys().copied().collect();
        layers.sort();
        let mut painted = 0;
        for layer in layers {
            if self.paint_layer(layer, painter) {
                painted += 1;
            }
        }
        painted
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
