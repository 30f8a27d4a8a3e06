// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for layer-building transactions.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! layer manager calls at each stage of a transaction. All method bodies
//! default to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`ItemAssignment`] and
//!   [`InvalidationRect`] events plus the corresponding `TraceSink` methods.

use crate::item::ItemKey;
use crate::layer::LayerKind;
#[cfg(feature = "trace-rich")]
use crate::layer::LayerId;
#[cfg(feature = "trace-rich")]
use kurbo::Rect;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted by [`LayerManager::begin_transaction`](crate::manager::LayerManager::begin_transaction).
#[derive(Clone, Copy, Debug)]
pub struct TransactionBeginEvent {
    /// Transaction counter.
    pub transaction: u64,
}

/// Emitted when a transaction stops early because the document changed
/// while its display list was being processed.
#[derive(Clone, Copy, Debug)]
pub struct TransactionAbortedEvent {
    /// Transaction counter.
    pub transaction: u64,
    /// Generation the display list was built from.
    pub list_generation: u64,
    /// Generation observed when the mismatch was detected.
    pub observed_generation: u64,
    /// Items processed before stopping.
    pub items_processed: usize,
}

/// Emitted when the backend refuses to allocate a layer or mask.
#[derive(Clone, Copy, Debug)]
pub struct LayerAllocationFailedEvent {
    /// Transaction counter.
    pub transaction: u64,
    /// Kind of layer requested, or `None` for a mask.
    pub kind: Option<LayerKind>,
    /// The item the layer was for, when it was a dedicated layer.
    pub item: Option<ItemKey>,
}

/// Per-transaction counters, emitted by
/// [`LayerManager::end_transaction`](crate::manager::LayerManager::end_transaction)
/// and returned from it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransactionSummary {
    /// Transaction counter.
    pub transaction: u64,
    /// Display items processed, after merging adjacent items.
    pub items: usize,
    /// Adjacent items folded into a predecessor.
    pub merged: usize,
    /// Items that received a dedicated layer.
    pub dedicated: usize,
    /// Layers newly allocated.
    pub layers_created: usize,
    /// Layers reused from the previous transaction.
    pub layers_recycled: usize,
    /// Layers destroyed because no container kept them.
    pub layers_destroyed: usize,
    /// Correlation entries removed because their item disappeared.
    pub entries_swept: usize,
    /// Masks released by the cache.
    pub masks_released: usize,
    /// Total invalidated area, in layer pixels.
    pub invalidated_area: f64,
    /// Whether the transaction stopped early.
    pub aborted: bool,
}

/// Records which layer an item ended up in.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct ItemAssignment {
    /// Transaction counter.
    pub transaction: u64,
    /// The item.
    pub item: ItemKey,
    /// The layer holding it.
    pub layer: LayerId,
    /// Whether the layer holds only this item.
    pub dedicated: bool,
}

/// One rectangle invalidated in a raster layer.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct InvalidationRect {
    /// Transaction counter.
    pub transaction: u64,
    /// The invalidated layer.
    pub layer: LayerId,
    /// The rectangle, in layer pixels.
    pub rect: Rect,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the layer manager.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a transaction begins.
    fn on_transaction_begin(&mut self, e: &TransactionBeginEvent) {
        _ = e;
    }

    /// Called when a transaction is cut short.
    fn on_transaction_aborted(&mut self, e: &TransactionAbortedEvent) {
        _ = e;
    }

    /// Called when a backend allocation fails.
    fn on_allocation_failed(&mut self, e: &LayerAllocationFailedEvent) {
        _ = e;
    }

    /// Called with the counters of a finished transaction.
    fn on_transaction_summary(&mut self, s: &TransactionSummary) {
        _ = s;
    }

    /// Called once per item placed in a layer (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    fn on_item_assignment(&mut self, e: &ItemAssignment) {
        _ = e;
    }

    /// Called once per invalidated rectangle (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    fn on_invalidation_rect(&mut self, e: &InvalidationRect) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Returns a tracer that dispatches to the same sink for a shorter
    /// lifetime, for nested transactions.
    #[inline]
    #[must_use]
    pub fn reborrow(&mut self) -> Tracer<'_> {
        #[cfg(feature = "trace")]
        {
            if let Some(s) = &mut self.sink {
                return Tracer::new(&mut **s);
            }
        }
        Tracer::none()
    }

    /// Emits a [`TransactionBeginEvent`].
    #[inline]
    pub fn transaction_begin(&mut self, e: &TransactionBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_transaction_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TransactionAbortedEvent`].
    #[inline]
    pub fn transaction_aborted(&mut self, e: &TransactionAbortedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_transaction_aborted(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`LayerAllocationFailedEvent`].
    #[inline]
    pub fn allocation_failed(&mut self, e: &LayerAllocationFailedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_allocation_failed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TransactionSummary`].
    #[inline]
    pub fn transaction_summary(&mut self, s: &TransactionSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_transaction_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits an [`ItemAssignment`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn item_assignment(&mut self, e: &ItemAssignment) {
        if let Some(s) = &mut self.sink {
            s.on_item_assignment(e);
        }
    }

    /// Emits an [`InvalidationRect`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn invalidation_rect(&mut self, e: &InvalidationRect) {
        if let Some(s) = &mut self.sink {
            s.on_invalidation_rect(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        begun: Vec<u64>,
        summaries: Vec<TransactionSummary>,
    }

    impl TraceSink for Recorder {
        fn on_transaction_begin(&mut self, e: &TransactionBeginEvent) {
            self.begun.push(e.transaction);
        }

        fn on_transaction_summary(&mut self, s: &TransactionSummary) {
            self.summaries.push(*s);
        }
    }

    #[test]
    fn none_tracer_discards_events() {
        let mut tracer = Tracer::none();
        tracer.transaction_begin(&TransactionBeginEvent { transaction: 1 });
        tracer.transaction_summary(&TransactionSummary::default());
    }

    #[test]
    fn noop_sink_accepts_everything() {
        let mut sink = NoopSink;
        let mut tracer = Tracer::new(&mut sink);
        tracer.allocation_failed(&LayerAllocationFailedEvent {
            transaction: 1,
            kind: Some(LayerKind::Painted),
            item: None,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        let mut rec = Recorder::default();
        {
            let mut tracer = Tracer::new(&mut rec);
            tracer.transaction_begin(&TransactionBeginEvent { transaction: 3 });
            tracer.transaction_summary(&TransactionSummary {
                transaction: 3,
                items: 2,
                ..TransactionSummary::default()
            });
        }
        assert_eq!(rec.begun, [3]);
        assert_eq!(rec.summaries[0].items, 2);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn reborrowed_tracer_reaches_the_same_sink() {
        let mut rec = Recorder::default();
        {
            let mut outer = Tracer::new(&mut rec);
            outer.transaction_begin(&TransactionBeginEvent { transaction: 1 });
            {
                let mut nested = outer.reborrow();
                nested.transaction_begin(&TransactionBeginEvent { transaction: 2 });
            }
            outer.transaction_begin(&TransactionBeginEvent { transaction: 3 });
        }
        assert_eq!(rec.begun, [1, 2, 3]);
    }

    #[cfg(not(feature = "trace"))]
    #[test]
    fn tracer_is_silent_without_feature() {
        let mut rec = Recorder::default();
        {
            let mut tracer = Tracer::new(&mut rec);
            tracer.transaction_begin(&TransactionBeginEvent { transaction: 3 });
        }
        assert!(rec.begun.is_empty());
        assert!(rec.summaries.is_empty());
    }
}
