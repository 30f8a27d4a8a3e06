// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use sediment_core::layer::LayerKind;
use sediment_core::trace::{
    InvalidationRect, ItemAssignment, LayerAllocationFailedEvent, TraceSink,
    TransactionAbortedEvent, TransactionBeginEvent, TransactionSummary,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    /// Whether per-item and per-rect events are printed.
    verbose: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            verbose: false,
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            verbose: false,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            verbose: false,
        }
    }

    /// Also print item assignments and invalidated rectangles.
    #[must_use]
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn kind_name(kind: Option<LayerKind>) -> &'static str {
    match kind {
        Some(LayerKind::Container) => "container",
        Some(LayerKind::Painted) => "painted",
        Some(LayerKind::Color) => "color",
        Some(LayerKind::Image) => "image",
        None => "mask",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_transaction_begin(&mut self, e: &TransactionBeginEvent) {
        let _ = writeln!(self.writer, "[begin] txn={}", e.transaction);
    }

    fn on_transaction_aborted(&mut self, e: &TransactionAbortedEvent) {
        let _ = writeln!(
            self.writer,
            "[abort] txn={} list_gen={} observed_gen={} after={} items",
            e.transaction, e.list_generation, e.observed_generation, e.items_processed,
        );
    }

    fn on_allocation_failed(&mut self, e: &LayerAllocationFailedEvent) {
        let item = match e.item {
            Some(key) => format!(" item={key:?}"),
            None => String::new(),
        };
        let _ = writeln!(
            self.writer,
            "[alloc:failed] txn={} kind={}{item}",
            e.transaction,
            kind_name(e.kind),
        );
    }

    fn on_transaction_summary(&mut self, s: &TransactionSummary) {
        let status = if s.aborted { "ABORTED" } else { "ok" };
        let _ = writeln!(
            self.writer,
            "[summary] txn={} items={} merged={} dedicated={} \
             layers(+{} ~{} -{}) swept={} masks_released={} invalid={:.0}px² {status}",
            s.transaction,
            s.items,
            s.merged,
            s.dedicated,
            s.layers_created,
            s.layers_recycled,
            s.layers_destroyed,
            s.entries_swept,
            s.masks_released,
            s.invalidated_area,
        );
    }

    fn on_item_assignment(&mut self, e: &ItemAssignment) {
        if !self.verbose {
            return;
        }
        let how = if e.dedicated { "dedicated" } else { "shared" };
        let _ = writeln!(
            self.writer,
            "[item] txn={} {:?} -> {:?} ({how})",
            e.transaction, e.item, e.layer,
        );
    }

    fn on_invalidation_rect(&mut self, e: &InvalidationRect) {
        if !self.verbose {
            return;
        }
        let r = e.rect;
        let _ = writeln!(
            self.writer,
            "[invalidate] txn={} {:?} ({}, {}, {}, {})",
            e.transaction, e.layer, r.x0, r.y0, r.x1, r.y1,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sediment_core::item::ItemKey;
    use sediment_core::layer::LayerId;

    #[test]
    fn pretty_print_summary() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_transaction_summary(&TransactionSummary {
            transaction: 3,
            items: 12,
            layers_created: 2,
            ..TransactionSummary::default()
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("[summary]"), "got: {output}");
        assert!(output.contains("txn=3"), "got: {output}");
        assert!(output.contains("items=12"), "got: {output}");
        assert!(output.contains("ok"), "got: {output}");
    }

    #[test]
    fn rich_events_need_verbose() {
        let event = ItemAssignment {
            transaction: 1,
            item: ItemKey::new(4, 0),
            layer: LayerId::from_raw(2, 0),
            dedicated: true,
        };
        let mut quiet = PrettyPrintSink::with_writer(Vec::<u8>::new());
        quiet.on_item_assignment(&event);
        assert!(quiet.into_inner().is_empty(), "quiet sink prints nothing");

        let mut loud = PrettyPrintSink::with_writer(Vec::<u8>::new()).verbose();
        loud.on_item_assignment(&event);
        let output = String::from_utf8(loud.into_inner()).unwrap();
        assert!(output.contains("dedicated"), "got: {output}");
    }

    #[test]
    fn failed_mask_allocation_names_mask() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_allocation_failed(&LayerAllocationFailedEvent {
            transaction: 1,
            kind: None,
            item: None,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("kind=mask"), "got: {output}");
    }
}
