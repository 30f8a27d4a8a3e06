// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing and JSON layer-tree dumps for sediment diagnostics.
//!
//! - [`pretty::PrettyPrintSink`] — a [`TraceSink`](sediment_core::trace::TraceSink)
//!   writing one human-readable line per event.
//! - [`dump::dump_tree`] — a JSON snapshot of a
//!   [`LayerTree`](sediment_core::layer::LayerTree), for golden files and
//!   bug reports.

pub mod dump;
pub mod pretty;
