// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sibling-list iteration.

use super::id::{INVALID, LayerId};
use super::tree::LayerTree;

/// An iterator over the direct children of a layer.
///
/// Created by [`LayerTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a LayerTree,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a LayerTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = LayerId;

    fn next(&mut self) -> Option<LayerId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        Some(LayerId {
            idx,
            generation: self.tree.generation[idx as usize],
        })
    }
}
