// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Builds the layers of one container from its display items.
//!
//! Items are visited once, in paint order. Each one either gets a dedicated
//! layer (color, image, nested container, or an exclusive painted layer) or
//! joins a painted-layer accumulator chosen by the [`AssignmentTree`]. Every
//! layer reserves a slot when it is started, so the final child list is in
//! paint order even though accumulators finish out of order.
//!
//! Once all items are placed, accumulators become layers: recycled from the
//! previous transaction when one of their items was in a suitable layer,
//! invalidated item by item, and handed to the occlusion pass together with
//! the dedicated layers.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Rect, RoundedRect, RoundedRectRadii, Vec2};

use crate::accumulator::{AssignedItem, PaintedLayerAccumulator};
use crate::assign::{AssignmentTree, FinishedAccumulator};
use crate::backend::LayerBackend;
use crate::color::Color;
use crate::config::BuilderConfig;
use crate::invalidate::{first_paint_region, item_invalid_region, to_layer_pixels};
use crate::item::{
    AgrId, AnimationRoots, DisplayItem, ItemKey, ItemKind, LayerState, WrapperEffect,
    merge_adjacent,
};
use crate::layer::{LayerId, LayerKind, LayerTree};
use crate::manager::{ContainerParameters, LayerManager, TransactionContext, TransactionState};
use crate::mask::{MaskCache, MaskGeometry};
use crate::occlusion::{LayerEntry, OcclusionParams, chain_clip_px, cull_and_apply};
use crate::paint::{PaintedItem, PaintedLayerData};
use crate::region::{Region, rect_is_empty, scale_rect_round_out};
use crate::registry::{CorrelationRegistry, EntryState};
#[cfg(feature = "trace-rich")]
use crate::trace::{InvalidationRect, ItemAssignment};
use crate::trace::{LayerAllocationFailedEvent, TransactionAbortedEvent};
use crate::transform::Transform3d;

/// Everything a container build mutates, borrowed from the manager.
pub(crate) struct BuildContext<'a, 't, B: LayerBackend + ?Sized> {
    pub(crate) backend: &'a mut B,
    pub(crate) registry: &'a mut CorrelationRegistry,
    pub(crate) masks: &'a mut MaskCache,
    pub(crate) painted: &'a mut HashMap<LayerId, PaintedLayerData>,
    pub(crate) txn: &'a mut TransactionState,
    pub(crate) config: &'a BuilderConfig,
    pub(crate) tx: &'a mut TransactionContext<'t>,
    pub(crate) transaction: u64,
}

/// Builds `items` into the children of `layer` and returns the opaque region
/// of the container's root group, in container pixels.
pub(crate) fn build_container<B: LayerBackend + ?Sized>(
    cx: &mut BuildContext<'_, '_, B>,
    items: &[DisplayItem],
    roots: &AnimationRoots,
    generation: u64,
    params: &ContainerParameters,
    layer: LayerId,
    top_level: bool,
) -> Region {
    let merged = merge_adjacent(items);
    cx.txn.summary.merged += items.len() - merged.len();

    let previous = cx.backend.children(layer);
    let mut container = Container {
        roots,
        params: *params,
        generation,
        top_level,
        recyclable: previous.iter().copied().collect(),
        slots: Vec::new(),
        pending: Vec::new(),
    };
    let mut tree = AssignmentTree::new(
        roots,
        params.root_agr,
        params.scale,
        params.background,
        cx.config.max_visible_above_rects,
    );

    for index in 0..merged.len() {
        if cx.txn.aborted {
            break;
        }
        if let Some(check) = cx.tx.mutation_check {
            let observed = check.current_generation();
            if observed != generation {
                cx.txn.aborted = true;
                cx.tx.tracer.transaction_aborted(&TransactionAbortedEvent {
                    transaction: cx.transaction,
                    list_generation: generation,
                    observed_generation: observed,
                    items_processed: cx.txn.summary.items,
                });
                break;
            }
        }
        cx.txn.summary.items += 1;
        container.place_item(cx, &mut tree, &merged, index);
    }

    tree.finish();
    let mut finished = core::mem::take(&mut tree.finished);
    finished.append(&mut container.pending);
    // Lower slots claim recyclable layers first.
    finished.sort_by_key(|f| f.acc.slot);
    for f in finished {
        container.finish_accumulator(cx, f, &merged);
    }

    let mut entries: Vec<LayerEntry> = core::mem::take(&mut container.slots)
        .into_iter()
        .flatten()
        .collect();
    let occlusion = OcclusionParams {
        roots,
        root_agr: params.root_agr,
        scale: params.scale,
        bounds_px: scale_rect_round_out(params.bounds, params.scale),
        cull: cx.config.occlusion_culling,
    };
    let opaque = cull_and_apply(&mut entries, &occlusion, &mut *cx.backend);
    let mut children: Vec<LayerId> = entries.iter().map(|e| e.layer).collect();
    if cx.txn.aborted {
        // Items after the abort point were never placed; their old layers
        // stay on screen above the rebuilt ones until the next transaction.
        for old in previous {
            if container.recyclable.remove(&old) {
                cx.txn.claimed.insert(old);
                children.push(old);
            }
        }
    }
    cx.backend.set_children(layer, &children);
    cx.txn.orphans.extend(container.recyclable.drain());
    opaque
}

/// Per-container build state.
struct Container<'l> {
    roots: &'l AnimationRoots,
    params: ContainerParameters,
    generation: u64,
    top_level: bool,
    /// Children of the container at the start of the build, not yet claimed.
    recyclable: HashSet<LayerId>,
    /// Committed layers by slot; `None` until finished or when allocation
    /// failed.
    slots: Vec<Option<LayerEntry>>,
    /// Exclusive painted layers waiting for the final pass.
    pending: Vec<FinishedAccumulator>,
}

impl Container<'_> {
    fn place_item<B: LayerBackend + ?Sized>(
        &mut self,
        cx: &mut BuildContext<'_, '_, B>,
        tree: &mut AssignmentTree<'_>,
        items: &[Cow<'_, DisplayItem>],
        index: usize,
    ) {
        let item = &*items[index];
        let scale = self.params.scale;
        let chain_clip = chain_clip_px(self.roots, item.agr, self.params.root_agr, scale);
        let visible_px = clip_rect(scale_rect_round_out(item.clipped_visible(), scale), chain_clip);

        let state = item.layer_state();
        match state {
            LayerState::Active | LayerState::ActiveEmpty => {
                let build_empty = state == LayerState::ActiveEmpty || item.flags.build_when_empty;
                if rect_is_empty(visible_px) && !build_empty {
                    return;
                }
                self.build_dedicated(cx, tree, item, index, visible_px, chain_clip);
            }
            LayerState::None | LayerState::Inactive => {
                if rect_is_empty(visible_px) {
                    return;
                }
                let opaque_px = self.opaque_px(item, chain_clip);
                let mut entry = AssignedItem::new(index, item, visible_px, scale);
                if state == LayerState::Inactive {
                    self.build_inactive(cx, item, &mut entry);
                }
                let slot = self.slots.len();
                let acc = tree.find_or_create(item.agr, visible_px, item.fixed_anchor, || {
                    PaintedLayerAccumulator::new(item.agr, item.fixed_anchor, slot)
                });
                if acc.slot == slot {
                    self.slots.push(None);
                }
                acc.accumulate(entry, item, &opaque_px, cx.config);
            }
        }
    }

    fn opaque_px(&self, item: &DisplayItem, chain_clip: Option<Rect>) -> Region {
        let mut opaque = item
            .clip
            .approximate_intersect_inward(&item.opaque_region())
            .scale_round_in(self.params.scale);
        if let Some(c) = chain_clip {
            opaque.intersect_rect(c);
        }
        opaque
    }

    // -- Dedicated layers --

    fn build_dedicated<B: LayerBackend + ?Sized>(
        &mut self,
        cx: &mut BuildContext<'_, '_, B>,
        tree: &mut AssignmentTree<'_>,
        item: &DisplayItem,
        index: usize,
        visible_px: Rect,
        chain_clip: Option<Rect>,
    ) {
        let scale = self.params.scale;
        let covered = if item.flags.animated {
            None
        } else {
            Some(visible_px)
        };
        let kind = match &item.kind {
            ItemKind::Generic { .. } | ItemKind::Border { .. } => {
                let background = tree.adding_own_layer(item.agr, covered, true);
                let slot = self.slots.len();
                self.slots.push(None);
                let mut acc = PaintedLayerAccumulator::new(item.agr, item.fixed_anchor, slot);
                let opaque_px = self.opaque_px(item, chain_clip);
                acc.accumulate(
                    AssignedItem::new(index, item, visible_px, scale),
                    item,
                    &opaque_px,
                    cx.config,
                );
                cx.txn.summary.dedicated += 1;
                self.pending.push(FinishedAccumulator { acc, background });
                return;
            }
            ItemKind::SolidColor { .. } => LayerKind::Color,
            ItemKind::Image { .. } => LayerKind::Image,
            ItemKind::Wrapper(_) | ItemKind::Metadata { .. } => LayerKind::Container,
        };

        let _ = tree.adding_own_layer(item.agr, covered, false);
        let slot = self.slots.len();
        self.slots.push(None);
        let Some((layer, _)) = self.obtain_layer(cx, core::iter::once(item.key), kind) else {
            cx.tx.tracer.allocation_failed(&LayerAllocationFailedEvent {
                transaction: cx.transaction,
                kind: Some(kind),
                item: Some(item.key),
            });
            return;
        };
        cx.txn.summary.dedicated += 1;
        cx.painted.remove(&layer);

        let (origin, _) = self.agr_origin(item.agr);
        let clip = intersect_clips(
            item.clip.bounds().map(|b| scale_rect_round_out(b, scale)),
            chain_clip,
        );
        let mut entry = LayerEntry::translated(layer, item.agr, item.fixed_anchor, origin);
        entry.clip = clip;
        if !rect_is_empty(visible_px) {
            entry.visible = Region::from_rect(visible_px);
        }

        match &item.kind {
            ItemKind::SolidColor { color } => {
                let bounds_px = scale_rect_round_out(item.clipped_bounds(), scale);
                cx.backend.set_transform(layer, translation(origin));
                cx.backend.set_clip_rect(layer, clip);
                cx.backend.set_color(layer, *color, bounds_px - origin);
                cx.backend.set_content_opaque(layer, color.is_opaque());
                if color.is_opaque() {
                    entry.opaque = entry.visible.clone();
                }
            }
            ItemKind::Image { image, opaque } => {
                let bounds_px = scale_rect_round_out(item.bounds, scale);
                cx.backend.set_transform(layer, translation(origin));
                cx.backend.set_clip_rect(layer, clip);
                cx.backend.set_image(layer, *image, bounds_px - origin);
                cx.backend.set_content_opaque(layer, *opaque);
                if *opaque {
                    entry.opaque = self.opaque_px(item, chain_clip);
                    entry.opaque.intersect(&entry.visible);
                }
            }
            ItemKind::Wrapper(w) => {
                let (transform, opacity) = match w.effect {
                    WrapperEffect::Opacity(o) => (Transform3d::IDENTITY, o),
                    WrapperEffect::Transform(t) => {
                        let s = Transform3d::from_scale(scale.x, scale.y, 1.0);
                        let s_inv = Transform3d::from_scale(1.0 / scale.x, 1.0 / scale.y, 1.0);
                        (s * t * s_inv, 1.0)
                    }
                };
                cx.backend.set_transform(layer, transform);
                cx.backend.set_opacity(layer, opacity);
                cx.backend.set_clip_rect(layer, clip);
                cx.backend.set_mask(layer, None);

                let inner_bounds = children_bounds(&w.children);
                let inner = ContainerParameters {
                    bounds: inner_bounds,
                    scale,
                    root_agr: item.agr,
                    background: Color::TRANSPARENT,
                };
                let inner_opaque = build_container(
                    cx,
                    &w.children,
                    self.roots,
                    self.generation,
                    &inner,
                    layer,
                    false,
                );

                if transform.is_integer_translation() {
                    let t = transform.translation();
                    entry.origin = Some(t);
                    if opacity >= 1.0 {
                        entry.opaque = inner_opaque.translated(t);
                        entry.opaque.intersect(&entry.visible);
                    }
                } else {
                    entry.origin = None;
                    entry.layer_visible =
                        Region::from_rect(scale_rect_round_out(inner_bounds, scale));
                }
            }
            ItemKind::Metadata { scroll } => {
                cx.backend.set_transform(layer, Transform3d::IDENTITY);
                cx.backend.set_children(layer, &[]);
                entry.origin = Some(Vec2::ZERO);
                entry.own_scroll = Some(*scroll);
            }
            ItemKind::Generic { .. } | ItemKind::Border { .. } => {
                unreachable!("painted dedicated items are finished as accumulators")
            }
        }
        self.slots[slot] = Some(entry);

        #[cfg(feature = "trace-rich")]
        cx.tx.tracer.item_assignment(&ItemAssignment {
            transaction: cx.transaction,
            item: item.key,
            layer,
            dedicated: true,
        });
        self.record_dedicated(cx, item, layer);
    }

    /// Registers a dedicated item and reports what changed about it.
    fn record_dedicated<B: LayerBackend + ?Sized>(
        &self,
        cx: &mut BuildContext<'_, '_, B>,
        item: &DisplayItem,
        layer: LayerId,
    ) {
        let scale = self.params.scale;
        let offset = self.roots.offset(item.agr);
        let old = cx.registry.lookup(item.key).cloned();
        let changed = match &old {
            Some(old) if old.layer == layer => item_invalid_region(old, item, offset),
            Some(old) => {
                invalidate_footprint(
                    &mut *cx.backend,
                    cx.painted,
                    cx.txn,
                    old.layer,
                    &old.footprint,
                );
                first_paint_region(item)
            }
            None => first_paint_region(item),
        };
        if self.top_level {
            cx.txn.invalid_area.union(&changed.scale_round_out(scale));
        }
        cx.registry.begin_update(
            item.key,
            EntryState {
                layer,
                geometry: item.geometry(),
                clip: item.clip.clone(),
                agr_offset: offset,
                footprint: Region::from_rect(scale_rect_round_out(item.clipped_bounds(), scale)),
            },
        );
    }

    // -- Inactive items --

    /// Runs the private layer manager of an inactive wrapper and records the
    /// area it repainted in the parent's space.
    fn build_inactive<B: LayerBackend + ?Sized>(
        &self,
        cx: &mut BuildContext<'_, '_, B>,
        item: &DisplayItem,
        entry: &mut AssignedItem,
    ) {
        let ItemKind::Wrapper(w) = &item.kind else {
            return;
        };
        let scale = self.params.scale;
        let mut manager = cx
            .registry
            .take_inactive(item.key)
            .unwrap_or_else(|| Box::new(LayerManager::with_config(LayerTree::new(), *cx.config)));

        let params = ContainerParameters {
            bounds: children_bounds(&w.children),
            scale,
            root_agr: item.agr,
            background: Color::TRANSPARENT,
        };
        let mut inner_cx = TransactionContext {
            tracer: cx.tx.tracer.reborrow(),
            mutation_check: cx.tx.mutation_check,
        };
        manager.begin_transaction(&mut inner_cx);
        let built = manager.build_items(
            &w.children,
            self.roots,
            self.generation,
            &params,
            &mut inner_cx,
        );
        let summary = manager.end_transaction(&mut inner_cx);
        if summary.aborted {
            cx.txn.aborted = true;
        }
        if built.is_none() || summary.aborted {
            // The private tree is incomplete; repaint the whole item.
            entry.inactive_invalid = Region::from_rect(item.bounds);
            entry.inactive = Some(manager);
            return;
        }

        let inner = manager
            .invalid_area()
            .scale_round_out(Vec2::new(1.0 / scale.x, 1.0 / scale.y));
        entry.inactive_invalid = match w.effect {
            WrapperEffect::Opacity(_) => inner,
            WrapperEffect::Transform(t) => match t.to_affine() {
                Some(a) => {
                    Region::from_rects(inner.rects().iter().map(|r| a.transform_rect_bbox(*r)))
                }
                None if inner.is_empty() => Region::new(),
                None => Region::from_rect(item.bounds),
            },
        };
        entry.inactive = Some(manager);
    }

    // -- Painted layers --

    fn finish_accumulator<B: LayerBackend + ?Sized>(
        &mut self,
        cx: &mut BuildContext<'_, '_, B>,
        finished: FinishedAccumulator,
        items: &[Cow<'_, DisplayItem>],
    ) {
        let FinishedAccumulator { mut acc, background } = finished;
        let scale = self.params.scale;
        let solid = acc.solid_color().filter(|_| cx.config.solid_color_layers);
        let image = acc.single_image().filter(|_| solid.is_none() && cx.config.image_layers);
        let kind = match (solid, image) {
            (Some(_), _) => LayerKind::Color,
            (None, Some(_)) => LayerKind::Image,
            (None, None) => LayerKind::Painted,
        };

        let keys = acc.items.iter().map(|a| items[a.index].key);
        let Some((layer, created)) = self.obtain_layer(cx, keys, kind) else {
            cx.tx.tracer.allocation_failed(&LayerAllocationFailedEvent {
                transaction: cx.transaction,
                kind: Some(kind),
                item: None,
            });
            return;
        };

        let (origin, residual) = self.agr_origin(acc.agr);
        let clip = chain_clip_px(self.roots, acc.agr, self.params.root_agr, scale);
        cx.backend.set_transform(layer, translation(origin));
        cx.backend.set_clip_rect(layer, clip);

        let previous = if created { None } else { cx.painted.get(&layer) };
        let repaint_all = kind == LayerKind::Painted
            && !created
            && previous.is_none_or(|d| {
                d.scale != scale || d.residual != residual || d.agr != acc.agr
            });
        if repaint_all {
            cx.backend.invalidate_all(layer);
            cx.txn.summary.invalidated_area += acc.visible.area();
        }
        if self.top_level && (created || repaint_all) {
            cx.txn.invalid_area.union(&acc.visible);
        }

        let fully_opaque = acc.opaque.contains(&acc.visible);
        match (solid, image) {
            (Some(color), _) => {
                cx.backend.set_color(layer, color, acc.visible.bounds() - origin);
                cx.backend.set_content_opaque(layer, color.is_opaque());
            }
            (None, Some((key, rect))) => {
                cx.backend.set_image(layer, key, rect - origin);
                cx.backend.set_content_opaque(layer, fully_opaque);
            }
            (None, None) => {
                let forced = !fully_opaque && background.is_opaque();
                cx.backend.set_content_opaque(layer, fully_opaque || forced);
                cx.backend.set_background_color(
                    layer,
                    if forced { background } else { Color::TRANSPARENT },
                );
            }
        }
        let common_clip_count = self.apply_mask(cx, layer, &acc, origin);

        let mut painted_items = Vec::with_capacity(acc.items.len());
        for assigned in core::mem::take(&mut acc.items) {
            let item = &*items[assigned.index];
            let offset = self.roots.offset(item.agr);
            let old = cx.registry.lookup(item.key).cloned();
            let changed = match &old {
                Some(old) if old.layer == layer => {
                    let mut r = item_invalid_region(old, item, offset);
                    r.union(&assigned.inactive_invalid);
                    r
                }
                Some(old) => {
                    invalidate_footprint(
                        &mut *cx.backend,
                        cx.painted,
                        cx.txn,
                        old.layer,
                        &old.footprint,
                    );
                    first_paint_region(item)
                }
                None => first_paint_region(item),
            };
            if !created && !repaint_all {
                let local = to_layer_pixels(&changed, scale, origin);
                if !local.is_empty() {
                    if kind == LayerKind::Painted {
                        note_layer_invalidation(cx, layer, &local);
                    }
                    if self.top_level {
                        cx.txn.invalid_area.union(&local.translated(origin));
                    }
                }
            }

            cx.registry.begin_update(
                item.key,
                EntryState {
                    layer,
                    geometry: item.geometry(),
                    clip: item.clip.clone(),
                    agr_offset: offset,
                    footprint: Region::from_rect(scale_rect_round_out(
                        item.clipped_bounds(),
                        scale,
                    )),
                },
            );
            if let Some(manager) = assigned.inactive {
                cx.registry.set_inactive(item.key, manager);
            }
            #[cfg(feature = "trace-rich")]
            cx.tx.tracer.item_assignment(&ItemAssignment {
                transaction: cx.transaction,
                item: item.key,
                layer,
                dedicated: false,
            });
            painted_items.push(PaintedItem {
                item: item.clone(),
                visible_px: assigned.visible_px,
            });
        }

        if kind == LayerKind::Painted {
            let forced_background = if !fully_opaque && background.is_opaque() {
                background
            } else {
                Color::TRANSPARENT
            };
            cx.painted.insert(
                layer,
                PaintedLayerData {
                    origin,
                    residual,
                    scale,
                    agr: acc.agr,
                    items: painted_items,
                    background: forced_background,
                    common_clip_count,
                    top_level: self.top_level,
                },
            );
        } else {
            cx.painted.remove(&layer);
        }

        let mut entry = LayerEntry::translated(layer, acc.agr, acc.fixed_anchor, origin);
        entry.clip = clip;
        entry.visible = core::mem::take(&mut acc.visible);
        entry.opaque = core::mem::take(&mut acc.opaque);
        if let Some(slot) = self.slots.get_mut(acc.slot) {
            *slot = Some(entry);
        }
    }

    /// Attaches a mask for the rounded clip segments shared by every item of
    /// `acc` and returns how many segments it covers.
    fn apply_mask<B: LayerBackend + ?Sized>(
        &self,
        cx: &mut BuildContext<'_, '_, B>,
        layer: LayerId,
        acc: &PaintedLayerAccumulator,
        origin: Vec2,
    ) -> usize {
        let (count, clip) = acc.common_clip();
        if count == 0 {
            cx.backend.set_mask(layer, None);
            return 0;
        }
        let scale = self.params.scale;
        let geometry = MaskGeometry::new(
            clip.rounded
                .iter()
                .take(count)
                .map(|rr| scale_rounded_rect(rr, scale, origin))
                .collect(),
        );
        let mask = cx.masks.get_or_create(&mut *cx.backend, &geometry);
        if mask.is_none() {
            cx.tx.tracer.allocation_failed(&LayerAllocationFailedEvent {
                transaction: cx.transaction,
                kind: None,
                item: None,
            });
        }
        cx.backend.set_mask(layer, mask);
        if mask.is_some() { count } else { 0 }
    }

    /// Recycles the layer of the first candidate item whose previous layer
    /// is still a child of this container with the same kind, or creates a
    /// new one. Returns the layer and whether it was created.
    fn obtain_layer<B: LayerBackend + ?Sized>(
        &mut self,
        cx: &mut BuildContext<'_, '_, B>,
        candidates: impl Iterator<Item = ItemKey>,
        kind: LayerKind,
    ) -> Option<(LayerId, bool)> {
        let recycled = candidates
            .filter_map(|key| cx.registry.lookup(key).map(|old| old.layer))
            .find(|l| self.recyclable.contains(l) && cx.backend.kind(*l) == kind);
        let (layer, created) = match recycled {
            Some(l) => {
                self.recyclable.remove(&l);
                cx.txn.summary.layers_recycled += 1;
                (l, false)
            }
            None => {
                let l = cx.backend.create_layer(kind)?;
                cx.txn.summary.layers_created += 1;
                (l, true)
            }
        };
        cx.txn.claimed.insert(layer);
        Some((layer, created))
    }

    /// Whole-pixel origin and sub-pixel residual of layers moving with `agr`.
    fn agr_origin(&self, agr: AgrId) -> (Vec2, Vec2) {
        let offset = self.roots.offset(agr);
        let scaled = Vec2::new(offset.x * self.params.scale.x, offset.y * self.params.scale.y);
        let origin = scaled.round();
        (origin, scaled - origin)
    }
}

/// Discards `footprint` (container pixels) from `layer` if it is a live
/// painted layer.
pub(crate) fn invalidate_footprint<B: LayerBackend + ?Sized>(
    backend: &mut B,
    painted: &HashMap<LayerId, PaintedLayerData>,
    txn: &mut TransactionState,
    layer: LayerId,
    footprint: &Region,
) {
    let Some(data) = painted.get(&layer) else {
        return;
    };
    if footprint.is_empty() || !backend.is_alive(layer) {
        return;
    }
    let local = footprint.translated(-data.origin);
    backend.invalidate_region(layer, &local);
    txn.summary.invalidated_area += local.area();
    if data.top_level {
        txn.invalid_area.union(footprint);
    }
}

fn note_layer_invalidation<B: LayerBackend + ?Sized>(
    cx: &mut BuildContext<'_, '_, B>,
    layer: LayerId,
    local: &Region,
) {
    cx.backend.invalidate_region(layer, local);
    cx.txn.summary.invalidated_area += local.area();
    #[cfg(feature = "trace-rich")]
    for &rect in local.rects() {
        cx.tx.tracer.invalidation_rect(&InvalidationRect {
            transaction: cx.transaction,
            layer,
            rect,
        });
    }
}

fn translation(origin: Vec2) -> Transform3d {
    Transform3d::from_translation(origin.x, origin.y, 0.0)
}

fn clip_rect(rect: Rect, clip: Option<Rect>) -> Rect {
    let r = match clip {
        Some(c) => rect.intersect(c),
        None => rect,
    };
    if rect_is_empty(r) { Rect::ZERO } else { r }
}

fn intersect_clips(a: Option<Rect>, b: Option<Rect>) -> Option<Rect> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.intersect(b)),
        (a, b) => a.or(b),
    }
}

fn children_bounds(children: &[DisplayItem]) -> Rect {
    children
        .iter()
        .map(|c| c.clipped_bounds())
        .reduce(|a, b| a.union(b))
        .unwrap_or(Rect::ZERO)
}

fn scale_rounded_rect(rr: &RoundedRect, scale: Vec2, origin: Vec2) -> RoundedRect {
    let r = rr.rect();
    let rect = Rect::new(r.x0 * scale.x, r.y0 * scale.y, r.x1 * scale.x, r.y1 * scale.y) - origin;
    let k = scale.x.min(scale.y);
    let radii = rr.radii();
    RoundedRect::from_rect(
        rect,
        RoundedRectRadii::new(
            radii.top_left * k,
            radii.top_right * k,
            radii.bottom_right * k,
            radii.bottom_left * k,
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_rect_collapses_disjoint() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(clip_rect(r, Some(Rect::new(20.0, 20.0, 30.0, 30.0))), Rect::ZERO);
        assert_eq!(clip_rect(r, None), r);
    }

    #[test]
    fn rounded_rect_scales_into_layer_space() {
        let rr = RoundedRect::new(10.0, 10.0, 20.0, 20.0, 2.0);
        let scaled = scale_rounded_rect(&rr, Vec2::new(2.0, 2.0), Vec2::new(20.0, 0.0));
        assert_eq!(scaled.rect(), Rect::new(0.0, 20.0, 20.0, 40.0));
        assert_eq!(scaled.radii().top_left, 4.0);
    }
}
