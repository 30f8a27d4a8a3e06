// Copyright 2026 the Sediment Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON snapshots of a layer tree.
//!
//! [`dump_tree`] walks a [`LayerTree`] from a root and produces a nested JSON
//! value with each layer's kind, properties and regions. [`write_tree`]
//! pretty-prints it.

use std::io::{self, Write};

use kurbo::Rect;
use serde_json::{Map, Value, json};

use sediment_core::color::Color;
use sediment_core::layer::{LayerId, LayerKind, LayerTree};
use sediment_core::region::Region;

/// Returns a JSON snapshot of `root` and its descendants.
#[must_use]
pub fn dump_tree(tree: &LayerTree, root: LayerId) -> Value {
    let mut fields = Map::new();
    fields.insert("id".into(), json!([root.index(), root.generation()]));
    fields.insert("kind".into(), json!(kind_name(tree.kind(root))));
    fields.insert("visible".into(), region_json(tree.visible_region(root)));

    let transform = tree.local_transform(root);
    if transform.is_2d() {
        let t = transform.translation();
        if t.x != 0.0 || t.y != 0.0 {
            fields.insert("translate".into(), json!([t.x, t.y]));
        }
    } else {
        fields.insert("transform".into(), json!(transform.cols));
    }
    let opacity = tree.local_opacity(root);
    if opacity < 1.0 {
        fields.insert("opacity".into(), json!(opacity));
    }
    if let Some(clip) = tree.clip(root) {
        fields.insert("clip".into(), rect_json(clip));
    }
    if let Some(mask) = tree.mask(root) {
        fields.insert("mask".into(), json!(mask.0));
    }
    let scroll = tree.scroll_metadata(root);
    if !scroll.is_empty() {
        fields.insert("scroll".into(), json!(scroll.iter().map(|s| s.0).collect::<Vec<_>>()));
    }
    if tree.content_opaque(root) {
        fields.insert("opaque".into(), json!(true));
    }

    match tree.kind(root) {
        LayerKind::Container => {
            let children: Vec<Value> = tree.children(root).map(|c| dump_tree(tree, c)).collect();
            fields.insert("children".into(), Value::Array(children));
        }
        LayerKind::Painted => {
            let background = tree.background_color(root);
            if !background.is_transparent() {
                fields.insert("background".into(), color_json(background));
            }
            fields.insert("valid".into(), region_json(tree.valid_region(root)));
        }
        LayerKind::Color => {
            fields.insert("color".into(), color_json(tree.color(root)));
            fields.insert("rect".into(), rect_json(tree.content_rect(root)));
        }
        LayerKind::Image => {
            if let Some(image) = tree.image(root) {
                fields.insert("image".into(), json!(image.0));
            }
            fields.insert("rect".into(), rect_json(tree.content_rect(root)));
        }
    }
    Value::Object(fields)
}

/// Pretty-prints the snapshot of `root` to `writer`.
pub fn write_tree(tree: &LayerTree, root: LayerId, writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &dump_tree(tree, root))?;
    writeln!(writer)
}

fn kind_name(kind: LayerKind) -> &'static str {
    match kind {
        LayerKind::Container => "container",
        LayerKind::Painted => "painted",
        LayerKind::Color => "color",
        LayerKind::Image => "image",
    }
}

fn rect_json(r: Rect) -> Value {
    json!([r.x0, r.y0, r.x1, r.y1])
}

fn region_json(region: &Region) -> Value {
    Value::Array(region.rects().iter().map(|&r| rect_json(r)).collect())
}

fn color_json(c: Color) -> Value {
    json!(format!("#{:02x}{:02x}{:02x}{:02x}", c.r, c.g, c.b, c.a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sediment_core::item::{AgrId, DisplayItem, DisplayList, ItemKey};
    use sediment_core::{ContainerParameters, LayerManager, TransactionContext};

    #[test]
    fn dump_describes_built_tree() {
        let mut list = DisplayList::default();
        list.push(DisplayItem::solid_color(
            ItemKey::new(1, 0),
            Rect::new(0.0, 0.0, 64.0, 64.0),
            Color::WHITE,
            AgrId(0),
        ));
        let card = Rect::new(8.0, 8.0, 24.0, 24.0);
        list.push(DisplayItem::generic(ItemKey::new(2, 0), card, AgrId(0)).active());

        let mut manager = LayerManager::new(LayerTree::new());
        let mut cx = TransactionContext::new();
        manager.begin_transaction(&mut cx);
        let params = ContainerParameters::new(Rect::new(0.0, 0.0, 64.0, 64.0));
        let root = manager
            .build_container(&list, &params, &mut cx)
            .unwrap()
            .layer;
        let _ = manager.end_transaction(&mut cx);

        let value = dump_tree(manager.backend(), root);
        assert_eq!(value["kind"], "container");
        let children = value["children"].as_array().unwrap();
        assert_eq!(children.len(), 2, "got: {value}");
        assert_eq!(children[0]["kind"], "color");
        assert_eq!(children[0]["color"], "#ffffffff");
        assert_eq!(children[1]["kind"], "painted");
        assert!(children[1]["translate"].is_null(), "painted layer sits at its root's origin");
        assert_eq!(children[1]["visible"], json!([[8.0, 8.0, 24.0, 24.0]]));
    }

    #[test]
    fn write_tree_emits_valid_json() {
        let mut tree = LayerTree::new();
        let root = tree.create_layer(LayerKind::Container).unwrap();
        let mut out = Vec::new();
        write_tree(&tree, root, &mut out).unwrap();
        let parsed: Value = serde_json::from_str(&String::from_utf8(out).unwrap()).unwrap();
        assert_eq!(parsed["children"], json!([]));
    }
}
