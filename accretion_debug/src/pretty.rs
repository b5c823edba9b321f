// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable one-line-per-event formatting.

use accretion_core::event::{ChangeEvent, EventValue};
use accretion_core::index::RowKey;

/// Formats one change event on a single line.
///
/// The shape is `kind[key] = value (graphic N)`, with the key and graphic
/// omitted when absent.
#[must_use]
pub fn format_event(event: &ChangeEvent) -> String {
    let mut out = String::from(event.type_str());
    if let Some(key) = &event.key {
        out.push_str(&format!("[{}]", format_key(key)));
    }
    out.push_str(" = ");
    out.push_str(&format_value(&event.value));
    if let Some(source) = event.source {
        out.push_str(&format!(" (graphic {})", source.graphic.0));
    }
    out
}

fn format_key(key: &RowKey) -> String {
    match key {
        RowKey::Index(i) => format!("{i}"),
        RowKey::Range(spec) => {
            let part = |v: Option<i64>| v.map(|v| format!("{v}")).unwrap_or_default();
            let mut s = format!("{}:{}", part(spec.start), part(spec.stop));
            if let Some(step) = spec.step {
                s.push_str(&format!(":{step}"));
            }
            s
        }
        RowKey::Indices(indices) => format!("{indices:?}"),
        RowKey::Mask(mask) => format!("mask[{} rows]", mask.len()),
        RowKey::Ellipsis => String::from("..."),
    }
}

fn format_value(value: &EventValue) -> String {
    match value {
        EventValue::None => String::from("-"),
        EventValue::Scalar(v) => format!("{v}"),
        EventValue::Rgba(c) => format!("rgba({}, {}, {}, {})", c.r, c.g, c.b, c.a),
        EventValue::Rows(rows) => format!("<{} values>", rows.len()),
        EventValue::Cmap(Some(map)) => String::from(map.name()),
        EventValue::Cmap(None) => String::from("no cmap"),
        EventValue::Rect(r) => format!("[{}, {}, {}, {}]", r.x0, r.y0, r.x1, r.y1),
    }
}
