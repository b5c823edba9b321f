// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reactive buffer features with minimal-range upload tracking.
//!
//! `accretion_core` sits between a scene-graph rendering engine and a
//! plotting library's user-facing graphic objects. Users mutate visual
//! attributes (vertex positions, per-vertex colors, point sizes, image
//! texels, selection bounds) through indexed writes; this crate turns each
//! write into the smallest contiguous device-upload range, keeps derived
//! state (colormap colors, chunked textures) consistent with the primary
//! data, and notifies registered listeners with structured change events.
//! It is `no_std` compatible (with `alloc`).
//!
//! # Architecture
//!
//! Every mutation flows through the same pipeline:
//!
//! ```text
//!   indexed write ──► index::resolve() ──► UploadRegion
//!                           │
//!                           ▼
//!   buffer::BufferHandle (write + UploadSink::update_range)
//!                           │
//!                           ▼
//!   derived features write through (cmap → colors, alpha → column 3)
//!                           │
//!                           ▼
//!   event::FeatureEvents::emit() ──► listeners, in registration order
//! ```
//!
//! **[`index`]** — Interprets row keys (integer, slice, boolean mask,
//! integer fancy index) against a row count and produces the minimal
//! contiguous `(offset, size)` span plus, where needed, the concrete set
//! of affected rows.
//!
//! **[`buffer`]** — Shared, fixed-row-count `f32` attribute storage. Every
//! indexed write resolves its key, applies the values, and forwards the
//! resolved span to the bound [`UploadSink`](buffer::UploadSink).
//!
//! **[`event`]** — Per-feature listener registry and synchronous dispatch
//! with listener-failure isolation and a re-entrancy guard for value
//! setters.
//!
//! **[`feature`]** — The closed set of feature kinds: buffered
//! (positions, colors, sizes), uniform (color, size), derived
//! (vertex/image colormaps, alpha) and selections.
//!
//! **[`chunk`]** — Partitions a 2-D image that exceeds the hardware
//! texture limit into a grid of tiles and routes writes into the subset of
//! tiles they overlap, each with its own minimal upload rect.
//!
//! **[`graphic`]** — Thin graphic wrappers (line, scatter, image) that
//! wire features together and stamp events with their origin.
//!
//! **[`color`]** / **[`colormap`]** — RGBA color parsing and named
//! colormap sampling consumed by the derived features.
//!
//! **[`trace`]** — [`DiagnosticSink`](trace::DiagnosticSink) trait for
//! listener failures, duplicate-handler warnings, and data-conversion
//! notices, with no-op defaults.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod buffer;
pub mod chunk;
pub mod color;
pub mod colormap;
pub mod event;
pub mod feature;
pub mod graphic;
pub mod index;
pub mod trace;
