// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording and pretty-printing for accretion diagnostics.
//!
//! This crate provides sink implementations for development, tests, and
//! post-mortem analysis:
//!
//! - [`recorder::UploadLog`] / [`recorder::TexelLog`] — record every
//!   marked upload region/rect for inspection.
//! - [`recorder::DiagnosticLog`] — records listener failures,
//!   duplicate-handler warnings, and conversion notices.
//! - [`recorder::EventTap`] — a ready-made listener that collects
//!   dispatched change events.
//! - [`pretty`] — human-readable one-line-per-event formatting.

pub mod pretty;
pub mod recorder;
