// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostics for the mutation/dispatch pipeline.
//!
//! This module provides a [`DiagnosticSink`] trait with per-event methods
//! that the core calls when something noteworthy but non-fatal happens:
//! a listener failed, a handler was registered twice, ingested data needed
//! a dtype conversion. All method bodies default to no-ops, so implementing
//! only the events you care about is fine.
//!
//! Sinks are shared behind `Rc` and may be called re-entrantly from event
//! dispatch, so methods take `&self`; implementations use interior
//! mutability where they accumulate state (see `accretion_debug`).

use crate::event::{FeatureKind, ListenerError};

/// Receives non-fatal diagnostics from features and buffers.
pub trait DiagnosticSink {
    /// A dispatched listener returned an error. Dispatch to the remaining
    /// listeners continues; the error never propagates to the mutation
    /// call site.
    fn on_listener_error(&self, feature: FeatureKind, error: &ListenerError) {
        let _ = (feature, error);
    }

    /// An already-registered handler was added again. The registration is
    /// a no-op.
    fn on_duplicate_handler(&self, feature: FeatureKind) {
        let _ = feature;
    }

    /// Ingested data was copied and converted to `f32` from another
    /// element type.
    fn on_data_converted(&self, from: &'static str) {
        let _ = from;
    }
}

/// A [`DiagnosticSink`] that drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDiagnostics;

impl DiagnosticSink for NoopDiagnostics {}
