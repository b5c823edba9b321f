// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selection features for selector widgets.
//!
//! Selections are plain-value features: a scalar position on an axis
//! ([`LinearSelection`]) or a rectangular region ([`RegionSelection`]).
//! Assignments clamp to the feature's limits before dispatching, and the
//! setters are re-entry guarded — selector widgets are the main place
//! where two features end up wired to update each other.

use core::cell::Cell;

use kurbo::Rect;

use crate::event::{EventValue, FeatureEvents, FeatureKind, MutationGuard};

/// A scalar selection on one axis, clamped to `limits`.
#[derive(Debug)]
pub struct LinearSelection {
    value: Cell<f64>,
    limits: Cell<(f64, f64)>,
    updating: Cell<bool>,
    events: FeatureEvents,
}

impl LinearSelection {
    /// Creates a selection at `value`, clamped into `limits`.
    #[must_use]
    pub fn new(value: f64, limits: (f64, f64)) -> Self {
        let (lo, hi) = ordered(limits);
        Self {
            value: Cell::new(value.clamp(lo, hi)),
            limits: Cell::new((lo, hi)),
            updating: Cell::new(false),
            events: FeatureEvents::new(FeatureKind::Selection),
        }
    }

    /// The current selection.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value.get()
    }

    /// The current limits.
    #[must_use]
    pub fn limits(&self) -> (f64, f64) {
        self.limits.get()
    }

    /// The listener registry.
    #[must_use]
    pub fn events(&self) -> &FeatureEvents {
        &self.events
    }

    /// Sets the selection, clamped into the limits, and dispatches.
    /// Re-entrant calls are silent no-ops.
    pub fn set_value(&self, value: f64) {
        let Some(_guard) = MutationGuard::try_acquire(&self.updating) else {
            return;
        };
        let (lo, hi) = self.limits.get();
        let clamped = value.clamp(lo, hi);
        self.value.set(clamped);
        self.events.emit(None, EventValue::Scalar(clamped));
    }

    /// Replaces the limits, re-clamping the current selection.
    ///
    /// If the selection moves, a change event fires.
    pub fn set_limits(&self, limits: (f64, f64)) {
        let (lo, hi) = ordered(limits);
        self.limits.set((lo, hi));
        let current = self.value.get();
        let clamped = current.clamp(lo, hi);
        if clamped != current {
            self.set_value(clamped);
        }
    }
}

/// A rectangular selection region, clamped into a limit rect.
#[derive(Debug)]
pub struct RegionSelection {
    rect: Cell<Rect>,
    limits: Cell<Rect>,
    updating: Cell<bool>,
    events: FeatureEvents,
}

impl RegionSelection {
    /// Creates a region selection, clamped into `limits`.
    #[must_use]
    pub fn new(rect: Rect, limits: Rect) -> Self {
        let limits = limits.abs();
        Self {
            rect: Cell::new(clamp_rect(rect.abs(), limits)),
            limits: Cell::new(limits),
            updating: Cell::new(false),
            events: FeatureEvents::new(FeatureKind::Selection),
        }
    }

    /// The current region.
    #[must_use]
    pub fn value(&self) -> Rect {
        self.rect.get()
    }

    /// The limit rect selections are clamped into.
    #[must_use]
    pub fn limits(&self) -> Rect {
        self.limits.get()
    }

    /// The listener registry.
    #[must_use]
    pub fn events(&self) -> &FeatureEvents {
        &self.events
    }

    /// Sets the region, clamped into the limits, and dispatches.
    /// Re-entrant calls are silent no-ops.
    pub fn set_value(&self, rect: Rect) {
        let Some(_guard) = MutationGuard::try_acquire(&self.updating) else {
            return;
        };
        let clamped = clamp_rect(rect.abs(), self.limits.get());
        self.rect.set(clamped);
        self.events.emit(None, EventValue::Rect(clamped));
    }
}

fn ordered((a, b): (f64, f64)) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Clamps every edge of `rect` into `limits`, preserving ordering.
fn clamp_rect(rect: Rect, limits: Rect) -> Rect {
    let x0 = rect.x0.clamp(limits.x0, limits.x1);
    let x1 = rect.x1.clamp(limits.x0, limits.x1);
    let y0 = rect.y0.clamp(limits.y0, limits.y1);
    let y1 = rect.y1.clamp(limits.y0, limits.y1);
    Rect::new(x0, y0, x1, y1)
}
