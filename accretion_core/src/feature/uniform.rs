// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform (single-value) features with guarded `set_value` semantics.
//!
//! Uniform features have no buffer; they hold one value and dispatch a
//! change event per assignment. Their setters refuse re-entrant
//! invocation: if a listener side effect calls back into the setter while
//! it is executing, the nested call is a silent no-op. This breaks
//! unbounded mutual recursion when two features are wired to update each
//! other.

use core::cell::Cell;

use crate::color::{ColorError, Rgba};
use crate::event::{EventValue, FeatureEvents, FeatureKind, MutationGuard};

/// The single uniform color of a graphic.
#[derive(Debug)]
pub struct UniformColor {
    value: Cell<Rgba>,
    updating: Cell<bool>,
    events: FeatureEvents,
}

impl UniformColor {
    /// Creates the feature with an initial color.
    #[must_use]
    pub fn new(initial: Rgba) -> Self {
        Self {
            value: Cell::new(initial),
            updating: Cell::new(false),
            events: FeatureEvents::new(FeatureKind::UniformColor),
        }
    }

    /// The current color.
    #[must_use]
    pub fn value(&self) -> Rgba {
        self.value.get()
    }

    /// The listener registry.
    #[must_use]
    pub fn events(&self) -> &FeatureEvents {
        &self.events
    }

    /// Sets the color and dispatches. Re-entrant calls are silent no-ops.
    pub fn set_value(&self, color: Rgba) {
        let Some(_guard) = MutationGuard::try_acquire(&self.updating) else {
            return;
        };
        self.value.set(color);
        self.events.emit(None, EventValue::Rgba(color));
    }

    /// Parses and sets a color string ("red", "#rrggbb", …).
    pub fn set_parsed(&self, input: &str) -> Result<(), ColorError> {
        self.set_value(Rgba::parse(input)?);
        Ok(())
    }

    /// Replaces only the alpha component, keeping RGB.
    pub fn set_alpha(&self, alpha: f32) {
        let Some(_guard) = MutationGuard::try_acquire(&self.updating) else {
            return;
        };
        let color = self.value.get().with_alpha(alpha);
        self.value.set(color);
        self.events.emit(None, EventValue::Rgba(color));
    }
}

/// The single uniform size (point size / line thickness) of a graphic.
#[derive(Debug)]
pub struct UniformSize {
    value: Cell<f32>,
    updating: Cell<bool>,
    events: FeatureEvents,
}

impl UniformSize {
    /// Creates the feature with an initial size.
    #[must_use]
    pub fn new(initial: f32) -> Self {
        Self {
            value: Cell::new(initial),
            updating: Cell::new(false),
            events: FeatureEvents::new(FeatureKind::UniformSize),
        }
    }

    /// The current size.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.value.get()
    }

    /// The listener registry.
    #[must_use]
    pub fn events(&self) -> &FeatureEvents {
        &self.events
    }

    /// Sets the size and dispatches. Re-entrant calls are silent no-ops.
    pub fn set_value(&self, size: f32) {
        let Some(_guard) = MutationGuard::try_acquire(&self.updating) else {
            return;
        };
        self.value.set(size);
        self.events.emit(None, EventValue::Scalar(f64::from(size)));
    }
}
