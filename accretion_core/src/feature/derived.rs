// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Derived features: values computed from, and written through to,
//! another feature.
//!
//! A derived feature never owns vertex data of its own. [`VertexCmap`]
//! samples a colormap and writes the result through its parent's color
//! feature, so upload marking and "colors" events fire exactly as they
//! would for a direct write; it then dispatches its own event.
//!
//! # Staleness
//!
//! The cached colormap association is deliberately not invalidated when
//! the user writes directly to the underlying color buffer. After a direct
//! full replacement, [`VertexCmap::name`] keeps reporting the old map even
//! though the visible colors no longer come from it. This mirrors the
//! behavior of the system this crate reimplements; see DESIGN.md.

use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::buffer::{ShapeError, WriteError};
use crate::color::Rgba;
use crate::colormap::Colormap;
use crate::event::{EventValue, FeatureEvents, FeatureKind, MutationGuard};
use crate::feature::buffered::VertexColors;
use crate::feature::uniform::UniformColor;

/// Colormap-derived vertex colors.
///
/// Holds the colormap name (nullable), an optional per-vertex transform
/// array rescaling how values map to colormap positions, and the alpha
/// applied to every sampled color. Writes go through the parent's
/// [`VertexColors`], passed at call time.
#[derive(Debug)]
pub struct VertexCmap {
    name: Cell<Option<Colormap>>,
    transform: RefCell<Option<Vec<f32>>>,
    alpha: Cell<f32>,
    updating: Cell<bool>,
    events: FeatureEvents,
    alpha_events: FeatureEvents,
}

impl Default for VertexCmap {
    fn default() -> Self {
        Self::new()
    }
}

impl VertexCmap {
    /// Creates an unassociated colormap feature with alpha 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: Cell::new(None),
            transform: RefCell::new(None),
            alpha: Cell::new(1.0),
            updating: Cell::new(false),
            events: FeatureEvents::new(FeatureKind::Cmap),
            alpha_events: FeatureEvents::new(FeatureKind::Alpha),
        }
    }

    /// The current colormap association.
    ///
    /// May be stale after a direct write to the color buffer; see the
    /// module docs.
    #[must_use]
    pub fn name(&self) -> Option<Colormap> {
        self.name.get()
    }

    /// The alpha applied to sampled colors.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.alpha.get()
    }

    /// The current transform array, if any.
    #[must_use]
    pub fn transform(&self) -> Option<Vec<f32>> {
        self.transform.borrow().clone()
    }

    /// Listener registry for "cmap" events.
    #[must_use]
    pub fn events(&self) -> &FeatureEvents {
        &self.events
    }

    /// Listener registry for "alpha" events.
    #[must_use]
    pub fn alpha_events(&self) -> &FeatureEvents {
        &self.alpha_events
    }

    /// Associates (or clears) the colormap and rewrites the colors.
    ///
    /// With `Some(map)`, every vertex color is recomputed: positions come
    /// from the transform array when present (min/max normalized) or are
    /// evenly spaced, alpha is overwritten with the current alpha, and the
    /// full result goes through `colors`' normal write path. With `None`,
    /// the association is cleared without touching the buffer.
    ///
    /// Re-entrant calls are silent no-ops.
    pub fn set(&self, colors: &VertexColors, name: Option<Colormap>) -> Result<(), WriteError> {
        let Some(_guard) = MutationGuard::try_acquire(&self.updating) else {
            return Ok(());
        };
        match name {
            None => {
                self.name.set(None);
                self.events.emit(None, EventValue::Cmap(None));
            }
            Some(map) => {
                let data = self.sampled(map, colors.rows())?;
                colors.replace(&data)?;
                self.name.set(Some(map));
                self.events.emit(None, EventValue::Cmap(Some(map)));
            }
        }
        Ok(())
    }

    /// Replaces the transform array and, if a map is associated,
    /// recomputes the colors.
    ///
    /// The array must hold one value per vertex.
    pub fn set_transform(&self, colors: &VertexColors, values: Vec<f32>) -> Result<(), WriteError> {
        let Some(_guard) = MutationGuard::try_acquire(&self.updating) else {
            return Ok(());
        };
        if values.len() != colors.rows() {
            return Err(ShapeError::ValueLength {
                expected: colors.rows(),
                got: values.len(),
            }
            .into());
        }
        let event_values = values.clone();
        *self.transform.borrow_mut() = Some(values);
        if let Some(map) = self.name.get() {
            let data = self.sampled(map, colors.rows())?;
            colors.replace(&data)?;
        }
        self.events.emit(None, EventValue::Rows(event_values));
        Ok(())
    }

    /// Sets the alpha and rewrites only the alpha column of the colors,
    /// leaving RGB untouched. Dispatches an "alpha" event of its own.
    pub fn set_alpha(&self, colors: &VertexColors, alpha: f32) -> Result<(), WriteError> {
        let Some(_guard) = MutationGuard::try_acquire(&self.updating) else {
            return Ok(());
        };
        self.alpha.set(alpha);
        colors.write_alpha(alpha)?;
        self.alpha_events.emit(None, EventValue::Scalar(f64::from(alpha)));
        Ok(())
    }

    /// Samples `n` colors with the current transform and alpha.
    fn sampled(&self, map: Colormap, n: usize) -> Result<Vec<f32>, WriteError> {
        let alpha = self.alpha.get();
        let transform = self.transform.borrow();
        let mut out = Vec::with_capacity(n * 4);
        match transform.as_ref() {
            None => {
                for color in map.sample_n(n) {
                    out.extend_from_slice(&color.with_alpha(alpha).to_array());
                }
            }
            Some(values) => {
                if values.len() != n {
                    return Err(ShapeError::ValueLength {
                        expected: n,
                        got: values.len(),
                    }
                    .into());
                }
                let mut min = f32::INFINITY;
                let mut max = f32::NEG_INFINITY;
                for &v in values.iter() {
                    min = min.min(v);
                    max = max.max(v);
                }
                for &v in values.iter() {
                    let t = if max > min { (v - min) / (max - min) } else { 0.5 };
                    out.extend_from_slice(&map.sample(t).with_alpha(alpha).to_array());
                }
            }
        }
        Ok(out)
    }
}

/// Alpha overlay for a uniform color.
///
/// Holds the current alpha and writes through the parent's
/// [`UniformColor`], recomputing the single RGBA tuple.
#[derive(Debug)]
pub struct UniformAlpha {
    alpha: Cell<f32>,
    updating: Cell<bool>,
    events: FeatureEvents,
}

impl UniformAlpha {
    /// Creates the feature with an initial alpha.
    #[must_use]
    pub fn new(initial: f32) -> Self {
        Self {
            alpha: Cell::new(initial),
            updating: Cell::new(false),
            events: FeatureEvents::new(FeatureKind::Alpha),
        }
    }

    /// The current alpha.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.alpha.get()
    }

    /// The listener registry.
    #[must_use]
    pub fn events(&self) -> &FeatureEvents {
        &self.events
    }

    /// Sets the alpha, recomputes the parent's color tuple, and
    /// dispatches. Re-entrant calls are silent no-ops.
    pub fn set(&self, color: &UniformColor, alpha: f32) {
        let Some(_guard) = MutationGuard::try_acquire(&self.updating) else {
            return;
        };
        self.alpha.set(alpha);
        color.set_alpha(alpha);
        self.events.emit(None, EventValue::Scalar(f64::from(alpha)));
    }
}

/// Image-side colormap state: map name plus the value window.
///
/// The window bounds (`vmin`/`vmax`) are initialized from the data and
/// adjusted independently; each change dispatches its own event.
#[derive(Debug)]
pub struct ImageCmap {
    name: Cell<Option<Colormap>>,
    vmin: Cell<f32>,
    vmax: Cell<f32>,
    updating: Cell<bool>,
    events: FeatureEvents,
    vmin_events: FeatureEvents,
    vmax_events: FeatureEvents,
}

impl ImageCmap {
    /// Creates the feature, computing the initial window from `data`.
    #[must_use]
    pub fn from_data(name: Option<Colormap>, data: &[f32]) -> Self {
        let (vmin, vmax) = window_of(data);
        Self {
            name: Cell::new(name),
            vmin: Cell::new(vmin),
            vmax: Cell::new(vmax),
            updating: Cell::new(false),
            events: FeatureEvents::new(FeatureKind::Cmap),
            vmin_events: FeatureEvents::new(FeatureKind::Vmin),
            vmax_events: FeatureEvents::new(FeatureKind::Vmax),
        }
    }

    /// The current colormap association.
    #[must_use]
    pub fn name(&self) -> Option<Colormap> {
        self.name.get()
    }

    /// The current `(vmin, vmax)` window.
    #[must_use]
    pub fn window(&self) -> (f32, f32) {
        (self.vmin.get(), self.vmax.get())
    }

    /// Listener registry for "cmap" events.
    #[must_use]
    pub fn events(&self) -> &FeatureEvents {
        &self.events
    }

    /// Listener registry for "vmin" events.
    #[must_use]
    pub fn vmin_events(&self) -> &FeatureEvents {
        &self.vmin_events
    }

    /// Listener registry for "vmax" events.
    #[must_use]
    pub fn vmax_events(&self) -> &FeatureEvents {
        &self.vmax_events
    }

    /// Sets (or clears) the colormap association.
    pub fn set_name(&self, name: Option<Colormap>) {
        let Some(_guard) = MutationGuard::try_acquire(&self.updating) else {
            return;
        };
        self.name.set(name);
        self.events.emit(None, EventValue::Cmap(name));
    }

    /// Sets the lower window bound.
    pub fn set_vmin(&self, vmin: f32) {
        let Some(_guard) = MutationGuard::try_acquire(&self.updating) else {
            return;
        };
        self.vmin.set(vmin);
        self.vmin_events.emit(None, EventValue::Scalar(f64::from(vmin)));
    }

    /// Sets the upper window bound.
    pub fn set_vmax(&self, vmax: f32) {
        let Some(_guard) = MutationGuard::try_acquire(&self.updating) else {
            return;
        };
        self.vmax.set(vmax);
        self.vmax_events.emit(None, EventValue::Scalar(f64::from(vmax)));
    }

    /// Recomputes the window from `data` and dispatches both events.
    pub fn reset_window(&self, data: &[f32]) {
        let (vmin, vmax) = window_of(data);
        self.set_vmin(vmin);
        self.set_vmax(vmax);
    }
}

fn window_of(data: &[f32]) -> (f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in data {
        min = min.min(v);
        max = max.max(v);
    }
    if min > max {
        // Empty data.
        (0.0, 0.0)
    } else {
        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;
    use crate::event::ChangeEvent;

    #[test]
    fn cmap_write_through_samples_the_palette() {
        let colors = VertexColors::filled(10, Rgba::WHITE);
        let cmap = VertexCmap::new();

        cmap.set(&colors, Some(Colormap::Grayscale)).unwrap();

        let array = colors.value();
        for row in 0..10 {
            let expected = row as f32 / 9.0;
            let r = array.row(row);
            assert!((r[0] - expected).abs() < 1e-6, "row {row}");
            assert_eq!(r[0], r[1]);
            assert_eq!(r[1], r[2]);
            assert_eq!(r[3], 1.0, "alpha applied in column 3");
        }
    }

    #[test]
    fn cmap_fires_both_colors_and_cmap_events() {
        let colors = VertexColors::filled(4, Rgba::WHITE);
        let cmap = VertexCmap::new();

        let kinds: Rc<core::cell::RefCell<Vec<FeatureKind>>> =
            Rc::new(core::cell::RefCell::new(Vec::new()));
        let k1 = kinds.clone();
        colors.events().add_event_handler(Rc::new(move |e: &ChangeEvent| {
            k1.borrow_mut().push(e.kind);
            Ok(())
        }));
        let k2 = kinds.clone();
        cmap.events().add_event_handler(Rc::new(move |e: &ChangeEvent| {
            k2.borrow_mut().push(e.kind);
            Ok(())
        }));

        cmap.set(&colors, Some(Colormap::Viridis)).unwrap();

        // Write-through first, then the cmap's own event.
        assert_eq!(
            *kinds.borrow(),
            vec![FeatureKind::Colors, FeatureKind::Cmap]
        );
    }

    #[test]
    fn alpha_changes_only_column_three() {
        let colors = VertexColors::filled(10, Rgba::WHITE);
        let cmap = VertexCmap::new();
        cmap.set(&colors, Some(Colormap::Viridis)).unwrap();
        let before: Vec<f32> = colors.value().as_slice().to_vec();

        cmap.set_alpha(&colors, 0.5).unwrap();

        assert_eq!(cmap.alpha(), 0.5);
        let array = colors.value();
        for row in 0..10 {
            let r = array.row(row);
            assert_eq!(&r[..3], &before[row * 4..row * 4 + 3], "row {row} rgb");
            assert_eq!(r[3], 0.5, "row {row} alpha");
        }
    }

    #[test]
    fn clearing_the_map_leaves_the_buffer() {
        let colors = VertexColors::filled(4, Rgba::WHITE);
        let cmap = VertexCmap::new();
        cmap.set(&colors, Some(Colormap::Heat)).unwrap();
        let before: Vec<f32> = colors.value().as_slice().to_vec();

        cmap.set(&colors, None).unwrap();

        assert_eq!(cmap.name(), None);
        assert_eq!(colors.value().as_slice(), &before[..]);
    }

    #[test]
    fn direct_color_write_leaves_the_cached_name_stale() {
        let colors = VertexColors::filled(4, Rgba::WHITE);
        let cmap = VertexCmap::new();
        cmap.set(&colors, Some(Colormap::Plasma)).unwrap();

        // Bypass the cmap feature entirely.
        colors.replace(&[1.0; 16]).unwrap();

        // Documented behavior: the association is not invalidated.
        assert_eq!(cmap.name(), Some(Colormap::Plasma));
    }

    #[test]
    fn transform_reorders_colormap_positions() {
        let colors = VertexColors::filled(3, Rgba::WHITE);
        let cmap = VertexCmap::new();
        cmap.set(&colors, Some(Colormap::Grayscale)).unwrap();

        // Highest value first: positions normalize to [1, 0, 0.5].
        cmap.set_transform(&colors, vec![4.0, 0.0, 2.0]).unwrap();

        let array = colors.value();
        assert!((array.get(0, 0) - 1.0).abs() < 1e-6);
        assert!((array.get(1, 0) - 0.0).abs() < 1e-6);
        assert!((array.get(2, 0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn transform_length_must_match_vertex_count() {
        let colors = VertexColors::filled(3, Rgba::WHITE);
        let cmap = VertexCmap::new();
        assert!(cmap.set_transform(&colors, vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn cmap_setter_is_reentry_safe() {
        let colors = Rc::new(VertexColors::filled(4, Rgba::WHITE));
        let cmap = Rc::new(VertexCmap::new());

        let cmap_ref = cmap.clone();
        let colors_ref = colors.clone();
        cmap.events().add_event_handler(Rc::new(move |_e| {
            // Attempt to re-enter while the setter is still running.
            cmap_ref.set(&colors_ref, Some(Colormap::Heat)).unwrap();
            Ok(())
        }));

        cmap.set(&colors, Some(Colormap::Viridis)).unwrap();
        assert_eq!(cmap.name(), Some(Colormap::Viridis), "nested set ignored");
    }

    #[test]
    fn uniform_alpha_writes_through() {
        let color = UniformColor::new(Rgba::new(0.3, 0.6, 0.9, 1.0));
        let alpha = UniformAlpha::new(1.0);

        alpha.set(&color, 0.25);

        assert_eq!(alpha.value(), 0.25);
        assert_eq!(color.value(), Rgba::new(0.3, 0.6, 0.9, 0.25));
    }

    #[test]
    fn image_cmap_window_comes_from_data() {
        let cmap = ImageCmap::from_data(None, &[3.0, -1.0, 7.5, 0.0]);
        assert_eq!(cmap.window(), (-1.0, 7.5));

        cmap.set_vmin(0.0);
        cmap.set_vmax(5.0);
        assert_eq!(cmap.window(), (0.0, 5.0));
    }

    #[test]
    fn image_cmap_events_carry_scalars() {
        let cmap = Rc::new(ImageCmap::from_data(Some(Colormap::Viridis), &[0.0, 1.0]));
        let seen = Rc::new(core::cell::RefCell::new(Vec::new()));
        let s = seen.clone();
        cmap.vmin_events().add_event_handler(Rc::new(move |e: &ChangeEvent| {
            s.borrow_mut().push((e.kind, e.value.clone()));
            Ok(())
        }));

        cmap.set_vmin(0.25);

        assert_eq!(
            *seen.borrow(),
            vec![(FeatureKind::Vmin, EventValue::Scalar(0.25))]
        );
    }
}
