// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Buffered features: positions, per-vertex colors, point sizes.
//!
//! Each feature owns a [`BufferHandle`] and a [`FeatureEvents`] registry.
//! Every indexed write resolves its key, applies the values, marks the
//! minimal upload span, and — if listeners exist — dispatches one
//! [`ChangeEvent`](crate::event::ChangeEvent) carrying the key and the
//! written values.

use alloc::vec::Vec;
use core::cell::Ref;

use crate::buffer::{AttributeArray, BufferHandle, RowValues, WriteError};
use crate::color::Rgba;
use crate::event::{EventValue, FeatureEvents, FeatureKind};
use crate::feature::ConstructionError;
use crate::index::RowKey;

/// Columns in a position row (x, y, z).
pub const POSITION_WIDTH: usize = 3;
/// Columns in a color row (r, g, b, a).
pub const COLOR_WIDTH: usize = 4;

/// Shared implementation of the buffered write path.
#[derive(Debug)]
struct Buffered {
    handle: BufferHandle,
    events: FeatureEvents,
}

impl Buffered {
    fn new(handle: BufferHandle, kind: FeatureKind) -> Self {
        Self {
            handle,
            events: FeatureEvents::new(kind),
        }
    }

    fn set(&self, key: &RowKey, values: RowValues<'_>) -> Result<(), WriteError> {
        let region = self.handle.set(key, values)?;
        if region.is_some() && self.events.handler_count() > 0 {
            self.events.emit(Some(key.clone()), event_value(&values));
        }
        Ok(())
    }

    fn set_cols(&self, key: &RowKey, cols: &RowKey, values: RowValues<'_>) -> Result<(), WriteError> {
        let region = self.handle.set_cols(key, cols, values)?;
        if region.is_some() && self.events.handler_count() > 0 {
            self.events.emit(Some(key.clone()), event_value(&values));
        }
        Ok(())
    }

    fn replace(&self, data: &[f32]) -> Result<(), WriteError> {
        self.handle.replace(data)?;
        if self.events.handler_count() > 0 {
            self.events.emit(Some(RowKey::all()), EventValue::Rows(data.to_vec()));
        }
        Ok(())
    }
}

/// The event payload for a written block.
fn event_value(values: &RowValues<'_>) -> EventValue {
    match values {
        RowValues::Splat(v) => EventValue::Scalar(f64::from(*v)),
        RowValues::Row(row) => EventValue::Rows(row.to_vec()),
        RowValues::PerRow(block) => EventValue::Rows(block.to_vec()),
    }
}

/// N×3 vertex positions.
///
/// N×2 input is accepted and zero-extended in z; the row count is fixed
/// afterwards.
#[derive(Debug)]
pub struct VertexPositions {
    inner: Buffered,
}

impl VertexPositions {
    /// Builds from flat point data of `width` 2 or 3, copying into an
    /// isolated buffer.
    pub fn new(points: &[f32], width: usize) -> Result<Self, ConstructionError> {
        let data = match width {
            3 => points.to_vec(),
            2 => {
                let mut data = Vec::with_capacity(points.len() / 2 * 3);
                for xy in points.chunks_exact(2) {
                    data.extend_from_slice(&[xy[0], xy[1], 0.0]);
                }
                data
            }
            got => return Err(ConstructionError::PointWidth { got }),
        };
        let array = AttributeArray::from_rows(data, POSITION_WIDTH)?;
        Ok(Self {
            inner: Buffered::new(BufferHandle::from_array(array), FeatureKind::Positions),
        })
    }

    /// Adopts an existing (possibly shared) N×3 buffer.
    pub fn from_handle(handle: BufferHandle) -> Result<Self, ConstructionError> {
        if handle.width() != POSITION_WIDTH {
            return Err(ConstructionError::PointWidth {
                got: handle.width(),
            });
        }
        Ok(Self {
            inner: Buffered::new(handle, FeatureKind::Positions),
        })
    }

    /// Vertex count.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.inner.handle.rows()
    }

    /// Read access to the current positions.
    #[must_use]
    pub fn value(&self) -> Ref<'_, AttributeArray> {
        self.inner.handle.value()
    }

    /// A handle aliasing this feature's buffer (shared storage).
    #[must_use]
    pub fn share_buffer(&self) -> BufferHandle {
        self.inner.handle.share()
    }

    /// The underlying buffer handle.
    #[must_use]
    pub fn buffer(&self) -> &BufferHandle {
        &self.inner.handle
    }

    /// The listener registry.
    #[must_use]
    pub fn events(&self) -> &FeatureEvents {
        &self.inner.events
    }

    /// Writes `values` at the rows selected by `key`.
    pub fn set(&self, key: &RowKey, values: RowValues<'_>) -> Result<(), WriteError> {
        self.inner.set(key, values)
    }

    /// Writes `values` at selected rows and components (e.g. only y).
    pub fn set_cols(
        &self,
        key: &RowKey,
        cols: &RowKey,
        values: RowValues<'_>,
    ) -> Result<(), WriteError> {
        self.inner.set_cols(key, cols, values)
    }

    /// Replaces all positions.
    pub fn replace(&self, data: &[f32]) -> Result<(), WriteError> {
        self.inner.replace(data)
    }
}

/// N×4 per-vertex RGBA colors.
#[derive(Debug)]
pub struct VertexColors {
    inner: Buffered,
}

impl VertexColors {
    /// Creates `rows` rows, all set to `initial`.
    #[must_use]
    pub fn filled(rows: usize, initial: Rgba) -> Self {
        let array = AttributeArray::filled(rows, &initial.to_array())
            .unwrap_or_else(|_| AttributeArray::zeros(rows, COLOR_WIDTH));
        Self {
            inner: Buffered::new(BufferHandle::from_array(array), FeatureKind::Colors),
        }
    }

    /// Builds from flat N×4 RGBA data, copying into an isolated buffer.
    pub fn from_rows(data: &[f32]) -> Result<Self, ConstructionError> {
        if data.len() % COLOR_WIDTH != 0 {
            return Err(ConstructionError::ColorsWidth { got: 0 });
        }
        let array = AttributeArray::from_rows(data.to_vec(), COLOR_WIDTH)?;
        Ok(Self {
            inner: Buffered::new(BufferHandle::from_array(array), FeatureKind::Colors),
        })
    }

    /// Adopts an existing (possibly shared) N×4 buffer.
    pub fn from_handle(handle: BufferHandle) -> Result<Self, ConstructionError> {
        if handle.width() != COLOR_WIDTH {
            return Err(ConstructionError::ColorsWidth {
                got: handle.width(),
            });
        }
        Ok(Self {
            inner: Buffered::new(handle, FeatureKind::Colors),
        })
    }

    /// Vertex count.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.inner.handle.rows()
    }

    /// Read access to the current colors.
    #[must_use]
    pub fn value(&self) -> Ref<'_, AttributeArray> {
        self.inner.handle.value()
    }

    /// One row as a color.
    #[must_use]
    pub fn color_at(&self, row: usize) -> Rgba {
        let array = self.inner.handle.value();
        let r = array.row(row);
        Rgba::new(r[0], r[1], r[2], r[3])
    }

    /// A handle aliasing this feature's buffer (shared storage).
    #[must_use]
    pub fn share_buffer(&self) -> BufferHandle {
        self.inner.handle.share()
    }

    /// The listener registry.
    #[must_use]
    pub fn events(&self) -> &FeatureEvents {
        &self.inner.events
    }

    /// Writes raw RGBA values at the rows selected by `key`.
    pub fn set(&self, key: &RowKey, values: RowValues<'_>) -> Result<(), WriteError> {
        self.inner.set(key, values)
    }

    /// Writes one color to every row selected by `key`.
    ///
    /// The dispatched event carries the color rather than the raw block.
    pub fn set_color(&self, key: &RowKey, color: Rgba) -> Result<(), WriteError> {
        let region = self.inner.handle.set(key, RowValues::Row(&color.to_array()))?;
        if region.is_some() && self.inner.events.handler_count() > 0 {
            self.inner
                .events
                .emit(Some(key.clone()), EventValue::Rgba(color));
        }
        Ok(())
    }

    /// Writes selected components only (e.g. the red column).
    pub fn set_cols(
        &self,
        key: &RowKey,
        cols: &RowKey,
        values: RowValues<'_>,
    ) -> Result<(), WriteError> {
        self.inner.set_cols(key, cols, values)
    }

    /// Rewrites the alpha column across every row, leaving RGB untouched.
    pub fn write_alpha(&self, alpha: f32) -> Result<(), WriteError> {
        self.inner
            .set_cols(&RowKey::all(), &RowKey::Index(3), RowValues::Splat(alpha))
    }

    /// Replaces all colors from flat RGBA data.
    ///
    /// Note: a colormap association cached by a
    /// [`VertexCmap`](crate::feature::VertexCmap) writing into this buffer
    /// is not cleared by a direct replacement and goes stale.
    pub fn replace(&self, data: &[f32]) -> Result<(), WriteError> {
        self.inner.replace(data)
    }
}

/// N×1 per-vertex point sizes.
#[derive(Debug)]
pub struct PointSizes {
    inner: Buffered,
}

impl PointSizes {
    /// Creates `rows` rows, all set to `size`.
    #[must_use]
    pub fn uniform(rows: usize, size: f32) -> Self {
        let array = AttributeArray::filled(rows, &[size])
            .unwrap_or_else(|_| AttributeArray::zeros(rows, 1));
        Self {
            inner: Buffered::new(BufferHandle::from_array(array), FeatureKind::Sizes),
        }
    }

    /// Builds from one size per vertex, copying into an isolated buffer.
    pub fn from_rows(sizes: &[f32]) -> Result<Self, ConstructionError> {
        let array = AttributeArray::from_rows(sizes.to_vec(), 1)?;
        Ok(Self {
            inner: Buffered::new(BufferHandle::from_array(array), FeatureKind::Sizes),
        })
    }

    /// Vertex count.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.inner.handle.rows()
    }

    /// Read access to the current sizes.
    #[must_use]
    pub fn value(&self) -> Ref<'_, AttributeArray> {
        self.inner.handle.value()
    }

    /// The listener registry.
    #[must_use]
    pub fn events(&self) -> &FeatureEvents {
        &self.inner.events
    }

    /// Writes sizes at the rows selected by `key`.
    pub fn set(&self, key: &RowKey, values: RowValues<'_>) -> Result<(), WriteError> {
        self.inner.set(key, values)
    }

    /// Replaces all sizes.
    pub fn replace(&self, sizes: &[f32]) -> Result<(), WriteError> {
        self.inner.replace(sizes)
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use super::*;
    use crate::buffer::UploadSink;
    use crate::event::{ChangeEvent, EventHandler};
    use crate::index::UploadRegion;

    #[derive(Default)]
    struct RegionLog {
        regions: Vec<UploadRegion>,
    }

    impl UploadSink for RegionLog {
        fn update_range(&mut self, region: UploadRegion) {
            self.regions.push(region);
        }
    }

    fn tap(events: &FeatureEvents) -> (Rc<RefCell<Vec<ChangeEvent>>>, EventHandler) {
        let seen: Rc<RefCell<Vec<ChangeEvent>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let handler: EventHandler = Rc::new(move |e: &ChangeEvent| {
            sink.borrow_mut().push(e.clone());
            Ok(())
        });
        events.add_event_handler(handler.clone());
        (seen, handler)
    }

    #[test]
    fn two_column_points_are_zero_extended() {
        let positions = VertexPositions::new(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        assert_eq!(positions.rows(), 2);
        assert_eq!(positions.value().row(0), &[1.0, 2.0, 0.0]);
        assert_eq!(positions.value().row(1), &[3.0, 4.0, 0.0]);
    }

    #[test]
    fn bad_point_width_is_construction_error() {
        assert_eq!(
            VertexPositions::new(&[0.0; 8], 4).unwrap_err(),
            ConstructionError::PointWidth { got: 4 }
        );
    }

    #[test]
    fn set_marks_and_emits_once() {
        let positions = VertexPositions::new(&[0.0; 30], 3).unwrap();
        let log = Rc::new(RefCell::new(RegionLog::default()));
        positions.buffer().bind_sink(log.clone());
        let (seen, _handler) = tap(positions.events());

        positions
            .set(&RowKey::Index(4), RowValues::Row(&[1.0, 2.0, 3.0]))
            .unwrap();

        assert_eq!(log.borrow().regions, vec![UploadRegion::new(4, 1)]);
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind, FeatureKind::Positions);
        assert_eq!(seen[0].key, Some(RowKey::Index(4)));
        assert_eq!(seen[0].value, EventValue::Rows(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn noop_write_does_not_emit() {
        let positions = VertexPositions::new(&[0.0; 30], 3).unwrap();
        let (seen, _handler) = tap(positions.events());
        positions
            .set(&RowKey::Indices(vec![]), RowValues::Splat(1.0))
            .unwrap();
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn color_feature_rejects_bad_width() {
        assert!(matches!(
            VertexColors::from_rows(&[0.0; 7]),
            Err(ConstructionError::ColorsWidth { .. })
        ));
    }

    #[test]
    fn set_color_emits_the_color() {
        let colors = VertexColors::filled(10, Rgba::WHITE);
        let (seen, _handler) = tap(colors.events());

        colors.set_color(&RowKey::Index(3), Rgba::RED).unwrap();

        assert_eq!(colors.color_at(3), Rgba::RED);
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].value, EventValue::Rgba(Rgba::RED));
    }

    #[test]
    fn write_alpha_leaves_rgb_bit_identical() {
        let colors = VertexColors::filled(5, Rgba::new(0.2, 0.4, 0.6, 1.0));
        let before: Vec<f32> = colors.value().as_slice().to_vec();

        colors.write_alpha(0.5).unwrap();

        let array = colors.value();
        for row in 0..5 {
            let r = array.row(row);
            assert_eq!(&r[..3], &before[row * 4..row * 4 + 3], "row {row} rgb");
            assert_eq!(r[3], 0.5, "row {row} alpha");
        }
    }

    #[test]
    fn shared_color_buffer_sees_writes_from_either_feature() {
        let a = VertexColors::filled(4, Rgba::WHITE);
        let b = VertexColors::from_handle(a.share_buffer()).unwrap();
        // a's handle, b's handle, and the probe handle itself.
        assert_eq!(a.share_buffer().shared(), 3);

        b.set_color(&RowKey::Index(1), Rgba::BLUE).unwrap();
        assert_eq!(a.color_at(1), Rgba::BLUE);
    }

    #[test]
    fn sizes_round_trip() {
        let sizes = PointSizes::from_rows(&[1.0, 2.0, 3.0]).unwrap();
        sizes.set(&RowKey::Index(1), RowValues::Splat(9.0)).unwrap();
        assert_eq!(sizes.value().as_slice(), &[1.0, 9.0, 3.0]);
    }
}
