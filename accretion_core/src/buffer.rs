// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared attribute storage with write-through upload marking.
//!
//! An [`AttributeArray`] is a contiguous, row-major `f32` array holding one
//! semantic attribute (positions: N×3, colors: N×4, sizes: N×1). Its row
//! count is fixed for the lifetime of the owning graphic; only values
//! mutate, never the shape.
//!
//! A [`BufferHandle`] is the shared, reference-counted owner. Every
//! indexed write resolves its key ([`crate::index`]), applies the values
//! at exactly the touched rows, and forwards the resolved span to the
//! bound [`UploadSink`] so the engine can schedule a device upload. There
//! is deliberately no mutable access to the raw storage: bypassing the
//! marking path is not representable.
//!
//! Handles created with [`BufferHandle::share`] alias the same storage and
//! sink; mutation through either handle is visible to both, and
//! [`BufferHandle::shared`] reports how many handles are alive. Copies are
//! opt-in via [`BufferHandle::copied_from`].

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::{Cell, Ref, RefCell};
use core::fmt;

use crate::index::{IndexError, RowKey, UploadRegion, resolve, resolve_elements};

/// Errors from shape validation of storage or assigned values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShapeError {
    /// Attribute width must be at least one column.
    ZeroWidth,
    /// Flat data length is not a multiple of the attribute width.
    DataLength {
        /// Length of the supplied data.
        len: usize,
        /// Attribute width in columns.
        width: usize,
    },
    /// A single row value has the wrong number of columns.
    RowWidth {
        /// Expected column count.
        expected: usize,
        /// Received column count.
        got: usize,
    },
    /// An assigned block cannot broadcast against the resolved selection.
    ValueLength {
        /// Expected element count for the selection.
        expected: usize,
        /// Received element count.
        got: usize,
    },
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroWidth => write!(f, "attribute width cannot be zero"),
            Self::DataLength { len, width } => {
                write!(f, "data length {len} is not a multiple of width {width}")
            }
            Self::RowWidth { expected, got } => {
                write!(f, "expected a row of {expected} components, got {got}")
            }
            Self::ValueLength { expected, got } => {
                write!(f, "expected {expected} elements for the selection, got {got}")
            }
        }
    }
}

impl core::error::Error for ShapeError {}

/// Errors from an indexed write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteError {
    /// The key could not be resolved.
    Index(IndexError),
    /// The value could not broadcast against the selection.
    Shape(ShapeError),
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(e) => write!(f, "{e}"),
            Self::Shape(e) => write!(f, "{e}"),
        }
    }
}

impl core::error::Error for WriteError {}

impl From<IndexError> for WriteError {
    fn from(e: IndexError) -> Self {
        Self::Index(e)
    }
}

impl From<ShapeError> for WriteError {
    fn from(e: ShapeError) -> Self {
        Self::Shape(e)
    }
}

/// Marks spans of a device-resident buffer for re-upload.
///
/// The engine side implements this; the core only forwards the minimal
/// `(offset, size)` span per write. Marking is a cheap metadata update —
/// the actual transfer happens in the engine's own flush cycle.
pub trait UploadSink {
    /// Marks `region` (in rows) as needing a device upload.
    fn update_range(&mut self, region: UploadRegion);
}

/// Fixed-shape, row-major `f32` storage for one attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeArray {
    data: Vec<f32>,
    width: usize,
}

impl AttributeArray {
    /// Adopts `data` as `len / width` rows of `width` columns, zero-copy.
    pub fn from_rows(data: Vec<f32>, width: usize) -> Result<Self, ShapeError> {
        if width == 0 {
            return Err(ShapeError::ZeroWidth);
        }
        if data.len() % width != 0 {
            return Err(ShapeError::DataLength {
                len: data.len(),
                width,
            });
        }
        Ok(Self { data, width })
    }

    /// Creates `rows` rows of zeros.
    #[must_use]
    pub fn zeros(rows: usize, width: usize) -> Self {
        Self {
            data: vec![0.0; rows * width],
            width: width.max(1),
        }
    }

    /// Creates `rows` rows, each a copy of `row`.
    pub fn filled(rows: usize, row: &[f32]) -> Result<Self, ShapeError> {
        if row.is_empty() {
            return Err(ShapeError::ZeroWidth);
        }
        let mut data = Vec::with_capacity(rows * row.len());
        for _ in 0..rows {
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            width: row.len(),
        })
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.data.len() / self.width
    }

    /// Number of columns per row.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// The full storage, row-major.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// One row as a slice.
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.rows()`.
    #[must_use]
    pub fn row(&self, row: usize) -> &[f32] {
        let start = row * self.width;
        &self.data[start..start + self.width]
    }

    /// One component.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is out of range.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        assert!(col < self.width, "column {col} out of range ({})", self.width);
        self.data[row * self.width + col]
    }

    fn set_component(&mut self, row: usize, col: usize, value: f32) {
        self.data[row * self.width + col] = value;
    }

    fn copy_row(&mut self, row: usize, values: &[f32]) {
        let start = row * self.width;
        self.data[start..start + self.width].copy_from_slice(values);
    }
}

/// Values assigned by an indexed write, with broadcast semantics.
#[derive(Clone, Copy, Debug)]
pub enum RowValues<'a> {
    /// One scalar written to every selected component.
    Splat(f32),
    /// One row (or one component-set for column writes) broadcast to every
    /// selected row.
    Row(&'a [f32]),
    /// A full block: one row of values per selected row, in selection
    /// order.
    PerRow(&'a [f32]),
}

struct BufferInner {
    array: RefCell<AttributeArray>,
    sink: RefCell<Option<Rc<RefCell<dyn UploadSink>>>>,
    /// Set once a full-extent replacement has happened; derived features
    /// may consult this to decide whether their cached state is current.
    replaced: Cell<bool>,
}

/// Shared handle to one attribute buffer with upload tracking.
///
/// Cloning via [`share`](Self::share) aliases the same storage; mutation
/// through any handle marks the same sink and is visible to all sharers.
#[derive(Clone)]
pub struct BufferHandle {
    inner: Rc<BufferInner>,
}

impl fmt::Debug for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let array = self.inner.array.borrow();
        f.debug_struct("BufferHandle")
            .field("rows", &array.rows())
            .field("width", &array.width())
            .field("shared", &self.shared())
            .finish_non_exhaustive()
    }
}

impl BufferHandle {
    /// Adopts an array zero-copy.
    #[must_use]
    pub fn from_array(array: AttributeArray) -> Self {
        Self {
            inner: Rc::new(BufferInner {
                array: RefCell::new(array),
                sink: RefCell::new(None),
                replaced: Cell::new(false),
            }),
        }
    }

    /// Deep-copies caller-owned data into an isolated buffer.
    ///
    /// This is the default ingestion path: it protects against aliasing
    /// with memory the caller may mutate later (e.g. memory-mapped data).
    /// To adopt storage without the copy, build an [`AttributeArray`] and
    /// use [`from_array`](Self::from_array).
    pub fn copied_from(data: &[f32], width: usize) -> Result<Self, ShapeError> {
        Ok(Self::from_array(AttributeArray::from_rows(
            data.to_vec(),
            width,
        )?))
    }

    /// Returns a handle aliasing the same storage and sink.
    #[must_use]
    pub fn share(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }

    /// Number of live handles on this storage (including this one).
    #[must_use]
    pub fn shared(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// Binds the engine-side sink that receives upload marks.
    pub fn bind_sink(&self, sink: Rc<RefCell<dyn UploadSink>>) {
        *self.inner.sink.borrow_mut() = Some(sink);
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.inner.array.borrow().rows()
    }

    /// Number of columns per row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.inner.array.borrow().width()
    }

    /// Read access to the current values.
    ///
    /// The guard must be dropped before the next write; writes go through
    /// [`set`](Self::set) and friends only.
    #[must_use]
    pub fn value(&self) -> Ref<'_, AttributeArray> {
        self.inner.array.borrow()
    }

    /// Copies one row out.
    #[must_use]
    pub fn row_vec(&self, row: usize) -> Vec<f32> {
        self.inner.array.borrow().row(row).to_vec()
    }

    /// Whether a full-extent replacement has ever happened on this buffer.
    #[must_use]
    pub fn was_replaced(&self) -> bool {
        self.inner.replaced.get()
    }

    /// Writes `values` at the rows selected by `key` and marks the minimal
    /// containing span on the bound sink.
    ///
    /// Returns the marked span, or `None` when the key selected nothing
    /// (no write, no mark).
    pub fn set(
        &self,
        key: &RowKey,
        values: RowValues<'_>,
    ) -> Result<Option<UploadRegion>, WriteError> {
        let (rows, width) = {
            let array = self.inner.array.borrow();
            (array.rows(), array.width())
        };
        let elements = resolve_elements(key, rows)?;
        let Some(region) = resolve(key, rows)? else {
            return Ok(None);
        };

        {
            let mut array = self.inner.array.borrow_mut();
            match values {
                RowValues::Splat(v) => {
                    for &row in &elements {
                        for col in 0..width {
                            array.set_component(row, col, v);
                        }
                    }
                }
                RowValues::Row(row_values) => {
                    if row_values.len() != width {
                        return Err(ShapeError::RowWidth {
                            expected: width,
                            got: row_values.len(),
                        }
                        .into());
                    }
                    for &row in &elements {
                        array.copy_row(row, row_values);
                    }
                }
                RowValues::PerRow(block) => {
                    let expected = elements.len() * width;
                    if block.len() != expected {
                        return Err(ShapeError::ValueLength {
                            expected,
                            got: block.len(),
                        }
                        .into());
                    }
                    for (i, &row) in elements.iter().enumerate() {
                        array.copy_row(row, &block[i * width..(i + 1) * width]);
                    }
                }
            }
        }

        self.mark(region);
        Ok(Some(region))
    }

    /// Writes `values` at the intersection of the rows selected by `key`
    /// and the columns selected by `cols`.
    ///
    /// Only the row key determines the marked span; untouched columns
    /// inside it keep their values.
    pub fn set_cols(
        &self,
        key: &RowKey,
        cols: &RowKey,
        values: RowValues<'_>,
    ) -> Result<Option<UploadRegion>, WriteError> {
        let (rows, width) = {
            let array = self.inner.array.borrow();
            (array.rows(), array.width())
        };
        let elements = resolve_elements(key, rows)?;
        let col_elements = resolve_elements(cols, width)?;
        let Some(region) = resolve(key, rows)? else {
            return Ok(None);
        };
        if col_elements.is_empty() {
            return Ok(None);
        }

        {
            let mut array = self.inner.array.borrow_mut();
            match values {
                RowValues::Splat(v) => {
                    for &row in &elements {
                        for &col in &col_elements {
                            array.set_component(row, col, v);
                        }
                    }
                }
                RowValues::Row(per_col) => {
                    if per_col.len() != col_elements.len() {
                        return Err(ShapeError::RowWidth {
                            expected: col_elements.len(),
                            got: per_col.len(),
                        }
                        .into());
                    }
                    for &row in &elements {
                        for (i, &col) in col_elements.iter().enumerate() {
                            array.set_component(row, col, per_col[i]);
                        }
                    }
                }
                RowValues::PerRow(block) => {
                    let expected = elements.len() * col_elements.len();
                    if block.len() != expected {
                        return Err(ShapeError::ValueLength {
                            expected,
                            got: block.len(),
                        }
                        .into());
                    }
                    for (i, &row) in elements.iter().enumerate() {
                        for (j, &col) in col_elements.iter().enumerate() {
                            array.set_component(row, col, block[i * col_elements.len() + j]);
                        }
                    }
                }
            }
        }

        self.mark(region);
        Ok(Some(region))
    }

    /// Replaces the full contents and marks the full extent.
    ///
    /// `data` must match the buffer's exact shape; re-uploading identical
    /// content is allowed (no dirty-diffing against previous values).
    pub fn replace(&self, data: &[f32]) -> Result<UploadRegion, WriteError> {
        let (rows, width) = {
            let array = self.inner.array.borrow();
            (array.rows(), array.width())
        };
        let expected = rows * width;
        if data.len() != expected {
            return Err(ShapeError::ValueLength {
                expected,
                got: data.len(),
            }
            .into());
        }
        {
            let mut array = self.inner.array.borrow_mut();
            for (row, chunk) in data.chunks_exact(width).enumerate() {
                array.copy_row(row, chunk);
            }
        }
        self.inner.replaced.set(true);
        let region = UploadRegion::new(0, rows);
        self.mark(region);
        Ok(region)
    }

    /// Forwards a span to the bound sink, if any.
    fn mark(&self, region: UploadRegion) {
        let sink = self.inner.sink.borrow().clone();
        if let Some(sink) = sink {
            sink.borrow_mut().update_range(region);
        }
    }
}
