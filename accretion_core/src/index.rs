// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Row-key resolution: turning heterogeneous index keys into upload spans.
//!
//! A [`RowKey`] addresses rows of a fixed-row-count attribute buffer the
//! way array libraries do: a single integer (negative counts from the
//! end), a slice with arbitrary step, a boolean mask, or an explicit list
//! of row indices. [`resolve`] reduces any key to the smallest contiguous
//! [`UploadRegion`] containing every touched row; [`resolve_elements`]
//! produces the concrete, order-preserving set of touched rows for writes
//! that must skip untouched rows inside the span.
//!
//! # Conservative spans
//!
//! Two deliberate overestimates are preserved from the system this crate
//! mirrors (its own tests pin them):
//!
//! - A slice with non-unit step resolves `size` as the difference of its
//!   normalized bounds, which may exceed the tight bound by up to
//!   `|step| - 1` elements.
//! - A reversed slice keeps the difference-based size over the window
//!   `[stop + 1, start + 1)`, clamped to the buffer's first row.
//!
//! Uploading an extra unchanged element is harmless; values are only ever
//! written at the concrete touched rows.

use alloc::vec::Vec;
use core::fmt;
use core::ops::{Range, RangeFrom, RangeFull, RangeTo};

/// Errors from resolving a [`RowKey`] against a row count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexError {
    /// An integer index (possibly after negative normalization) falls
    /// outside `0..rows`.
    OutOfBounds {
        /// The index as supplied by the caller.
        index: i64,
        /// The buffer's row count.
        rows: usize,
    },
    /// A slice was given a step of zero.
    ZeroStep,
    /// A boolean mask's length does not match the row count.
    MaskLength {
        /// The buffer's row count.
        expected: usize,
        /// The mask's length.
        got: usize,
    },
    /// Ellipsis keys are not supported for buffer indexing.
    Ellipsis,
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { index, rows } => {
                write!(f, "index {index} out of bounds for {rows} rows")
            }
            Self::ZeroStep => write!(f, "slice step cannot be zero"),
            Self::MaskLength { expected, got } => {
                write!(f, "boolean mask length {got} does not match {expected} rows")
            }
            Self::Ellipsis => write!(
                f,
                "ellipsis keys are not supported; use an integer, slice, mask, or index list"
            ),
        }
    }
}

impl core::error::Error for IndexError {}

/// The minimal contiguous span of a buffer's first dimension that must be
/// pushed to the device after a write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct UploadRegion {
    /// First row of the span.
    pub offset: usize,
    /// Number of rows in the span.
    pub size: usize,
}

impl UploadRegion {
    /// Creates a span covering `size` rows starting at `offset`.
    #[must_use]
    pub const fn new(offset: usize, size: usize) -> Self {
        Self { offset, size }
    }

    /// One past the last row of the span.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.size
    }

    /// Returns the smallest span covering both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let offset = self.offset.min(other.offset);
        let end = self.end().max(other.end());
        Self {
            offset,
            size: end - offset,
        }
    }

    /// Returns `true` if `other` overlaps or directly abuts this span.
    #[must_use]
    pub const fn touches(&self, other: &Self) -> bool {
        self.offset <= other.end() && other.offset <= self.end()
    }
}

/// A slice over the rows dimension with array-library semantics.
///
/// `None` fields take the usual defaults: start at the beginning (or the
/// end for negative steps), stop at the end (or before the beginning),
/// step 1. Negative `start`/`stop` count from the end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SliceSpec {
    /// First index, or the directional default.
    pub start: Option<i64>,
    /// Stop index (exclusive), or the directional default.
    pub stop: Option<i64>,
    /// Step, defaulting to 1. Zero is rejected at resolution time.
    pub step: Option<i64>,
}

impl SliceSpec {
    /// Creates a fully specified slice.
    #[must_use]
    pub const fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    /// Normalizes against `rows`, returning `(start, stop, step)` with the
    /// same clamping rules as array-library slices: for positive steps the
    /// bounds land in `0..=rows`, for negative steps in `-1..=rows - 1`.
    pub fn indices(&self, rows: usize) -> Result<(i64, i64, i64), IndexError> {
        let n = rows as i64;
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(IndexError::ZeroStep);
        }

        let (lower, upper) = if step > 0 { (0, n) } else { (-1, n - 1) };

        let clamp = |value: Option<i64>, default: i64| -> i64 {
            match value {
                None => default,
                Some(mut v) => {
                    if v < 0 {
                        v += n;
                        if v < lower {
                            v = lower;
                        }
                    } else if v > upper {
                        v = upper;
                    }
                    v
                }
            }
        };

        let start = clamp(self.start, if step > 0 { 0 } else { n - 1 });
        let stop = clamp(self.stop, if step > 0 { n } else { -1 });
        Ok((start, stop, step))
    }
}

/// A key addressing rows of an attribute buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowKey {
    /// A single row; negative values count from the end.
    Index(i64),
    /// A contiguous or strided range of rows.
    Range(SliceSpec),
    /// An explicit list of rows (fancy indexing); negative values count
    /// from the end. Order is preserved for element enumeration.
    Indices(Vec<i64>),
    /// A boolean mask selecting rows where `true`; its length must equal
    /// the buffer's row count.
    Mask(Vec<bool>),
    /// Kept for array-style API parity; always rejected with
    /// [`IndexError::Ellipsis`].
    Ellipsis,
}

impl RowKey {
    /// The key selecting every row.
    #[must_use]
    pub const fn all() -> Self {
        Self::Range(SliceSpec {
            start: None,
            stop: None,
            step: None,
        })
    }
}

impl From<usize> for RowKey {
    fn from(i: usize) -> Self {
        Self::Index(i as i64)
    }
}

impl From<i64> for RowKey {
    fn from(i: i64) -> Self {
        Self::Index(i)
    }
}

impl From<Range<usize>> for RowKey {
    fn from(r: Range<usize>) -> Self {
        Self::Range(SliceSpec::new(
            Some(r.start as i64),
            Some(r.end as i64),
            None,
        ))
    }
}

impl From<RangeFrom<usize>> for RowKey {
    fn from(r: RangeFrom<usize>) -> Self {
        Self::Range(SliceSpec::new(Some(r.start as i64), None, None))
    }
}

impl From<RangeTo<usize>> for RowKey {
    fn from(r: RangeTo<usize>) -> Self {
        Self::Range(SliceSpec::new(None, Some(r.end as i64), None))
    }
}

impl From<RangeFull> for RowKey {
    fn from(_: RangeFull) -> Self {
        Self::all()
    }
}

impl From<Vec<i64>> for RowKey {
    fn from(v: Vec<i64>) -> Self {
        Self::Indices(v)
    }
}

impl From<Vec<bool>> for RowKey {
    fn from(v: Vec<bool>) -> Self {
        Self::Mask(v)
    }
}

/// Normalizes a single index against `rows`, resolving negatives.
fn normalize(index: i64, rows: usize) -> Result<usize, IndexError> {
    let n = rows as i64;
    let i = if index < 0 { index + n } else { index };
    if i < 0 || i >= n {
        return Err(IndexError::OutOfBounds { index, rows });
    }
    Ok(i as usize)
}

/// Resolves a key to the smallest contiguous span containing every touched
/// row, or `None` when the key selects nothing (a no-op write).
///
/// ```
/// use accretion_core::index::{RowKey, SliceSpec, UploadRegion, resolve};
///
/// let key = RowKey::Range(SliceSpec::new(Some(2), Some(8), Some(2)));
/// let region = resolve(&key, 10).unwrap().unwrap();
/// assert_eq!(region, UploadRegion::new(2, 6));
/// ```
pub fn resolve(key: &RowKey, rows: usize) -> Result<Option<UploadRegion>, IndexError> {
    match key {
        RowKey::Index(i) => {
            let offset = normalize(*i, rows)?;
            Ok(Some(UploadRegion::new(offset, 1)))
        }
        RowKey::Range(spec) => {
            let (start, stop, step) = spec.indices(rows)?;
            if step > 0 {
                if start >= stop {
                    return Ok(None);
                }
                Ok(Some(UploadRegion::new(
                    start as usize,
                    (stop - start) as usize,
                )))
            } else {
                if start <= stop {
                    return Ok(None);
                }
                // Traversal runs from `start` down to `stop + 1`, so the
                // covered window is `[stop + 1, start + 1)`, clamped to the
                // buffer's first row. Size stays difference-based.
                let offset = (stop + 1).max(0) as usize;
                Ok(Some(UploadRegion::new(offset, (start - stop) as usize)))
            }
        }
        RowKey::Indices(indices) => span_of(indices.iter().copied(), rows),
        RowKey::Mask(mask) => {
            if mask.len() != rows {
                return Err(IndexError::MaskLength {
                    expected: rows,
                    got: mask.len(),
                });
            }
            span_of(
                mask.iter()
                    .enumerate()
                    .filter(|(_, set)| **set)
                    .map(|(i, _)| i as i64),
                rows,
            )
        }
        RowKey::Ellipsis => Err(IndexError::Ellipsis),
    }
}

/// Bounding span of an index set: `offset = min`, `size = max - min + 1`.
fn span_of(
    indices: impl Iterator<Item = i64>,
    rows: usize,
) -> Result<Option<UploadRegion>, IndexError> {
    let mut min = usize::MAX;
    let mut max = 0_usize;
    let mut any = false;
    for index in indices {
        let i = normalize(index, rows)?;
        min = min.min(i);
        max = max.max(i);
        any = true;
    }
    if !any {
        return Ok(None);
    }
    Ok(Some(UploadRegion::new(min, max - min + 1)))
}

/// Resolves a key to the concrete, order-preserving list of touched rows.
///
/// Slices with negative steps enumerate in descending order, matching
/// their traversal; masks enumerate ascending; index lists keep their
/// given order. An empty result means the write is a no-op.
pub fn resolve_elements(key: &RowKey, rows: usize) -> Result<Vec<usize>, IndexError> {
    match key {
        RowKey::Index(i) => Ok(alloc::vec![normalize(*i, rows)?]),
        RowKey::Range(spec) => {
            let (start, stop, step) = spec.indices(rows)?;
            let mut out = Vec::new();
            let mut i = start;
            if step > 0 {
                while i < stop {
                    out.push(i as usize);
                    i += step;
                }
            } else {
                while i > stop {
                    out.push(i as usize);
                    i += step;
                }
            }
            Ok(out)
        }
        RowKey::Indices(indices) => indices.iter().map(|&i| normalize(i, rows)).collect(),
        RowKey::Mask(mask) => {
            if mask.len() != rows {
                return Err(IndexError::MaskLength {
                    expected: rows,
                    got: mask.len(),
                });
            }
            Ok(mask
                .iter()
                .enumerate()
                .filter(|(_, set)| **set)
                .map(|(i, _)| i)
                .collect())
        }
        RowKey::Ellipsis => Err(IndexError::Ellipsis),
    }
}
