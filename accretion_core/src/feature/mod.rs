// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The closed set of reactive feature kinds.
//!
//! A feature wraps either a shared attribute buffer or a plain value and
//! exposes the same reactive surface: current value, mutation entry
//! points, and a [`FeatureEvents`](crate::event::FeatureEvents) registry.
//! Features never outlive their graphic and never change shape after
//! construction; invalid initial data is rejected eagerly with
//! [`ConstructionError`] before any buffer is allocated.
//!
//! - **Buffered** ([`buffered`]) — positions, per-vertex colors, point
//!   sizes; indexed writes with upload marking.
//! - **Uniform** ([`uniform`]) — single-value color and size with guarded
//!   `set_value` semantics.
//! - **Derived** ([`derived`]) — colormap and alpha features that write
//!   through to a color feature's buffer; image value windows.
//! - **Selection** ([`selection`]) — selector positions and regions,
//!   clamped to limits.

use core::fmt;

use crate::buffer::{ShapeError, WriteError};

pub mod buffered;
pub mod derived;
pub mod selection;
pub mod uniform;

pub use buffered::{PointSizes, VertexColors, VertexPositions};
pub use derived::{ImageCmap, UniformAlpha, VertexCmap};
pub use selection::{LinearSelection, RegionSelection};
pub use uniform::{UniformColor, UniformSize};

/// Errors from validating initial feature data.
///
/// Raised at construction time, before any buffer is allocated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstructionError {
    /// Point data must be N×2 or N×3.
    PointWidth {
        /// Received column count.
        got: usize,
    },
    /// Per-vertex colors must be N×4 RGBA.
    ColorsWidth {
        /// Received column count (or 0 when the flat length is not a
        /// multiple of 4).
        got: usize,
    },
    /// A per-vertex array does not match the graphic's vertex count.
    LengthMismatch {
        /// The graphic's vertex count.
        expected: usize,
        /// Received element count.
        got: usize,
    },
    /// Image data must have 2 or 3 dimensions.
    ImageDims {
        /// Received dimension count.
        got: usize,
    },
    /// Image channel count must be 1, 3, or 4.
    ImageChannels {
        /// Received channel count.
        got: usize,
    },
    /// Flat pixel data does not match the declared shape.
    PixelCount {
        /// `rows × cols × channels` for the declared shape.
        expected: usize,
        /// Received element count.
        got: usize,
    },
    /// Storage-level shape validation failed.
    Storage(ShapeError),
    /// An initial write (e.g. applying a configured colormap) failed.
    InitialWrite(WriteError),
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PointWidth { got } => {
                write!(f, "point data must be Nx2 or Nx3, got width {got}")
            }
            Self::ColorsWidth { got } => {
                write!(f, "per-vertex colors must be Nx4 RGBA, got width {got}")
            }
            Self::LengthMismatch { expected, got } => {
                write!(f, "expected {expected} per-vertex values, got {got}")
            }
            Self::ImageDims { got } => {
                write!(f, "image data must have 2 or 3 dimensions, got {got}")
            }
            Self::ImageChannels { got } => {
                write!(f, "image channel count must be 1, 3, or 4, got {got}")
            }
            Self::PixelCount { expected, got } => {
                write!(f, "expected {expected} pixel values for the shape, got {got}")
            }
            Self::Storage(e) => write!(f, "{e}"),
            Self::InitialWrite(e) => write!(f, "initial write failed: {e}"),
        }
    }
}

impl core::error::Error for ConstructionError {}

impl From<ShapeError> for ConstructionError {
    fn from(e: ShapeError) -> Self {
        Self::Storage(e)
    }
}

impl From<WriteError> for ConstructionError {
    fn from(e: WriteError) -> Self {
        Self::InitialWrite(e)
    }
}
