// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! wgpu implementations of accretion's upload sinks.
//!
//! The core marks upload spans/rects synchronously at write time; this
//! crate accumulates them and turns them into `Queue::write_buffer` /
//! `Queue::write_texture` calls at flush time, coalescing overlapping
//! spans first. Flushing is driven by the application's frame loop:
//!
//! ```rust,ignore
//! // Per frame, after user mutations:
//! buffer_sink.borrow_mut().flush(&positions.value());
//! for (tile_sink, _) in &tile_sinks {
//!     tile_sink.borrow_mut().flush(&image.value());
//! }
//! // ... encode and submit render passes referencing the same resources.
//! ```
//!
//! The sinks hold clones of the [`wgpu::Queue`] (queues are internally
//! reference-counted), so no lifetime ties them to the device setup code.

use core::fmt;

use accretion_core::buffer::{AttributeArray, UploadSink};
use accretion_core::chunk::{TexelRect, TileRef, TileSink};
use accretion_core::index::UploadRegion;

/// Errors from backend resource creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendError {
    /// Only 1- and 4-channel images map to wgpu texture formats
    /// (`R32Float` / `Rgba32Float`); 3-channel data must be padded by the
    /// caller.
    UnsupportedChannels(usize),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedChannels(got) => {
                write!(f, "no float texture format for {got} channels (use 1 or 4)")
            }
        }
    }
}

impl std::error::Error for BackendError {}

/// Accumulates upload spans for one attribute buffer and flushes them via
/// [`wgpu::Queue::write_buffer`].
pub struct WgpuBufferSink {
    queue: wgpu::Queue,
    buffer: wgpu::Buffer,
    width: usize,
    pending: Vec<UploadRegion>,
}

impl fmt::Debug for WgpuBufferSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WgpuBufferSink")
            .field("width", &self.width)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl WgpuBufferSink {
    /// Wraps a device buffer holding rows of `width` `f32` columns.
    #[must_use]
    pub fn new(queue: wgpu::Queue, buffer: wgpu::Buffer, width: usize) -> Self {
        Self {
            queue,
            buffer,
            width: width.max(1),
            pending: Vec::new(),
        }
    }

    /// Spans marked since the last flush.
    #[must_use]
    pub fn pending(&self) -> &[UploadRegion] {
        &self.pending
    }

    /// Writes every pending span from `array` to the device buffer,
    /// coalescing overlapping or abutting spans first.
    ///
    /// # Panics
    ///
    /// Panics if `array` does not match the width/row count the buffer
    /// was created for.
    pub fn flush(&mut self, array: &AttributeArray) {
        assert_eq!(array.width(), self.width, "attribute width changed");
        let spans = coalesce(core::mem::take(&mut self.pending));
        let data = array.as_slice();
        for span in spans {
            let start = span.offset * self.width;
            let end = span.end() * self.width;
            let offset_bytes = (start * size_of::<f32>()) as u64;
            self.queue
                .write_buffer(&self.buffer, offset_bytes, bytemuck::cast_slice(&data[start..end]));
        }
    }
}

impl UploadSink for WgpuBufferSink {
    fn update_range(&mut self, region: UploadRegion) {
        self.pending.push(region);
    }
}

/// Creates a device buffer sized for `array`, usable as a vertex buffer
/// and as a copy destination, and uploads the initial contents.
#[must_use]
pub fn create_attribute_buffer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    array: &AttributeArray,
) -> wgpu::Buffer {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: (array.as_slice().len() * size_of::<f32>()) as u64,
        usage: wgpu::BufferUsages::VERTEX
            | wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    queue.write_buffer(&buffer, 0, bytemuck::cast_slice(array.as_slice()));
    buffer
}

/// Accumulates texel rects for one tile of a chunked image and flushes
/// them via [`wgpu::Queue::write_texture`].
pub struct WgpuTileSink {
    queue: wgpu::Queue,
    texture: wgpu::Texture,
    tile_origin: [usize; 2],
    image_cols: usize,
    channels: usize,
    pending: Vec<TexelRect>,
}

impl fmt::Debug for WgpuTileSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WgpuTileSink")
            .field("tile_origin", &self.tile_origin)
            .field("channels", &self.channels)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl WgpuTileSink {
    /// Wraps the device texture backing `tile` of an image with
    /// `image_cols` columns and `channels` channels per texel.
    #[must_use]
    pub fn new(
        queue: wgpu::Queue,
        texture: wgpu::Texture,
        tile: &TileRef,
        image_cols: usize,
        channels: usize,
    ) -> Self {
        Self {
            queue,
            texture,
            tile_origin: [tile.rows.start, tile.cols.start],
            image_cols,
            channels: channels.max(1),
            pending: Vec::new(),
        }
    }

    /// Rects marked since the last flush.
    #[must_use]
    pub fn pending(&self) -> &[TexelRect] {
        &self.pending
    }

    /// Writes every pending rect from the full logical `image` (row-major,
    /// `image_cols × channels` per row) to the device texture.
    pub fn flush(&mut self, image: &[f32]) {
        for rect in core::mem::take(&mut self.pending) {
            let staging = rect_rows(image, self.image_cols, self.channels, self.tile_origin, &rect);
            let bytes_per_row = rect.size[0] * self.channels as u32 * size_of::<f32>() as u32;
            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &self.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: rect.origin[0],
                        y: rect.origin[1],
                        z: rect.origin[2],
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                bytemuck::cast_slice(&staging),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(rect.size[1]),
                },
                wgpu::Extent3d {
                    width: rect.size[0],
                    height: rect.size[1],
                    depth_or_array_layers: rect.size[2],
                },
            );
        }
    }
}

impl TileSink for WgpuTileSink {
    fn update_rect(&mut self, rect: TexelRect) {
        self.pending.push(rect);
    }
}

/// Creates the device texture for one tile.
///
/// Single-channel data maps to `R32Float`, four-channel to `Rgba32Float`;
/// three-channel data has no float format and must be padded upstream.
pub fn create_tile_texture(
    device: &wgpu::Device,
    label: &str,
    tile: &TileRef,
    channels: usize,
) -> Result<wgpu::Texture, BackendError> {
    let format = match channels {
        1 => wgpu::TextureFormat::R32Float,
        4 => wgpu::TextureFormat::Rgba32Float,
        got => return Err(BackendError::UnsupportedChannels(got)),
    };
    Ok(device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: tile.cols.len() as u32,
            height: tile.rows.len() as u32,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    }))
}

/// Merges overlapping or abutting spans, returning them sorted by offset.
fn coalesce(mut spans: Vec<UploadRegion>) -> Vec<UploadRegion> {
    spans.sort_by_key(|s| s.offset);
    let mut merged: Vec<UploadRegion> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if last.touches(&span) => *last = last.union(&span),
            _ => merged.push(span),
        }
    }
    merged
}

/// Copies the rows of one tile-local rect out of the full logical image
/// into a contiguous staging block.
fn rect_rows(
    image: &[f32],
    image_cols: usize,
    channels: usize,
    tile_origin: [usize; 2],
    rect: &TexelRect,
) -> Vec<f32> {
    let w = rect.size[0] as usize;
    let h = rect.size[1] as usize;
    let mut staging = Vec::with_capacity(w * h * channels);
    for y in 0..h {
        let row = tile_origin[0] + rect.origin[1] as usize + y;
        let col = tile_origin[1] + rect.origin[0] as usize;
        let start = (row * image_cols + col) * channels;
        staging.extend_from_slice(&image[start..start + w * channels]);
    }
    staging
}
