// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Texture chunking for images larger than one hardware texture.
//!
//! A [`TileGrid`] partitions an H×W image into `ceil(H / T) × ceil(W / T)`
//! tiles of at most `T` texels per edge, where `T` is the hardware texture
//! dimension limit. The union of the tiles covers the image exactly, with
//! no gaps and no overlaps.
//!
//! [`ChunkedImage`] keeps the image as one logical array regardless of
//! tiling: reads reassemble trivially (single backing store), and a write
//! addressed by `(row_key, col_key)` is decomposed into the subset of
//! tiles it overlaps, each marked with its own minimal upload rect in
//! tile-local coordinates. Rects are emitted in `(x, y, z)` origin /
//! `(width, height, depth)` size order, matching texture addressing.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Ref, RefCell};
use core::fmt;
use core::ops::Range;

use kurbo::Rect;

use crate::buffer::{ShapeError, WriteError};
use crate::event::{EventValue, FeatureEvents, FeatureKind};
use crate::feature::ConstructionError;
use crate::index::{RowKey, resolve, resolve_elements};
use crate::trace::DiagnosticSink;

/// Chunking configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Maximum tile edge length in texels (the hardware texture dimension
    /// limit).
    pub tile_edge: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self { tile_edge: 8192 }
    }
}

/// A tile-local upload rect in texture addressing order.
///
/// `origin` is `(x, y, z)` and `size` is `(width, height, depth)`; the
/// row/column orientation of image writes is converted when rects are
/// emitted (columns map to x, rows to y).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TexelRect {
    /// Rect origin, `(x, y, z)`.
    pub origin: [u32; 3],
    /// Rect size, `(width, height, depth)`.
    pub size: [u32; 3],
}

/// Marks rects of one device texture for re-upload.
pub trait TileSink {
    /// Marks `rect` (tile-local) as needing a device upload.
    fn update_rect(&mut self, rect: TexelRect);
}

/// Partition of an image into a grid of bounded tiles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    rows: usize,
    cols: usize,
    tile_edge: usize,
    row_starts: Vec<usize>,
    col_starts: Vec<usize>,
}

impl TileGrid {
    /// Partitions `rows × cols` texels into tiles of at most `tile_edge`
    /// per side.
    ///
    /// # Panics
    ///
    /// Panics if `tile_edge` is zero.
    #[must_use]
    pub fn new(rows: usize, cols: usize, tile_edge: usize) -> Self {
        assert!(tile_edge > 0, "tile edge must be positive");
        Self {
            rows,
            cols,
            tile_edge,
            row_starts: starts(rows, tile_edge),
            col_starts: starts(cols, tile_edge),
        }
    }

    /// Image height in texels.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Image width in texels.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Number of tile rows.
    #[must_use]
    pub fn grid_rows(&self) -> usize {
        self.row_starts.len()
    }

    /// Number of tile columns.
    #[must_use]
    pub fn grid_cols(&self) -> usize {
        self.col_starts.len()
    }

    /// Start offset of each tile row.
    #[must_use]
    pub fn row_starts(&self) -> &[usize] {
        &self.row_starts
    }

    /// Start offset of each tile column.
    #[must_use]
    pub fn col_starts(&self) -> &[usize] {
        &self.col_starts
    }

    /// Row extent of tile row `grid_row`.
    #[must_use]
    pub fn row_extent(&self, grid_row: usize) -> Range<usize> {
        let start = self.row_starts[grid_row];
        start..(start + self.tile_edge).min(self.rows)
    }

    /// Column extent of tile column `grid_col`.
    #[must_use]
    pub fn col_extent(&self, grid_col: usize) -> Range<usize> {
        let start = self.col_starts[grid_col];
        start..(start + self.tile_edge).min(self.cols)
    }

    /// A restartable iterator over every tile, row-major.
    #[must_use]
    pub fn tiles(&self) -> TileIter<'_> {
        TileIter { grid: self, next: 0 }
    }
}

fn starts(extent: usize, tile_edge: usize) -> Vec<usize> {
    (0..extent.div_ceil(tile_edge))
        .map(|i| i * tile_edge)
        .collect()
}

/// One tile of a [`TileGrid`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileRef {
    /// Tile row in the grid.
    pub grid_row: usize,
    /// Tile column in the grid.
    pub grid_col: usize,
    /// Row-major tile index (`grid_row * grid_cols + grid_col`).
    pub index: usize,
    /// Image rows covered by this tile.
    pub rows: Range<usize>,
    /// Image columns covered by this tile.
    pub cols: Range<usize>,
}

impl TileRef {
    /// World-space placement rect for this tile's mesh: columns map to x,
    /// rows to y.
    #[must_use]
    pub fn world_rect(&self) -> Rect {
        Rect::new(
            self.cols.start as f64,
            self.rows.start as f64,
            self.cols.end as f64,
            self.rows.end as f64,
        )
    }
}

/// Row-major iterator over the tiles of a [`TileGrid`].
///
/// Obtain a fresh one from [`TileGrid::tiles`] to restart.
#[derive(Clone, Debug)]
pub struct TileIter<'a> {
    grid: &'a TileGrid,
    next: usize,
}

impl Iterator for TileIter<'_> {
    type Item = TileRef;

    fn next(&mut self) -> Option<Self::Item> {
        let grid_cols = self.grid.grid_cols();
        let total = self.grid.grid_rows() * grid_cols;
        if self.next >= total {
            return None;
        }
        let index = self.next;
        self.next += 1;
        let grid_row = index / grid_cols;
        let grid_col = index % grid_cols;
        Some(TileRef {
            grid_row,
            grid_col,
            index,
            rows: self.grid.row_extent(grid_row),
            cols: self.grid.col_extent(grid_col),
        })
    }
}

/// Ingested pixel data in one of the accepted element types.
///
/// Anything but `f32` is copied and converted, with a notice sent to the
/// diagnostics sink; `f32` input is adopted zero-copy.
#[derive(Clone, Debug)]
pub enum PixelData {
    /// Adopted as-is.
    F32(Vec<f32>),
    /// Converted; values map to `0.0..=255.0`.
    U8(Vec<u8>),
    /// Converted; values map to `0.0..=65535.0`.
    U16(Vec<u16>),
    /// Converted with precision loss beyond 2^24.
    F64(Vec<f64>),
}

impl PixelData {
    fn into_f32(self) -> (Vec<f32>, Option<&'static str>) {
        match self {
            Self::F32(data) => (data, None),
            Self::U8(data) => (data.into_iter().map(f32::from).collect(), Some("u8")),
            Self::U16(data) => (data.into_iter().map(f32::from).collect(), Some("u16")),
            Self::F64(data) => (data.into_iter().map(|v| v as f32).collect(), Some("f64")),
        }
    }
}

/// Values assigned by a rectangular image write.
#[derive(Clone, Copy, Debug)]
pub enum PixelValues<'a> {
    /// One scalar written to every selected texel component.
    Splat(f32),
    /// A block of `selected_rows × selected_cols × channels` values in
    /// selection order.
    Block(&'a [f32]),
}

/// One logical image backed by a grid of device textures.
pub struct ChunkedImage {
    data: RefCell<Vec<f32>>,
    channels: usize,
    grid: TileGrid,
    sinks: RefCell<Vec<Option<Rc<RefCell<dyn TileSink>>>>>,
    events: FeatureEvents,
}

impl fmt::Debug for ChunkedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkedImage")
            .field("rows", &self.grid.rows())
            .field("cols", &self.grid.cols())
            .field("channels", &self.channels)
            .field("grid_rows", &self.grid.grid_rows())
            .field("grid_cols", &self.grid.grid_cols())
            .finish_non_exhaustive()
    }
}

impl ChunkedImage {
    /// Builds a chunked image from flat pixel data and its shape.
    ///
    /// `shape` is `[rows, cols]` (grayscale) or `[rows, cols, channels]`
    /// with 1, 3, or 4 channels. Non-`f32` input is converted with a
    /// notice to `diagnostics`.
    pub fn new(
        data: PixelData,
        shape: &[usize],
        config: ChunkConfig,
        diagnostics: Option<Rc<dyn DiagnosticSink>>,
    ) -> Result<Self, ConstructionError> {
        let (rows, cols, channels) = match *shape {
            [rows, cols] => (rows, cols, 1),
            [rows, cols, channels] => {
                if !matches!(channels, 1 | 3 | 4) {
                    return Err(ConstructionError::ImageChannels { got: channels });
                }
                (rows, cols, channels)
            }
            _ => return Err(ConstructionError::ImageDims { got: shape.len() }),
        };

        let (flat, converted) = data.into_f32();
        let expected = rows * cols * channels;
        if flat.len() != expected {
            return Err(ConstructionError::PixelCount {
                expected,
                got: flat.len(),
            });
        }
        if let (Some(from), Some(diag)) = (converted, diagnostics.as_ref()) {
            diag.on_data_converted(from);
        }

        let grid = TileGrid::new(rows, cols, config.tile_edge);
        let tile_count = grid.grid_rows() * grid.grid_cols();
        Ok(Self {
            data: RefCell::new(flat),
            channels,
            grid,
            sinks: RefCell::new(alloc::vec![None; tile_count]),
            events: FeatureEvents::new(FeatureKind::ImageData),
        })
    }

    /// The tile partition.
    #[must_use]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Channels per texel.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// The listener registry.
    #[must_use]
    pub fn events(&self) -> &FeatureEvents {
        &self.events
    }

    /// Binds the device texture behind one tile.
    ///
    /// # Panics
    ///
    /// Panics if the grid position is out of range.
    pub fn bind_tile_sink(
        &self,
        grid_row: usize,
        grid_col: usize,
        sink: Rc<RefCell<dyn TileSink>>,
    ) {
        assert!(
            grid_row < self.grid.grid_rows() && grid_col < self.grid.grid_cols(),
            "tile ({grid_row}, {grid_col}) out of range for {}x{} grid",
            self.grid.grid_rows(),
            self.grid.grid_cols()
        );
        self.sinks.borrow_mut()[grid_row * self.grid.grid_cols() + grid_col] = Some(sink);
    }

    /// Binds every tile using a factory (e.g. one device texture per
    /// tile), in row-major order.
    pub fn bind_tiles(&self, mut factory: impl FnMut(&TileRef) -> Rc<RefCell<dyn TileSink>>) {
        for tile in self.grid.tiles() {
            let sink = factory(&tile);
            self.sinks.borrow_mut()[tile.index] = Some(sink);
        }
    }

    /// Read access to the full logical image, row-major.
    #[must_use]
    pub fn value(&self) -> Ref<'_, [f32]> {
        Ref::map(self.data.borrow(), Vec::as_slice)
    }

    /// One texel component.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of range.
    #[must_use]
    pub fn get(&self, row: usize, col: usize, channel: usize) -> f32 {
        assert!(channel < self.channels, "channel {channel} out of range");
        let cols = self.grid.cols();
        self.data.borrow()[(row * cols + col) * self.channels + channel]
    }

    /// Writes `values` at the texels selected by `(row_key, col_key)` and
    /// marks every overlapped tile's minimal local rect.
    pub fn set(
        &self,
        row_key: &RowKey,
        col_key: &RowKey,
        values: PixelValues<'_>,
    ) -> Result<(), WriteError> {
        let rows = self.grid.rows();
        let cols = self.grid.cols();
        let row_elems = resolve_elements(row_key, rows)?;
        let col_elems = resolve_elements(col_key, cols)?;
        let (Some(row_region), Some(col_region)) =
            (resolve(row_key, rows)?, resolve(col_key, cols)?)
        else {
            return Ok(());
        };

        {
            let mut data = self.data.borrow_mut();
            match values {
                PixelValues::Splat(v) => {
                    for &r in &row_elems {
                        for &c in &col_elems {
                            let base = (r * cols + c) * self.channels;
                            data[base..base + self.channels].fill(v);
                        }
                    }
                }
                PixelValues::Block(block) => {
                    let expected = row_elems.len() * col_elems.len() * self.channels;
                    if block.len() != expected {
                        return Err(ShapeError::ValueLength {
                            expected,
                            got: block.len(),
                        }
                        .into());
                    }
                    let row_stride = col_elems.len() * self.channels;
                    for (i, &r) in row_elems.iter().enumerate() {
                        for (j, &c) in col_elems.iter().enumerate() {
                            let src = i * row_stride + j * self.channels;
                            let dst = (r * cols + c) * self.channels;
                            data[dst..dst + self.channels]
                                .copy_from_slice(&block[src..src + self.channels]);
                        }
                    }
                }
            }
        }

        self.mark_rect(
            row_region.offset..row_region.end(),
            col_region.offset..col_region.end(),
        );

        if self.events.handler_count() > 0 {
            let value = match values {
                PixelValues::Splat(v) => EventValue::Scalar(f64::from(v)),
                PixelValues::Block(block) => EventValue::Rows(block.to_vec()),
            };
            self.events.emit(Some(row_key.clone()), value);
        }
        Ok(())
    }

    /// Replaces the full image and marks every tile in full.
    pub fn replace(&self, data: &[f32]) -> Result<(), WriteError> {
        let expected = self.grid.rows() * self.grid.cols() * self.channels;
        if data.len() != expected {
            return Err(ShapeError::ValueLength {
                expected,
                got: data.len(),
            }
            .into());
        }
        self.data.borrow_mut().copy_from_slice(data);
        self.mark_rect(0..self.grid.rows(), 0..self.grid.cols());
        if self.events.handler_count() > 0 {
            self.events
                .emit(Some(RowKey::all()), EventValue::Rows(data.to_vec()));
        }
        Ok(())
    }

    /// Marks the intersection of `rows × cols` with every overlapped
    /// tile, in tile-local texture coordinates.
    fn mark_rect(&self, rows: Range<usize>, cols: Range<usize>) {
        for tile in self.grid.tiles() {
            let r0 = tile.rows.start.max(rows.start);
            let r1 = tile.rows.end.min(rows.end);
            let c0 = tile.cols.start.max(cols.start);
            let c1 = tile.cols.end.min(cols.end);
            if r0 >= r1 || c0 >= c1 {
                continue;
            }
            let sink = self.sinks.borrow()[tile.index].clone();
            if let Some(sink) = sink {
                sink.borrow_mut().update_rect(TexelRect {
                    origin: [
                        (c0 - tile.cols.start) as u32,
                        (r0 - tile.rows.start) as u32,
                        0,
                    ],
                    size: [(c1 - c0) as u32, (r1 - r0) as u32, 1],
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::index::SliceSpec;

    #[test]
    fn grid_partition_matches_hardware_limit() {
        // 20000x20000 at a tile edge of 8192 is a 3x3 grid.
        let grid = TileGrid::new(20_000, 20_000, 8192);
        assert_eq!(grid.grid_rows(), 3);
        assert_eq!(grid.grid_cols(), 3);
        assert_eq!(grid.row_starts(), &[0, 8192, 16384]);
        assert_eq!(grid.col_starts(), &[0, 8192, 16384]);
        assert_eq!(grid.row_extent(2), 16384..20_000);
    }

    #[test]
    fn oversized_write_intersects_the_expected_tiles() {
        // Rows 12000..18000, cols 16000..19000 over the 3x3 grid above
        // touch tile rows {1, 2} and tile cols {1, 2}.
        let grid = TileGrid::new(20_000, 20_000, 8192);
        let touched: Vec<(usize, usize)> = grid
            .tiles()
            .filter(|t| {
                t.rows.start < 18_000
                    && t.rows.end > 12_000
                    && t.cols.start < 19_000
                    && t.cols.end > 16_000
            })
            .map(|t| (t.grid_row, t.grid_col))
            .collect();
        assert_eq!(touched, vec![(1, 1), (1, 2), (2, 1), (2, 2)]);
    }

    #[test]
    fn tiles_cover_exactly_with_no_overlap() {
        let grid = TileGrid::new(10, 7, 4);
        let mut covered = vec![false; 10 * 7];
        for tile in grid.tiles() {
            for r in tile.rows.clone() {
                for c in tile.cols.clone() {
                    assert!(!covered[r * 7 + c], "overlap at ({r}, {c})");
                    covered[r * 7 + c] = true;
                }
            }
        }
        assert!(covered.iter().all(|&b| b), "grid must cover every texel");
    }

    #[test]
    fn tile_iterator_is_row_major_and_restartable() {
        let grid = TileGrid::new(10, 10, 4);
        let order: Vec<(usize, usize)> = grid
            .tiles()
            .map(|t| (t.grid_row, t.grid_col))
            .collect();
        assert_eq!(
            order,
            vec![
                (0, 0),
                (0, 1),
                (0, 2),
                (1, 0),
                (1, 1),
                (1, 2),
                (2, 0),
                (2, 1),
                (2, 2)
            ]
        );
        // A fresh iterator starts over.
        assert_eq!(grid.tiles().count(), 9);
    }

    #[test]
    fn world_rect_places_tiles_in_image_space() {
        let grid = TileGrid::new(10, 7, 4);
        let tiles: Vec<TileRef> = grid.tiles().collect();
        assert_eq!(tiles[1].world_rect(), Rect::new(4.0, 0.0, 7.0, 4.0));
        assert_eq!(tiles[3].world_rect(), Rect::new(4.0, 4.0, 7.0, 8.0));
    }

    fn image(rows: usize, cols: usize, tile_edge: usize) -> ChunkedImage {
        ChunkedImage::new(
            PixelData::F32(vec![0.0; rows * cols]),
            &[rows, cols],
            ChunkConfig { tile_edge },
            None,
        )
        .unwrap()
    }

    #[derive(Default)]
    struct RectLog {
        rects: Vec<TexelRect>,
    }

    impl TileSink for RectLog {
        fn update_rect(&mut self, rect: TexelRect) {
            self.rects.push(rect);
        }
    }

    fn bind_logs(image: &ChunkedImage) -> Vec<Rc<RefCell<RectLog>>> {
        let mut logs = Vec::new();
        for _ in image.grid().tiles() {
            logs.push(Rc::new(RefCell::new(RectLog::default())));
        }
        let mut i = 0;
        image.bind_tiles(|_tile| {
            let log = logs[i].clone();
            i += 1;
            log
        });
        logs
    }

    #[test]
    fn construction_rejects_bad_shapes() {
        let err = ChunkedImage::new(
            PixelData::F32(vec![0.0; 8]),
            &[8],
            ChunkConfig::default(),
            None,
        )
        .unwrap_err();
        assert_eq!(err, ConstructionError::ImageDims { got: 1 });

        let err = ChunkedImage::new(
            PixelData::F32(vec![0.0; 24]),
            &[2, 2, 6],
            ChunkConfig::default(),
            None,
        )
        .unwrap_err();
        assert_eq!(err, ConstructionError::ImageChannels { got: 6 });

        let err = ChunkedImage::new(
            PixelData::F32(vec![0.0; 5]),
            &[2, 3],
            ChunkConfig::default(),
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConstructionError::PixelCount {
                expected: 6,
                got: 5
            }
        );
    }

    #[test]
    fn u8_ingestion_converts_with_notice() {
        use core::cell::Cell;

        struct ConvLog(Cell<Option<&'static str>>);
        impl DiagnosticSink for ConvLog {
            fn on_data_converted(&self, from: &'static str) {
                self.0.set(Some(from));
            }
        }

        let log = Rc::new(ConvLog(Cell::new(None)));
        let image = ChunkedImage::new(
            PixelData::U8(vec![0, 128, 255, 64]),
            &[2, 2],
            ChunkConfig::default(),
            Some(log.clone()),
        )
        .unwrap();
        assert_eq!(log.0.get(), Some("u8"));
        assert_eq!(image.get(0, 1, 0), 128.0);
    }

    #[test]
    fn write_routes_to_overlapped_tiles_only() {
        // 10x10 at tile edge 4: 3x3 grid. Write rows 3..9, cols 2..5:
        // touches tile rows {0,1,2} x tile cols {0,1}.
        let image = image(10, 10, 4);
        let logs = bind_logs(&image);

        image
            .set(
                &RowKey::from(3..9_usize),
                &RowKey::from(2..5_usize),
                PixelValues::Splat(1.0),
            )
            .unwrap();

        let marked: Vec<usize> = logs
            .iter()
            .enumerate()
            .filter(|(_, log)| !log.borrow().rects.is_empty())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(marked, vec![0, 1, 3, 4, 6, 7]);

        // Tile (0,0) covers rows 0..4, cols 0..4; the write hits rows
        // 3..4, cols 2..4 there, so local origin (x=2, y=3), size (2, 1).
        assert_eq!(
            logs[0].borrow().rects,
            vec![TexelRect {
                origin: [2, 3, 0],
                size: [2, 1, 1]
            }]
        );
        // Tile (1,1) covers rows 4..8, cols 4..8; hit rows 4..8, col 4.
        assert_eq!(
            logs[4].borrow().rects,
            vec![TexelRect {
                origin: [0, 0, 0],
                size: [1, 4, 1]
            }]
        );
    }

    #[test]
    fn texels_outside_the_write_are_untouched() {
        let image = image(10, 10, 4);
        image
            .set(
                &RowKey::from(3..9_usize),
                &RowKey::from(2..5_usize),
                PixelValues::Splat(7.0),
            )
            .unwrap();

        for r in 0..10 {
            for c in 0..10 {
                let expected = if (3..9).contains(&r) && (2..5).contains(&c) {
                    7.0
                } else {
                    0.0
                };
                assert_eq!(image.get(r, c, 0), expected, "texel ({r}, {c})");
            }
        }
    }

    #[test]
    fn block_write_applies_in_selection_order() {
        let image = image(4, 4, 4);
        image
            .set(
                &RowKey::Indices(vec![0, 2]),
                &RowKey::Indices(vec![1, 3]),
                PixelValues::Block(&[1.0, 2.0, 3.0, 4.0]),
            )
            .unwrap();
        assert_eq!(image.get(0, 1, 0), 1.0);
        assert_eq!(image.get(0, 3, 0), 2.0);
        assert_eq!(image.get(2, 1, 0), 3.0);
        assert_eq!(image.get(2, 3, 0), 4.0);
    }

    #[test]
    fn block_length_mismatch_errors() {
        let image = image(4, 4, 4);
        let err = image
            .set(
                &RowKey::Index(0),
                &RowKey::all(),
                PixelValues::Block(&[0.0; 3]),
            )
            .unwrap_err();
        assert!(matches!(err, WriteError::Shape(_)));
    }

    #[test]
    fn stepped_write_skips_untouched_texels_inside_the_span() {
        let image = image(8, 8, 8);
        let logs = bind_logs(&image);
        image
            .set(
                &RowKey::Range(SliceSpec::new(Some(0), Some(8), Some(4))),
                &RowKey::all(),
                PixelValues::Splat(5.0),
            )
            .unwrap();

        // Rows 0 and 4 written, everything between untouched.
        assert_eq!(image.get(0, 0, 0), 5.0);
        assert_eq!(image.get(4, 0, 0), 5.0);
        assert_eq!(image.get(2, 0, 0), 0.0);
        // One tile, one conservative rect over the bounding rows.
        let rects = &logs[0].borrow().rects;
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].origin, [0, 0, 0]);
        assert_eq!(rects[0].size[0], 8);
        assert!(rects[0].size[1] >= 5, "span covers rows 0..=4");
    }

    #[test]
    fn replace_marks_every_tile() {
        let image = image(10, 10, 4);
        let logs = bind_logs(&image);
        image.replace(&[2.0; 100]).unwrap();

        for (i, log) in logs.iter().enumerate() {
            assert_eq!(log.borrow().rects.len(), 1, "tile {i}");
        }
        // Corner tile is 2x2 texels.
        assert_eq!(
            logs[8].borrow().rects[0],
            TexelRect {
                origin: [0, 0, 0],
                size: [2, 2, 1]
            }
        );
        assert_eq!(image.get(9, 9, 0), 2.0);
    }

    #[test]
    fn multichannel_block_write_keeps_channel_layout() {
        let image = ChunkedImage::new(
            PixelData::F32(vec![0.0; 2 * 2 * 3]),
            &[2, 2, 3],
            ChunkConfig::default(),
            None,
        )
        .unwrap();
        image
            .set(
                &RowKey::Index(1),
                &RowKey::Index(0),
                PixelValues::Block(&[0.1, 0.2, 0.3]),
            )
            .unwrap();
        assert_eq!(image.get(1, 0, 0), 0.1);
        assert_eq!(image.get(1, 0, 1), 0.2);
        assert_eq!(image.get(1, 0, 2), 0.3);
        assert_eq!(image.get(1, 1, 0), 0.0);
    }
}
