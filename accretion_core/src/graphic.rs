// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thin graphic wrappers wiring features together.
//!
//! A graphic owns its features, allocates its identity, and stamps every
//! feature's events with an [`EventSource`] back-reference so listeners
//! can tell which graphic (and which scene node) a change came from. The
//! graphics here are deliberately thin: rendering, picking, and layout
//! belong to the host engine.

use alloc::rc::Rc;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::buffer::{BufferHandle, WriteError};
use crate::chunk::{ChunkConfig, ChunkedImage, PixelData};
use crate::color::Rgba;
use crate::colormap::Colormap;
use crate::event::EventSource;
use crate::feature::{
    ConstructionError, ImageCmap, PointSizes, UniformSize, VertexCmap, VertexColors,
    VertexPositions,
};
use crate::trace::DiagnosticSink;

/// Identity of a graphic.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GraphicId(pub u64);

impl fmt::Debug for GraphicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GraphicId({})", self.0)
    }
}

/// Identity of a graphic's scene-graph node.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

static NEXT_GRAPHIC: AtomicU64 = AtomicU64::new(1);
static NEXT_NODE: AtomicU64 = AtomicU64::new(1);

fn allocate_source() -> EventSource {
    EventSource {
        graphic: GraphicId(NEXT_GRAPHIC.fetch_add(1, Ordering::Relaxed)),
        node: NodeId(NEXT_NODE.fetch_add(1, Ordering::Relaxed)),
    }
}

/// Initial point data for a positions feature.
#[derive(Clone, Debug)]
pub enum PointsInit<'a> {
    /// Flat point data of the given width (2 or 3), copied into an
    /// isolated buffer.
    Data(&'a [f32], usize),
    /// An existing N×3 buffer, adopted by reference (shared storage).
    Shared(BufferHandle),
}

/// Initial color data for a per-vertex color feature.
#[derive(Clone, Copy, Debug)]
pub enum ColorInit<'a> {
    /// Every vertex gets this color.
    Uniform(Rgba),
    /// Flat N×4 RGBA data.
    PerVertex(&'a [f32]),
}

impl Default for ColorInit<'_> {
    fn default() -> Self {
        Self::Uniform(Rgba::WHITE)
    }
}

/// Initial size data for a scatter's per-vertex sizes.
#[derive(Clone, Copy, Debug)]
pub enum SizeInit<'a> {
    /// Every vertex gets this size.
    Uniform(f32),
    /// One size per vertex.
    PerVertex(&'a [f32]),
}

impl Default for SizeInit<'_> {
    fn default() -> Self {
        Self::Uniform(1.0)
    }
}

/// The position/color/cmap trio shared by point-based graphics.
#[derive(Debug)]
struct PointsBody {
    positions: VertexPositions,
    colors: VertexColors,
    cmap: VertexCmap,
}

impl PointsBody {
    fn new(
        points: PointsInit<'_>,
        colors: ColorInit<'_>,
        cmap: Option<Colormap>,
    ) -> Result<Self, ConstructionError> {
        let positions = match points {
            PointsInit::Data(data, width) => VertexPositions::new(data, width)?,
            PointsInit::Shared(handle) => VertexPositions::from_handle(handle)?,
        };
        let rows = positions.rows();

        let colors = match colors {
            ColorInit::Uniform(color) => VertexColors::filled(rows, color),
            ColorInit::PerVertex(data) => {
                if data.len() % 4 != 0 {
                    return Err(ConstructionError::ColorsWidth { got: 0 });
                }
                if data.len() / 4 != rows {
                    return Err(ConstructionError::LengthMismatch {
                        expected: rows,
                        got: data.len() / 4,
                    });
                }
                VertexColors::from_rows(data)?
            }
        };

        let vertex_cmap = VertexCmap::new();
        if cmap.is_some() {
            vertex_cmap.set(&colors, cmap)?;
        }

        Ok(Self {
            positions,
            colors,
            cmap: vertex_cmap,
        })
    }

    fn stamp(&self, source: EventSource) {
        self.positions.events().set_source(Some(source));
        self.colors.events().set_source(Some(source));
        self.cmap.events().set_source(Some(source));
        self.cmap.alpha_events().set_source(Some(source));
    }

    fn set_diagnostics(&self, sink: Option<Rc<dyn DiagnosticSink>>) {
        self.positions.events().set_diagnostics(sink.clone());
        self.colors.events().set_diagnostics(sink.clone());
        self.cmap.events().set_diagnostics(sink.clone());
        self.cmap.alpha_events().set_diagnostics(sink);
    }
}

/// Options for [`LineGraphic::new`].
#[derive(Clone, Debug)]
pub struct LineOptions<'a> {
    /// Initial point data.
    pub points: PointsInit<'a>,
    /// Initial colors.
    pub colors: ColorInit<'a>,
    /// Colormap applied at construction, overriding `colors`.
    pub cmap: Option<Colormap>,
    /// Line thickness.
    pub thickness: f32,
}

/// A polyline graphic: positions, per-vertex colors, colormap, thickness.
#[derive(Debug)]
pub struct LineGraphic {
    source: EventSource,
    body: PointsBody,
    thickness: UniformSize,
}

impl LineGraphic {
    /// Builds the graphic, validating all initial data eagerly.
    pub fn new(options: LineOptions<'_>) -> Result<Self, ConstructionError> {
        let body = PointsBody::new(options.points, options.colors, options.cmap)?;
        let thickness = UniformSize::new(options.thickness);

        let source = allocate_source();
        body.stamp(source);
        thickness.events().set_source(Some(source));

        Ok(Self {
            source,
            body,
            thickness,
        })
    }

    /// This graphic's identity.
    #[must_use]
    pub fn id(&self) -> GraphicId {
        self.source.graphic
    }

    /// The underlying scene node's identity.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.source.node
    }

    /// Vertex positions.
    #[must_use]
    pub fn positions(&self) -> &VertexPositions {
        &self.body.positions
    }

    /// Per-vertex colors.
    #[must_use]
    pub fn colors(&self) -> &VertexColors {
        &self.body.colors
    }

    /// The colormap feature writing into [`colors`](Self::colors).
    #[must_use]
    pub fn cmap(&self) -> &VertexCmap {
        &self.body.cmap
    }

    /// Line thickness.
    #[must_use]
    pub fn thickness(&self) -> &UniformSize {
        &self.thickness
    }

    /// Associates (or clears) the colormap, rewriting the colors.
    pub fn set_cmap(&self, cmap: Option<Colormap>) -> Result<(), WriteError> {
        self.body.cmap.set(&self.body.colors, cmap)
    }

    /// Sets the colormap alpha, rewriting only the alpha column.
    pub fn set_cmap_alpha(&self, alpha: f32) -> Result<(), WriteError> {
        self.body.cmap.set_alpha(&self.body.colors, alpha)
    }

    /// Installs a diagnostics sink on every feature.
    pub fn set_diagnostics(&self, sink: Option<Rc<dyn DiagnosticSink>>) {
        self.body.set_diagnostics(sink.clone());
        self.thickness.events().set_diagnostics(sink);
    }
}

/// Options for [`ScatterGraphic::new`].
#[derive(Clone, Debug)]
pub struct ScatterOptions<'a> {
    /// Initial point data.
    pub points: PointsInit<'a>,
    /// Initial colors.
    pub colors: ColorInit<'a>,
    /// Colormap applied at construction, overriding `colors`.
    pub cmap: Option<Colormap>,
    /// Initial point sizes.
    pub sizes: SizeInit<'a>,
}

/// A scatter graphic: positions, per-vertex colors, colormap, sizes.
#[derive(Debug)]
pub struct ScatterGraphic {
    source: EventSource,
    body: PointsBody,
    sizes: PointSizes,
}

impl ScatterGraphic {
    /// Builds the graphic, validating all initial data eagerly.
    pub fn new(options: ScatterOptions<'_>) -> Result<Self, ConstructionError> {
        let body = PointsBody::new(options.points, options.colors, options.cmap)?;
        let rows = body.positions.rows();

        let sizes = match options.sizes {
            SizeInit::Uniform(size) => PointSizes::uniform(rows, size),
            SizeInit::PerVertex(data) => {
                if data.len() != rows {
                    return Err(ConstructionError::LengthMismatch {
                        expected: rows,
                        got: data.len(),
                    });
                }
                PointSizes::from_rows(data)?
            }
        };

        let source = allocate_source();
        body.stamp(source);
        sizes.events().set_source(Some(source));

        Ok(Self {
            source,
            body,
            sizes,
        })
    }

    /// This graphic's identity.
    #[must_use]
    pub fn id(&self) -> GraphicId {
        self.source.graphic
    }

    /// The underlying scene node's identity.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.source.node
    }

    /// Vertex positions.
    #[must_use]
    pub fn positions(&self) -> &VertexPositions {
        &self.body.positions
    }

    /// Per-vertex colors.
    #[must_use]
    pub fn colors(&self) -> &VertexColors {
        &self.body.colors
    }

    /// The colormap feature writing into [`colors`](Self::colors).
    #[must_use]
    pub fn cmap(&self) -> &VertexCmap {
        &self.body.cmap
    }

    /// Per-vertex point sizes.
    #[must_use]
    pub fn sizes(&self) -> &PointSizes {
        &self.sizes
    }

    /// Associates (or clears) the colormap, rewriting the colors.
    pub fn set_cmap(&self, cmap: Option<Colormap>) -> Result<(), WriteError> {
        self.body.cmap.set(&self.body.colors, cmap)
    }
}

/// Options for [`ImageGraphic::new`].
#[derive(Clone, Debug)]
pub struct ImageOptions<'a> {
    /// Flat pixel data.
    pub pixels: PixelData,
    /// `[rows, cols]` or `[rows, cols, channels]`.
    pub shape: &'a [usize],
    /// Colormap for single-channel data.
    pub cmap: Option<Colormap>,
    /// Chunking configuration.
    pub chunk: ChunkConfig,
}

/// An image graphic: chunked texel data plus a colormap/value window.
#[derive(Debug)]
pub struct ImageGraphic {
    source: EventSource,
    data: ChunkedImage,
    cmap: ImageCmap,
}

impl ImageGraphic {
    /// Builds the graphic, validating shape and coercing pixel data.
    pub fn new(options: ImageOptions<'_>) -> Result<Self, ConstructionError> {
        Self::with_diagnostics(options, None)
    }

    /// Like [`new`](Self::new), with a diagnostics sink for conversion
    /// notices and listener failures.
    pub fn with_diagnostics(
        options: ImageOptions<'_>,
        diagnostics: Option<Rc<dyn DiagnosticSink>>,
    ) -> Result<Self, ConstructionError> {
        let data = ChunkedImage::new(
            options.pixels,
            options.shape,
            options.chunk,
            diagnostics.clone(),
        )?;
        let cmap = ImageCmap::from_data(options.cmap, &data.value());

        let source = allocate_source();
        data.events().set_source(Some(source));
        cmap.events().set_source(Some(source));
        cmap.vmin_events().set_source(Some(source));
        cmap.vmax_events().set_source(Some(source));

        data.events().set_diagnostics(diagnostics.clone());
        cmap.events().set_diagnostics(diagnostics.clone());
        cmap.vmin_events().set_diagnostics(diagnostics.clone());
        cmap.vmax_events().set_diagnostics(diagnostics);

        Ok(Self { source, data, cmap })
    }

    /// This graphic's identity.
    #[must_use]
    pub fn id(&self) -> GraphicId {
        self.source.graphic
    }

    /// The underlying scene node's identity.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.source.node
    }

    /// The chunked texel data.
    #[must_use]
    pub fn data(&self) -> &ChunkedImage {
        &self.data
    }

    /// The colormap/value-window feature.
    #[must_use]
    pub fn cmap(&self) -> &ImageCmap {
        &self.cmap
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use super::*;
    use crate::buffer::UploadSink;
    use crate::event::{ChangeEvent, EventValue, FeatureKind};
    use crate::index::{RowKey, UploadRegion};

    #[derive(Default)]
    struct RegionLog {
        regions: Vec<UploadRegion>,
    }

    impl UploadSink for RegionLog {
        fn update_range(&mut self, region: UploadRegion) {
            self.regions.push(region);
        }
    }

    fn white_line(rows: usize) -> LineGraphic {
        let points: Vec<f32> = (0..rows * 3).map(|i| i as f32).collect();
        LineGraphic::new(LineOptions {
            points: PointsInit::Data(&points, 3),
            colors: ColorInit::Uniform(Rgba::WHITE),
            cmap: None,
            thickness: 2.0,
        })
        .unwrap()
    }

    #[test]
    fn red_write_scenario_end_to_end() {
        // 10-row color feature initialized to white; write "red" at row 3.
        let line = white_line(10);
        let log = Rc::new(RefCell::new(RegionLog::default()));
        line.colors().share_buffer().bind_sink(log.clone());

        let seen: Rc<RefCell<Vec<ChangeEvent>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        line.colors().events().add_event_handler(Rc::new(move |e: &ChangeEvent| {
            sink.borrow_mut().push(e.clone());
            Ok(())
        }));

        let red = Rgba::parse("red").unwrap();
        line.colors().set_color(&RowKey::Index(3), red).unwrap();

        // The indexed row changed; the other nine are still white.
        assert_eq!(line.colors().color_at(3), Rgba::new(1.0, 0.0, 0.0, 1.0));
        for row in (0..10).filter(|&r| r != 3) {
            assert_eq!(line.colors().color_at(row), Rgba::WHITE, "row {row}");
        }

        // Exactly one minimal upload region was marked.
        assert_eq!(log.borrow().regions, vec![UploadRegion::new(3, 1)]);

        // Exactly one "colors" event, with the key and the new value.
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind, FeatureKind::Colors);
        assert_eq!(seen[0].type_str(), "colors");
        assert_eq!(seen[0].key, Some(RowKey::Index(3)));
        assert_eq!(seen[0].value, EventValue::Rgba(red));
        assert_eq!(seen[0].source.unwrap().graphic, line.id());
        assert_eq!(seen[0].source.unwrap().node, line.node_id());
    }

    #[test]
    fn graphics_get_distinct_ids() {
        let a = white_line(2);
        let b = white_line(2);
        assert_ne!(a.id(), b.id());
        assert_ne!(a.node_id(), b.node_id());
    }

    #[test]
    fn per_vertex_colors_must_match_vertex_count() {
        let points = [0.0; 9];
        let err = LineGraphic::new(LineOptions {
            points: PointsInit::Data(&points, 3),
            colors: ColorInit::PerVertex(&[0.0; 8]),
            cmap: None,
            thickness: 1.0,
        })
        .unwrap_err();
        assert_eq!(
            err,
            ConstructionError::LengthMismatch {
                expected: 3,
                got: 2
            }
        );
    }

    #[test]
    fn cmap_at_construction_overrides_colors() {
        let points: Vec<f32> = (0..30).map(|i| i as f32).collect();
        let line = LineGraphic::new(LineOptions {
            points: PointsInit::Data(&points, 3),
            colors: ColorInit::Uniform(Rgba::WHITE),
            cmap: Some(Colormap::Grayscale),
            thickness: 1.0,
        })
        .unwrap();

        assert_eq!(line.cmap().name(), Some(Colormap::Grayscale));
        assert_eq!(line.colors().color_at(0), Rgba::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(line.colors().color_at(9), Rgba::new(1.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn scatter_shares_a_line_positions_buffer() {
        let line = white_line(5);
        let scatter = ScatterGraphic::new(ScatterOptions {
            points: PointsInit::Shared(line.positions().share_buffer()),
            colors: ColorInit::Uniform(Rgba::BLUE),
            cmap: None,
            sizes: SizeInit::Uniform(4.0),
        })
        .unwrap();

        // Both features alias one storage.
        assert_eq!(line.positions().buffer().shared(), 2);

        scatter
            .positions()
            .set(&RowKey::Index(0), crate::buffer::RowValues::Splat(9.0))
            .unwrap();
        assert_eq!(line.positions().value().row(0), &[9.0, 9.0, 9.0]);
    }

    #[test]
    fn scatter_sizes_validate_length() {
        let err = ScatterGraphic::new(ScatterOptions {
            points: PointsInit::Data(&[0.0; 6], 3),
            colors: ColorInit::default(),
            cmap: None,
            sizes: SizeInit::PerVertex(&[1.0, 2.0, 3.0]),
        })
        .unwrap_err();
        assert_eq!(
            err,
            ConstructionError::LengthMismatch {
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn image_graphic_wires_window_from_pixels() {
        let image = ImageGraphic::new(ImageOptions {
            pixels: PixelData::F32(vec![0.0, 1.0, 2.0, 3.0]),
            shape: &[2, 2],
            cmap: Some(Colormap::Viridis),
            chunk: ChunkConfig::default(),
        })
        .unwrap();

        assert_eq!(image.cmap().window(), (0.0, 3.0));
        assert_eq!(image.cmap().name(), Some(Colormap::Viridis));
        assert_eq!(image.data().grid().grid_rows(), 1);
    }

    #[test]
    fn image_events_carry_the_graphic_source() {
        let image = ImageGraphic::new(ImageOptions {
            pixels: PixelData::F32(vec![0.0; 4]),
            shape: &[2, 2],
            cmap: None,
            chunk: ChunkConfig::default(),
        })
        .unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        image.data().events().add_event_handler(Rc::new(move |e: &ChangeEvent| {
            sink.borrow_mut().push(e.source);
            Ok(())
        }));

        image
            .data()
            .set(
                &RowKey::Index(0),
                &RowKey::all(),
                crate::chunk::PixelValues::Splat(1.0),
            )
            .unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].unwrap().graphic, image.id());
    }
}
