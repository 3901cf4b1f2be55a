//! Pre-tessellated tile geometry, uploaded once and drawn per layer.

mod circle;
mod fill;
mod line;
mod raster;
mod symbol;

use std::cell::OnceCell;

use crate::gl::{Context, IndexBuffer, Segment, Vertex, VertexBuffer};
use crate::style::Layer;

use super::{PaintParameters, Painter, RenderTile};

pub use circle::CircleBucket;
pub use fill::FillBucket;
pub use line::LineBucket;
pub use raster::RasterBucket;
pub use symbol::SymbolBucket;

/// The geometry of one layer within one tile.
pub trait Bucket {
    fn has_data(&self) -> bool;

    /// Whether GPU buffers still have to be created.
    fn needs_upload(&self) -> bool;

    fn upload(&self, ctx: &mut Context);

    /// Draws the bucket for `layer`, whose kind must match the bucket's.
    fn render(&self, painter: &mut Painter, params: &PaintParameters<'_>, layer: &Layer, tile: &RenderTile);
}

/// Vertices, u16 indices and the segments splitting them into draws.
#[derive(Debug)]
pub struct Geometry<V: Vertex> {
    pub vertices: Vec<V>,
    pub indices: Vec<u16>,
    pub segments: Vec<Segment>,
    buffers: OnceCell<(VertexBuffer<V>, IndexBuffer)>,
}

impl<V: Vertex> Geometry<V> {
    pub fn new(vertices: Vec<V>, indices: Vec<u16>, segments: Vec<Segment>) -> Self {
        Self { vertices, indices, segments, buffers: OnceCell::new() }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }

    pub fn has_data(&self) -> bool {
        !self.segments.is_empty()
    }

    pub fn needs_upload(&self) -> bool {
        self.has_data() && self.buffers.get().is_none()
    }

    pub fn upload(&self, ctx: &mut Context) {
        if !self.needs_upload() {
            return;
        }
        let vertices = ctx.create_vertex_buffer(&self.vertices);
        let indices = ctx.create_index_buffer(&self.indices);
        let _ = self.buffers.set((vertices, indices));
    }

    /// GPU buffers, once uploaded.
    pub fn buffers(&self) -> Option<&(VertexBuffer<V>, IndexBuffer)> {
        self.buffers.get()
    }
}
