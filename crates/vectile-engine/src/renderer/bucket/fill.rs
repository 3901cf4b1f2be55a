use std::cell::OnceCell;

use crate::gl::{Context, IndexBuffer, Segment, VertexBuffer};
use crate::renderer::{PaintParameters, Painter, RenderTile};
use crate::shader::vertex::FillVertex;
use crate::style::{Layer, LayerKind};

use super::Bucket;

#[derive(Debug)]
pub struct FillBuffers {
    pub vertices: VertexBuffer<FillVertex>,
    pub triangles: IndexBuffer,
    pub lines: IndexBuffer,
}

/// Polygon interiors as triangles plus their outlines as line pairs, both
/// indexing one vertex array.
#[derive(Debug)]
pub struct FillBucket {
    pub vertices: Vec<FillVertex>,
    pub triangles: Vec<u16>,
    pub triangle_segments: Vec<Segment>,
    pub lines: Vec<u16>,
    pub line_segments: Vec<Segment>,
    buffers: OnceCell<FillBuffers>,
}

impl FillBucket {
    pub fn new(
        vertices: Vec<FillVertex>,
        triangles: Vec<u16>,
        triangle_segments: Vec<Segment>,
        lines: Vec<u16>,
        line_segments: Vec<Segment>,
    ) -> Self {
        Self { vertices, triangles, triangle_segments, lines, line_segments, buffers: OnceCell::new() }
    }

    pub fn buffers(&self) -> Option<&FillBuffers> {
        self.buffers.get()
    }
}

impl Bucket for FillBucket {
    fn has_data(&self) -> bool {
        !self.triangle_segments.is_empty() || !self.line_segments.is_empty()
    }

    fn needs_upload(&self) -> bool {
        self.has_data() && self.buffers.get().is_none()
    }

    fn upload(&self, ctx: &mut Context) {
        if !self.needs_upload() {
            return;
        }
        let buffers = FillBuffers {
            vertices: ctx.create_vertex_buffer(&self.vertices),
            triangles: ctx.create_index_buffer(&self.triangles),
            lines: ctx.create_index_buffer(&self.lines),
        };
        let _ = self.buffers.set(buffers);
    }

    fn render(&self, painter: &mut Painter, params: &PaintParameters<'_>, layer: &Layer, tile: &RenderTile) {
        let LayerKind::Fill(paint) = &layer.kind else {
            debug_assert!(false, "fill bucket drawn for a {} layer", layer.name());
            return;
        };
        painter.render_fill(params, self, paint, tile);
    }
}
