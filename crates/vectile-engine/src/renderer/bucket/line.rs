use crate::gl::{Context, Segment};
use crate::renderer::{PaintParameters, Painter, RenderTile};
use crate::shader::vertex::LineVertex;
use crate::style::{Layer, LayerKind};

use super::{Bucket, Geometry};

/// Extruded line triangles.
#[derive(Debug)]
pub struct LineBucket {
    pub geometry: Geometry<LineVertex>,
}

impl LineBucket {
    pub fn new(vertices: Vec<LineVertex>, indices: Vec<u16>, segments: Vec<Segment>) -> Self {
        Self { geometry: Geometry::new(vertices, indices, segments) }
    }
}

impl Bucket for LineBucket {
    fn has_data(&self) -> bool {
        self.geometry.has_data()
    }

    fn needs_upload(&self) -> bool {
        self.geometry.needs_upload()
    }

    fn upload(&self, ctx: &mut Context) {
        self.geometry.upload(ctx);
    }

    fn render(&self, painter: &mut Painter, params: &PaintParameters<'_>, layer: &Layer, tile: &RenderTile) {
        let LayerKind::Line(paint) = &layer.kind else {
            debug_assert!(false, "line bucket drawn for a {} layer", layer.name());
            return;
        };
        painter.render_line(params, self, paint, tile);
    }
}
