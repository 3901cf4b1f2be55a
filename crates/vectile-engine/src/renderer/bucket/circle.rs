use crate::gl::{Context, Segment};
use crate::renderer::{PaintParameters, Painter, RenderTile};
use crate::shader::vertex::CircleVertex;
use crate::style::{Layer, LayerKind};

use super::{Bucket, Geometry};

/// Quads of four extruded corners per circle, two triangles each.
#[derive(Debug)]
pub struct CircleBucket {
    pub geometry: Geometry<CircleVertex>,
}

impl CircleBucket {
    pub fn new(vertices: Vec<CircleVertex>, indices: Vec<u16>, segments: Vec<Segment>) -> Self {
        Self { geometry: Geometry::new(vertices, indices, segments) }
    }
}

impl Bucket for CircleBucket {
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
        let LayerKind::Circle(paint) = &layer.kind else {
            debug_assert!(false, "circle bucket drawn for a {} layer", layer.name());
            return;
        };
        painter.render_circle(params, self, paint, tile);
    }
}
