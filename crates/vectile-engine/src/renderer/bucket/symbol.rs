use crate::gl::Context;
use crate::renderer::{PaintParameters, Painter, RenderTile};
use crate::shader::vertex::SymbolVertex;
use crate::style::{Layer, LayerKind};

use super::{Bucket, Geometry};

/// Icon and glyph quads of a symbol layer.
#[derive(Debug)]
pub struct SymbolBucket {
    pub icons: Geometry<SymbolVertex>,
    pub text: Geometry<SymbolVertex>,
    /// Icons are signed distance fields and take the icon color.
    pub sdf_icons: bool,
}

impl SymbolBucket {
    pub fn new(icons: Geometry<SymbolVertex>, text: Geometry<SymbolVertex>, sdf_icons: bool) -> Self {
        Self { icons, text, sdf_icons }
    }
}

impl Bucket for SymbolBucket {
    fn has_data(&self) -> bool {
        self.icons.has_data() || self.text.has_data()
    }

    fn needs_upload(&self) -> bool {
        self.icons.needs_upload() || self.text.needs_upload()
    }

    fn upload(&self, ctx: &mut Context) {
        self.icons.upload(ctx);
        self.text.upload(ctx);
    }

    fn render(&self, painter: &mut Painter, params: &PaintParameters<'_>, layer: &Layer, tile: &RenderTile) {
        let LayerKind::Symbol(paint) = &layer.kind else {
            debug_assert!(false, "symbol bucket drawn for a {} layer", layer.name());
            return;
        };
        painter.render_symbol(params, self, paint, tile);
    }
}
