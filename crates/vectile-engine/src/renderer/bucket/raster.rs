use std::cell::RefCell;

use crate::gl::{Context, Texture};
use crate::renderer::{PaintParameters, Painter, RenderTile};
use crate::style::{Layer, LayerKind};

use super::Bucket;

/// A decoded RGBA image covering one tile.
#[derive(Debug)]
pub struct RasterBucket {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    texture: RefCell<Option<Texture>>,
}

impl RasterBucket {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height * 4) as usize);
        Self { width, height, pixels, texture: RefCell::new(None) }
    }

    pub fn texture(&self) -> &RefCell<Option<Texture>> {
        &self.texture
    }
}

impl Bucket for RasterBucket {
    fn has_data(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    fn needs_upload(&self) -> bool {
        self.has_data() && self.texture.borrow().is_none()
    }

    fn upload(&self, ctx: &mut Context) {
        if !self.needs_upload() {
            return;
        }
        let texture = ctx.create_texture_with_data(self.width, self.height, &self.pixels, 0);
        *self.texture.borrow_mut() = Some(texture);
    }

    fn render(&self, painter: &mut Painter, params: &PaintParameters<'_>, layer: &Layer, tile: &RenderTile) {
        let LayerKind::Raster(paint) = &layer.kind else {
            debug_assert!(false, "raster bucket drawn for a {} layer", layer.name());
            return;
        };
        painter.render_raster(params, self, paint, tile);
    }
}
