use crate::paint::Color;
use crate::renderer::bucket::Bucket;
use crate::renderer::{DebugOptions, RenderTile};

use super::atlas::{Atlas, SpriteAtlas};
use super::layer::Layer;
use super::source::Source;

/// One layer as drawn over one tile, or over the whole view for background
/// and custom layers.
#[derive(Clone, Copy)]
pub struct RenderItem<'a> {
    pub layer: &'a Layer,
    pub tile: Option<&'a RenderTile>,
    pub bucket: Option<&'a dyn Bucket>,
}

impl<'a> RenderItem<'a> {
    /// An item drawn without tile geometry.
    pub fn layer(layer: &'a Layer) -> Self {
        Self { layer, tile: None, bucket: None }
    }

    pub fn tiled(layer: &'a Layer, tile: &'a RenderTile, bucket: &'a dyn Bucket) -> Self {
        Self { layer, tile: Some(tile), bucket: Some(bucket) }
    }
}

/// Everything a frame draws, in back-to-front order.
pub struct RenderData<'a> {
    pub order: Vec<RenderItem<'a>>,
    pub sources: Vec<&'a dyn Source>,
    /// Color the frame is cleared to.
    pub background_color: Color,
}

/// The style as seen by the painter.
pub trait Style {
    fn render_data(&self, debug: DebugOptions) -> RenderData<'_>;
    fn sprite_atlas(&self) -> &dyn SpriteAtlas;
    fn glyph_atlas(&self) -> &dyn Atlas;
    fn line_atlas(&self) -> &dyn Atlas;
}
