//! What the painter draws: layers with their paint properties, sources of
//! render tiles, atlases and the per-frame render order.

pub mod atlas;
pub mod layer;
pub mod memory;
pub mod render_item;
pub mod source;

pub use atlas::{Atlas, ImageAtlas, SpriteAtlas, SpriteAtlasPosition};
pub use layer::{
    BackgroundPaint, CirclePaint, CirclePitchScale, CustomLayer, CustomLayerHost, FillPaint,
    Layer, LayerKind, LineDash, LinePaint, RasterPaint, RenderPass, RenderPasses, SymbolPaint,
    TranslateAnchor,
};
pub use memory::MemoryStyle;
pub use render_item::{RenderData, RenderItem, Style};
pub use source::{Source, TileSource};
