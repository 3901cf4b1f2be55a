use crate::paint::Color;
use crate::renderer::DebugOptions;

use super::atlas::{Atlas, ImageAtlas, SpriteAtlas};
use super::layer::{Layer, LayerKind};
use super::render_item::{RenderData, RenderItem, Style};
use super::source::{Source, TileSource};

/// A style whose layers, sources and atlases are built in memory.
#[derive(Debug)]
pub struct MemoryStyle {
    pub layers: Vec<Layer>,
    pub sources: Vec<TileSource>,
    pub sprite_atlas: ImageAtlas,
    pub glyph_atlas: ImageAtlas,
    pub line_atlas: ImageAtlas,
}

impl MemoryStyle {
    pub fn new(layers: Vec<Layer>, sources: Vec<TileSource>) -> Self {
        Self {
            layers,
            sources,
            sprite_atlas: ImageAtlas::new(1, 1),
            glyph_atlas: ImageAtlas::new(1, 1),
            line_atlas: ImageAtlas::new(1, 1),
        }
    }

    fn source(&self, id: &str) -> Option<&TileSource> {
        self.sources.iter().find(|source| source.id() == id)
    }
}

impl Style for MemoryStyle {
    fn render_data(&self, debug: DebugOptions) -> RenderData<'_> {
        let mut data = RenderData {
            order: Vec::new(),
            sources: Vec::new(),
            background_color: Color::transparent(),
        };

        for (index, layer) in self.layers.iter().enumerate() {
            match &layer.kind {
                LayerKind::Background(paint) => {
                    // A plain bottom background becomes the clear color,
                    // except when overdraw is inspected.
                    if index == 0 && paint.pattern.is_none() && !debug.contains(DebugOptions::OVERDRAW) {
                        data.background_color = paint.color.with_opacity(paint.opacity);
                    } else {
                        data.order.push(RenderItem::layer(layer));
                    }
                    continue;
                }
                LayerKind::Custom(_) => {
                    data.order.push(RenderItem::layer(layer));
                    continue;
                }
                _ => {}
            }

            let Some(source) = layer.source.as_deref().and_then(|id| self.source(id)) else {
                log::warn!("layer `{}` refers to a missing source", layer.id);
                continue;
            };
            if !data.sources.iter().any(|s| s.id() == source.id()) {
                data.sources.push(source);
            }

            let mut tiles: Vec<_> = source.tiles().iter().collect();
            if matches!(layer.kind, LayerKind::Symbol(_)) {
                // Lower labels draw over higher ones.
                tiles.sort_by(|a, b| b.id.canonical.y.cmp(&a.id.canonical.y).then(a.id.cmp(&b.id)));
            } else {
                tiles.sort_by_key(|tile| tile.id);
            }

            for tile in tiles {
                if let Some(bucket) = tile.bucket(&layer.id) {
                    if bucket.has_data() {
                        data.order.push(RenderItem::tiled(layer, tile, bucket));
                    }
                }
            }
        }

        data
    }

    fn sprite_atlas(&self) -> &dyn SpriteAtlas {
        &self.sprite_atlas
    }

    fn glyph_atlas(&self) -> &dyn Atlas {
        &self.glyph_atlas
    }

    fn line_atlas(&self) -> &dyn Atlas {
        &self.line_atlas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RenderTile;
    use crate::renderer::bucket::CircleBucket;
    use crate::shader::vertex::CircleVertex;
    use crate::gl::Segment;
    use crate::style::layer::{BackgroundPaint, CirclePaint};
    use crate::tile::UnwrappedTileId;

    fn circle_bucket() -> CircleBucket {
        let vertices = vec![
            CircleVertex::new(10, 10, -1, -1),
            CircleVertex::new(10, 10, 1, -1),
            CircleVertex::new(10, 10, 1, 1),
            CircleVertex::new(10, 10, -1, 1),
        ];
        CircleBucket::new(vertices, vec![0, 1, 2, 0, 3, 2], vec![Segment::new(0, 0, 4, 2)])
    }

    fn style(background: BackgroundPaint) -> MemoryStyle {
        let tile = RenderTile::new(UnwrappedTileId::new(0, 0, 0)).with_bucket("dots", circle_bucket());
        MemoryStyle::new(
            vec![
                Layer::new("bg", None, LayerKind::Background(background)),
                Layer::new("dots", Some("points"), LayerKind::Circle(CirclePaint::default())),
            ],
            vec![TileSource::new("points", vec![tile])],
        )
    }

    #[test]
    fn solid_bottom_background_becomes_the_clear_color() {
        let style = style(BackgroundPaint { color: Color::white(), opacity: 0.5, pattern: None });
        let data = style.render_data(DebugOptions::empty());

        assert_eq!(data.background_color, Color::white().with_opacity(0.5));
        assert_eq!(data.order.len(), 1);
        assert_eq!(data.order[0].layer.id, "dots");
        assert_eq!(data.sources.len(), 1);
    }

    #[test]
    fn overdraw_keeps_the_background_layer() {
        let style = style(BackgroundPaint::default());
        let data = style.render_data(DebugOptions::OVERDRAW);

        assert_eq!(data.order.len(), 2);
        assert_eq!(data.order[0].layer.id, "bg");
        assert!(data.order[0].tile.is_none());
    }
}
