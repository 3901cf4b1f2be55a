use glam::DMat4;

use crate::algorithm::{ClipId, ClipIdGenerator};
use crate::map::TransformState;
use crate::renderer::{Painter, RenderTile};

/// A provider of render tiles, visited once per frame before and after the
/// layer passes.
pub trait Source {
    fn id(&self) -> &str;

    /// Prepares the visible tiles: assigns their clip ids and matrices.
    fn start_render(&self, generator: &mut ClipIdGenerator, proj: &DMat4, state: &TransformState);

    /// Runs once per frame after both passes, even when no tile was drawn.
    fn finish_render(&self, painter: &mut Painter);
}

/// Tiles already loaded and tessellated for one source.
#[derive(Debug)]
pub struct TileSource {
    id: String,
    tiles: Vec<RenderTile>,
    clipped: bool,
}

impl TileSource {
    /// A vector source; its tiles are stencil clipped.
    pub fn new(id: impl Into<String>, tiles: Vec<RenderTile>) -> Self {
        Self { id: id.into(), tiles, clipped: true }
    }

    /// An image source; its tiles carry no clip ids.
    pub fn raster(id: impl Into<String>, tiles: Vec<RenderTile>) -> Self {
        Self { id: id.into(), tiles, clipped: false }
    }

    pub fn tiles(&self) -> &[RenderTile] {
        &self.tiles
    }
}

impl Source for TileSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn start_render(&self, generator: &mut ClipIdGenerator, proj: &DMat4, state: &TransformState) {
        if self.clipped {
            // Clips are assigned per frame; last frame's would be reused.
            for tile in &self.tiles {
                tile.set_clip(ClipId::default());
            }
            let tiles: Vec<&RenderTile> = self.tiles.iter().collect();
            generator.update(&tiles);
        }
        for tile in &self.tiles {
            tile.set_matrix((*proj * state.matrix_for(&tile.id)).as_mat4());
        }
    }

    fn finish_render(&self, painter: &mut Painter) {
        for tile in &self.tiles {
            painter.render_tile_debug(tile);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::UnwrappedTileId;

    #[test]
    fn sibling_tiles_get_distinct_clips() {
        let source = TileSource::new(
            "vector",
            vec![RenderTile::new(UnwrappedTileId::new(1, 0, 0)), RenderTile::new(UnwrappedTileId::new(1, 1, 0))],
        );
        let state = TransformState::new(512, 512);
        let mut generator = ClipIdGenerator::new();
        source.start_render(&mut generator, &state.proj_matrix(), &state);

        let [a, b] = [source.tiles()[0].clip(), source.tiles()[1].clip()];
        assert_ne!(a.reference, b.reference);
        assert_eq!(a.mask, b.mask);
        assert_ne!(source.tiles()[0].matrix(), source.tiles()[1].matrix());
    }

    #[test]
    fn every_frame_assigns_fresh_clips() {
        let source = TileSource::new(
            "vector",
            vec![RenderTile::new(UnwrappedTileId::new(1, 0, 0)), RenderTile::new(UnwrappedTileId::new(1, 1, 0))],
        );
        let state = TransformState::new(512, 512);

        let mut first = ClipIdGenerator::new();
        source.start_render(&mut first, &state.proj_matrix(), &state);
        let clips: Vec<_> = source.tiles().iter().map(RenderTile::clip).collect();

        let mut second = ClipIdGenerator::new();
        source.start_render(&mut second, &state.proj_matrix(), &state);

        assert_eq!(second.bits_used(), first.bits_used());
        assert_ne!(second.bits_used(), 0);
        assert_eq!(source.tiles().iter().map(RenderTile::clip).collect::<Vec<_>>(), clips);
        assert_eq!(second.stencils(), first.stencils());
    }

    #[test]
    fn raster_tiles_stay_unclipped() {
        let source = TileSource::raster("imagery", vec![RenderTile::new(UnwrappedTileId::new(0, 0, 0))]);
        let state = TransformState::new(512, 512);
        let mut generator = ClipIdGenerator::new();
        source.start_render(&mut generator, &state.proj_matrix(), &state);

        assert_eq!(source.tiles()[0].clip(), Default::default());
        assert!(generator.stencils().is_empty());
    }
}
