use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;

use glam::{Mat4, Vec3};

use crate::algorithm::ClipId;
use crate::map::TransformState;
use crate::style::TranslateAnchor;
use crate::tile::UnwrappedTileId;

use super::bucket::Bucket;

/// A loaded tile of one source with the buckets of every layer it feeds.
///
/// Clip id and matrix are refreshed by the owning source at the start of
/// each frame.
pub struct RenderTile {
    pub id: UnwrappedTileId,
    clip: Cell<ClipId>,
    matrix: Cell<Mat4>,
    buckets: BTreeMap<String, Box<dyn Bucket>>,
}

impl RenderTile {
    pub fn new(id: UnwrappedTileId) -> Self {
        Self {
            id,
            clip: Cell::new(ClipId::default()),
            matrix: Cell::new(Mat4::IDENTITY),
            buckets: BTreeMap::new(),
        }
    }

    /// Attaches the geometry of layer `layer_id`.
    pub fn with_bucket(mut self, layer_id: &str, bucket: impl Bucket + 'static) -> Self {
        self.buckets.insert(layer_id.to_owned(), Box::new(bucket));
        self
    }

    pub fn bucket(&self, layer_id: &str) -> Option<&dyn Bucket> {
        self.buckets.get(layer_id).map(|bucket| &**bucket)
    }

    #[inline]
    pub fn clip(&self) -> ClipId {
        self.clip.get()
    }

    #[inline]
    pub fn set_clip(&self, clip: ClipId) {
        self.clip.set(clip);
    }

    /// Tile units to clip space.
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        self.matrix.get()
    }

    #[inline]
    pub fn set_matrix(&self, matrix: Mat4) {
        self.matrix.set(matrix);
    }

    /// The tile matrix shifted by a paint `translate` given in pixels.
    pub fn translated_matrix(&self, translate: [f32; 2], anchor: TranslateAnchor, state: &TransformState) -> Mat4 {
        let matrix = self.matrix();
        if translate == [0.0, 0.0] {
            return matrix;
        }

        let [x, y] = match anchor {
            TranslateAnchor::Map => translate,
            TranslateAnchor::Viewport => {
                let (sin, cos) = (-state.bearing() as f32).sin_cos();
                [translate[0] * cos - translate[1] * sin, translate[0] * sin + translate[1] * cos]
            }
        };
        let offset = Vec3::new(
            state.pixels_to_tile_units(&self.id, x),
            state.pixels_to_tile_units(&self.id, y),
            0.0,
        );
        matrix * Mat4::from_translation(offset)
    }
}

impl fmt::Debug for RenderTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTile")
            .field("id", &self.id)
            .field("clip", &self.clip.get())
            .field("buckets", &self.buckets.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn zero_translation_keeps_the_matrix() {
        let tile = RenderTile::new(UnwrappedTileId::new(0, 0, 0));
        tile.set_matrix(Mat4::from_scale(Vec3::splat(2.0)));
        let state = TransformState::new(512, 512);
        assert_eq!(tile.translated_matrix([0.0, 0.0], TranslateAnchor::Map, &state), tile.matrix());
    }

    #[test]
    fn map_translation_moves_by_tile_units() {
        let tile = RenderTile::new(UnwrappedTileId::new(0, 0, 0));
        let state = TransformState::new(512, 512);
        let matrix = tile.translated_matrix([1.0, 2.0], TranslateAnchor::Map, &state);

        // At zoom 0 one pixel is 8192 / 512 tile units.
        let moved = matrix * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(moved.truncate(), Vec3::new(16.0, 32.0, 0.0));
    }

    #[test]
    fn viewport_translation_counters_the_bearing() {
        let tile = RenderTile::new(UnwrappedTileId::new(0, 0, 0));
        let mut state = TransformState::new(512, 512);
        state.set_bearing(std::f64::consts::FRAC_PI_2);
        let matrix = tile.translated_matrix([1.0, 0.0], TranslateAnchor::Viewport, &state);

        let moved = (matrix * Vec4::new(0.0, 0.0, 0.0, 1.0)).truncate();
        assert!(moved.x.abs() < 1e-3, "{moved}");
        assert!((moved.y + 16.0).abs() < 1e-3, "{moved}");
    }
}
