use glam::DVec2;

use crate::map::TransformState;

use super::UnwrappedTileId;

const EDGE_EPSILON: f64 = 1e-6;

/// Tiles of zoom level `z` that intersect the viewport, nearest to the
/// center first.
///
/// The four viewport corners are unprojected onto the ground plane and the
/// covering range of their bounding box is returned. Columns beyond the world
/// edges come back as wrapped ids; rows are clamped to the world.
pub fn tile_cover(state: &TransformState, z: u8) -> Vec<UnwrappedTileId> {
    let proj = state.proj_matrix();
    let inverse = proj.inverse();
    let tiles_per_world = f64::from(1u32 << z);
    let tile_size = state.world_size() / tiles_per_world;

    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
        .map(|(x, y)| state.unproject_clip(&inverse, DVec2::new(x, y)) / tile_size);

    let min = corners.iter().copied().fold(DVec2::INFINITY, DVec2::min);
    let max = corners.iter().copied().fold(DVec2::NEG_INFINITY, DVec2::max);
    if !min.is_finite() || !max.is_finite() {
        log::warn!("viewport does not intersect the ground plane");
        return Vec::new();
    }

    let x_range = (min.x + EDGE_EPSILON).floor() as i64..(max.x - EDGE_EPSILON).ceil() as i64;
    let y_start = (min.y + EDGE_EPSILON).floor().max(0.0) as u32;
    let y_end = (max.y - EDGE_EPSILON).ceil().min(tiles_per_world) as u32;

    let center = state.center() / tile_size;
    let mut tiles: Vec<(f64, UnwrappedTileId)> = x_range
        .flat_map(|x| (y_start..y_end).map(move |y| (x, y)))
        .map(|(x, y)| {
            let mid = DVec2::new(x as f64 + 0.5, f64::from(y) + 0.5);
            (mid.distance_squared(center), UnwrappedTileId::new(z, x, y))
        })
        .collect();

    tiles.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    tiles.into_iter().map(|(_, id)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_world_at_zoom_zero_is_one_tile() {
        let state = TransformState::new(512, 512);
        assert_eq!(tile_cover(&state, 0), vec![UnwrappedTileId::new(0, 0, 0)]);
    }

    #[test]
    fn wide_viewports_reach_into_neighbouring_worlds() {
        let state = TransformState::new(1024, 512);
        let cover = tile_cover(&state, 0);
        assert_eq!(cover.len(), 3);
        assert_eq!(cover[0], UnwrappedTileId::new(0, 0, 0));
        assert!(cover.contains(&UnwrappedTileId::new(0, -1, 0)));
        assert!(cover.contains(&UnwrappedTileId::new(0, 1, 0)));
    }

    #[test]
    fn rows_are_clamped_to_the_world() {
        let state = TransformState::new(512, 2048);
        let cover = tile_cover(&state, 1);
        assert_eq!(cover.len(), 4);
        assert!(cover.iter().all(|id| id.wrap == 0 && id.canonical.y < 2));
    }
}
