use std::f64::consts::{FRAC_PI_2, PI};

use glam::{DMat4, DVec2, DVec3};

use crate::tile::{EXTENT, UnwrappedTileId};

use super::ViewportMode;

/// Size of one tile on screen at integer zoom levels, in pixels.
pub const TILE_SIZE: f64 = 512.0;

/// Camera distance from the center, in multiples of the viewport height.
pub const DEFAULT_ALTITUDE: f64 = 1.5;

/// Zoom levels are tracked at 1/10 precision in 256 slots.
pub const MAX_ZOOM: f64 = 25.5;

const MAX_PITCH: f64 = 60.0 * PI / 180.0;
const NEAR_Z: f64 = 1.0;

/// Position and orientation of the camera over the web-mercator world.
///
/// The center is kept in world pixels at the current scale, so
/// `x, y ∈ [0, world_size)`, with `y` growing southwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformState {
    width: u32,
    height: u32,
    scale: f64,
    x: f64,
    y: f64,
    bearing: f64,
    pitch: f64,
    viewport_mode: ViewportMode,
}

impl TransformState {
    /// A north-up view of the whole world at zoom 0.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scale: 1.0,
            x: TILE_SIZE / 2.0,
            y: TILE_SIZE / 2.0,
            bearing: 0.0,
            pitch: 0.0,
            viewport_mode: ViewportMode::Default,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn zoom(&self) -> f64 {
        self.scale.log2()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn integer_zoom(&self) -> u8 {
        self.zoom().floor().clamp(0.0, MAX_ZOOM) as u8
    }

    /// Changes the zoom level around the current center.
    pub fn set_zoom(&mut self, zoom: f64) {
        let scale = 2f64.powf(zoom.clamp(0.0, MAX_ZOOM));
        let ratio = scale / self.scale;
        self.x *= ratio;
        self.y *= ratio;
        self.scale = scale;
    }

    pub fn world_size(&self) -> f64 {
        TILE_SIZE * self.scale
    }

    /// Center in world pixels at the current scale.
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    /// Center as a fraction of the world, `[0, 1]` on both axes.
    pub fn set_center_normalized(&mut self, center: DVec2) {
        let world = self.world_size();
        self.x = center.x.rem_euclid(1.0) * world;
        self.y = center.y.clamp(0.0, 1.0) * world;
    }

    /// Moves the center by a screen-space offset in pixels.
    pub fn move_by(&mut self, dx: f64, dy: f64) {
        let (sin, cos) = (-self.bearing).sin_cos();
        let world = self.world_size();
        self.x = (self.x + dx * cos - dy * sin).rem_euclid(world);
        self.y = (self.y + dx * sin + dy * cos).clamp(0.0, world);
    }

    /// Radians, clockwise from north.
    pub fn bearing(&self) -> f64 {
        self.bearing
    }

    pub fn set_bearing(&mut self, bearing: f64) {
        self.bearing = bearing.rem_euclid(2.0 * PI);
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    pub fn set_pitch(&mut self, pitch: f64) {
        self.pitch = pitch.clamp(0.0, MAX_PITCH);
    }

    pub fn viewport_mode(&self) -> ViewportMode {
        self.viewport_mode
    }

    pub fn set_viewport_mode(&mut self, mode: ViewportMode) {
        self.viewport_mode = mode;
    }

    pub fn altitude(&self) -> f64 {
        DEFAULT_ALTITUDE
    }

    /// Vertical field of view that puts the camera `altitude` viewport
    /// heights above the center.
    pub fn field_of_view(&self) -> f64 {
        2.0 * (0.5 / self.altitude()).atan()
    }

    fn camera_to_center_distance(&self) -> f64 {
        self.altitude() * f64::from(self.height)
    }

    /// Maps world pixels on the ground plane to clip space.
    pub fn proj_matrix(&self) -> DMat4 {
        let (width, height) = (f64::from(self.width.max(1)), f64::from(self.height.max(1)));
        let fov = self.field_of_view();
        let half_fov = fov / 2.0;
        let distance = self.camera_to_center_distance().max(NEAR_Z * 2.0);

        // Farthest visible ground point, from the triangle formed by the
        // camera, the center and the top edge of the view.
        let ground_angle = FRAC_PI_2 + self.pitch;
        let top_half_surface =
            half_fov.sin() * distance / (PI - ground_angle - half_fov).sin();
        let furthest = (FRAC_PI_2 - self.pitch).cos() * top_half_surface + distance;
        let far = furthest * 1.01;

        let y_sign = match self.viewport_mode {
            ViewportMode::Default => -1.0,
            ViewportMode::FlippedY => 1.0,
        };

        DMat4::perspective_rh(fov, width / height, NEAR_Z, far)
            * DMat4::from_translation(DVec3::new(0.0, 0.0, -distance))
            * DMat4::from_scale(DVec3::new(1.0, y_sign, 1.0))
            * DMat4::from_rotation_x(self.pitch)
            * DMat4::from_rotation_z(self.bearing)
            * DMat4::from_translation(DVec3::new(-self.x, -self.y, 0.0))
    }

    /// Maps tile-local coordinates (`0..EXTENT`) of `id` to world pixels.
    pub fn matrix_for(&self, id: &UnwrappedTileId) -> DMat4 {
        let tile_scale = self.world_size() / f64::from(1u32 << id.canonical.z);
        let offset = DVec3::new(
            id.unwrapped_x() as f64 * tile_scale,
            f64::from(id.canonical.y) * tile_scale,
            0.0,
        );
        let units = tile_scale / f64::from(EXTENT);
        DMat4::from_translation(offset) * DMat4::from_scale(DVec3::new(units, units, 1.0))
    }

    /// Converts a screen distance into tile units of `id` at the current zoom.
    pub fn pixels_to_tile_units(&self, id: &UnwrappedTileId, pixels: f32) -> f32 {
        let tile_pixels = TILE_SIZE * 2f64.powf(self.zoom() - f64::from(id.canonical.z));
        (f64::from(pixels) * f64::from(EXTENT) / tile_pixels) as f32
    }

    /// Where the ray through a clip-space point meets the ground, in world
    /// pixels. Rays above the horizon are clamped to the far plane.
    pub(crate) fn unproject_clip(&self, inverse: &DMat4, ndc: DVec2) -> DVec2 {
        let near = inverse.project_point3(DVec3::new(ndc.x, ndc.y, 0.0));
        let far = inverse.project_point3(DVec3::new(ndc.x, ndc.y, 1.0));
        let dz = near.z - far.z;
        let t = if dz.abs() < f64::EPSILON { 1.0 } else { near.z / dz };
        let t = if t.is_finite() && t >= 0.0 { t.min(1.0) } else { 1.0 };
        near.lerp(far, t).truncate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec4;

    fn clip(state: &TransformState, world: DVec2) -> DVec2 {
        let p = state.proj_matrix() * DVec4::new(world.x, world.y, 0.0, 1.0);
        DVec2::new(p.x / p.w, p.y / p.w)
    }

    #[test]
    fn center_projects_to_the_middle_of_the_viewport() {
        let mut state = TransformState::new(800, 600);
        state.set_zoom(3.0);
        state.set_center_normalized(DVec2::new(0.3, 0.6));

        let c = clip(&state, state.center());
        assert!(c.length() < 1e-9, "{c:?}");
    }

    #[test]
    fn north_is_up_unless_flipped() {
        let mut state = TransformState::new(512, 512);
        let north = state.center() - DVec2::new(0.0, 100.0);
        assert!(clip(&state, north).y > 0.0);

        state.set_viewport_mode(ViewportMode::FlippedY);
        assert!(clip(&state, north).y < 0.0);
    }

    #[test]
    fn viewport_edges_are_half_a_viewport_away() {
        let state = TransformState::new(512, 512);
        let right = clip(&state, state.center() + DVec2::new(256.0, 0.0));
        assert!((right.x - 1.0).abs() < 1e-9, "{right:?}");
    }

    #[test]
    fn zooming_keeps_the_normalized_center() {
        let mut state = TransformState::new(512, 512);
        state.set_center_normalized(DVec2::new(0.25, 0.75));
        state.set_zoom(4.0);
        let c = state.center() / state.world_size();
        assert!((c - DVec2::new(0.25, 0.75)).length() < 1e-12);
        assert_eq!(state.integer_zoom(), 4);
        assert_eq!(state.scale(), 16.0);
    }

    #[test]
    fn tile_matrix_spans_one_tile() {
        let mut state = TransformState::new(512, 512);
        state.set_zoom(1.0);
        let id = UnwrappedTileId::new(1, 1, 1);
        let m = state.matrix_for(&id);
        let corner = m.transform_point3(DVec3::new(f64::from(EXTENT), f64::from(EXTENT), 0.0));
        assert_eq!(corner.truncate(), DVec2::new(1024.0, 1024.0));
        assert_eq!(state.pixels_to_tile_units(&id, 512.0), f32::from(EXTENT));
    }
}
