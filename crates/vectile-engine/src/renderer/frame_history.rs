//! Zoom history driving the cross-fade of symbols and raster tiles.
//!
//! Every tenth of a zoom level has an opacity that fades in while the map is
//! at or above that level and fades out below it. The opacities live in a
//! 256×1 texture the shaders index with a vertex's minimum zoom.

use std::time::{Duration, Instant};

use crate::gl::{Context, Texture, TextureFilter, TextureMipMap, TextureUnit};

const LEVELS: usize = 256;

#[derive(Debug)]
pub struct FrameHistory {
    change_times: [Option<Instant>; LEVELS],
    change_opacities: [u8; LEVELS],
    opacities: [u8; LEVELS],

    previous_zoom_index: usize,
    previous_time: Option<Instant>,
    time: Option<Instant>,

    first_frame: bool,
    changed: bool,
    texture: Option<Texture>,
}

impl Default for FrameHistory {
    fn default() -> Self {
        Self {
            change_times: [None; LEVELS],
            change_opacities: [0; LEVELS],
            opacities: [0; LEVELS],
            previous_zoom_index: 0,
            previous_time: None,
            time: None,
            first_frame: true,
            changed: false,
            texture: None,
        }
    }
}

fn zoom_index(zoom: f64) -> usize {
    (zoom * 10.0).floor().clamp(0.0, (LEVELS - 1) as f64) as usize
}

impl FrameHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, now: Instant, zoom: f64, duration: Duration) {
        let zoom_index = zoom_index(zoom);

        if self.first_frame {
            self.changed = true;
            self.opacities[..=zoom_index].fill(u8::MAX);
            self.first_frame = false;
        }

        // Levels crossed since the last zoom change restart their fade.
        let crossed = if zoom_index < self.previous_zoom_index {
            zoom_index + 1..=self.previous_zoom_index
        } else {
            self.previous_zoom_index + 1..=zoom_index
        };
        for z in crossed {
            self.change_times[z] = Some(now);
            self.change_opacities[z] = self.opacities[z];
        }

        for z in 0..LEVELS {
            let delta = opacity_change(self.change_times[z], now, duration);
            let opacity = if z <= zoom_index {
                self.change_opacities[z].saturating_add(delta)
            } else {
                self.change_opacities[z].saturating_sub(delta)
            };
            if opacity != self.opacities[z] {
                self.opacities[z] = opacity;
                self.changed = true;
            }
        }

        if zoom_index != self.previous_zoom_index {
            self.previous_zoom_index = zoom_index;
            self.previous_time = Some(now);
        }
        self.time = Some(now);
    }

    /// Whether a fade started less than `duration` before the last record.
    pub fn needs_animation(&self, duration: Duration) -> bool {
        match (self.time, self.previous_time) {
            (Some(time), Some(previous)) => time.saturating_duration_since(previous) < duration,
            _ => false,
        }
    }

    pub fn opacity(&self, zoom: f64) -> u8 {
        self.opacities[zoom_index(zoom)]
    }

    pub fn upload(&mut self, ctx: &mut Context, unit: TextureUnit) {
        if !self.changed {
            return;
        }

        let mut rgba = [0u8; LEVELS * 4];
        for (texel, &opacity) in rgba.chunks_exact_mut(4).zip(&self.opacities) {
            texel[3] = opacity;
        }

        match self.texture.as_mut() {
            Some(texture) => ctx.update_texture(texture, LEVELS as u32, 1, &rgba, unit),
            None => self.texture = Some(ctx.create_texture_with_data(LEVELS as u32, 1, &rgba, unit)),
        }
        self.changed = false;
    }

    pub fn bind(&mut self, ctx: &mut Context, unit: TextureUnit) {
        self.upload(ctx, unit);
        if let Some(texture) = self.texture.as_mut() {
            ctx.bind_texture(texture, unit, TextureFilter::Nearest, TextureMipMap::No);
        }
    }
}

fn opacity_change(since: Option<Instant>, now: Instant, duration: Duration) -> u8 {
    let Some(since) = since else { return u8::MAX };
    if duration.is_zero() {
        return u8::MAX;
    }
    let progress = now.saturating_duration_since(since).as_secs_f64() / duration.as_secs_f64();
    (progress.min(1.0) * 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::backend::{Call, RecordingApi};

    const FADE: Duration = Duration::from_millis(300);

    #[test]
    fn first_record_shows_every_level_up_to_the_zoom() {
        let mut history = FrameHistory::new();
        history.record(Instant::now(), 2.0, FADE);

        assert_eq!(history.opacity(0.0), 255);
        assert_eq!(history.opacity(2.0), 255);
        assert_eq!(history.opacity(2.1), 0);
    }

    #[test]
    fn zooming_in_fades_new_levels_over_the_duration() {
        let start = Instant::now();
        let mut history = FrameHistory::new();
        history.record(start, 1.0, FADE);
        history.record(start, 1.5, FADE);
        assert_eq!(history.opacity(1.5), 0);
        assert!(history.needs_animation(FADE));

        history.record(start + FADE / 2, 1.5, FADE);
        let half = history.opacity(1.5);
        assert!((120..=135).contains(&half), "{half}");
        assert!(history.needs_animation(FADE));

        history.record(start + FADE, 1.5, FADE);
        assert_eq!(history.opacity(1.5), 255);
        assert!(!history.needs_animation(FADE));
    }

    #[test]
    fn zooming_out_fades_levels_away() {
        let start = Instant::now();
        let mut history = FrameHistory::new();
        history.record(start, 3.0, FADE);
        history.record(start + Duration::from_secs(1), 2.0, FADE);
        assert_eq!(history.opacity(2.5), 255);

        history.record(start + Duration::from_secs(2), 2.0, FADE);
        assert_eq!(history.opacity(2.5), 0);
        assert_eq!(history.opacity(2.0), 255);
    }

    #[test]
    fn zero_duration_switches_at_once() {
        let start = Instant::now();
        let mut history = FrameHistory::new();
        history.record(start, 0.0, Duration::ZERO);
        history.record(start, 4.0, Duration::ZERO);
        assert_eq!(history.opacity(4.0), 255);
        assert!(!history.needs_animation(Duration::ZERO));
    }

    #[test]
    fn uploads_only_after_a_change() {
        let api = RecordingApi::new();
        let mut ctx = Context::new(Box::new(api.clone()));
        let start = Instant::now();
        let mut history = FrameHistory::new();

        history.record(start, 1.0, FADE);
        history.upload(&mut ctx, 0);
        history.record(start, 1.0, FADE);
        history.upload(&mut ctx, 0);

        let uploads: Vec<_> = api
            .calls()
            .into_iter()
            .filter(|call| matches!(call, Call::TexImage2D { .. }))
            .collect();
        assert_eq!(uploads, vec![Call::TexImage2D { width: 256, height: 1 }]);
    }
}
