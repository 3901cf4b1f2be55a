use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::gl::{Context, Texture, TextureFilter, TextureMipMap, TextureUnit};

/// A texture the style fills on the CPU and the painter samples from.
pub trait Atlas {
    /// Sends pending pixel changes to the GPU.
    fn upload(&self, ctx: &mut Context, unit: TextureUnit);

    /// Uploads if needed, then binds the texture to `unit`.
    fn bind(&self, ctx: &mut Context, unit: TextureUnit, filter: TextureFilter);

    /// Pixel size of the backing image.
    fn size(&self) -> [u32; 2];
}

/// Normalized texture rectangle of one sprite.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SpriteAtlasPosition {
    /// Size of the sprite in pixels.
    pub size: [f32; 2],
    pub tl: [f32; 2],
    pub br: [f32; 2],
}

pub trait SpriteAtlas: Atlas {
    fn position(&self, name: &str) -> Option<SpriteAtlasPosition>;
}

/// An RGBA atlas with named rectangular regions.
#[derive(Debug)]
pub struct ImageAtlas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    regions: HashMap<String, [u32; 4]>,
    texture: RefCell<Option<Texture>>,
    dirty: Cell<bool>,
}

impl ImageAtlas {
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
            regions: HashMap::new(),
            texture: RefCell::new(None),
            dirty: Cell::new(true),
        }
    }

    /// Copies a `w`×`h` RGBA image to `(x, y)` and names the region.
    ///
    /// Returns `false` without changing anything when the image does not fit.
    pub fn insert(&mut self, name: &str, x: u32, y: u32, w: u32, h: u32, rgba: &[u8]) -> bool {
        if x + w > self.width || y + h > self.height || rgba.len() != (w * h * 4) as usize {
            log::warn!("image `{name}` ({w}x{h} at {x},{y}) does not fit the atlas");
            return false;
        }

        let stride = (self.width * 4) as usize;
        let row = (w * 4) as usize;
        for r in 0..h as usize {
            let dst = (y as usize + r) * stride + x as usize * 4;
            self.pixels[dst..dst + row].copy_from_slice(&rgba[r * row..(r + 1) * row]);
        }
        self.regions.insert(name.to_owned(), [x, y, w, h]);
        self.dirty.set(true);
        true
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }
}

impl Atlas for ImageAtlas {
    fn upload(&self, ctx: &mut Context, unit: TextureUnit) {
        if !self.dirty.get() {
            return;
        }

        let mut texture = self.texture.borrow_mut();
        match texture.as_mut() {
            Some(texture) => ctx.update_texture(texture, self.width, self.height, &self.pixels, unit),
            None => {
                *texture = Some(ctx.create_texture_with_data(self.width, self.height, &self.pixels, unit));
            }
        }
        self.dirty.set(false);
    }

    fn bind(&self, ctx: &mut Context, unit: TextureUnit, filter: TextureFilter) {
        self.upload(ctx, unit);
        if let Some(texture) = self.texture.borrow_mut().as_mut() {
            ctx.bind_texture(texture, unit, filter, TextureMipMap::No);
        }
    }

    fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }
}

impl SpriteAtlas for ImageAtlas {
    fn position(&self, name: &str) -> Option<SpriteAtlasPosition> {
        let &[x, y, w, h] = self.regions.get(name)?;
        let (width, height) = (self.width as f32, self.height as f32);
        Some(SpriteAtlasPosition {
            size: [w as f32, h as f32],
            tl: [x as f32 / width, y as f32 / height],
            br: [(x + w) as f32 / width, (y + h) as f32 / height],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::backend::{Call, RecordingApi};

    #[test]
    fn positions_are_normalized() {
        let mut atlas = ImageAtlas::new(64, 32);
        assert!(atlas.insert("dot", 16, 8, 16, 8, &[255; 16 * 8 * 4]));

        let position = atlas.position("dot").unwrap();
        assert_eq!(position.size, [16.0, 8.0]);
        assert_eq!(position.tl, [0.25, 0.25]);
        assert_eq!(position.br, [0.5, 0.5]);
        assert!(atlas.position("missing").is_none());
    }

    #[test]
    fn oversized_images_are_rejected() {
        let mut atlas = ImageAtlas::new(8, 8);
        assert!(!atlas.insert("big", 4, 4, 8, 8, &[0; 8 * 8 * 4]));
        assert!(atlas.position("big").is_none());
    }

    #[test]
    fn uploads_only_when_dirty() {
        let api = RecordingApi::new();
        let mut ctx = Context::new(Box::new(api.clone()));
        let mut atlas = ImageAtlas::new(4, 4);

        atlas.upload(&mut ctx, 0);
        atlas.upload(&mut ctx, 0);
        let uploads = |api: &RecordingApi| api.count(|c| matches!(c, Call::TexImage2D { .. }));
        assert_eq!(uploads(&api), 1);

        atlas.insert("px", 0, 0, 1, 1, &[1, 2, 3, 4]);
        atlas.upload(&mut ctx, 0);
        assert_eq!(uploads(&api), 2);
        assert!(!atlas.is_dirty());
    }
}
