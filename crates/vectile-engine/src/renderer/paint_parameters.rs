use crate::shader::Programs;
use crate::style::{Atlas, SpriteAtlas};

/// Per-frame inputs shared by every layer draw.
#[derive(Clone, Copy)]
pub struct PaintParameters<'a> {
    /// Regular or overdraw programs, chosen once per frame.
    pub programs: Programs,
    pub sprite_atlas: &'a dyn SpriteAtlas,
    pub glyph_atlas: &'a dyn Atlas,
    pub line_atlas: &'a dyn Atlas,
}
