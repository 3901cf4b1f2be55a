//! WGSL programs, their uniform blocks and vertex layouts.

mod program;
pub mod uniforms;
pub mod vertex;

use anyhow::Context as _;

use crate::gl::{Context, ProgramId};

pub use program::Program;

/// Which variant of every program to build.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShaderMode {
    Regular,
    /// Every fragment outputs white so additive blending shows overdraw.
    Overdraw,
}

const FILL: &str = include_str!("wgsl/fill.wgsl");
const FILL_PATTERN: &str = include_str!("wgsl/fill_pattern.wgsl");
const FILL_OUTLINE: &str = include_str!("wgsl/fill_outline.wgsl");
const FILL_OUTLINE_PATTERN: &str = include_str!("wgsl/fill_outline_pattern.wgsl");
const LINE: &str = include_str!("wgsl/line.wgsl");
const CIRCLE: &str = include_str!("wgsl/circle.wgsl");
const SYMBOL: &str = include_str!("wgsl/symbol.wgsl");
const RASTER: &str = include_str!("wgsl/raster.wgsl");

/// The full program set the painter draws with.
#[derive(Debug)]
pub struct Shaders {
    pub fill: Program,
    pub fill_pattern: Program,
    pub fill_outline: Program,
    pub fill_outline_pattern: Program,
    pub line: Program,
    pub circle: Program,
    pub symbol: Program,
    pub raster: Program,
}

impl Shaders {
    pub fn new(ctx: &mut Context, mode: ShaderMode) -> anyhow::Result<Self> {
        let mut build = |name: &str, source: &str| {
            Program::new(ctx, name, source, mode)
                .with_context(|| format!("failed to build the {name} program ({mode:?})"))
        };

        Ok(Self {
            fill: build("fill", FILL)?,
            fill_pattern: build("fill_pattern", FILL_PATTERN)?,
            fill_outline: build("fill_outline", FILL_OUTLINE)?,
            fill_outline_pattern: build("fill_outline_pattern", FILL_OUTLINE_PATTERN)?,
            line: build("line", LINE)?,
            circle: build("circle", CIRCLE)?,
            symbol: build("symbol", SYMBOL)?,
            raster: build("raster", RASTER)?,
        })
    }

    pub fn programs(&self) -> Programs {
        Programs {
            fill: self.fill.id(),
            fill_pattern: self.fill_pattern.id(),
            fill_outline: self.fill_outline.id(),
            fill_outline_pattern: self.fill_outline_pattern.id(),
            line: self.line.id(),
            circle: self.circle.id(),
            symbol: self.symbol.id(),
            raster: self.raster.id(),
        }
    }
}

/// Program ids of one [`Shaders`] set, copied into each frame's parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Programs {
    pub fill: ProgramId,
    pub fill_pattern: ProgramId,
    pub fill_outline: ProgramId,
    pub fill_outline_pattern: ProgramId,
    pub line: ProgramId,
    pub circle: ProgramId,
    pub symbol: ProgramId,
    pub raster: ProgramId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::backend::RecordingApi;

    #[test]
    fn every_program_gets_its_own_id() {
        let mut ctx = Context::new(Box::new(RecordingApi::new()));
        let shaders = Shaders::new(&mut ctx, ShaderMode::Regular).unwrap();
        let p = shaders.programs();

        let mut ids = vec![
            p.fill,
            p.fill_pattern,
            p.fill_outline,
            p.fill_outline_pattern,
            p.line,
            p.circle,
            p.symbol,
            p.raster,
        ];
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }

    #[test]
    fn every_source_declares_both_entry_points() {
        for source in [FILL, FILL_PATTERN, FILL_OUTLINE, FILL_OUTLINE_PATTERN, LINE, CIRCLE, SYMBOL, RASTER] {
            assert!(source.contains("fn vs_main"));
            assert!(source.contains("fn fs_main"));
            assert!(source.contains("OVERDRAW_INSPECTOR"));
        }
    }
}
