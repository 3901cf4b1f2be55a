use crate::gl::{Context, ProgramId, ShaderKind, UniqueProgram, UniqueShader};

use super::ShaderMode;

/// A linked vertex + fragment pair built from one WGSL module.
///
/// The shader objects are kept alive for as long as the program is, matching
/// the lifetime the graphics API expects for attached shaders.
#[derive(Debug)]
pub struct Program {
    program: UniqueProgram,
    _vertex: UniqueShader,
    _fragment: UniqueShader,
}

impl Program {
    pub fn new(ctx: &mut Context, name: &str, source: &str, mode: ShaderMode) -> anyhow::Result<Self> {
        let source = format!(
            "const OVERDRAW_INSPECTOR: bool = {};\n{source}",
            mode == ShaderMode::Overdraw
        );

        let vertex = ctx.create_shader(ShaderKind::Vertex, &source)?;
        let fragment = ctx.create_shader(ShaderKind::Fragment, &source)?;
        let program = ctx.link_program(&vertex, &fragment)?;
        log::debug!("program `{name}` ({mode:?}) linked as {}", program.id());

        Ok(Self { program, _vertex: vertex, _fragment: fragment })
    }

    #[inline]
    pub fn id(&self) -> ProgramId {
        self.program.id()
    }
}
