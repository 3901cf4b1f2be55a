use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::gl::GraphicsApi;
use crate::map::TransformState;
use crate::paint::Color;

/// One of the two ordered sweeps over the render items.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RenderPass {
    Opaque,
    Translucent,
}

bitflags! {
    /// Passes a layer takes part in.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct RenderPasses: u8 {
        const OPAQUE = 1 << 0;
        const TRANSLUCENT = 1 << 1;
    }
}

impl From<RenderPass> for RenderPasses {
    fn from(pass: RenderPass) -> Self {
        match pass {
            RenderPass::Opaque => RenderPasses::OPAQUE,
            RenderPass::Translucent => RenderPasses::TRANSLUCENT,
        }
    }
}

/// Frame of reference for a paint `translate` offset.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum TranslateAnchor {
    /// Offsets rotate with the map.
    #[default]
    Map,
    /// Offsets stay aligned with the screen.
    Viewport,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum CirclePitchScale {
    /// Circles shrink with distance like the ground does.
    #[default]
    Map,
    Viewport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundPaint {
    pub color: Color,
    pub opacity: f32,
    /// Sprite name of a repeating pattern, drawn instead of the color.
    pub pattern: Option<String>,
}

impl Default for BackgroundPaint {
    fn default() -> Self {
        Self { color: Color::black(), opacity: 1.0, pattern: None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillPaint {
    pub antialias: bool,
    pub opacity: f32,
    pub color: Color,
    /// Defaults to the fill color when unset.
    pub outline_color: Option<Color>,
    pub translate: [f32; 2],
    pub translate_anchor: TranslateAnchor,
    pub pattern: Option<String>,
}

impl Default for FillPaint {
    fn default() -> Self {
        Self {
            antialias: true,
            opacity: 1.0,
            color: Color::black(),
            outline_color: None,
            translate: [0.0, 0.0],
            translate_anchor: TranslateAnchor::Map,
            pattern: None,
        }
    }
}

/// Row of the line atlas holding a rasterized dash pattern.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LineDash {
    /// Normalized texture row of the pattern.
    pub y: f32,
    /// Normalized height of the row.
    pub height: f32,
    /// Pattern length in line widths.
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinePaint {
    pub opacity: f32,
    pub color: Color,
    pub translate: [f32; 2],
    pub translate_anchor: TranslateAnchor,
    pub width: f32,
    pub gap_width: f32,
    pub offset: f32,
    pub blur: f32,
    pub dash: Option<LineDash>,
}

impl Default for LinePaint {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            color: Color::black(),
            translate: [0.0, 0.0],
            translate_anchor: TranslateAnchor::Map,
            width: 1.0,
            gap_width: 0.0,
            offset: 0.0,
            blur: 0.0,
            dash: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CirclePaint {
    pub radius: f32,
    pub color: Color,
    pub blur: f32,
    pub opacity: f32,
    pub translate: [f32; 2],
    pub translate_anchor: TranslateAnchor,
    pub pitch_scale: CirclePitchScale,
}

impl Default for CirclePaint {
    fn default() -> Self {
        Self {
            radius: 5.0,
            color: Color::black(),
            blur: 0.0,
            opacity: 1.0,
            translate: [0.0, 0.0],
            translate_anchor: TranslateAnchor::Map,
            pitch_scale: CirclePitchScale::Map,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolPaint {
    pub icon_opacity: f32,
    /// Tint for signed-distance-field icons.
    pub icon_color: Color,
    pub icon_size: f32,
    pub text_opacity: f32,
    pub text_color: Color,
    pub text_size: f32,
    pub translate: [f32; 2],
    pub translate_anchor: TranslateAnchor,
}

impl Default for SymbolPaint {
    fn default() -> Self {
        Self {
            icon_opacity: 1.0,
            icon_color: Color::black(),
            icon_size: 1.0,
            text_opacity: 1.0,
            text_color: Color::black(),
            text_size: 16.0,
            translate: [0.0, 0.0],
            translate_anchor: TranslateAnchor::Map,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterPaint {
    pub opacity: f32,
    /// Degrees.
    pub hue_rotate: f32,
    pub brightness_min: f32,
    pub brightness_max: f32,
    pub saturation: f32,
    pub contrast: f32,
}

impl Default for RasterPaint {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            hue_rotate: 0.0,
            brightness_min: 0.0,
            brightness_max: 1.0,
            saturation: 0.0,
            contrast: 0.0,
        }
    }
}

/// Renderer supplied by the embedding application.
///
/// It runs with the painter's cached state reset and may change any GPU
/// state it likes.
pub trait CustomLayerHost {
    fn render(&self, api: &mut dyn GraphicsApi, state: &TransformState);
}

#[derive(Clone)]
pub struct CustomLayer(pub Rc<dyn CustomLayerHost>);

impl fmt::Debug for CustomLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomLayer")
    }
}

#[derive(Debug, Clone)]
pub enum LayerKind {
    Background(BackgroundPaint),
    Circle(CirclePaint),
    Fill(FillPaint),
    Line(LinePaint),
    Symbol(SymbolPaint),
    Raster(RasterPaint),
    Custom(CustomLayer),
}

#[derive(Debug, Clone)]
pub struct Layer {
    pub id: String,
    /// Id of the source feeding the layer; background and custom layers
    /// have none.
    pub source: Option<String>,
    pub kind: LayerKind,
}

impl Layer {
    pub fn new(id: impl Into<String>, source: Option<&str>, kind: LayerKind) -> Self {
        Self { id: id.into(), source: source.map(str::to_owned), kind }
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            LayerKind::Background(_) => "background",
            LayerKind::Circle(_) => "circle",
            LayerKind::Fill(_) => "fill",
            LayerKind::Line(_) => "line",
            LayerKind::Symbol(_) => "symbol",
            LayerKind::Raster(_) => "raster",
            LayerKind::Custom(_) => "custom",
        }
    }

    /// Passes derived from the current paint properties.
    pub fn passes(&self) -> RenderPasses {
        let mut passes = RenderPasses::empty();
        match &self.kind {
            LayerKind::Background(paint) => {
                if paint.opacity <= 0.0 {
                    return passes;
                }
                if paint.pattern.is_some() || paint.color.a * paint.opacity < 1.0 {
                    passes |= RenderPasses::TRANSLUCENT;
                } else {
                    passes |= RenderPasses::OPAQUE;
                }
            }
            LayerKind::Fill(paint) => {
                if paint.antialias {
                    passes |= RenderPasses::TRANSLUCENT;
                }
                if paint.pattern.is_some() || paint.color.a * paint.opacity < 1.0 {
                    passes |= RenderPasses::TRANSLUCENT;
                } else {
                    passes |= RenderPasses::OPAQUE;
                }
            }
            LayerKind::Line(paint) => {
                if paint.opacity > 0.0 && paint.color.a > 0.0 && paint.width > 0.0 {
                    passes |= RenderPasses::TRANSLUCENT;
                }
            }
            LayerKind::Circle(paint) => {
                if paint.radius > 0.0 && paint.color.a > 0.0 && paint.opacity > 0.0 {
                    passes |= RenderPasses::TRANSLUCENT;
                }
            }
            LayerKind::Symbol(paint) => {
                if paint.icon_opacity > 0.0 || paint.text_opacity > 0.0 {
                    passes |= RenderPasses::TRANSLUCENT;
                }
            }
            LayerKind::Raster(paint) => {
                if paint.opacity > 0.0 {
                    passes |= RenderPasses::TRANSLUCENT;
                }
            }
            LayerKind::Custom(_) => passes |= RenderPasses::TRANSLUCENT,
        }
        passes
    }

    #[inline]
    pub fn has_render_pass(&self, pass: RenderPass) -> bool {
        self.passes().contains(pass.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(paint: FillPaint) -> Layer {
        Layer::new("fill", Some("source"), LayerKind::Fill(paint))
    }

    #[test]
    fn opaque_fill_without_antialias_is_opaque_only() {
        let layer = fill(FillPaint { antialias: false, ..FillPaint::default() });
        assert_eq!(layer.passes(), RenderPasses::OPAQUE);
        assert!(!layer.has_render_pass(RenderPass::Translucent));
    }

    #[test]
    fn antialiased_fill_takes_both_passes() {
        let layer = fill(FillPaint::default());
        assert_eq!(layer.passes(), RenderPasses::OPAQUE | RenderPasses::TRANSLUCENT);
    }

    #[test]
    fn faded_fill_is_translucent() {
        let layer = fill(FillPaint { antialias: false, opacity: 0.5, ..FillPaint::default() });
        assert_eq!(layer.passes(), RenderPasses::TRANSLUCENT);
    }

    #[test]
    fn background_passes_follow_color_and_pattern() {
        let solid = Layer::new("bg", None, LayerKind::Background(BackgroundPaint::default()));
        assert_eq!(solid.passes(), RenderPasses::OPAQUE);

        let patterned = Layer::new(
            "bg",
            None,
            LayerKind::Background(BackgroundPaint {
                pattern: Some("dots".into()),
                ..BackgroundPaint::default()
            }),
        );
        assert_eq!(patterned.passes(), RenderPasses::TRANSLUCENT);

        let hidden = Layer::new(
            "bg",
            None,
            LayerKind::Background(BackgroundPaint { opacity: 0.0, ..BackgroundPaint::default() }),
        );
        assert!(hidden.passes().is_empty());
    }

    #[test]
    fn invisible_lines_and_circles_take_no_pass() {
        let line = Layer::new(
            "line",
            Some("source"),
            LayerKind::Line(LinePaint { width: 0.0, ..LinePaint::default() }),
        );
        assert!(line.passes().is_empty());

        let circle = Layer::new(
            "circle",
            Some("source"),
            LayerKind::Circle(CirclePaint { color: Color::transparent(), ..CirclePaint::default() }),
        );
        assert!(circle.passes().is_empty());
    }
}
