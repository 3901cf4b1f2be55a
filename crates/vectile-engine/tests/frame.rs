use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::{Duration, Instant};

use vectile_engine::gl::backend::{Call, RecordingApi};
use vectile_engine::gl::{CompareFunc, Context, DepthRange, GraphicsApi, PrimitiveType, Segment, Viewport};
use vectile_engine::map::{ContextMode, MapMode, TransformState};
use vectile_engine::paint::Color;
use vectile_engine::renderer::bucket::{Bucket, CircleBucket, FillBucket};
use vectile_engine::renderer::{DebugOptions, FrameData, PaintParameters, Painter, RenderTile, RendererConfig};
use vectile_engine::shader::uniforms::{FillOutlinePatternUniforms, FillPatternUniforms};
use vectile_engine::shader::vertex::{CircleVertex, FillVertex};
use vectile_engine::style::{
    Atlas, BackgroundPaint, CirclePaint, CustomLayer, CustomLayerHost, FillPaint, ImageAtlas, Layer,
    LayerKind, LinePaint, RenderData, RenderItem, RenderPass, Source, SpriteAtlas, Style, TileSource,
};
use vectile_engine::tile::UnwrappedTileId;

/// Every layer in order, every tile with a bucket for it, no clear-color
/// shortcut for backgrounds.
struct TestStyle {
    layers: Vec<Layer>,
    sources: Vec<TileSource>,
    atlas: ImageAtlas,
}

impl TestStyle {
    fn new(layers: Vec<Layer>, sources: Vec<TileSource>) -> Self {
        Self { layers, sources, atlas: ImageAtlas::new(1, 1) }
    }
}

impl Style for TestStyle {
    fn render_data(&self, _debug: DebugOptions) -> RenderData<'_> {
        let mut order = Vec::new();
        for layer in &self.layers {
            let Some(source_id) = &layer.source else {
                order.push(RenderItem::layer(layer));
                continue;
            };
            let source = self.sources.iter().find(|s| s.id() == source_id.as_str()).unwrap();
            for tile in source.tiles() {
                if let Some(bucket) = tile.bucket(&layer.id) {
                    order.push(RenderItem::tiled(layer, tile, bucket));
                }
            }
        }

        RenderData {
            order,
            sources: self.sources.iter().map(|s| s as &dyn Source).collect(),
            background_color: Color::transparent(),
        }
    }

    fn sprite_atlas(&self) -> &dyn SpriteAtlas {
        &self.atlas
    }

    fn glyph_atlas(&self) -> &dyn Atlas {
        &self.atlas
    }

    fn line_atlas(&self) -> &dyn Atlas {
        &self.atlas
    }
}

fn painter(api: &RecordingApi) -> Painter {
    let painter = Painter::new(Box::new(api.clone()), TransformState::new(512, 512), RendererConfig::default())
        .unwrap();
    api.clear_calls();
    painter
}

fn frame(map_mode: MapMode) -> FrameData {
    FrameData { map_mode, ..FrameData::new([512, 512], Instant::now()) }
}

fn render(painter: &mut Painter, style: &TestStyle, frame: &FrameData) {
    let annotations = ImageAtlas::new(1, 1);
    painter.render(style, frame, &annotations);
}

/// Three circles in one vertex range, six triangles.
fn circles(segments: Vec<Segment>) -> CircleBucket {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for (i, x) in [100i16, 200, 300].into_iter().enumerate() {
        for (ex, ey) in [(-1, -1), (1, -1), (1, 1), (-1, 1)] {
            vertices.push(CircleVertex::new(x, 100, ex, ey));
        }
        let base = (i * 4) as u16;
        indices.extend([base, base + 1, base + 2, base, base + 3, base + 2]);
    }
    CircleBucket::new(vertices, indices, segments)
}

fn circle_layer(id: &str) -> Layer {
    Layer::new(id, Some("points"), LayerKind::Circle(CirclePaint::default()))
}

fn draws(calls: &[Call]) -> Vec<&Call> {
    calls
        .iter()
        .filter(|c| matches!(c, Call::DrawArrays { .. } | Call::DrawElements { .. }))
        .collect()
}

#[test]
fn still_background_frame_draws_one_unblended_quad() {
    let api = RecordingApi::new();
    let mut painter = painter(&api);
    let style = TestStyle::new(
        vec![Layer::new("background", None, LayerKind::Background(BackgroundPaint::default()))],
        vec![],
    );

    render(&mut painter, &style, &frame(MapMode::Still));

    let calls = api.calls();
    assert_eq!(
        draws(&calls),
        vec![&Call::DrawArrays { primitive: PrimitiveType::Triangles, first: 0, count: 6 }]
    );
    assert!(!calls.contains(&Call::Blend(true)));
    assert!(!calls.contains(&Call::StencilTest(true)));

    let clear = calls.iter().position(|c| matches!(c, Call::Clear(_))).unwrap();
    let draw = calls.iter().position(|c| matches!(c, Call::DrawArrays { .. })).unwrap();
    assert!(clear < draw);
}

#[test]
fn circle_segments_share_one_vertex_array() {
    let api = RecordingApi::new();
    let mut painter = painter(&api);
    let bucket = circles(vec![Segment::new(0, 0, 12, 2), Segment::new(0, 2, 12, 2), Segment::new(0, 4, 12, 2)]);
    let tile = RenderTile::new(UnwrappedTileId::new(0, 0, 0)).with_bucket("dots", bucket);
    let style = TestStyle::new(vec![circle_layer("dots")], vec![TileSource::raster("points", vec![tile])]);

    render(&mut painter, &style, &frame(MapMode::Continuous));

    let calls = api.calls();
    assert_eq!(painter.context().vertex_array_count(), 1);
    assert_eq!(api.count(|c| matches!(c, Call::GenVertexArray(_))), 1);
    assert_eq!(api.count(|c| matches!(c, Call::VertexAttribPointer { .. })), 1);

    let offsets: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            Call::DrawElements { primitive: PrimitiveType::Triangles, count: 6, byte_offset } => Some(*byte_offset),
            _ => None,
        })
        .collect();
    assert_eq!(offsets, vec![0, 12, 24]);
}

#[test]
fn higher_items_get_nearer_depth_ranges() {
    let api = RecordingApi::new();
    let mut painter = painter(&api);
    let tile = RenderTile::new(UnwrappedTileId::new(0, 0, 0))
        .with_bucket("lower", circles(vec![Segment::new(0, 0, 12, 6)]))
        .with_bucket("upper", circles(vec![Segment::new(0, 0, 12, 6)]));
    let style = TestStyle::new(
        vec![circle_layer("lower"), circle_layer("upper")],
        vec![TileSource::raster("points", vec![tile])],
    );

    render(&mut painter, &style, &frame(MapMode::Continuous));

    let ranges: Vec<DepthRange> = api
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::DepthRange(range) => Some(range),
            _ => None,
        })
        .collect();
    // Translucent content is drawn bottom to top.
    let [lower, upper] = ranges[..] else { panic!("expected two depth ranges, got {ranges:?}") };

    assert!(upper.near < lower.near);
    assert!(lower.far <= 1.0);
    for z in [0.0, 0.25, 0.5, 0.75, 1.0] {
        let window = |r: DepthRange| r.near + z * (r.far - r.near);
        assert!(window(upper) < window(lower), "at z = {z}");
    }
}

/// Records the pass of every render call.
struct PassRecorder(Rc<RefCell<Vec<RenderPass>>>);

impl Bucket for PassRecorder {
    fn has_data(&self) -> bool {
        true
    }

    fn needs_upload(&self) -> bool {
        false
    }

    fn upload(&self, _ctx: &mut Context) {}

    fn render(&self, painter: &mut Painter, _params: &PaintParameters<'_>, _layer: &Layer, _tile: &RenderTile) {
        self.0.borrow_mut().push(painter.pass());
    }
}

struct CountingHost(Rc<Cell<usize>>);

impl CustomLayerHost for CountingHost {
    fn render(&self, _api: &mut dyn GraphicsApi, _state: &TransformState) {
        self.0.set(self.0.get() + 1);
    }
}

#[test]
fn items_are_drawn_only_in_their_passes() {
    let api = RecordingApi::new();
    let mut painter = painter(&api);

    let solid = Rc::new(RefCell::new(Vec::new()));
    let lines = Rc::new(RefCell::new(Vec::new()));
    let custom = Rc::new(Cell::new(0));
    let tile = RenderTile::new(UnwrappedTileId::new(0, 0, 0))
        .with_bucket("solid", PassRecorder(solid.clone()))
        .with_bucket("lines", PassRecorder(lines.clone()));
    let style = TestStyle::new(
        vec![
            Layer::new(
                "solid",
                Some("shapes"),
                LayerKind::Fill(FillPaint { antialias: false, ..FillPaint::default() }),
            ),
            Layer::new("lines", Some("shapes"), LayerKind::Line(LinePaint::default())),
            Layer::new("custom", None, LayerKind::Custom(CustomLayer(Rc::new(CountingHost(custom.clone()))))),
        ],
        vec![TileSource::new("shapes", vec![tile])],
    );

    render(&mut painter, &style, &frame(MapMode::Continuous));

    assert_eq!(*solid.borrow(), vec![RenderPass::Opaque]);
    assert_eq!(*lines.borrow(), vec![RenderPass::Translucent]);
    assert_eq!(custom.get(), 1);
}

#[test]
fn still_mode_clips_sibling_tiles_apart() {
    let api = RecordingApi::new();
    let mut painter = painter(&api);
    let tiles = [(0, 0), (1, 0), (0, 1), (1, 1)]
        .into_iter()
        .map(|(x, y)| {
            RenderTile::new(UnwrappedTileId::new(1, x, y))
                .with_bucket("dots", circles(vec![Segment::new(0, 0, 12, 6)]))
        })
        .collect();
    let style = TestStyle::new(vec![circle_layer("dots")], vec![TileSource::new("points", tiles)]);

    render(&mut painter, &style, &frame(MapMode::Still));

    let calls = api.calls();
    let references = |func: CompareFunc| -> Vec<i32> {
        calls
            .iter()
            .filter_map(|c| match c {
                Call::StencilFunc(f, reference, _) if *f == func => Some(*reference),
                _ => None,
            })
            .collect()
    };
    let masks = references(CompareFunc::Always);
    let tested = references(CompareFunc::Equal);

    assert_eq!(masks.len(), 4);
    assert_eq!(masks.iter().collect::<BTreeSet<_>>().len(), 4);
    assert_eq!(tested.iter().collect::<BTreeSet<_>>(), masks.iter().collect::<BTreeSet<_>>());
}

#[test]
fn repeated_still_frames_redraw_every_clip_mask() {
    let api = RecordingApi::new();
    let mut painter = painter(&api);
    let tiles = [(0, 0), (1, 0)]
        .into_iter()
        .map(|(x, y)| {
            RenderTile::new(UnwrappedTileId::new(1, x, y))
                .with_bucket("dots", circles(vec![Segment::new(0, 0, 12, 6)]))
        })
        .collect();
    let style = TestStyle::new(vec![circle_layer("dots")], vec![TileSource::new("points", tiles)]);
    let frame = frame(MapMode::Still);

    let mask_references = |api: &RecordingApi| -> Vec<i32> {
        api.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::StencilFunc(CompareFunc::Always, reference, _) => Some(reference),
                _ => None,
            })
            .collect()
    };

    render(&mut painter, &style, &frame);
    let first = mask_references(&api);
    api.clear_calls();
    render(&mut painter, &style, &frame);
    let second = mask_references(&api);

    assert_eq!(first.len(), 2);
    assert_eq!(second, first);
}

#[test]
fn patterned_fills_fringe_with_the_pattern_outline_program() {
    let api = RecordingApi::new();
    let mut painter = painter(&api);
    let square = FillBucket::new(
        vec![
            FillVertex::new(0, 0),
            FillVertex::new(100, 0),
            FillVertex::new(100, 100),
            FillVertex::new(0, 100),
        ],
        vec![0, 1, 2, 0, 2, 3],
        vec![Segment::new(0, 0, 4, 2)],
        vec![0, 1, 1, 2, 2, 3, 3, 0],
        vec![Segment::new(0, 0, 4, 4)],
    );
    let tiles = vec![RenderTile::new(UnwrappedTileId::new(0, 0, 0)).with_bucket("parks", square)];
    let paint = FillPaint { pattern: Some("grass".to_owned()), ..FillPaint::default() };
    let mut style = TestStyle::new(
        vec![Layer::new("parks", Some("areas"), LayerKind::Fill(paint))],
        vec![TileSource::new("areas", tiles)],
    );
    style.atlas = ImageAtlas::new(4, 4);
    assert!(style.atlas.insert("grass", 0, 0, 2, 2, &[255; 16]));

    render(&mut painter, &style, &frame(MapMode::Still));

    let calls = api.calls();
    let block_before = |kind: PrimitiveType| {
        let draw = calls
            .iter()
            .position(|c| matches!(c, Call::DrawElements { primitive, .. } if *primitive == kind))
            .unwrap();
        calls[..draw]
            .iter()
            .rev()
            .find_map(|c| match c {
                Call::UniformBlock { program, len } => Some((*program, *len)),
                _ => None,
            })
            .unwrap()
    };
    let (fill_program, fill_len) = block_before(PrimitiveType::Triangles);
    let (outline_program, outline_len) = block_before(PrimitiveType::Lines);

    assert_eq!(fill_len, std::mem::size_of::<FillPatternUniforms>());
    assert_eq!(outline_len, std::mem::size_of::<FillOutlinePatternUniforms>());
    assert_ne!(outline_program, fill_program);
}

struct MarkerHost;

impl CustomLayerHost for MarkerHost {
    fn render(&self, api: &mut dyn GraphicsApi, _state: &TransformState) {
        api.line_width(7.0);
    }
}

#[test]
fn custom_layers_run_between_reset_and_dirty_state() {
    let api = RecordingApi::new();
    let mut painter = painter(&api);
    let tile = RenderTile::new(UnwrappedTileId::new(0, 0, 0))
        .with_bucket("under", circles(vec![Segment::new(0, 0, 12, 6)]))
        .with_bucket("over", circles(vec![Segment::new(0, 0, 12, 6)]));
    let style = TestStyle::new(
        vec![
            circle_layer("under"),
            Layer::new("custom", None, LayerKind::Custom(CustomLayer(Rc::new(MarkerHost)))),
            circle_layer("over"),
        ],
        vec![TileSource::raster("points", vec![tile])],
    );

    render(&mut painter, &style, &frame(MapMode::Continuous));

    let calls = api.calls();
    let marker = calls.iter().position(|c| *c == Call::LineWidth(7.0)).unwrap();
    let program = calls[..marker]
        .iter()
        .find_map(|c| match c {
            Call::UseProgram(p) if *p != 0 => Some(*p),
            _ => None,
        })
        .unwrap();

    assert!(calls[..marker].contains(&Call::UseProgram(0)));
    assert_eq!(calls[marker + 1], Call::BindFramebuffer(0));
    assert_eq!(calls[marker + 2], Call::Viewport(Viewport::sized(512, 512)));
    assert!(calls[marker..].contains(&Call::UseProgram(program)));
}

#[test]
fn shared_context_mode_distrusts_the_cache_between_frames() {
    let style = TestStyle::new(
        vec![Layer::new("background", None, LayerKind::Background(BackgroundPaint::default()))],
        vec![],
    );
    let depth_tests = |context_mode| {
        let api = RecordingApi::new();
        let mut painter = painter(&api);
        let frame = FrameData { context_mode, ..frame(MapMode::Still) };
        render(&mut painter, &style, &frame);
        api.clear_calls();
        render(&mut painter, &style, &frame);
        api.count(|c| matches!(c, Call::DepthTest(_)))
    };

    assert_eq!(depth_tests(ContextMode::Exclusive), 0);
    assert_eq!(depth_tests(ContextMode::Shared), 1);
}

#[test]
fn tile_borders_outline_every_tile() {
    let api = RecordingApi::new();
    let mut painter = painter(&api);
    let tile = RenderTile::new(UnwrappedTileId::new(0, 0, 0))
        .with_bucket("dots", circles(vec![Segment::new(0, 0, 12, 6)]));
    let style = TestStyle::new(vec![circle_layer("dots")], vec![TileSource::new("points", vec![tile])]);
    let frame = FrameData {
        debug_options: DebugOptions::TILE_BORDERS,
        pixel_ratio: 2.0,
        ..frame(MapMode::Continuous)
    };

    render(&mut painter, &style, &frame);

    let calls = api.calls();
    assert!(calls.contains(&Call::LineWidth(8.0)));
    assert_eq!(
        calls.last(),
        Some(&Call::DrawArrays { primitive: PrimitiveType::LineStrip, first: 0, count: 5 })
    );
}

#[cfg(debug_assertions)]
#[test]
fn overdraw_clears_to_black() {
    let api = RecordingApi::new();
    let mut painter = painter(&api);
    let style = TestStyle::new(vec![], vec![]);
    let frame = FrameData { debug_options: DebugOptions::OVERDRAW, ..frame(MapMode::Continuous) };

    render(&mut painter, &style, &frame);

    assert!(api.calls().contains(&Call::ClearColor(Color::black())));
}

#[test]
fn zoom_changes_animate_for_the_fade_duration() {
    let api = RecordingApi::new();
    let mut painter = painter(&api);
    let style = TestStyle::new(vec![], vec![]);
    let start = Instant::now();

    render(&mut painter, &style, &FrameData::new([512, 512], start));
    painter.transform_mut().set_zoom(1.0);
    render(&mut painter, &style, &FrameData::new([512, 512], start));
    assert!(painter.needs_animation());

    render(&mut painter, &style, &FrameData::new([512, 512], start + Duration::from_secs(1)));
    assert!(!painter.needs_animation());
}
