//! A synthetic map: a 2x2 grid of z1 tiles, each with a water polygon, a
//! road and a handful of places.

use vectile_engine::gl::Segment;
use vectile_engine::paint::Color;
use vectile_engine::renderer::RenderTile;
use vectile_engine::renderer::bucket::{CircleBucket, FillBucket, LineBucket};
use vectile_engine::shader::vertex::{CircleVertex, FillVertex, LineVertex};
use vectile_engine::style::{
    BackgroundPaint, CirclePaint, FillPaint, Layer, LayerKind, LinePaint, MemoryStyle,
    TileSource,
};
use vectile_engine::tile::{EXTENT, UnwrappedTileId};

const SOURCE: &str = "demo";

pub fn style() -> MemoryStyle {
    let layers = vec![
        Layer::new(
            "land",
            None,
            LayerKind::Background(BackgroundPaint {
                color: Color::from_rgba_u8(238, 234, 222, 255),
                ..BackgroundPaint::default()
            }),
        ),
        Layer::new(
            "water",
            Some(SOURCE),
            LayerKind::Fill(FillPaint {
                color: Color::from_rgba_u8(160, 196, 230, 255),
                outline_color: Some(Color::from_rgba_u8(110, 150, 200, 255)),
                ..FillPaint::default()
            }),
        ),
        Layer::new(
            "roads",
            Some(SOURCE),
            LayerKind::Line(LinePaint {
                color: Color::from_rgba_u8(120, 110, 100, 255),
                width: 4.0,
                ..LinePaint::default()
            }),
        ),
        Layer::new(
            "places",
            Some(SOURCE),
            LayerKind::Circle(CirclePaint {
                radius: 6.0,
                color: Color::from_rgba_u8(200, 60, 50, 255),
                ..CirclePaint::default()
            }),
        ),
    ];

    let tiles = [(0, 0), (1, 0), (0, 1), (1, 1)]
        .into_iter()
        .map(|(x, y)| tile(UnwrappedTileId::new(1, x, y)))
        .collect();

    MemoryStyle::new(layers, vec![TileSource::new(SOURCE, tiles)])
}

fn tile(id: UnwrappedTileId) -> RenderTile {
    // Vary the shapes a little per tile.
    let seed = (id.canonical.x * 2 + id.canonical.y) as i16;
    RenderTile::new(id)
        .with_bucket("water", water(seed))
        .with_bucket("roads", road(seed))
        .with_bucket("places", places(seed))
}

fn water(seed: i16) -> FillBucket {
    let inset = EXTENT / 8 + seed * 256;
    let (lo, hi) = (inset, EXTENT - inset);
    let vertices = vec![
        FillVertex::new(lo, lo),
        FillVertex::new(hi, lo),
        FillVertex::new(hi, hi),
        FillVertex::new(lo, hi),
    ];
    FillBucket::new(
        vertices,
        vec![0, 1, 2, 0, 2, 3],
        vec![Segment::new(0, 0, 4, 2)],
        vec![0, 1, 1, 2, 2, 3, 3, 0],
        vec![Segment::new(0, 0, 4, 4)],
    )
}

fn road(seed: i16) -> LineBucket {
    let y = EXTENT / 4 + seed * (EXTENT / 8);
    let length = EXTENT as u16;
    let vertices = vec![
        LineVertex::new(0, y, [0.0, 1.0], 1, 0),
        LineVertex::new(0, y, [0.0, 1.0], -1, 0),
        LineVertex::new(EXTENT, y, [0.0, 1.0], 1, length),
        LineVertex::new(EXTENT, y, [0.0, 1.0], -1, length),
    ];
    LineBucket::new(vertices, vec![0, 1, 2, 1, 3, 2], vec![Segment::new(0, 0, 4, 2)])
}

fn places(seed: i16) -> CircleBucket {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for (i, step) in (1..=3i16).enumerate() {
        let x = step * EXTENT / 4;
        let y = EXTENT / 2 + (step - 2) * seed * 512;
        for (ex, ey) in [(-1, -1), (1, -1), (1, 1), (-1, 1)] {
            vertices.push(CircleVertex::new(x, y, ex, ey));
        }
        let base = (i * 4) as u16;
        indices.extend([base, base + 1, base + 2, base, base + 3, base + 2]);
    }
    let segment = Segment::new(0, 0, vertices.len(), indices.len() / 3);
    CircleBucket::new(vertices, indices, vec![segment])
}
