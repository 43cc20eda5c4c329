use std::sync::Arc;

use vectile::core::geo::{pixel_x_to_longitude, pixel_y_to_latitude};
use vectile::rendering::paint::{Color, Paint};
use vectile::theme::rules::{Element, Instruction, Rule, RuleTheme};
use vectile::tiles::source::{PointFeature, Tag, WayFeature};
use vectile::{
    DebugSettings, LatLng, RenderJob, RenderTheme, Tile, TileData, TileRenderer, TileSource,
};

/// Integration tests driving the whole tile pipeline: dataset -> theme
/// matching -> decoration -> rasterization, asserting on output pixels.
mod pipeline {
    use super::*;

    const BACKGROUND: Color = Color::rgb(240, 240, 230);
    const WATER: Color = Color::rgb(170, 211, 223);
    const ROAD: Color = Color::rgb(255, 0, 0);

    struct FixtureSource {
        data: TileData,
    }

    impl TileSource for FixtureSource {
        fn read_tile(&self, _tile: &Tile) -> Option<TileData> {
            Some(self.data.clone())
        }
    }

    fn fixture_theme() -> Arc<dyn RenderTheme> {
        Arc::new(
            RuleTheme::builder()
                .background(BACKGROUND)
                .rule(
                    Rule::new(Element::LinearWay, "highway", None).instruction(Instruction::Way {
                        paint: Paint::stroke(ROAD, 4.0),
                        level: 1,
                    }),
                )
                .rule(
                    Rule::new(Element::ClosedWay, "natural", Some("water")).instruction(
                        Instruction::Area {
                            paint: Paint::fill(WATER),
                            level: 0,
                        },
                    ),
                )
                .rule(
                    Rule::new(Element::Node, "place", None).instruction(Instruction::Caption {
                        text_key: "name".into(),
                        vertical_offset: 0.0,
                        paint: Paint {
                            color: Color::BLACK,
                            text_size: 14.0,
                            ..Paint::default()
                        },
                        halo: None,
                    }),
                )
                .build(),
        )
    }

    /// Geographic position of a tile-pixel coordinate inside `tile`.
    fn latlng_at(tile: &Tile, px: f64, py: f64) -> LatLng {
        let origin = tile.pixel_origin();
        LatLng::new(
            pixel_y_to_latitude(origin.y + py, tile.zoom),
            pixel_x_to_longitude(origin.x + px, tile.zoom),
        )
    }

    fn renderer_for(data: TileData) -> TileRenderer {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut renderer = TileRenderer::new(Arc::new(FixtureSource { data }));
        renderer.set_theme(fixture_theme());
        renderer
    }

    fn pixel_color(pixmap: &tiny_skia::Pixmap, x: u32, y: u32) -> Color {
        let pixel = pixmap.pixel(x, y).expect("in bounds").demultiply();
        Color::new(pixel.red(), pixel.green(), pixel.blue(), pixel.alpha())
    }

    #[test]
    fn test_water_tile_renders_water_fill() {
        let mut renderer = renderer_for(TileData {
            is_water: true,
            ..TileData::default()
        });
        let pixmap = renderer
            .render_tile(&RenderJob::new(Tile::new(5, 5, 4)))
            .expect("render");

        // the synthesized full-extent polygon covers the whole tile
        assert_eq!(pixel_color(&pixmap, 128, 128), WATER);
        assert_eq!(pixel_color(&pixmap, 10, 245), WATER);
    }

    #[test]
    fn test_road_strokes_reach_pixels() {
        let tile = Tile::new(4000, 4000, 14);
        let road = WayFeature {
            rings: vec![vec![
                latlng_at(&tile, 20.0, 128.0),
                latlng_at(&tile, 236.0, 128.0),
            ]],
            layer: 5,
            tags: vec![Tag::new("highway", "primary")],
        };
        let mut renderer = renderer_for(TileData {
            ways: vec![road],
            ..TileData::default()
        });
        let pixmap = renderer
            .render_tile(&RenderJob::new(tile))
            .expect("render");

        // stroke width 4 is scaled up at zoom 14, so the center row is road
        let center = pixel_color(&pixmap, 128, 128);
        assert_eq!(center.r, ROAD.r);
        // away from the road the background shows
        assert_eq!(pixel_color(&pixmap, 128, 20), BACKGROUND);
    }

    #[test]
    fn test_caption_draws_ink() {
        let tile = Tile::new(4000, 4000, 14);
        let town = PointFeature {
            position: latlng_at(&tile, 128.0, 128.0),
            layer: 5,
            tags: vec![Tag::new("place", "town"), Tag::new("name", "Riverton")],
        };
        let mut renderer = renderer_for(TileData {
            points: vec![town],
            ..TileData::default()
        });
        let pixmap = renderer
            .render_tile(&RenderJob::new(tile))
            .expect("render");

        let background = BACKGROUND.to_skia().premultiply().to_color_u8();
        let inked = pixmap
            .pixels()
            .iter()
            .filter(|pixel| **pixel != background)
            .count();
        assert!(inked > 0, "caption text should leave glyph pixels");
    }

    #[test]
    fn test_without_theme_rendering_fails_until_theme_returns() {
        let mut renderer = renderer_for(TileData::default());
        renderer.clear_theme();
        assert!(renderer.render_tile(&RenderJob::new(Tile::new(0, 0, 1))).is_err());

        renderer.set_theme(fixture_theme());
        assert!(renderer.render_tile(&RenderJob::new(Tile::new(0, 0, 1))).is_ok());
    }

    #[test]
    fn test_debug_overlays_draw_over_background() {
        let mut renderer = renderer_for(TileData::default());
        let job = RenderJob {
            tile: Tile::new(17, 42, 7),
            text_scale: 1.0,
            debug: DebugSettings {
                draw_tile_frame: true,
                draw_tile_coordinates: true,
            },
        };
        let pixmap = renderer.render_tile(&job).expect("render");

        let background = BACKGROUND.to_skia().premultiply().to_color_u8();
        let inked = pixmap
            .pixels()
            .iter()
            .filter(|pixel| **pixel != background)
            .count();
        assert!(inked > 0, "frame and coordinate labels should be visible");
    }

    #[test]
    fn test_same_job_renders_identically() {
        let tile = Tile::new(4000, 4000, 14);
        let road = WayFeature {
            rings: vec![vec![
                latlng_at(&tile, 20.0, 40.0),
                latlng_at(&tile, 200.0, 220.0),
            ]],
            layer: 0,
            tags: vec![Tag::new("highway", "residential")],
        };
        let mut renderer = renderer_for(TileData {
            ways: vec![road],
            ..TileData::default()
        });

        let first = renderer.render_tile(&RenderJob::new(tile)).expect("render");
        let second = renderer.render_tile(&RenderJob::new(tile)).expect("render");
        assert_eq!(first.data(), second.data());
    }
}
