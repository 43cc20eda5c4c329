//! A programmatic rule-table implementation of [`RenderTheme`].
//!
//! Rules are declared in code rather than parsed from XML: each rule names
//! the element kind it applies to (node, closed way, linear way), a tag to
//! match, a zoom range, and the drawing instructions to emit on a match.
//! Rules are indexed by tag key for lookup.

use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex};

use fxhash::FxHashMap;

use crate::rendering::paint::{Color, Paint, Symbol};
use crate::theme::{RenderCallback, RenderTheme};
use crate::tiles::source::Tag;

/// Which feature kind a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Node,
    ClosedWay,
    LinearWay,
}

/// One drawing instruction emitted when its rule matches.
#[derive(Debug, Clone)]
pub enum Instruction {
    Way {
        paint: Paint,
        level: usize,
    },
    Area {
        paint: Paint,
        level: usize,
    },
    Circle {
        radius: f32,
        paint: Paint,
        level: usize,
    },
    /// Caption text taken from the value of `text_key` in the feature tags.
    /// Dispatched as a point caption for nodes and an area caption for
    /// closed ways.
    Caption {
        text_key: String,
        vertical_offset: f64,
        paint: Paint,
        halo: Option<Paint>,
    },
    Symbol {
        symbol: Symbol,
    },
    WaySymbol {
        symbol: Symbol,
        align_center: bool,
        repeat: bool,
    },
    WayText {
        text_key: String,
        paint: Paint,
        halo: Option<Paint>,
    },
}

/// A matching rule: element kind + tag + zoom range -> instructions.
#[derive(Debug, Clone)]
pub struct Rule {
    pub element: Element,
    pub key: String,
    /// `None` matches any value for the key.
    pub value: Option<String>,
    pub zoom: RangeInclusive<u8>,
    pub instructions: Vec<Instruction>,
}

impl Rule {
    pub fn new(element: Element, key: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            element,
            key: key.into(),
            value: value.map(str::to_owned),
            zoom: 0..=crate::constants::ZOOM_MAX,
            instructions: Vec::new(),
        }
    }

    pub fn zoom(mut self, zoom: RangeInclusive<u8>) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn instruction(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }
}

/// A paint that re-derives its shared copy when the scale factors change.
#[derive(Debug)]
struct PaintCell {
    base: Paint,
    current: Mutex<Arc<Paint>>,
}

impl PaintCell {
    fn new(base: Paint) -> Self {
        let current = Mutex::new(Arc::new(base.clone()));
        Self { base, current }
    }

    fn get(&self) -> Arc<Paint> {
        Arc::clone(&self.current.lock().expect("paint cell poisoned"))
    }

    fn rescale(&self, stroke_factor: f32, text_factor: f32) {
        let scaled = self
            .base
            .with_stroke_scale(stroke_factor)
            .with_text_scale(text_factor);
        *self.current.lock().expect("paint cell poisoned") = Arc::new(scaled);
    }
}

/// Internal compiled instruction referencing scaled paint cells.
#[derive(Debug)]
enum Compiled {
    Way {
        paint: PaintCell,
        level: usize,
    },
    Area {
        paint: PaintCell,
        level: usize,
    },
    Circle {
        radius: f32,
        paint: PaintCell,
        level: usize,
    },
    Caption {
        text_key: String,
        vertical_offset: f64,
        paint: PaintCell,
        halo: Option<PaintCell>,
    },
    Symbol {
        symbol: Symbol,
    },
    WaySymbol {
        symbol: Symbol,
        align_center: bool,
        repeat: bool,
    },
    WayText {
        text_key: String,
        paint: PaintCell,
        halo: Option<PaintCell>,
    },
}

struct CompiledRule {
    element: Element,
    value: Option<String>,
    zoom: RangeInclusive<u8>,
    instructions: Vec<Compiled>,
}

/// Rule-table render theme. Construct with [`RuleThemeBuilder`].
pub struct RuleTheme {
    background: Color,
    levels: usize,
    /// Rules indexed by the tag key they match on.
    rules: FxHashMap<String, Vec<CompiledRule>>,
    stroke_factor: Mutex<f32>,
    text_factor: Mutex<f32>,
}

impl RuleTheme {
    pub fn builder() -> RuleThemeBuilder {
        RuleThemeBuilder::default()
    }

    fn match_element(
        &self,
        element: Element,
        callback: &mut dyn RenderCallback,
        tags: &[Tag],
        zoom: u8,
    ) {
        for tag in tags {
            let Some(candidates) = self.rules.get(&tag.key) else {
                continue;
            };
            for rule in candidates {
                if rule.element != element || !rule.zoom.contains(&zoom) {
                    continue;
                }
                if let Some(value) = &rule.value {
                    if *value != tag.value {
                        continue;
                    }
                }
                for instruction in &rule.instructions {
                    Self::emit(instruction, element, callback, tags);
                }
            }
        }
    }

    fn emit(
        instruction: &Compiled,
        element: Element,
        callback: &mut dyn RenderCallback,
        tags: &[Tag],
    ) {
        match instruction {
            Compiled::Way { paint, level } => callback.render_way(paint.get(), *level),
            Compiled::Area { paint, level } => callback.render_area(paint.get(), *level),
            Compiled::Circle {
                radius,
                paint,
                level,
            } => callback.render_point_of_interest_circle(*radius, paint.get(), *level),
            Compiled::Caption {
                text_key,
                vertical_offset,
                paint,
                halo,
            } => {
                let Some(caption) = tag_value(tags, text_key) else {
                    return;
                };
                let halo = halo.as_ref().map(PaintCell::get);
                if element == Element::Node {
                    callback.render_point_of_interest_caption(
                        caption,
                        *vertical_offset,
                        paint.get(),
                        halo,
                    );
                } else {
                    callback.render_area_caption(caption, *vertical_offset, paint.get(), halo);
                }
            }
            Compiled::Symbol { symbol } => {
                if element == Element::Node {
                    callback.render_point_of_interest_symbol(symbol.clone());
                } else {
                    callback.render_area_symbol(symbol.clone());
                }
            }
            Compiled::WaySymbol {
                symbol,
                align_center,
                repeat,
            } => callback.render_way_symbol(symbol.clone(), *align_center, *repeat),
            Compiled::WayText {
                text_key,
                paint,
                halo,
            } => {
                if let Some(text) = tag_value(tags, text_key) {
                    callback.render_way_text(text, paint.get(), halo.as_ref().map(PaintCell::get));
                }
            }
        }
    }

    fn rescale_all(&self) {
        let stroke = *self.stroke_factor.lock().expect("factor poisoned");
        let text = *self.text_factor.lock().expect("factor poisoned");
        for rules in self.rules.values() {
            for rule in rules {
                for instruction in &rule.instructions {
                    for cell in instruction_cells(instruction) {
                        cell.rescale(stroke, text);
                    }
                }
            }
        }
    }
}

fn tag_value<'t>(tags: &'t [Tag], key: &str) -> Option<&'t str> {
    tags.iter()
        .find(|tag| tag.key == key)
        .map(|tag| tag.value.as_str())
}

fn instruction_cells(instruction: &Compiled) -> Vec<&PaintCell> {
    match instruction {
        Compiled::Way { paint, .. }
        | Compiled::Area { paint, .. }
        | Compiled::Circle { paint, .. } => vec![paint],
        Compiled::Caption { paint, halo, .. } | Compiled::WayText { paint, halo, .. } => {
            let mut cells = vec![paint];
            if let Some(halo) = halo {
                cells.push(halo);
            }
            cells
        }
        Compiled::Symbol { .. } | Compiled::WaySymbol { .. } => Vec::new(),
    }
}

impl RenderTheme for RuleTheme {
    fn levels(&self) -> usize {
        self.levels
    }

    fn map_background(&self) -> Color {
        self.background
    }

    fn match_node(&self, callback: &mut dyn RenderCallback, tags: &[Tag], zoom: u8) {
        self.match_element(Element::Node, callback, tags, zoom);
    }

    fn match_closed_way(&self, callback: &mut dyn RenderCallback, tags: &[Tag], zoom: u8) {
        self.match_element(Element::ClosedWay, callback, tags, zoom);
    }

    fn match_linear_way(&self, callback: &mut dyn RenderCallback, tags: &[Tag], zoom: u8) {
        self.match_element(Element::LinearWay, callback, tags, zoom);
    }

    fn scale_stroke_width(&self, factor: f32) {
        *self.stroke_factor.lock().expect("factor poisoned") = factor;
        self.rescale_all();
    }

    fn scale_text_size(&self, factor: f32) {
        *self.text_factor.lock().expect("factor poisoned") = factor;
        self.rescale_all();
    }
}

/// Builder assembling a [`RuleTheme`] from rules.
#[derive(Default)]
pub struct RuleThemeBuilder {
    background: Option<Color>,
    levels: usize,
    rules: Vec<Rule>,
}

impl RuleThemeBuilder {
    pub fn background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    /// Number of drawing levels per layer. Must cover every level used by
    /// the rules; instructions at higher levels are dropped at render time.
    pub fn levels(mut self, levels: usize) -> Self {
        self.levels = levels;
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn build(self) -> RuleTheme {
        let mut rules: FxHashMap<String, Vec<CompiledRule>> = FxHashMap::default();
        let mut max_level = 0;
        for rule in self.rules {
            let instructions = rule
                .instructions
                .into_iter()
                .map(|instruction| compile(instruction, &mut max_level))
                .collect();
            rules.entry(rule.key).or_default().push(CompiledRule {
                element: rule.element,
                value: rule.value,
                zoom: rule.zoom,
                instructions,
            });
        }

        RuleTheme {
            background: self.background.unwrap_or(Color::WHITE),
            levels: self.levels.max(max_level + 1),
            rules,
            stroke_factor: Mutex::new(1.0),
            text_factor: Mutex::new(1.0),
        }
    }
}

fn compile(instruction: Instruction, max_level: &mut usize) -> Compiled {
    match instruction {
        Instruction::Way { paint, level } => {
            *max_level = (*max_level).max(level);
            Compiled::Way {
                paint: PaintCell::new(paint),
                level,
            }
        }
        Instruction::Area { paint, level } => {
            *max_level = (*max_level).max(level);
            Compiled::Area {
                paint: PaintCell::new(paint),
                level,
            }
        }
        Instruction::Circle {
            radius,
            paint,
            level,
        } => {
            *max_level = (*max_level).max(level);
            Compiled::Circle {
                radius,
                paint: PaintCell::new(paint),
                level,
            }
        }
        Instruction::Caption {
            text_key,
            vertical_offset,
            paint,
            halo,
        } => Compiled::Caption {
            text_key,
            vertical_offset,
            paint: PaintCell::new(paint),
            halo: halo.map(PaintCell::new),
        },
        Instruction::Symbol { symbol } => Compiled::Symbol { symbol },
        Instruction::WaySymbol {
            symbol,
            align_center,
            repeat,
        } => Compiled::WaySymbol {
            symbol,
            align_center,
            repeat,
        },
        Instruction::WayText {
            text_key,
            paint,
            halo,
        } => Compiled::WayText {
            text_key,
            paint: PaintCell::new(paint),
            halo: halo.map(PaintCell::new),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc as StdArc;

    #[derive(Default)]
    struct Recorder {
        ways: Vec<(f32, usize)>,
        captions: Vec<String>,
        way_texts: Vec<String>,
    }

    impl RenderCallback for Recorder {
        fn render_way(&mut self, paint: StdArc<Paint>, level: usize) {
            self.ways.push((paint.stroke_width, level));
        }
        fn render_area(&mut self, _paint: StdArc<Paint>, _level: usize) {}
        fn render_point_of_interest_circle(
            &mut self,
            _radius: f32,
            _paint: StdArc<Paint>,
            _level: usize,
        ) {
        }
        fn render_point_of_interest_caption(
            &mut self,
            caption: &str,
            _vertical_offset: f64,
            _paint: StdArc<Paint>,
            _halo: Option<StdArc<Paint>>,
        ) {
            self.captions.push(caption.to_owned());
        }
        fn render_point_of_interest_symbol(&mut self, _symbol: Symbol) {}
        fn render_area_caption(
            &mut self,
            _caption: &str,
            _vertical_offset: f64,
            _paint: StdArc<Paint>,
            _halo: Option<StdArc<Paint>>,
        ) {
        }
        fn render_area_symbol(&mut self, _symbol: Symbol) {}
        fn render_way_symbol(&mut self, _symbol: Symbol, _align_center: bool, _repeat: bool) {}
        fn render_way_text(
            &mut self,
            text: &str,
            _paint: StdArc<Paint>,
            _halo: Option<StdArc<Paint>>,
        ) {
            self.way_texts.push(text.to_owned());
        }
    }

    fn highway_theme() -> RuleTheme {
        RuleTheme::builder()
            .background(Color::WHITE)
            .rule(
                Rule::new(Element::LinearWay, "highway", Some("primary"))
                    .zoom(10..=22)
                    .instruction(Instruction::Way {
                        paint: Paint::stroke(Color::BLACK, 2.0),
                        level: 1,
                    }),
            )
            .rule(
                Rule::new(Element::Node, "place", None).instruction(Instruction::Caption {
                    text_key: "name".into(),
                    vertical_offset: 0.0,
                    paint: Paint::default(),
                    halo: None,
                }),
            )
            .build()
    }

    #[test]
    fn test_zoom_gating() {
        let theme = highway_theme();
        let tags = vec![Tag::new("highway", "primary")];
        let mut recorder = Recorder::default();
        theme.match_linear_way(&mut recorder, &tags, 9);
        assert!(recorder.ways.is_empty());
        theme.match_linear_way(&mut recorder, &tags, 10);
        assert_eq!(recorder.ways, vec![(2.0, 1)]);
    }

    #[test]
    fn test_element_separation() {
        let theme = highway_theme();
        let tags = vec![Tag::new("highway", "primary")];
        let mut recorder = Recorder::default();
        theme.match_closed_way(&mut recorder, &tags, 15);
        theme.match_node(&mut recorder, &tags, 15);
        assert!(recorder.ways.is_empty());
    }

    #[test]
    fn test_caption_resolves_text_key() {
        let theme = highway_theme();
        let mut recorder = Recorder::default();
        let tags = vec![Tag::new("place", "town"), Tag::new("name", "Springfield")];
        theme.match_node(&mut recorder, &tags, 14);
        assert_eq!(recorder.captions, vec!["Springfield".to_owned()]);

        // a matching rule without the text key emits nothing
        let mut recorder = Recorder::default();
        theme.match_node(&mut recorder, &[Tag::new("place", "town")], 14);
        assert!(recorder.captions.is_empty());
    }

    #[test]
    fn test_stroke_rescale_relative_to_base() {
        let theme = highway_theme();
        let tags = vec![Tag::new("highway", "primary")];

        theme.scale_stroke_width(1.5);
        let mut recorder = Recorder::default();
        theme.match_linear_way(&mut recorder, &tags, 15);
        assert_eq!(recorder.ways, vec![(3.0, 1)]);

        // factors are absolute against the base width, not cumulative
        theme.scale_stroke_width(1.5);
        let mut recorder = Recorder::default();
        theme.match_linear_way(&mut recorder, &tags, 15);
        assert_eq!(recorder.ways, vec![(3.0, 1)]);
    }

    #[test]
    fn test_levels_cover_rules() {
        let theme = highway_theme();
        assert!(theme.levels() >= 2);
    }
}
