use crate::data_types::match_category::{MatchCategory, SegmentKind};

use lazy_static::lazy_static;
use rustc_hash::FxHashMap as HashMap;
use serde::{Serialize, Serializer};

/// Named colors we accept, listed in the order used when converting back to a name
const NAMED_COLOR_TABLE: [(&str, [u8; 3]); 24] = [
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("darkred", [139, 0, 0]),
    ("orange", [255, 165, 0]),
    ("yellow", [255, 255, 0]),
    ("gold", [255, 215, 0]),
    ("green", [0, 128, 0]),
    ("forestgreen", [34, 139, 34]),
    ("limegreen", [50, 205, 50]),
    ("lime", [0, 255, 0]),
    ("darkgreen", [0, 100, 0]),
    ("blue", [0, 0, 255]),
    ("navy", [0, 0, 128]),
    ("lightsteelblue", [176, 196, 222]),
    ("skyblue", [135, 206, 235]),
    ("purple", [128, 0, 128]),
    ("magenta", [255, 0, 255]),
    ("cyan", [0, 255, 255]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("lightgray", [211, 211, 211]),
    ("darkgray", [169, 169, 169]),
    ("brown", [165, 42, 42])
];

lazy_static! {
    /// Lookup from lower-case color name to RGB
    static ref NAMED_COLORS: HashMap<&'static str, Color> = NAMED_COLOR_TABLE.iter()
        .map(|&(name, [r, g, b])| (name, Color::new(r, g, b)))
        .collect();
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ColorError {
    #[error("unknown color {0:?}, expected a color name or #RRGGBB")]
    UnknownColor(String)
}

/// An RGB color for one pixel column
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Color {
    r: u8,
    g: u8,
    b: u8
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b }
    }

    /// Parses either a known color name (case-insensitive) or a "#RRGGBB" hex string.
    /// # Errors
    /// * if the value is neither a known name nor a valid hex color
    pub fn parse(value: &str) -> Result<Color, ColorError> {
        let trimmed = value.trim();
        if let Some(hex) = trimmed.strip_prefix('#') {
            if hex.len() == 6 && hex.is_ascii() {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i+2], 16);
                if let (Ok(r), Ok(g), Ok(b)) = (channel(0), channel(2), channel(4)) {
                    return Ok(Color::new(r, g, b));
                }
            }
            return Err(ColorError::UnknownColor(value.to_string()));
        }

        NAMED_COLORS.get(trimmed.to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| ColorError::UnknownColor(value.to_string()))
    }

    /// Shortcut for the built-in names, panics on anything not in the table.
    /// Only used for compile-time defaults.
    fn named(name: &str) -> Color {
        *NAMED_COLORS.get(name).expect("a built-in color name")
    }

    pub fn rgb(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Returns the first table name for this color, if there is one
    pub fn name(&self) -> Option<&'static str> {
        NAMED_COLOR_TABLE.iter()
            .find(|(_name, rgb)| *rgb == self.rgb())
            .map(|(name, _rgb)| *name)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The full color configuration: one raw color per match category and one color per segment outcome
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColorPalette {
    /// Indexed by `MatchCategory as usize`
    raw_colors: [Color; MatchCategory::HalfMatch as usize + 1],
    /// Painted over no-match runs
    no_match_segment: Color,
    /// Painted over full-match runs
    full_match_segment: Color,
    /// Everything that no run claims
    half_match_segment: Color
}

impl Default for ColorPalette {
    fn default() -> Self {
        let gray = Color::named("gray");
        ColorPalette {
            raw_colors: [
                gray, // no_call
                gray, // delete
                gray, // insert
                Color::named("orange"), // missing
                Color::named("forestgreen"), // full_match
                Color::named("red"), // no_match
                Color::named("yellow") // half_match
            ],
            no_match_segment: Color::named("red"),
            full_match_segment: Color::named("limegreen"),
            half_match_segment: Color::named("yellow")
        }
    }
}

impl ColorPalette {
    /// The raw (per-row) color for a category
    pub fn raw_color(&self, category: MatchCategory) -> Color {
        self.raw_colors[category as usize]
    }

    pub fn set_raw_color(&mut self, category: MatchCategory, color: Color) {
        self.raw_colors[category as usize] = color;
    }

    /// The color painted over a qualifying run of the given kind
    pub fn segment_color(&self, kind: SegmentKind) -> Color {
        match kind {
            SegmentKind::NoMatch => self.no_match_segment,
            SegmentKind::FullMatch => self.full_match_segment
        }
    }

    pub fn set_segment_color(&mut self, kind: SegmentKind, color: Color) {
        match kind {
            SegmentKind::NoMatch => self.no_match_segment = color,
            SegmentKind::FullMatch => self.full_match_segment = color
        };
    }

    /// The color for rows that no segment claims
    pub fn default_segment_color(&self) -> Color {
        self.half_match_segment
    }

    pub fn set_default_segment_color(&mut self, color: Color) {
        self.half_match_segment = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_colors() {
        assert_eq!(Color::parse("red").unwrap(), Color::new(255, 0, 0));
        assert_eq!(Color::parse("LimeGreen").unwrap(), Color::new(50, 205, 50));
        assert_eq!(Color::parse("#228B22").unwrap(), Color::parse("forestgreen").unwrap());
        assert_eq!(Color::parse("#0a0b0c").unwrap(), Color::new(10, 11, 12));
        assert!(Color::parse("reddish").is_err());
        assert!(Color::parse("#12345").is_err());
        assert!(Color::parse("#gggggg").is_err());
    }

    #[test]
    fn test_color_display() {
        // gray and grey share an RGB, the first table entry wins
        assert_eq!(Color::parse("grey").unwrap().to_string(), "gray");
        assert_eq!(Color::new(10, 11, 12).to_string(), "#0a0b0c");
        assert_eq!(Color::new(10, 11, 12).name(), None);
    }

    #[test]
    fn test_default_palette() {
        let palette = ColorPalette::default();
        assert_eq!(palette.raw_color(MatchCategory::NoMatch).to_string(), "red");
        assert_eq!(palette.raw_color(MatchCategory::FullMatch).to_string(), "forestgreen");
        assert_eq!(palette.raw_color(MatchCategory::HalfMatch).to_string(), "yellow");
        assert_eq!(palette.raw_color(MatchCategory::Missing).to_string(), "orange");
        assert_eq!(palette.raw_color(MatchCategory::NoCall).to_string(), "gray");
        assert_eq!(palette.segment_color(SegmentKind::NoMatch).to_string(), "red");
        assert_eq!(palette.segment_color(SegmentKind::FullMatch).to_string(), "limegreen");
        assert_eq!(palette.default_segment_color().to_string(), "yellow");

        let mut palette = palette;
        palette.set_raw_color(MatchCategory::Delete, Color::new(1, 2, 3));
        assert_eq!(palette.raw_color(MatchCategory::Delete), Color::new(1, 2, 3));
        assert_eq!(palette.raw_color(MatchCategory::Insert).to_string(), "gray");
    }
}
