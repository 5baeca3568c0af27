use eframe::egui::Color32;
use std::fmt;

// ============================================================================
// Rgb: opaque canvas color
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `rgb(r, g, b)`, `#rrggbb` or `#rgb`.
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        let inner = s.strip_prefix("rgb(")?.strip_suffix(')')?;
        let mut parts = inner.split(',').map(|p| p.trim().parse::<u8>());
        let r = parts.next()?.ok()?;
        let g = parts.next()?.ok()?;
        let b = parts.next()?.ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(r, g, b))
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            // #abc expands each digit: a -> aa
            3 => {
                let r = channel(&hex[0..1])?;
                let g = channel(&hex[1..2])?;
                let b = channel(&hex[2..3])?;
                Some(Self::new(r * 17, g * 17, b * 17))
            }
            _ => None,
        }
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Rgb> for Color32 {
    fn from(c: Rgb) -> Self {
        Color32::from_rgb(c.r, c.g, c.b)
    }
}

impl From<image::Rgba<u8>> for Rgb {
    fn from(px: image::Rgba<u8>) -> Self {
        Self::new(px[0], px[1], px[2])
    }
}

impl From<Rgb> for image::Rgba<u8> {
    fn from(c: Rgb) -> Self {
        image::Rgba([c.r, c.g, c.b, 255])
    }
}

/// Quick-select swatches next to the color picker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    Red,
    Blue,
}

impl Preset {
    pub const fn color(self) -> Rgb {
        match self {
            Preset::Red => Rgb::new(254, 1, 96),
            Preset::Blue => Rgb::new(0, 128, 255),
        }
    }

    pub fn all() -> &'static [Preset] {
        &[Preset::Red, Preset::Blue]
    }
}

// ============================================================================
// ColorState: current / previous pair
// ============================================================================

/// The active drawing color and the one it replaced.
///
/// `previous` is `None` until a color has been picked, and again right after a
/// swap consumed it. Swapping is only offered while it is `Some`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorState {
    pub current: Rgb,
    pub previous: Option<Rgb>,
}

impl Default for ColorState {
    fn default() -> Self {
        Self {
            current: Rgb::BLACK,
            previous: None,
        }
    }
}

impl ColorState {
    pub fn new(current: Rgb, previous: Option<Rgb>) -> Self {
        Self { current, previous }
    }

    pub fn pick(&mut self, color: Rgb) {
        self.previous = Some(self.current);
        self.current = color;
    }

    /// Restore the previous color. Returns `false` (and changes nothing) when
    /// there is none.
    pub fn swap(&mut self) -> bool {
        match self.previous.take() {
            Some(prev) => {
                self.current = prev;
                true
            }
            None => false,
        }
    }

    pub fn preset(&mut self, preset: Preset) {
        self.pick(preset.color());
    }

    /// Adopt a color sampled from the canvas.
    pub fn eyedrop(&mut self, sampled: Rgb) {
        self.pick(sampled);
    }

    pub fn can_swap(&self) -> bool {
        self.previous.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_css_and_hex_forms() {
        assert_eq!(Rgb::parse("rgb(254, 1, 96)"), Some(Rgb::new(254, 1, 96)));
        assert_eq!(Rgb::parse("rgb(0,128,255)"), Some(Rgb::new(0, 128, 255)));
        assert_eq!(Rgb::parse("#ff8000"), Some(Rgb::new(255, 128, 0)));
        assert_eq!(Rgb::parse("#fff"), Some(Rgb::WHITE));
        assert_eq!(Rgb::parse("#FfF"), Some(Rgb::WHITE));
    }

    #[test]
    fn rejects_malformed_colors() {
        for bad in ["", "none", "rgb(1, 2)", "rgb(1, 2, 3, 4)", "rgb(256, 0, 0)", "#12345", "#ggg", "#ééé"] {
            assert_eq!(Rgb::parse(bad), None, "{bad:?} should not parse");
        }
    }

    #[test]
    fn display_is_parseable() {
        let c = Rgb::new(12, 200, 7);
        assert_eq!(c.to_string(), "rgb(12, 200, 7)");
        assert_eq!(Rgb::parse(&c.to_string()), Some(c));
    }

    #[test]
    fn swap_without_previous_is_noop() {
        let mut colors = ColorState::default();
        assert!(!colors.can_swap());
        assert!(!colors.swap());
        assert_eq!(colors, ColorState::default());
    }

    #[test]
    fn pick_then_swap_restores_and_consumes_previous() {
        let mut colors = ColorState::default();
        colors.pick(Rgb::new(1, 2, 3));
        assert_eq!(colors.previous, Some(Rgb::BLACK));
        assert!(colors.can_swap());

        assert!(colors.swap());
        assert_eq!(colors.current, Rgb::BLACK);
        assert_eq!(colors.previous, None);
        assert!(!colors.swap());
    }

    #[test]
    fn presets_and_eyedrop_behave_like_pick() {
        let mut colors = ColorState::default();
        colors.preset(Preset::Red);
        assert_eq!(colors.current, Preset::Red.color());
        colors.preset(Preset::Blue);
        assert_eq!(colors.previous, Some(Preset::Red.color()));
        colors.eyedrop(Rgb::WHITE);
        assert_eq!(colors, ColorState::new(Rgb::WHITE, Some(Preset::Blue.color())));
    }
}
