use serde::{Deserialize, Serialize};

/// RGBA color of a highlight symbol or a chart slice.
///
/// Serialized as a `#RRGGBBAA` string.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from_hex(&value).ok_or_else(|| format!("invalid color '{value}'"))
    }
}

impl From<Color> for String {
    fn from(val: Color) -> Self {
        val.to_hex()
    }
}

impl Color {
    /// `#00000000`
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    /// `#000000FF`
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    /// `#FFFFFFFF`
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    /// CSS `orange`: `#FFA500FF`
    pub const ORANGE: Color = Color::rgba(255, 165, 0, 255);
    /// CSS `green`: `#008000FF`
    pub const GREEN: Color = Color::rgba(0, 128, 0, 255);
    /// `#AAAAAAFF`
    pub const GRAY: Color = Color::rgba(170, 170, 170, 255);

    /// Constructs color from its RGBA channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Constructs an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Channels as `[r, g, b, a]`.
    pub fn to_u8_array(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Alpha channel as a fraction in `[0, 1]`.
    pub fn opacity(&self) -> f64 {
        self.a as f64 / 255.0
    }

    /// `#RRGGBBAA` string.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }

    /// CSS `rgba(r, g, b, opacity)` string.
    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.opacity())
    }

    /// Parses `#RRGGBB` or `#RRGGBBAA`.
    pub fn try_from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
            return None;
        }

        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        let a = if digits.len() == 8 { channel(6)? } else { 255 };

        Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// Same color with the given alpha channel.
    pub fn with_alpha(&self, a: u8) -> Self {
        Self { a, ..*self }
    }
}
