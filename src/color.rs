use serde::{Deserialize, Serialize};

use crate::error::{FrameshotError, FrameshotResult};

/// Straight-alpha RGBA color.
///
/// Serializes as a `#RRGGBB`/`#RRGGBBAA` hex string, which is how colors
/// arrive from appearance config and the CLI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (case-insensitive, `#` optional).
    pub fn from_hex(s: &str) -> FrameshotResult<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);

        fn hex_byte(pair: &str) -> FrameshotResult<u8> {
            u8::from_str_radix(pair, 16)
                .map_err(|_| FrameshotError::config(format!("invalid hex byte \"{pair}\"")))
        }

        match s.len() {
            6 => Ok(Self {
                r: hex_byte(&s[0..2])?,
                g: hex_byte(&s[2..4])?,
                b: hex_byte(&s[4..6])?,
                a: 255,
            }),
            8 => Ok(Self {
                r: hex_byte(&s[0..2])?,
                g: hex_byte(&s[2..4])?,
                b: hex_byte(&s[4..6])?,
                a: hex_byte(&s[6..8])?,
            }),
            _ => Err(FrameshotError::config(
                "hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)",
            )),
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Scale the alpha channel by a percentage in `0..=100`.
    pub fn with_opacity_pct(self, pct: u8) -> Self {
        let pct = u16::from(pct.min(100));
        Self {
            a: ((u16::from(self.a) * pct + 50) / 100) as u8,
            ..self
        }
    }

    /// Premultiplied RGBA8 bytes.
    pub fn premul(self) -> [u8; 4] {
        let a = u16::from(self.a);
        if a == 0 {
            return [0, 0, 0, 0];
        }
        let mul = |c: u8| ((u16::from(c) * a + 127) / 255) as u8;
        [mul(self.r), mul(self.g), mul(self.b), self.a]
    }
}

impl TryFrom<String> for Color {
    type Error = FrameshotError;

    fn try_from(s: String) -> FrameshotResult<Self> {
        Self::from_hex(&s)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> String {
        c.to_hex()
    }
}
