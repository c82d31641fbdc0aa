use serde::{Deserialize, Serialize};

/// Straight (non-premultiplied) RGBA colour with 8 bits per channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u8, pub u8, pub u8, pub u8);

impl Color {
    pub const TRANSPARENT: Color = Color(0, 0, 0, 0);
    pub const BLACK: Color = Color(0, 0, 0, 255);
    pub const WHITE: Color = Color(255, 255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color(r, g, b, 255)
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color(r, g, b, a)
    }

    pub fn alpha(self) -> u8 {
        self.3
    }

    pub fn is_transparent(self) -> bool {
        self.3 == 0
    }

    /// Parses `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        match digits.len() {
            6 => Some(Color(channel(0)?, channel(2)?, channel(4)?, 255)),
            8 => Some(Color(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    /// Source-over blend of `self` onto `dst`.
    pub fn over(self, dst: Color) -> Color {
        let sa = self.3 as u32;
        if sa == 255 {
            return self;
        }
        if sa == 0 {
            return dst;
        }
        let inv = 255 - sa;
        let mix = |s: u8, d: u8| ((s as u32 * sa + d as u32 * inv) / 255) as u8;
        Color(
            mix(self.0, dst.0),
            mix(self.1, dst.1),
            mix(self.2, dst.2),
            (sa + dst.3 as u32 * inv / 255).min(255) as u8,
        )
    }

    /// Perceived brightness in `0..=255`, used by text-mode backends to pick shading.
    pub fn luma(self) -> u8 {
        ((self.0 as u32 * 299 + self.1 as u32 * 587 + self.2 as u32 * 114) / 1000) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(Color::from_hex("#ff8000"), Some(Color(255, 128, 0, 255)));
        assert_eq!(Color::from_hex("#10203040"), Some(Color(16, 32, 48, 64)));
        assert_eq!(Color::from_hex("ff8000"), None);
        assert_eq!(Color::from_hex("#ff80"), None);
    }

    #[test]
    fn opaque_source_replaces_destination() {
        assert_eq!(Color::WHITE.over(Color::BLACK), Color::WHITE);
        assert_eq!(Color::TRANSPARENT.over(Color::BLACK), Color::BLACK);
    }
}
