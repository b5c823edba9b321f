// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! RGBA color values and string parsing.
//!
//! Colors are stored as `f32` components in `0.0..=1.0`, matching the
//! layout of the per-vertex color buffers they are written into. Parsing
//! accepts a small set of named colors (plus matplotlib-style single-letter
//! shorthands) and `#RRGGBB` / `#RRGGBBAA` hex strings.

use alloc::string::{String, ToString};
use core::fmt;

/// RGBA color with `f32` components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgba {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Rgba {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque red.
    pub const RED: Self = Self::new(1.0, 0.0, 0.0, 1.0);
    /// Opaque green.
    pub const GREEN: Self = Self::new(0.0, 1.0, 0.0, 1.0);
    /// Opaque blue.
    pub const BLUE: Self = Self::new(0.0, 0.0, 1.0, 1.0);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a color from explicit components.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color.
    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Returns this color with its alpha replaced.
    #[must_use]
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Components as an array in buffer layout order.
    #[must_use]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Linear interpolation between two colors (alpha included).
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Parses a named color or `#RRGGBB` / `#RRGGBBAA` hex string.
    pub fn parse(input: &str) -> Result<Self, ColorError> {
        if let Some(hex) = input.strip_prefix('#') {
            return parse_hex(input, hex);
        }
        named(input).ok_or_else(|| ColorError::Unknown(input.to_string()))
    }
}

impl From<[f32; 4]> for Rgba {
    fn from(c: [f32; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

/// Errors from color parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColorError {
    /// The name is not in the named-color table.
    Unknown(String),
    /// A `#…` string is not 6 or 8 hex digits.
    BadHex(String),
}

impl fmt::Display for ColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(name) => write!(f, "unknown color name {name:?}"),
            Self::BadHex(input) => {
                write!(f, "invalid hex color {input:?} (expected #RRGGBB or #RRGGBBAA)")
            }
        }
    }
}

impl core::error::Error for ColorError {}

fn named(name: &str) -> Option<Rgba> {
    Some(match name {
        "white" | "w" => Rgba::WHITE,
        "black" | "k" => Rgba::BLACK,
        "red" | "r" => Rgba::RED,
        "green" | "g" => Rgba::GREEN,
        "blue" | "b" => Rgba::BLUE,
        "cyan" | "c" => Rgba::rgb(0.0, 1.0, 1.0),
        "magenta" | "m" => Rgba::rgb(1.0, 0.0, 1.0),
        "yellow" | "y" => Rgba::rgb(1.0, 1.0, 0.0),
        "orange" => Rgba::rgb(1.0, 0.647, 0.0),
        "purple" => Rgba::rgb(0.5, 0.0, 0.5),
        "gray" | "grey" => Rgba::rgb(0.5, 0.5, 0.5),
        "pink" => Rgba::rgb(1.0, 0.753, 0.796),
        "transparent" => Rgba::TRANSPARENT,
        _ => return None,
    })
}

fn parse_hex(input: &str, hex: &str) -> Result<Rgba, ColorError> {
    let channel = |offset: usize| -> Result<f32, ColorError> {
        let byte = u8::from_str_radix(&hex[offset..offset + 2], 16)
            .map_err(|_| ColorError::BadHex(input.to_string()))?;
        Ok(f32::from(byte) / 255.0)
    };
    match hex.len() {
        6 => Ok(Rgba::new(channel(0)?, channel(2)?, channel(4)?, 1.0)),
        8 => Ok(Rgba::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => Err(ColorError::BadHex(input.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_colors_parse() {
        assert_eq!(Rgba::parse("red").unwrap(), Rgba::RED);
        assert_eq!(Rgba::parse("w").unwrap(), Rgba::WHITE);
        assert_eq!(Rgba::parse("k").unwrap(), Rgba::BLACK);
    }

    #[test]
    fn hex_parses_with_and_without_alpha() {
        assert_eq!(Rgba::parse("#ff0000").unwrap(), Rgba::RED);
        let half = Rgba::parse("#00ff0080").unwrap();
        assert_eq!(half.g, 1.0);
        assert!((half.a - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn unknown_name_errors() {
        assert_eq!(
            Rgba::parse("chartreuse-ish"),
            Err(ColorError::Unknown("chartreuse-ish".to_string()))
        );
    }

    #[test]
    fn bad_hex_errors() {
        assert!(matches!(Rgba::parse("#12345"), Err(ColorError::BadHex(_))));
        assert!(matches!(Rgba::parse("#zzzzzz"), Err(ColorError::BadHex(_))));
    }

    #[test]
    fn with_alpha_keeps_rgb() {
        let c = Rgba::RED.with_alpha(0.25);
        assert_eq!((c.r, c.g, c.b, c.a), (1.0, 0.0, 0.0, 0.25));
    }

    #[test]
    fn lerp_endpoints() {
        assert_eq!(Rgba::BLACK.lerp(Rgba::WHITE, 0.0), Rgba::BLACK);
        assert_eq!(Rgba::BLACK.lerp(Rgba::WHITE, 1.0), Rgba::WHITE);
        let mid = Rgba::BLACK.lerp(Rgba::WHITE, 0.5);
        assert_eq!(mid.r, 0.5);
    }
}
