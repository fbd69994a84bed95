//! Color parsing for border and background options.

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::ColorError;

/// Fully transparent white, the default canvas background.
pub const TRANSPARENT_WHITE: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// CSS basic color keywords accepted as already-resolved color tokens.
const NAMED_COLORS: &[(&str, [u8; 4])] = &[
    ("transparent", [0, 0, 0, 0]),
    ("black", [0, 0, 0, 255]),
    ("white", [255, 255, 255, 255]),
    ("red", [255, 0, 0, 255]),
    ("lime", [0, 255, 0, 255]),
    ("green", [0, 128, 0, 255]),
    ("blue", [0, 0, 255, 255]),
    ("yellow", [255, 255, 0, 255]),
    ("cyan", [0, 255, 255, 255]),
    ("aqua", [0, 255, 255, 255]),
    ("magenta", [255, 0, 255, 255]),
    ("fuchsia", [255, 0, 255, 255]),
    ("silver", [192, 192, 192, 255]),
    ("gray", [128, 128, 128, 255]),
    ("grey", [128, 128, 128, 255]),
    ("maroon", [128, 0, 0, 255]),
    ("olive", [128, 128, 0, 255]),
    ("purple", [128, 0, 128, 255]),
    ("teal", [0, 128, 128, 255]),
    ("navy", [0, 0, 128, 255]),
    ("orange", [255, 165, 0, 255]),
];

/// Parse a color string.
///
/// `#RRGGBB` is opaque, `#RRGGBBAA` carries its own alpha. Strings without a
/// leading `#` are looked up as color names.
pub fn parse_color(input: &str) -> Result<Rgba<u8>, ColorError> {
    let trimmed = input.trim();
    match trimmed.strip_prefix('#') {
        Some(hex) => parse_hex(hex).ok_or_else(|| ColorError::MalformedHex(input.to_string())),
        None => NAMED_COLORS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
            .map(|(_, rgba)| Rgba(*rgba))
            .ok_or_else(|| ColorError::UnknownName(input.to_string())),
    }
}

fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Some(Rgba([channel(0)?, channel(2)?, channel(4)?, alpha]))
}

/// A color as it arrives in a request: either a string or a channel array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Text(String),
    Channels(Vec<u8>),
}

impl Default for ColorSpec {
    fn default() -> Self {
        Self::Channels(TRANSPARENT_WHITE.0.to_vec())
    }
}

impl ColorSpec {
    /// Resolve to a concrete RGBA value.
    pub fn resolve(&self) -> Result<Rgba<u8>, ColorError> {
        match self {
            Self::Text(text) => parse_color(text),
            Self::Channels(c) => match c.as_slice() {
                [r, g, b] => Ok(Rgba([*r, *g, *b, 255])),
                [r, g, b, a] => Ok(Rgba([*r, *g, *b, *a])),
                other => Err(ColorError::ChannelCount(other.len())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_hex_is_opaque() {
        assert_eq!(parse_color("#cccccc").unwrap(), Rgba([204, 204, 204, 255]));
    }

    #[test]
    fn test_rgba_hex_keeps_alpha() {
        assert_eq!(parse_color("#FF000080").unwrap(), Rgba([255, 0, 0, 128]));
    }

    #[test]
    fn test_malformed_hex_rejected() {
        for bad in ["#12345", "#gggggg", "#", "#1234567", "#ffééff"] {
            assert!(
                matches!(parse_color(bad), Err(ColorError::MalformedHex(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_named_color_token() {
        assert_eq!(parse_color("Red").unwrap(), Rgba([255, 0, 0, 255]));
        assert_eq!(parse_color("transparent").unwrap().0[3], 0);
        assert!(matches!(
            parse_color("notacolor"),
            Err(ColorError::UnknownName(_))
        ));
    }

    #[test]
    fn test_color_spec_from_json() {
        let spec: ColorSpec = serde_json::from_str("[10, 20, 30]").unwrap();
        assert_eq!(spec.resolve().unwrap(), Rgba([10, 20, 30, 255]));

        let spec: ColorSpec = serde_json::from_str("\"#00000000\"").unwrap();
        assert_eq!(spec.resolve().unwrap(), Rgba([0, 0, 0, 0]));

        let spec: ColorSpec = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(spec.resolve(), Err(ColorError::ChannelCount(2)));
    }

    #[test]
    fn test_default_background_is_transparent_white() {
        assert_eq!(ColorSpec::default().resolve().unwrap(), TRANSPARENT_WHITE);
    }
}
