//! The genie's verdict on a wish, and the narration/hint records that
//! travel alongside it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::object::{ObjectKind, UnknownObject};

/// Response body of `POST /process_wish`.
///
/// Every field defaults, so a sparse response still parses. Missing color,
/// scale or vfx simply mean "leave the object as it is".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WishVerdict {
    /// Key used to look up the object's asset
    pub object_name: String,

    /// Human-readable label
    pub display_name: String,

    /// CSS-style color, empty for no recolor
    pub hex_color: String,

    /// Scale multiplier, <= 0 for no change
    pub scale: f32,

    /// none / fire / smoke / sparks
    pub vfx_type: String,

    /// Whether this object satisfies the active door's rule
    pub door_open: bool,

    /// Line spoken as the object drops in
    pub drop_voice: String,

    /// Line spoken when the object is used on the door
    pub congrats_voice: String,

    pub audio_url_drop: String,
    pub audio_url_congrats: String,
}

impl WishVerdict {
    /// Parsed color, or `None` when empty or unparseable
    pub fn color(&self) -> Option<Rgba> {
        let raw = self.hex_color.trim();
        if raw.is_empty() {
            return None;
        }
        match Rgba::parse(raw) {
            Ok(color) => Some(color),
            Err(e) => {
                warn!(error = %e, "Ignoring color from verdict");
                None
            }
        }
    }

    /// Scale multiplier, or `None` when it should be left alone
    pub fn scale_factor(&self) -> Option<f32> {
        (self.scale.is_finite() && self.scale > 0.0).then_some(self.scale)
    }

    pub fn vfx(&self) -> VfxKind {
        match self.vfx_type.parse() {
            Ok(kind) => kind,
            Err(e) => {
                warn!(error = %e, "Ignoring vfx from verdict");
                VfxKind::None
            }
        }
    }

    /// The conjured object's kind. `Ok(None)` when no object was named.
    pub fn object_kind(&self) -> Result<Option<ObjectKind>, UnknownObject> {
        let name = self.object_name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        name.parse().map(Some)
    }

    /// Display name, falling back to the object name
    pub fn label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.object_name
        } else {
            &self.display_name
        }
    }
}

/// Visual effect attached to a conjured object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VfxKind {
    #[default]
    None,
    Fire,
    Smoke,
    Sparks,
}

impl VfxKind {
    pub const ATTACHABLE: [VfxKind; 3] = [VfxKind::Fire, VfxKind::Smoke, VfxKind::Sparks];

    pub fn as_str(self) -> &'static str {
        match self {
            VfxKind::None => "none",
            VfxKind::Fire => "fire",
            VfxKind::Smoke => "smoke",
            VfxKind::Sparks => "sparks",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown vfx type: {0}")]
pub struct UnknownVfx(pub String);

impl FromStr for VfxKind {
    type Err = UnknownVfx;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(VfxKind::None),
            "fire" => Ok(VfxKind::Fire),
            "smoke" => Ok(VfxKind::Smoke),
            "sparks" => Ok(VfxKind::Sparks),
            _ => Err(UnknownVfx(s.to_string())),
        }
    }
}

impl fmt::Display for VfxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Linear color, each channel in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("Invalid hex color: {0}")]
    InvalidHex(String),

    #[error("Unknown color name: {0}")]
    UnknownName(String),
}

/// Named colors accepted alongside hex notation
const NAMED_COLORS: &[(&str, [u8; 4])] = &[
    ("red", [0xFF, 0x00, 0x00, 0xFF]),
    ("cyan", [0x00, 0xFF, 0xFF, 0xFF]),
    ("blue", [0x00, 0x00, 0xFF, 0xFF]),
    ("darkblue", [0x00, 0x00, 0xA0, 0xFF]),
    ("lightblue", [0xAD, 0xD8, 0xE6, 0xFF]),
    ("purple", [0x80, 0x00, 0x80, 0xFF]),
    ("yellow", [0xFF, 0xFF, 0x00, 0xFF]),
    ("lime", [0x00, 0xFF, 0x00, 0xFF]),
    ("fuchsia", [0xFF, 0x00, 0xFF, 0xFF]),
    ("white", [0xFF, 0xFF, 0xFF, 0xFF]),
    ("silver", [0xC0, 0xC0, 0xC0, 0xFF]),
    ("grey", [0x80, 0x80, 0x80, 0xFF]),
    ("gray", [0x80, 0x80, 0x80, 0xFF]),
    ("black", [0x00, 0x00, 0x00, 0xFF]),
    ("orange", [0xFF, 0xA5, 0x00, 0xFF]),
    ("brown", [0xA5, 0x2A, 0x2A, 0xFF]),
    ("maroon", [0x80, 0x00, 0x00, 0xFF]),
    ("green", [0x00, 0x80, 0x00, 0xFF]),
    ("olive", [0x80, 0x80, 0x00, 0xFF]),
    ("navy", [0x00, 0x00, 0x80, 0xFF]),
    ("teal", [0x00, 0x80, 0x80, 0xFF]),
    ("aqua", [0x00, 0xFF, 0xFF, 0xFF]),
    ("magenta", [0xFF, 0x00, 0xFF, 0xFF]),
];

impl Rgba {
    pub fn from_bytes([r, g, b, a]: [u8; 4]) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    /// Channels as bytes, clamped to the valid range
    pub fn to_bytes(self) -> [u8; 4] {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [byte(self.r), byte(self.g), byte(self.b), byte(self.a)]
    }

    /// `#RRGGBBAA`
    pub fn to_hex(self) -> String {
        format!("#{}", hex::encode_upper(self.to_bytes()))
    }

    /// Parse `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA` or a color name
    pub fn parse(input: &str) -> Result<Self, ColorParseError> {
        let input = input.trim();
        let Some(digits) = input.strip_prefix('#') else {
            let name = input.to_ascii_lowercase();
            return NAMED_COLORS
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, bytes)| Self::from_bytes(*bytes))
                .ok_or_else(|| ColorParseError::UnknownName(input.to_string()));
        };

        let invalid = || ColorParseError::InvalidHex(input.to_string());

        let expanded = match digits.len() {
            3 | 4 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 | 8 => digits.to_string(),
            _ => return Err(invalid()),
        };

        let bytes = hex::decode(&expanded).map_err(|_| invalid())?;
        let mut rgba = [0xFF; 4];
        rgba[..bytes.len()].copy_from_slice(&bytes);
        Ok(Self::from_bytes(rgba))
    }
}

/// Response body of `GET /room_transition` and `GET /intro`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Narration {
    pub audio_url: String,
    pub subtitle: String,
}

/// Response body of `GET /get_hint`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hint {
    pub hint: String,
    pub audio_url: String,
    pub hint_level: u32,
    pub hints_remaining: u32,
}
