//! Content descriptor for one hall: title, asset folder and per-orb captions.

use crate::constants::{DEFAULT_CAPTION, ORB_COUNT};
use crate::error::HallError;
use crate::surface::Rgba;
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

/// Orb slot keys in wall-slot order.
pub const SLOT_KEYS: [&str; ORB_COUNT] = [
    "overview",
    "gallery",
    "technologies",
    "details",
    "links",
    "contact",
    "placeholder1",
    "placeholder2",
    "placeholder3",
    "placeholder4",
    "placeholder5",
    "placeholder6",
    "placeholder7",
    "placeholder8",
    "placeholder9",
    "placeholder10",
    "placeholder11",
    "placeholder12",
    "placeholder13",
    "placeholder14",
    "placeholder15",
    "placeholder16",
    "placeholder17",
    "placeholder18",
    "placeholder19",
    "placeholder20",
    "placeholder21",
];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentDescriptor {
    pub title: String,
    /// Asset sub-folder; `None` sends every orb to its fallback face.
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default, rename = "cardTitles")]
    pub card_titles: FnvHashMap<String, String>,
}

impl ContentDescriptor {
    pub fn from_json(json: &str) -> Result<Self, HallError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn caption(&self, slot: &str) -> &str {
        self.card_titles
            .get(slot)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_CAPTION)
    }

    /// Folder with surrounding whitespace and slashes removed; empty counts as none.
    pub fn folder(&self) -> Option<&str> {
        self.folder
            .as_deref()
            .map(|f| f.trim().trim_matches('/'))
            .filter(|f| !f.is_empty())
    }
}

/// Per-invocation settings supplied by the host page.
#[derive(Clone, Debug, PartialEq)]
pub struct HallConfig {
    pub assets_root: String,
    /// Seed for every procedural texture and emitter.
    pub seed: u64,
    pub accent: Rgba,
}

impl Default for HallConfig {
    fn default() -> Self {
        Self {
            assets_root: "assets".to_string(),
            seed: 0x6d65_6d6f,
            accent: Rgba::from_hex(0x8a5cff),
        }
    }
}

/// Accent colour from a host-supplied `#rrggbb` (or bare `rrggbb`) string.
pub fn parse_accent(hex: &str) -> Option<Rgba> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 {
        return None;
    }
    u32::from_str_radix(digits, 16).ok().map(Rgba::from_hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_titles() {
        let c = ContentDescriptor::from_json(
            r#"{"title":"Demo","folder":"demo","cardTitles":{"overview":"Overview"}}"#,
        )
        .unwrap();
        assert_eq!(c.folder(), Some("demo"));
        assert_eq!(c.caption("overview"), "Overview");
        assert_eq!(c.caption("gallery"), DEFAULT_CAPTION);
    }

    #[test]
    fn null_folder_and_missing_titles() {
        let c = ContentDescriptor::from_json(r#"{"title":"Empty","folder":null}"#).unwrap();
        assert_eq!(c.folder(), None);
        assert!(c.card_titles.is_empty());
        assert!(ContentDescriptor::from_json("{").is_err());
    }

    #[test]
    fn accent_accepts_hex_with_or_without_hash() {
        assert_eq!(parse_accent("#ff8000"), Some(Rgba::from_hex(0xff8000)));
        assert_eq!(parse_accent(" 66ccff "), Some(Rgba::from_hex(0x66ccff)));
        assert_eq!(parse_accent("#fff"), None);
        assert_eq!(parse_accent("#zzzzzz"), None);
    }

    #[test]
    fn slot_keys_are_unique() {
        let mut keys = SLOT_KEYS.to_vec();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), ORB_COUNT);
    }
}
