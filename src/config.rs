//! Editor configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! overrides. Colors are written as CSS hex strings (`"#3b82f6"`).

use std::path::Path;

use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::object::NewObject;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV_VAR: &str = "WHITEBOARD_CONFIG";

/// Parses `#rrggbb` or `rrggbb` into a color.
pub fn parse_hex_color(field: &'static str, value: &str) -> Result<Color32, ConfigError> {
    let digits = value.strip_prefix('#').unwrap_or(value);
    let invalid = || ConfigError::Color {
        field,
        value: value.to_owned(),
    };
    if digits.len() != 6 {
        return Err(invalid());
    }
    let rgb = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;
    Ok(Color32::from_rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8))
}

mod hex_color {
    use egui::Color32;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color32, D::Error> {
        let value = String::deserialize(deserializer)?;
        super::parse_hex_color("color", &value).map_err(serde::de::Error::custom)
    }
}

/// Geometry and colors of the selection frame and its handles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionStyle {
    pub padding: f64,
    pub outline_width: f64,
    #[serde(with = "hex_color")]
    pub color: Color32,
    /// Draw order of the frame, above every object.
    pub z_index: i32,
    pub handle_size: f64,
    pub rotate_handle_offset: f64,
    pub rotate_handle_radius: f64,
}

impl SelectionStyle {
    pub fn handle_half(&self) -> f64 {
        self.handle_size / 2.0
    }
}

impl Default for SelectionStyle {
    fn default() -> Self {
        Self {
            padding: 2.0,
            outline_width: 2.0,
            color: Color32::from_rgb(0x3b, 0x82, 0xf6),
            z_index: 9999,
            handle_size: 12.0,
            rotate_handle_offset: 18.0,
            rotate_handle_radius: 6.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefaultRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub selection: SelectionStyle,
    #[serde(with = "hex_color")]
    pub placeholder_tint: Color32,
    #[serde(with = "hex_color")]
    pub background: Color32,
    /// Smallest width/height an interactive resize may produce.
    pub min_size: f64,
    /// Drift (seconds) tolerated between a video's stored time and its playback position.
    pub video_time_epsilon: f64,
    pub default_image: DefaultRect,
    pub default_video: DefaultRect,
    /// Seeded images are shrunk to fit these bounds once their size is known.
    pub initial_image_max_width: f64,
    pub initial_image_max_height: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            selection: SelectionStyle::default(),
            placeholder_tint: Color32::from_rgb(0xdd, 0xdd, 0xdd),
            background: Color32::from_rgb(0x11, 0x11, 0x11),
            min_size: crate::geometry::transform_math::DEFAULT_MIN_SIZE,
            video_time_epsilon: 0.25,
            default_image: DefaultRect {
                x: 100.0,
                y: 100.0,
                width: 300.0,
                height: 200.0,
            },
            default_video: DefaultRect {
                x: 150.0,
                y: 150.0,
                width: 320.0,
                height: 180.0,
            },
            initial_image_max_width: 800.0,
            initial_image_max_height: 600.0,
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Loads the file named by [`CONFIG_ENV_VAR`], falling back to defaults.
    pub fn from_env() -> Self {
        let Ok(path) = std::env::var(CONFIG_ENV_VAR) else {
            return Self::default();
        };
        match Self::from_path(Path::new(&path)) {
            Ok(config) => {
                log::info!("Loaded editor config from {}", path);
                config
            }
            Err(err) => {
                log::warn!("Ignoring editor config: {}", err);
                Self::default()
            }
        }
    }

    /// A new object for `src` placed at the default image or video rect,
    /// depending on the file extension.
    pub fn new_object_for_source(&self, src: &str) -> NewObject {
        let path = src.split(['?', '#']).next().unwrap_or(src).to_ascii_lowercase();
        let is_video = [".mp4", ".webm", ".mov", ".m4v"]
            .iter()
            .any(|ext| path.ends_with(ext));
        if is_video {
            let r = self.default_video;
            NewObject::video(src, r.x, r.y, r.width, r.height)
        } else {
            let r = self.default_image;
            NewObject::image(src, r.x, r.y, r.width, r.height)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKindTag;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(
            parse_hex_color("c", "#3b82f6").unwrap(),
            Color32::from_rgb(0x3b, 0x82, 0xf6)
        );
        assert_eq!(
            parse_hex_color("c", "dddddd").unwrap(),
            Color32::from_rgb(0xdd, 0xdd, 0xdd)
        );
        assert!(matches!(
            parse_hex_color("c", "#12345"),
            Err(ConfigError::Color { .. })
        ));
        assert!(parse_hex_color("c", "#zzzzzz").is_err());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = EditorConfig::from_json_str(
            r##"{ "min_size": 24.0, "selection": { "color": "#ff0000" } }"##,
        )
        .unwrap();
        assert_eq!(config.min_size, 24.0);
        assert_eq!(config.selection.color, Color32::from_rgb(255, 0, 0));
        assert_eq!(config.selection.padding, 2.0);
        assert_eq!(config.video_time_epsilon, 0.25);
    }

    #[test]
    fn test_invalid_color_is_rejected() {
        let result = EditorConfig::from_json_str(r#"{ "background": "blue" }"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_source_kind_from_extension() {
        let config = EditorConfig::default();
        let video = config.new_object_for_source("https://host/clip.MP4?token=1");
        assert_eq!(video.kind.tag(), ObjectKindTag::Video);
        assert_eq!((video.x, video.y, video.width, video.height), (150.0, 150.0, 320.0, 180.0));
        let image = config.new_object_for_source("photo.jpg");
        assert_eq!(image.kind.tag(), ObjectKindTag::Image);
        assert_eq!((image.x, image.y, image.width, image.height), (100.0, 100.0, 300.0, 200.0));
    }
}
