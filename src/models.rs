use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;

/// The fixed definition of the icon: geometry, colours, glyph and exports.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct IconSpec {
    pub canvas_size: u32,
    pub margin: u32,
    pub circle_color: [u8; 4],
    pub text: String,
    pub text_color: [u8; 4],
    /// Lookup name of the outline font, resolved against the working directory and the platform font folders.
    pub font_name: String,
    /// Pixels per em.
    pub font_size: f32,
    pub sizes: Vec<u32>,
    pub file_stem: String,
}

impl Default for IconSpec {
    fn default() -> Self {
        Self {
            canvas_size: 256,
            margin: 10,
            circle_color: [41, 128, 185, 255],
            text: "S".to_owned(),
            text_color: [255, 255, 255, 255],
            font_name: "arial.ttf".to_owned(),
            font_size: 150.0,
            sizes: vec![16, 32, 48, 128, 256],
            file_stem: "setharkk".to_owned(),
        }
    }
}

impl IconSpec {
    pub fn png_file_name(&self, size: u32) -> String {
        format!("{}_{}x{}.png", self.file_stem, size, size)
    }

    pub fn ico_file_name(&self) -> String {
        format!("{}.ico", self.file_stem)
    }
}

/// Which glyph renderer drew the text.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FontSource {
    Named(PathBuf),
    BuiltIn,
}

/// A file written by a run.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub sha256: String,
}

/// Summary of a completed run, printed as JSON by `main`.
#[derive(Serialize, Debug, Clone)]
pub struct GenerationReport {
    pub generated_at: DateTime<Local>,
    pub font: FontSource,
    pub outputs: Vec<OutputFile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_embed_the_size() {
        let spec = IconSpec::default();
        let names: Vec<String> = spec.sizes.iter().map(|&s| spec.png_file_name(s)).collect();
        assert_eq!(
            names,
            [
                "setharkk_16x16.png",
                "setharkk_32x32.png",
                "setharkk_48x48.png",
                "setharkk_128x128.png",
                "setharkk_256x256.png",
            ]
        );
        assert_eq!(spec.ico_file_name(), "setharkk.ico");
    }

    #[test]
    fn font_source_serializes_as_tagged_variant() {
        let named = serde_json::to_value(FontSource::Named(PathBuf::from("arial.ttf"))).unwrap();
        assert_eq!(named, serde_json::json!({ "named": "arial.ttf" }));
        let built_in = serde_json::to_value(FontSource::BuiltIn).unwrap();
        assert_eq!(built_in, serde_json::json!("built_in"));
    }
}
