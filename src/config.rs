//! Pipeline configuration.
//!
//! Every field has a default matching the layout conventions of the
//! magazine exports this crate was written for; a TOML file only needs to
//! name the values it changes.
//!
//! ```toml
//! [markers]
//! end_glyph = "■"
//!
//! [merge]
//! line_height = 120.0
//! ```

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// On-disk configuration. Missing sections and fields fall back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub markers: MarkerConfig,
    pub merge: MergeConfig,
    pub authors: AuthorConfig,
    pub association: AssociationConfig,
    pub categories: CategoryConfig,
    pub images: ImageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Glyph the layout tool places at the end of an article.
    pub end_glyph: String,
    /// Title text that opens a compound obituary heading.
    pub obituary_pattern: String,
    /// Title text that is the lifespan line of an obituary heading.
    pub lifespan_pattern: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            end_glyph: "■".to_string(),
            obituary_pattern: r"(?i)^\s*in\s+memoriam\s*$".to_string(),
            lifespan_pattern: r"\b\d{4}\s*[-–—]\s*\d{4}\b".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Nominal line height in export units.
    pub line_height: f32,
    /// A vertical gap below `line_height * gap_factor` continues a paragraph.
    pub gap_factor: f32,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            line_height: 120.0,
            gap_factor: 1.5,
        }
    }
}

impl MergeConfig {
    pub fn gap_threshold(&self) -> f32 {
        self.line_height * self.gap_factor
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorConfig {
    /// Credit-line prefixes stripped before parsing names, matched
    /// case-insensitively. Longer prefixes should come first.
    pub prefixes: Vec<String>,
    /// Separators between several names in one credit line.
    pub separators: Vec<String>,
    /// Fragments shorter than this (in characters) are not names.
    pub min_length: usize,
}

impl Default for AuthorConfig {
    fn default() -> Self {
        Self {
            prefixes: [
                "tekst en foto's:",
                "tekst en beeld:",
                "tekst:",
                "door:",
                "interview:",
                "foto's:",
                "foto:",
            ]
            .map(String::from)
            .to_vec(),
            separators: [" en ", " & ", " and "].map(String::from).to_vec(),
            min_length: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationConfig {
    /// How many elements a caption or photo may sit from its anchor.
    pub window: usize,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self { window: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    /// Keywords looked up in a title's class name when no category element
    /// is present, paired with the category they imply.
    pub class_keywords: Vec<(String, String)>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            class_keywords: [
                ("meditatie", "Meditatie"),
                ("interview", "Interview"),
                ("column", "Column"),
                ("boek", "Boekbespreking"),
                ("nieuws", "Nieuws"),
                ("memoriam", "In memoriam"),
            ]
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub author_photo_keywords: Vec<String>,
    pub decorative_keywords: Vec<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            author_photo_keywords: ["auteur", "author", "portret", "pasfoto"]
                .map(String::from)
                .to_vec(),
            decorative_keywords: [
                "logo",
                "icoon",
                "icon",
                "lijn",
                "ornament",
                "achtergrond",
                "background",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Compile the marker patterns.
    pub fn patterns(&self) -> Result<Patterns> {
        Ok(Patterns {
            obituary: Regex::new(&self.markers.obituary_pattern)?,
            lifespan: Regex::new(&self.markers.lifespan_pattern)?,
        })
    }
}

/// Compiled marker patterns.
#[derive(Debug, Clone)]
pub struct Patterns {
    pub obituary: Regex,
    pub lifespan: Regex,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.markers.end_glyph, "■");
        assert_eq!(config.association.window, 3);
        assert!((config.merge.gap_threshold() - 180.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml_str(
            r#"
            [markers]
            end_glyph = "◆"

            [authors]
            min_length = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.markers.end_glyph, "◆");
        assert_eq!(config.authors.min_length, 4);
        // Untouched fields keep their defaults
        assert!(!config.authors.prefixes.is_empty());
        assert_eq!(config.merge.line_height, 120.0);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(Config::from_toml_str("[markers\nend_glyph = 1").is_err());
    }

    #[test]
    fn test_patterns_compile() {
        let patterns = Config::default().patterns().unwrap();
        assert!(patterns.obituary.is_match("In memoriam"));
        assert!(patterns.obituary.is_match("IN MEMORIAM "));
        assert!(!patterns.obituary.is_match("In memoriam Jan"));
        assert!(patterns.lifespan.is_match("1938–2026"));
        assert!(patterns.lifespan.is_match("1938 - 2026"));
    }
}
