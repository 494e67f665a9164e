// Library exports for socialplot

pub mod csv_reader;
pub mod data;
pub mod graph;
pub mod parser;
pub mod runtime;
pub mod theme;

// Pipeline stages
pub mod ir;
pub mod transform;
pub mod scale;
pub mod curve;
pub mod compiler;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::theme::Theme;
use crate::transform::DateWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[serde(rename = "svg")]
    #[default]
    Svg,
    #[serde(rename = "png")]
    Png,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderOptions {
    /// Width of the plotting area in pixels
    #[serde(default = "default_width")]
    pub width: u32,
    /// Height of the plotting area in pixels
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
    #[serde(default)]
    pub theme: Theme,
    /// Days drawn by the line chart
    #[serde(default)]
    pub window: DateWindow,
}

fn default_width() -> u32 { 600 }
fn default_height() -> u32 { 400 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 600,
            height: 400,
            format: OutputFormat::Svg,
            theme: Theme::default(),
            window: DateWindow::default(),
        }
    }
}

impl RenderOptions {
    /// Load options from a JSON file; absent fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("Invalid config '{}'", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let options = serde_json::from_str(text)?;
        Ok(options)
    }
}
