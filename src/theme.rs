//! Chart colors and stroke widths.
//!
//! Every field has a default matching the dashboard look (light blue
//! background, steelblue boxes and lines, red markers, the three-color bar
//! palette), so a config file only needs the fields it changes.

use serde::Deserialize;
use plotters::style::RGBColor;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub background: String,
    pub stroke: String,
    pub text: String,
    pub box_fill: String,
    pub box_stroke_width: f64,
    pub bar_stroke_width: f64,
    pub palette: Vec<String>,
    pub line_color: String,
    pub line_width: f64,
    pub point_color: String,
    pub point_radius: f64,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: "lightblue".to_string(),
            stroke: "black".to_string(),
            text: "black".to_string(),
            box_fill: "steelblue".to_string(),
            box_stroke_width: 2.0,
            bar_stroke_width: 1.0,
            palette: vec![
                "#1f77b4".to_string(),
                "#ff7f0e".to_string(),
                "#2ca02c".to_string(),
            ],
            line_color: "steelblue".to_string(),
            line_width: 2.0,
            point_color: "red".to_string(),
            point_radius: 4.0,
        }
    }
}

// === Color Parsing ===

/// Parse a color string into RGBColor, supporting hex (#RRGGBB, #RGB) and named colors
pub fn parse_color(color_str: &str) -> Option<RGBColor> {
    let color_str = color_str.trim();

    if color_str.starts_with('#') {
        return parse_hex_color(color_str);
    }

    match color_str.to_lowercase().as_str() {
        "white" => Some(RGBColor(255, 255, 255)),
        "black" => Some(RGBColor(0, 0, 0)),
        "red" => Some(RGBColor(255, 0, 0)),
        "green" => Some(RGBColor(0, 128, 0)),
        "blue" => Some(RGBColor(0, 0, 255)),
        "steelblue" => Some(RGBColor(70, 130, 180)),
        "lightblue" => Some(RGBColor(173, 216, 230)),
        "orange" => Some(RGBColor(255, 165, 0)),
        "purple" => Some(RGBColor(128, 0, 128)),
        "gray" | "grey" => Some(RGBColor(128, 128, 128)),
        "lightgray" | "lightgrey" => Some(RGBColor(211, 211, 211)),
        _ => None,
    }
}

/// Parse hex color (#RRGGBB or #RGB)
fn parse_hex_color(hex: &str) -> Option<RGBColor> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(RGBColor(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(RGBColor(r, g, b))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_color("#1f77b4"), Some(RGBColor(31, 119, 180)));
        assert_eq!(parse_color("#F00"), Some(RGBColor(255, 0, 0)));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#zzzzzz"), None);
    }

    #[test]
    fn test_parse_named_color() {
        assert_eq!(parse_color("steelblue"), Some(RGBColor(70, 130, 180)));
        assert_eq!(parse_color(" LightBlue "), Some(RGBColor(173, 216, 230)));
        assert_eq!(parse_color("chartreuse-ish"), None);
    }

    #[test]
    fn test_default_theme_colors_parse() {
        let theme = Theme::default();
        for c in [&theme.background, &theme.stroke, &theme.text, &theme.box_fill, &theme.line_color, &theme.point_color] {
            assert!(parse_color(c).is_some(), "unparseable default color {}", c);
        }
        assert!(theme.palette.iter().all(|c| parse_color(c).is_some()));
    }

    #[test]
    fn test_partial_theme_from_json() {
        let theme: Theme = serde_json::from_str(r#"{"background": "white", "point_radius": 6}"#).unwrap();
        assert_eq!(theme.background, "white");
        assert_eq!(theme.point_radius, 6.0);
        assert_eq!(theme.box_fill, "steelblue");
    }
}
