use anyhow::{anyhow, Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;

use crate::curve;
use crate::ir::{DrawCommand, SceneGraph};
use crate::theme::parse_color;
use crate::OutputFormat;

// Samples per Bézier segment when flattening paths
const CURVE_STEPS: usize = 16;

/// Style configuration for strokes
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: String,
    pub width: f64,
}

/// Style configuration for markers
#[derive(Debug, Clone, PartialEq)]
pub struct PointStyle {
    pub color: String,
}

/// Style configuration for rectangles (boxes, bars, swatches)
#[derive(Debug, Clone, PartialEq)]
pub struct RectStyle {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: f64,
}

/// Which point of the text sits at its anchor position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

/// Style configuration for labels
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub color: String,
    pub size: f64,
    pub anchor: Anchor,
    /// Degrees, negative turns counterclockwise
    pub angle: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        LineStyle { color: "black".to_string(), width: 1.0 }
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle {
            color: "black".to_string(),
            size: 10.0,
            anchor: Anchor::Start,
            angle: 0.0,
        }
    }
}

/// Render a scene graph to SVG or PNG bytes
pub fn render_scene(scene: &SceneGraph, format: &OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Svg => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, (scene.width, scene.height))
                    .into_drawing_area();
                draw_scene(&root, scene)?;
                root.present()
                    .map_err(|e| anyhow!("Failed to present drawing: {}", e))?;
            }
            Ok(svg.into_bytes())
        }
        OutputFormat::Png => {
            let mut buffer = vec![0u8; (scene.width * scene.height * 3) as usize];
            {
                let root = BitMapBackend::with_buffer(&mut buffer, (scene.width, scene.height))
                    .into_drawing_area();
                draw_scene(&root, scene)?;
                root.present()
                    .map_err(|e| anyhow!("Failed to present drawing: {}", e))?;
            }

            let mut png_bytes = Vec::new();
            {
                let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
                encoder
                    .write_image(&buffer, scene.width, scene.height, image::ColorType::Rgb8)
                    .context("Failed to encode PNG")?;
            }
            Ok(png_bytes)
        }
    }
}

fn draw_scene<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, scene: &SceneGraph) -> Result<()> {
    let background = resolve_color(&scene.background)?;
    root.fill(&background)
        .map_err(|e| anyhow!("Failed to fill background: {}", e))?;

    for command in &scene.commands {
        draw_command(root, command)?;
    }
    Ok(())
}

fn draw_command<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, command: &DrawCommand) -> Result<()> {
    match command {
        DrawCommand::DrawLine { points, style } => {
            let color = resolve_color(&style.color)?;
            let points: Vec<(i32, i32)> = points.iter().map(|&p| to_pixel(p)).collect();
            root.draw(&PathElement::new(points, color.stroke_width(stroke(style.width))))
                .map_err(|e| anyhow!("Failed to draw line: {}", e))?;
        }
        DrawCommand::DrawRect { tl, br, style } => {
            let corners = [to_pixel(*tl), to_pixel(*br)];
            if let Some(fill) = &style.fill {
                let color = resolve_color(fill)?;
                root.draw(&Rectangle::new(corners, color.filled()))
                    .map_err(|e| anyhow!("Failed to draw rectangle: {}", e))?;
            }
            if let Some(edge) = &style.stroke {
                let color = resolve_color(edge)?;
                root.draw(&Rectangle::new(corners, color.stroke_width(stroke(style.stroke_width))))
                    .map_err(|e| anyhow!("Failed to draw rectangle outline: {}", e))?;
            }
        }
        DrawCommand::DrawCircle { center, radius, style } => {
            let color = resolve_color(&style.color)?;
            let radius = radius.round().max(1.0) as i32;
            root.draw(&Circle::new(to_pixel(*center), radius, color.filled()))
                .map_err(|e| anyhow!("Failed to draw circle: {}", e))?;
        }
        DrawCommand::DrawPath { start, segments, style } => {
            let color = resolve_color(&style.color)?;
            let points: Vec<(i32, i32)> = curve::flatten(*start, segments, CURVE_STEPS)
                .into_iter()
                .map(to_pixel)
                .collect();
            root.draw(&PathElement::new(points, color.stroke_width(stroke(style.width))))
                .map_err(|e| anyhow!("Failed to draw path: {}", e))?;
        }
        DrawCommand::DrawText { pos, text, style } => {
            let color = resolve_color(&style.color)?;
            let h_pos = match style.anchor {
                Anchor::Start => HPos::Left,
                Anchor::Middle => HPos::Center,
                Anchor::End => HPos::Right,
            };
            let text_style = ("sans-serif", style.size)
                .into_font()
                .color(&color)
                .pos(Pos::new(h_pos, VPos::Center))
                .transform(snap_rotation(style.angle));
            root.draw(&Text::new(text.clone(), to_pixel(*pos), text_style))
                .map_err(|e| anyhow!("Failed to draw text '{}': {}", text, e))?;
        }
    }
    Ok(())
}

fn resolve_color(name: &str) -> Result<RGBColor> {
    parse_color(name).ok_or_else(|| anyhow!("Unknown color '{}'", name))
}

fn to_pixel(p: (f64, f64)) -> (i32, i32) {
    (p.0.round() as i32, p.1.round() as i32)
}

fn stroke(width: f64) -> u32 {
    width.round().max(1.0) as u32
}

/// Nearest quarter turn plotters can draw; tilts under 45 degrees stay upright
fn snap_rotation(angle: f64) -> FontTransform {
    let quarter = (angle.rem_euclid(360.0) / 90.0).round() as i32 % 4;
    match quarter {
        1 => FontTransform::Rotate90,
        2 => FontTransform::Rotate180,
        3 => FontTransform::Rotate270,
        _ => FontTransform::None,
    }
}
