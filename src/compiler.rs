use chrono::NaiveDate;
use tracing::debug;

use crate::curve::natural_curve;
use crate::graph::{Anchor, LineStyle, PointStyle, RectStyle, TextStyle};
use crate::ir::{CellAverage, DailyAverage, DrawCommand, GroupSummary, SceneGraph};
use crate::scale::{extent, BandScale, LinearScale, OrdinalScale, TimeScale};
use crate::theme::Theme;
use crate::transform::{distinct_in_order, filter_window, DateWindow};
use crate::RenderOptions;

const TICK_SIZE: f64 = 6.0;
const TICK_PADDING: f64 = 3.0;
const TICK_COUNT: usize = 10;
const TICK_FONT: f64 = 10.0;
const LABEL_FONT: f64 = 14.0;
const LEGEND_FONT: f64 = 12.0;
const LEGEND_SWATCH: f64 = 15.0;
const LEGEND_SPACING: f64 = 20.0;
const OUTER_PADDING: f64 = 0.2;
const INNER_PADDING: f64 = 0.05;
const DATE_TICK_ANGLE: f64 = -25.0;

#[derive(Debug, Clone, Copy)]
struct Margin {
    top: f64,
    right: f64,
    bottom: f64,
    left: f64,
}

// The box plot draws inside its own margins; the other charts add margins around the plot area
const BOX_MARGIN: Margin = Margin { top: 50.0, right: 50.0, bottom: 50.0, left: 55.0 };
const PLOT_MARGIN: Margin = Margin { top: 50.0, right: 50.0, bottom: 50.0, left: 50.0 };

// =============================================================================
// Shared Emitters
// =============================================================================

fn axis_line_style(theme: &Theme) -> LineStyle {
    LineStyle { color: theme.stroke.clone(), width: 1.0 }
}

fn tick_text(theme: &Theme, anchor: Anchor, angle: f64) -> TextStyle {
    TextStyle { color: theme.text.clone(), size: TICK_FONT, anchor, angle }
}

fn label(commands: &mut Vec<DrawCommand>, theme: &Theme, pos: (f64, f64), text: &str, anchor: Anchor, angle: f64) {
    commands.push(DrawCommand::DrawText {
        pos,
        text: text.to_string(),
        style: TextStyle { color: theme.text.clone(), size: LABEL_FONT, anchor, angle },
    });
}

/// Vertical axis with ticks pointing left, placed at `x`
fn left_axis(commands: &mut Vec<DrawCommand>, theme: &Theme, scale: &LinearScale, x: f64, y_offset: f64) {
    let (r0, r1) = scale.range;
    commands.push(DrawCommand::DrawLine {
        points: vec![
            (x - TICK_SIZE, y_offset + r0),
            (x, y_offset + r0),
            (x, y_offset + r1),
            (x - TICK_SIZE, y_offset + r1),
        ],
        style: axis_line_style(theme),
    });

    for value in scale.ticks(TICK_COUNT) {
        let y = y_offset + scale.map(value);
        commands.push(DrawCommand::DrawLine {
            points: vec![(x - TICK_SIZE, y), (x, y)],
            style: axis_line_style(theme),
        });
        commands.push(DrawCommand::DrawText {
            pos: (x - TICK_SIZE - TICK_PADDING, y),
            text: scale.tick_format(TICK_COUNT, value),
            style: tick_text(theme, Anchor::End, 0.0),
        });
    }
}

/// Horizontal axis with ticks pointing down at each position, placed at `y`
fn bottom_axis(
    commands: &mut Vec<DrawCommand>,
    theme: &Theme,
    span: (f64, f64),
    ticks: &[(f64, String)],
    y: f64,
    label_style: TextStyle,
) {
    commands.push(DrawCommand::DrawLine {
        points: vec![
            (span.0, y + TICK_SIZE),
            (span.0, y),
            (span.1, y),
            (span.1, y + TICK_SIZE),
        ],
        style: axis_line_style(theme),
    });

    for (x, text) in ticks {
        commands.push(DrawCommand::DrawLine {
            points: vec![(*x, y), (*x, y + TICK_SIZE)],
            style: axis_line_style(theme),
        });
        commands.push(DrawCommand::DrawText {
            pos: (*x, y + TICK_SIZE + TICK_PADDING + TICK_FONT / 2.0),
            text: text.clone(),
            style: label_style.clone(),
        });
    }
}

fn band_ticks(scale: &BandScale, x_offset: f64) -> Vec<(f64, String)> {
    scale
        .categories()
        .iter()
        .filter_map(|c| scale.center(c).map(|x| (x_offset + x, c.clone())))
        .collect()
}

// =============================================================================
// Box Plot
// =============================================================================

/// Whisker, box and median tick for each group, one band per group
pub fn compile_boxplot(summaries: &[GroupSummary], options: &RenderOptions) -> SceneGraph {
    let theme = &options.theme;
    let width = options.width as f64;
    let height = options.height as f64;
    let m = BOX_MARGIN;

    let y = LinearScale::from_extent(
        summaries.iter().flat_map(|s| [s.min, s.max]),
        (height - m.bottom, m.top),
    );
    let x = BandScale::new(
        summaries.iter().map(|s| s.key.clone()).collect(),
        (m.left, width - m.right),
    );
    debug!(domain = ?y.domain, groups = summaries.len(), "Box plot scales");

    let mut commands = Vec::new();
    left_axis(&mut commands, theme, &y, m.left, 0.0);
    bottom_axis(
        &mut commands,
        theme,
        x.range(),
        &band_ticks(&x, 0.0),
        height - m.bottom,
        tick_text(theme, Anchor::Middle, 0.0),
    );
    label(&mut commands, theme, (width / 2.2, height - 10.0), "Platform", Anchor::Start, 0.0);
    label(&mut commands, theme, (15.0, height / 1.7), "Number of likes", Anchor::Start, -90.0);

    let outline = LineStyle { color: theme.stroke.clone(), width: theme.box_stroke_width };
    let boxes: Vec<(&GroupSummary, f64)> = summaries
        .iter()
        .filter_map(|s| x.position(&s.key).map(|left| (s, left)))
        .collect();
    let band = x.bandwidth();

    // Whiskers first so the boxes cover them
    for (s, left) in &boxes {
        let center = left + band / 2.0;
        commands.push(DrawCommand::DrawLine {
            points: vec![(center, y.map(s.min)), (center, y.map(s.max))],
            style: outline.clone(),
        });
    }

    for (s, left) in &boxes {
        commands.push(DrawCommand::DrawRect {
            tl: (*left, y.map(s.q3)),
            br: (left + band, y.map(s.q1)),
            style: RectStyle {
                fill: Some(theme.box_fill.clone()),
                stroke: Some(theme.stroke.clone()),
                stroke_width: theme.box_stroke_width,
            },
        });
    }

    for (s, left) in &boxes {
        let median = y.map(s.median);
        commands.push(DrawCommand::DrawLine {
            points: vec![(*left, median), (left + band, median)],
            style: outline.clone(),
        });
    }

    SceneGraph {
        width: options.width,
        height: options.height,
        background: theme.background.clone(),
        commands,
    }
}

// =============================================================================
// Grouped Bar Chart
// =============================================================================

/// One bar per (group, subgroup) cell, subgroups dodged inside their group's band.
/// `color_domain` fixes which palette slot each subgroup takes.
pub fn compile_barplot(cells: &[CellAverage], color_domain: Vec<String>, options: &RenderOptions) -> SceneGraph {
    let theme = &options.theme;
    let width = options.width as f64;
    let height = options.height as f64;
    let m = PLOT_MARGIN;
    let (ox, oy) = (m.left, m.top);

    let groups = distinct_in_order(cells.iter().map(|c| c.group.as_str()));
    let subgroups = distinct_in_order(cells.iter().map(|c| c.subgroup.as_str()));

    let x0 = BandScale::new(groups, (0.0, width)).with_padding(OUTER_PADDING);
    let x1 = BandScale::new(subgroups.clone(), (0.0, x0.bandwidth())).with_padding(INNER_PADDING);
    let max_mean = extent(cells.iter().map(|c| c.mean)).map_or(0.0, |(_, hi)| hi);
    let y = LinearScale::new((0.0, max_mean), (height, 0.0)).nice(TICK_COUNT);
    let color = OrdinalScale::new(color_domain, theme.palette.clone());
    debug!(domain = ?y.domain, cells = cells.len(), "Bar chart scales");

    let mut commands = Vec::new();
    bottom_axis(
        &mut commands,
        theme,
        (ox, ox + width),
        &band_ticks(&x0, ox),
        oy + height,
        tick_text(theme, Anchor::Middle, 0.0),
    );
    left_axis(&mut commands, theme, &y, ox, oy);
    label(&mut commands, theme, (ox + width / 2.2, oy + height + 38.0), "Platform", Anchor::Start, 0.0);
    label(&mut commands, theme, (ox - 37.0, oy + height / 1.7), "Average number of likes", Anchor::Start, -90.0);

    for cell in cells {
        let (Some(group_x), Some(sub_x)) = (x0.position(&cell.group), x1.position(&cell.subgroup)) else {
            continue;
        };
        let left = ox + group_x + sub_x;
        commands.push(DrawCommand::DrawRect {
            tl: (left, oy + y.map(cell.mean)),
            br: (left + x1.bandwidth(), oy + height),
            style: RectStyle {
                fill: color.color(&cell.subgroup).map(str::to_string),
                stroke: Some(theme.stroke.clone()),
                stroke_width: theme.bar_stroke_width,
            },
        });
    }

    // Legend: swatch and name per subgroup, top right
    let (lx, ly) = (ox + width - 20.0, oy - 20.0);
    for (i, name) in subgroups.iter().enumerate() {
        let row = ly + i as f64 * LEGEND_SPACING;
        commands.push(DrawCommand::DrawRect {
            tl: (lx, row),
            br: (lx + LEGEND_SWATCH, row + LEGEND_SWATCH),
            style: RectStyle {
                fill: color.color(name).map(str::to_string),
                stroke: None,
                stroke_width: 0.0,
            },
        });
        commands.push(DrawCommand::DrawText {
            pos: (lx + 20.0, row + 12.0),
            text: name.clone(),
            style: TextStyle { color: theme.text.clone(), size: LEGEND_FONT, anchor: Anchor::Start, angle: 0.0 },
        });
    }

    SceneGraph {
        width: options.width + (m.left + m.right) as u32,
        height: options.height + (m.top + m.bottom) as u32,
        background: theme.background.clone(),
        commands,
    }
}

// =============================================================================
// Time-Series Line Chart
// =============================================================================

/// Smooth path and markers through the daily averages inside `window`.
/// The axes span every day in `daily`, drawn or not.
///
/// Date tick labels carry a -25 degree tilt in the scene. The plotters
/// backends only rotate text by quarter turns, so they draw these labels
/// upright, end-anchored under their tick.
pub fn compile_lineplot(daily: &[DailyAverage], window: &DateWindow, options: &RenderOptions) -> SceneGraph {
    let theme = &options.theme;
    let width = options.width as f64;
    let height = options.height as f64;
    let m = PLOT_MARGIN;
    let (ox, oy) = (m.left, m.top);

    let x = TimeScale::from_extent(daily.iter().map(|d| d.date), (0.0, width));
    let max_avg = extent(daily.iter().map(|d| d.avg_likes)).map_or(0.0, |(_, hi)| hi);
    let y = LinearScale::new((0.0, max_avg), (height, 0.0)).nice(TICK_COUNT);
    let shown = filter_window(daily, window);
    debug!(domain = ?y.domain, days = daily.len(), shown = shown.len(), "Line chart scales");

    let mut commands = Vec::new();
    left_axis(&mut commands, theme, &y, ox, oy);
    let ticks: Vec<(f64, String)> = match &x {
        Some(x) => shown
            .iter()
            .map(|d| (ox + x.map(d.date), format_tick_date(d.date)))
            .collect(),
        None => Vec::new(),
    };
    bottom_axis(
        &mut commands,
        theme,
        (ox, ox + width),
        &ticks,
        oy + height,
        tick_text(theme, Anchor::End, DATE_TICK_ANGLE),
    );
    label(&mut commands, theme, (ox + width / 2.0, oy + height + m.bottom - 10.0), "Date", Anchor::Middle, 0.0);
    label(&mut commands, theme, (ox - m.left + 15.0, oy + height / 2.0), "Average number of likes", Anchor::Middle, -90.0);

    if let Some(x) = &x {
        let points: Vec<(f64, f64)> = shown
            .iter()
            .map(|d| (ox + x.map(d.date), oy + y.map(d.avg_likes)))
            .collect();

        if let Some((start, segments)) = natural_curve(&points) {
            commands.push(DrawCommand::DrawPath {
                start,
                segments,
                style: LineStyle { color: theme.line_color.clone(), width: theme.line_width },
            });
        }

        for center in points {
            commands.push(DrawCommand::DrawCircle {
                center,
                radius: theme.point_radius,
                style: PointStyle { color: theme.point_color.clone() },
            });
        }
    }

    SceneGraph {
        width: options.width + (m.left + m.right) as u32,
        height: options.height + (m.top + m.bottom) as u32,
        background: theme.background.clone(),
        commands,
    }
}

fn format_tick_date(date: NaiveDate) -> String {
    date.format("%m/%d").to_string()
}
