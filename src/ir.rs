use chrono::NaiveDate;
use crate::graph::{LineStyle, PointStyle, RectStyle, TextStyle};

// =============================================================================
// Aggregates
// =============================================================================

/// Five-number summary of the Likes of one group (box plot input).
/// Invariant: min <= q1 <= median <= q3 <= max.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub key: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Mean Likes of one (group, subgroup) pair that occurs in the data (bar chart input)
#[derive(Debug, Clone, PartialEq)]
pub struct CellAverage {
    pub group: String,
    pub subgroup: String,
    pub mean: f64,
}

/// Mean Likes of one calendar day (line chart input)
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAverage {
    pub date: NaiveDate,
    pub avg_likes: f64,
}

impl DailyAverage {
    /// `M/D/YYYY (Weekday)`, the label used by the daily summary file
    pub fn label(&self) -> String {
        self.date.format("%-m/%-d/%Y (%A)").to_string()
    }
}

// =============================================================================
// Scene Graph
// =============================================================================

/// The drawing commands of one chart, in pixel space with the origin top-left.
/// The backend just executes these in order.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub width: u32,
    pub height: u32,
    pub background: String,
    pub commands: Vec<DrawCommand>,
}

/// Control points and end point of one cubic Bézier segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicSegment {
    pub c1: (f64, f64),
    pub c2: (f64, f64),
    pub to: (f64, f64),
}

#[derive(Debug, Clone)]
pub enum DrawCommand {
    DrawLine {
        points: Vec<(f64, f64)>,
        style: LineStyle,
    },
    DrawRect {
        // Top-Left, Bottom-Right
        tl: (f64, f64),
        br: (f64, f64),
        style: RectStyle,
    },
    DrawCircle {
        center: (f64, f64),
        radius: f64,
        style: PointStyle,
    },
    DrawPath {
        start: (f64, f64),
        segments: Vec<CubicSegment>,
        style: LineStyle,
    },
    DrawText {
        pos: (f64, f64),
        text: String,
        style: TextStyle,
    },
}
