// Pipeline executor: load, coerce, aggregate, compile, render

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::compiler;
use crate::csv_reader::{self, SummaryRow};
use crate::data::{self, CoercionMode, Record};
use crate::graph;
use crate::ir::{DailyAverage, SceneGraph};
use crate::transform::{self, distinct_in_order};
use crate::RenderOptions;

/// Read and coerce the engagement dataset at `path` (`-` for stdin)
pub fn load_records(path: &Path, mode: CoercionMode) -> Result<Vec<Record>> {
    let reader = csv_reader::open_input(path)?;
    let raw = csv_reader::read_records(reader, mode)
        .with_context(|| format!("Failed to load '{}'", path.display()))?;
    let records = data::coerce_records(&raw, mode)
        .with_context(|| format!("Malformed data in '{}'", path.display()))?;
    info!(path = %path.display(), rows = raw.len(), kept = records.len(), "Loaded records");
    Ok(records)
}

/// Read a `Date,AvgLikes` summary file, ordered by date
pub fn load_daily_summary(path: &Path, mode: CoercionMode) -> Result<Vec<DailyAverage>> {
    let reader = csv_reader::open_input(path)?;
    let raw = csv_reader::read_daily_summary(reader, mode)
        .with_context(|| format!("Failed to load summary '{}'", path.display()))?;
    let daily = data::coerce_summary(&raw, mode)
        .with_context(|| format!("Malformed summary in '{}'", path.display()))?;
    info!(path = %path.display(), days = daily.len(), "Loaded daily summary");
    Ok(daily)
}

pub fn boxplot_scene(records: &[Record], options: &RenderOptions) -> SceneGraph {
    let summaries = transform::summarize(records, |r| r.platform.as_str());
    info!(groups = summaries.len(), "Summarized likes per platform");
    for s in &summaries {
        debug!(platform = %s.key, posts = s.count, median = s.median, "Platform summary");
    }
    compiler::compile_boxplot(&summaries, options)
}

pub fn barplot_scene(records: &[Record], options: &RenderOptions) -> SceneGraph {
    let cells = transform::mean_by_two_keys(records, |r| r.platform.as_str(), |r| r.post_type.as_str());
    // Colors follow post-type order in the raw rows
    let color_domain = distinct_in_order(records.iter().map(|r| r.post_type.as_str()));
    info!(cells = cells.len(), post_types = color_domain.len(), "Averaged likes per platform and post type");
    compiler::compile_barplot(&cells, color_domain, options)
}

pub fn lineplot_scene(daily: &[DailyAverage], options: &RenderOptions) -> SceneGraph {
    info!(
        days = daily.len(),
        start = %options.window.start,
        end = %options.window.end,
        "Plotting daily averages"
    );
    compiler::compile_lineplot(daily, &options.window, options)
}

/// Render a compiled scene in the configured output format
pub fn render(scene: &SceneGraph, options: &RenderOptions) -> Result<Vec<u8>> {
    let bytes = graph::render_scene(scene, &options.format)
        .with_context(|| format!("Failed to render {}x{} scene", scene.width, scene.height))?;
    info!(format = options.format.extension(), bytes = bytes.len(), "Rendered chart");
    Ok(bytes)
}

pub fn render_boxplot(records: &[Record], options: &RenderOptions) -> Result<Vec<u8>> {
    render(&boxplot_scene(records, options), options)
}

pub fn render_barplot(records: &[Record], options: &RenderOptions) -> Result<Vec<u8>> {
    render(&barplot_scene(records, options), options)
}

pub fn render_lineplot(daily: &[DailyAverage], options: &RenderOptions) -> Result<Vec<u8>> {
    render(&lineplot_scene(daily, options), options)
}

/// Summary rows for the daily averages: labeled dates, likes to 3 decimals
pub fn daily_summary_rows(daily: &[DailyAverage]) -> Vec<SummaryRow> {
    daily
        .iter()
        .map(|d| SummaryRow {
            date: d.label(),
            avg_likes: three_decimals(d.avg_likes),
        })
        .collect()
}

/// Fixed 3-decimal text of `value`. Exact halfway values round away from
/// zero; everything else is correctly rounded.
fn three_decimals(value: f64) -> String {
    const SCALE: u128 = 1000;

    if value.is_finite() && value != 0.0 {
        // value = mantissa * 2^exponent, exactly
        let bits = value.to_bits();
        let biased = ((bits >> 52) & 0x7ff) as i32;
        let fraction = u128::from(bits & ((1u64 << 52) - 1));
        let (mantissa, exponent) = if biased == 0 {
            (fraction, -1074)
        } else {
            (fraction | (1u128 << 52), biased - 1075)
        };

        // Halfway between two thousandths only if the scaled value ends in exactly .5
        let shift = -exponent;
        if (1..64).contains(&shift) {
            let scaled = mantissa * SCALE;
            let remainder = scaled & ((1u128 << shift) - 1);
            if remainder == 1u128 << (shift - 1) {
                let n = (scaled >> shift) + 1;
                let sign = if value < 0.0 { "-" } else { "" };
                return format!("{}{}.{:03}", sign, n / SCALE, n % SCALE);
            }
        }
    }

    format!("{:.3}", value)
}

/// Write the daily average summary of `records` as CSV
pub fn export_daily_summary<W: Write>(records: &[Record], writer: W) -> Result<()> {
    let daily = transform::compute_daily_averages(records);
    info!(days = daily.len(), "Writing daily summary");
    csv_reader::write_daily_summary(writer, &daily_summary_rows(&daily))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::DrawCommand;
    use crate::OutputFormat;
    use chrono::NaiveDate;
    use std::io::Cursor;

    const CSV: &str = "\
Platform,PostType,Date,Likes
Instagram,Image,3/1/2024 (Friday),100
Instagram,Video,3/1/2024 (Friday),200
Facebook,Image,3/2/2024 (Saturday),50
Facebook,Link,3/8/2024 (Friday),70
Twitter,Video,3/2/2024 (Saturday),30
";

    fn records() -> Vec<Record> {
        let raw = csv_reader::read_records(Cursor::new(CSV), CoercionMode::Strict).unwrap();
        data::coerce_records(&raw, CoercionMode::Strict).unwrap()
    }

    fn count_rects(scene: &SceneGraph) -> usize {
        scene.commands.iter().filter(|c| matches!(c, DrawCommand::DrawRect { .. })).count()
    }

    #[test]
    fn test_boxplot_one_box_per_platform() {
        let scene = boxplot_scene(&records(), &RenderOptions::default());
        assert_eq!(count_rects(&scene), 3);
    }

    #[test]
    fn test_barplot_bars_and_legend() {
        let scene = barplot_scene(&records(), &RenderOptions::default());
        // 5 non-empty cells plus 3 legend swatches
        assert_eq!(count_rects(&scene), 5 + 3);
    }

    #[test]
    fn test_lineplot_drops_days_outside_window() {
        let daily = transform::compute_daily_averages(&records());
        assert_eq!(daily.len(), 3);
        let scene = lineplot_scene(&daily, &RenderOptions::default());
        let circles = scene.commands.iter().filter(|c| matches!(c, DrawCommand::DrawCircle { .. })).count();
        assert_eq!(circles, 2);
    }

    #[test]
    fn test_daily_summary_rows() {
        let daily = vec![
            DailyAverage { date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), avg_likes: 150.0 },
            DailyAverage { date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(), avg_likes: 40.0 / 3.0 },
            DailyAverage { date: NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(), avg_likes: 161.0 / 16.0 },
        ];
        let rows = daily_summary_rows(&daily);
        assert_eq!(rows[0].date, "3/1/2024 (Friday)");
        assert_eq!(rows[0].avg_likes, "150.000");
        assert_eq!(rows[1].avg_likes, "13.333");
        assert_eq!(rows[2].avg_likes, "10.063");
    }

    #[test]
    fn test_three_decimals_halfway_rounds_up() {
        // 16 posts averaging 10.0625 likes
        assert_eq!(three_decimals(161.0 / 16.0), "10.063");
        assert_eq!(three_decimals(0.0625), "0.063");
        assert_eq!(three_decimals(-10.0625), "-10.063");
    }

    #[test]
    fn test_three_decimals_near_halfway() {
        // 1.0005 is stored just below the halfway point
        assert_eq!(three_decimals(1.0005), "1.000");
        assert_eq!(three_decimals(12.5), "12.500");
        assert_eq!(three_decimals(0.0), "0.000");
        assert_eq!(three_decimals(1234567.8), "1234567.800");
    }

    #[test]
    fn test_export_daily_summary_reads_back() {
        let mut out = Vec::new();
        export_daily_summary(&records(), &mut out).unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.starts_with("Date,AvgLikes\n"));
        assert!(text.contains("3/2/2024 (Saturday),40.000"));

        let rows = csv_reader::read_daily_summary(Cursor::new(out), CoercionMode::Strict).unwrap();
        let daily = data::coerce_summary(&rows, CoercionMode::Strict).unwrap();
        assert_eq!(daily, transform::compute_daily_averages(&records()));
    }

    #[test]
    fn test_render_svg_by_default() {
        let bytes = render_boxplot(&records(), &RenderOptions::default()).unwrap();
        let svg = String::from_utf8(bytes).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Instagram"));
    }

    #[test]
    fn test_render_png_when_configured() {
        let options = RenderOptions { format: OutputFormat::Png, ..RenderOptions::default() };
        let scene = SceneGraph { width: 10, height: 10, background: "white".to_string(), commands: Vec::new() };
        let bytes = render(&scene, &options).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
