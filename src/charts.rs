//! Percentile/latency comparison chart.
use std::path::Path;

use plotters::prelude::*;
use tracing::info;

use crate::error::RenderError;
use crate::report::TERMINAL_PERCENTILE;
use crate::results::{ChartSeries, ResultSet, ensure_parent_dir};

const CHART_SIZE: (u32, u32) = (1024, 600);
const BACKGROUND: RGBColor = RGBColor(0xef, 0xef, 0xef);
const PALETTE: [RGBColor; 8] = [
    BLUE,
    RED,
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xff, 0x7f, 0x0e),
    MAGENTA,
    CYAN,
    RGBColor(0x8c, 0x56, 0x4b),
    BLACK,
];

/// Colour for the series at `index`, cycling through the palette.
#[must_use]
pub fn series_color(index: usize) -> RGBColor {
    PALETTE
        .get(index.checked_rem(PALETTE.len()).unwrap_or_default())
        .copied()
        .unwrap_or(BLUE)
}

/// Renders one line per result, in result order, to a PNG at `path`.
///
/// # Errors
///
/// Returns an error when there is nothing to plot or the image cannot be
/// drawn or written.
pub fn render_comparison_chart(results: &ResultSet, path: &Path) -> Result<(), RenderError> {
    if results.is_empty() {
        return Err(RenderError::EmptyResultSet);
    }
    ensure_parent_dir(path)?;
    let series = results.series();
    let y_max = latency_ceiling(&series);

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&BACKGROUND)?;
    let root = root.margin(20, 20, 20, 20);

    let mut chart = ChartBuilder::on(&root)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..TERMINAL_PERCENTILE, 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Percentile")
        .y_desc("Latency (milliseconds)")
        .light_line_style(BACKGROUND)
        .draw()?;

    for (index, line) in series.iter().enumerate() {
        let color = series_color(index);
        chart
            .draw_series(LineSeries::new(line.points.iter().copied(), color.stroke_width(2)))?
            .label(line.label.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x.saturating_add(20), y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    info!(path = %path.display(), series = series.len(), "Comparison chart written");
    Ok(())
}

fn latency_ceiling(series: &[ChartSeries]) -> f64 {
    let max = series
        .iter()
        .flat_map(|line| line.points.iter().map(|(_, latency)| *latency))
        .fold(0.0_f64, f64::max);
    if max > 0.0 { max * 1.1 } else { 1.0 }
}
