use crate::db::CategoryTotal;
use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::info;

const CHART_SIZE: (u32, u32) = (1000, 600);
const BAR_COLOR: RGBColor = RGBColor(31, 119, 180);

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("no category totals to plot")]
    NoData,

    #[error("failed to render chart: {0}")]
    Render(String),
}

/// Decimals for y tick labels: cents at least, more when the axis tops out below a few cents
fn tick_precision(y_top: f64) -> usize {
    let needed = (-(y_top / 10.0).log10()).ceil();
    if needed.is_finite() && needed > 2.0 {
        (needed as usize).min(10)
    } else {
        2
    }
}

fn render_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Render(e.to_string())
}

/// Draw one bar per category and write it to `path` as SVG, replacing any existing file.
/// An empty `totals` leaves `path` untouched.
pub fn render_category_chart(totals: &[CategoryTotal], path: &Path) -> Result<(), ChartError> {
    if totals.is_empty() {
        return Err(ChartError::NoData);
    }

    let max_total = totals.iter().map(|t| t.total).fold(0.0_f64, f64::max);
    let y_top = if max_total > 0.0 { max_total * 1.1 } else { 1.0 };
    let decimals = tick_precision(y_top);

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Expenses by Category", ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(140)
        .y_label_area_size(80)
        .build_cartesian_2d((0..totals.len()).into_segmented(), 0.0..y_top)
        .map_err(render_err)?;

    let label_for = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(i) => totals
            .get(*i)
            .map(|t| t.category.clone())
            .unwrap_or_default(),
        _ => String::new(),
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Categories")
        .y_desc("Amount ($)")
        .x_labels(totals.len())
        .x_label_formatter(&label_for)
        .x_label_style(
            ("sans-serif", 14)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .y_label_formatter(&|y| format!("{:.*}", decimals, y))
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(BAR_COLOR.filled())
                .margin(10)
                .data(totals.iter().enumerate().map(|(i, t)| (i, t.total))),
        )
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    info!(path = %path.display(), bars = totals.len(), "wrote category chart");

    Ok(())
}
