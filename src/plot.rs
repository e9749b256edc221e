//! Chart rendering to image files.

use crate::error::StatsError;
use crate::figure::{Figure, Panel};
use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontTransform;
use std::path::Path;
use tracing::info;

/// 18 x 10 inches at 180 dpi
pub const FIGURE_SIZE: (u32, u32) = (3240, 1800);

const BACKGROUND: RGBColor = RGBColor(0x1e, 0x1e, 0x1e);
const SERIES: RGBColor = RGBColor(0, 191, 255);
const PEAK: RGBColor = RGBColor(255, 165, 0);
const THRESHOLD: RGBColor = RGBColor(255, 0, 0);

/// Dashes across the full width of the threshold line
const DASH_COUNT: usize = 80;

const MARGIN: u32 = 16;
const X_LABEL_AREA: u32 = 50;
const Y_LABEL_AREA: u32 = 170;
const LABEL_SIZE: u32 = 22;
/// Approximate advance of one monospace label character, in pixels
const LABEL_CHAR_WIDTH: usize = 14;

/// Output encoding, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// png, jpg/jpeg or bmp through the bitmap backend
    Raster,
    Svg,
}

impl ImageFormat {
    pub fn from_path(path: &Path) -> std::result::Result<Self, StatsError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("png" | "jpg" | "jpeg" | "bmp") => Ok(ImageFormat::Raster),
            Some("svg") => Ok(ImageFormat::Svg),
            Some(other) => Err(StatsError::Argument(format!(
                "unsupported output format '.{}' (use png, jpg, bmp or svg)",
                other
            ))),
            None => Err(StatsError::Argument(format!(
                "output path {} has no file extension",
                path.display()
            ))),
        }
    }
}

/// Render the figure to `path`, in the format its extension names.
pub fn save_figure<P: AsRef<Path>>(figure: &Figure, path: P) -> Result<()> {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path)?;

    let rendered = match format {
        ImageFormat::Raster => {
            let root = BitMapBackend::new(path, FIGURE_SIZE).into_drawing_area();
            draw_figure(root, figure)
        }
        ImageFormat::Svg => {
            let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
            draw_figure(root, figure)
        }
    };
    rendered.with_context(|| format!("Failed to render chart to {}", path.display()))?;

    info!(path = %path.display(), ?format, "chart written");
    Ok(())
}

fn draw_figure<DB>(root: DrawingArea<DB, Shift>, figure: &Figure) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&BACKGROUND)?;
    let body = root.titled(&figure.heading, ("sans-serif", 48).into_font().color(&WHITE))?;

    let areas = body.split_evenly((figure.panels.len(), 1));
    for (area, panel) in areas.iter().zip(&figure.panels) {
        draw_panel(area, figure, panel)?;
    }

    root.present()?;
    Ok(())
}

fn draw_panel<DB>(area: &DrawingArea<DB, Shift>, figure: &Figure, panel: &Panel) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (x0, x1) = figure.x_range;
    let (y0, y1) = panel.y_range;

    // Grid lines land exactly on the tick multiples
    let x_coord = (x0..x1)
        .with_key_points(figure.major_ticks.clone())
        .with_light_points(figure.minor_ticks.iter().copied());

    let plot_width = area.dim_in_pixel().0.saturating_sub(Y_LABEL_AREA + 2 * MARGIN);
    let widest = widest_time_label(figure);
    let upright = time_labels_crowded(figure.major_ticks.len(), widest, plot_width);
    let x_label_area = if upright {
        X_LABEL_AREA.max((widest * LABEL_CHAR_WIDTH) as u32 + 20)
    } else {
        X_LABEL_AREA
    };

    let mut chart = ChartBuilder::on(area)
        .caption(panel.title(), ("sans-serif", 30).into_font().color(&WHITE))
        .margin(MARGIN)
        .x_label_area_size(x_label_area)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(x_coord, y0..y1)?;

    let x_label = |x: &f64| figure.format_time(*x);
    let y_label = |y: &f64| panel.format_tick(*y);

    let mut mesh = chart.configure_mesh();
    mesh.disable_y_mesh()
        .bold_line_style(WHITE.mix(0.3))
        .light_line_style(WHITE.mix(0.15))
        .axis_style(WHITE)
        .label_style(("monospace", LABEL_SIZE).into_font().color(&WHITE))
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label);
    // Text only turns in quarter steps; stand dense time labels upright
    if upright {
        mesh.x_label_style(
            ("monospace", LABEL_SIZE)
                .into_font()
                .transform(FontTransform::Rotate90)
                .color(&WHITE),
        );
    }
    if let Some(desc) = panel.y_desc() {
        mesh.y_desc(desc)
            .axis_desc_style(("sans-serif", 24).into_font().color(&WHITE));
    }
    mesh.draw()?;

    // Samples above the panel's ceiling sit on its top edge
    chart.draw_series(LineSeries::new(
        figure.series(panel).map(|(x, y)| (x, y.min(y1))),
        SERIES.stroke_width(2),
    ))?;

    let annotated = panel.threshold.is_some() || panel.peak.is_some();

    if let Some(level) = panel.threshold {
        chart
            .draw_series(dash_segments(x0, x1, DASH_COUNT).into_iter().map(|(a, b)| {
                PathElement::new(vec![(a, level), (b, level)], THRESHOLD.stroke_width(3))
            }))?
            .label(format!("{}s threshold", level))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], THRESHOLD.stroke_width(3)));
    }

    if let Some(peak) = panel.peak {
        let visible = (peak.value <= y1).then_some((peak.time, peak.value));
        chart
            .draw_series(visible.map(|p| Circle::new(p, 10, PEAK.filled())))?
            .label(peak.label())
            .legend(|(x, y)| Circle::new((x + 15, y), 8, PEAK.filled()));
    }

    if annotated {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(BACKGROUND)
            .border_style(WHITE)
            .label_font(("sans-serif", 22).into_font().color(&WHITE))
            .draw()?;
    }

    Ok(())
}

fn widest_time_label(figure: &Figure) -> usize {
    figure
        .major_ticks
        .iter()
        .map(|&t| figure.format_time(t).len())
        .max()
        .unwrap_or(0)
}

/// Whether `count` horizontal labels of `widest` characters overrun `width` pixels.
fn time_labels_crowded(count: usize, widest: usize, width: u32) -> bool {
    count * (widest + 2) * LABEL_CHAR_WIDTH > width as usize
}

/// `(start, end)` of `count` evenly spaced dashes covering `[lo, hi]`.
fn dash_segments(lo: f64, hi: f64, count: usize) -> Vec<(f64, f64)> {
    if count == 0 || !(hi > lo) {
        return Vec::new();
    }
    let step = (hi - lo) / count as f64;
    (0..count)
        .map(|i| {
            let start = lo + step * i as f64;
            (start, start + step * 0.6)
        })
        .collect()
}
