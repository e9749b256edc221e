//! Data-to-visual mapping for the statistics chart.
//!
//! A [`Figure`] holds everything a backend needs: converted values, axis
//! ranges, tick positions, label formatters and annotations. Building one
//! performs every parse, so a bad value fails here before any backend is
//! touched.

use crate::axis::{TickFormat, TickSpacing, Unit};
use crate::dataset::{Column, Dataset};
use crate::error::Result;
use crate::timecode::format_seconds;
use tracing::debug;

/// Upper bound of the render-time panel, whatever the data.
pub const RENDER_TIME_CEILING: f64 = 0.3;
/// Reference line drawn on the render-time panel.
pub const RENDER_TIME_THRESHOLD: f64 = 0.25;

/// Largest sample of a panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub index: usize,
    pub time: f64,
    pub value: f64,
}

impl Peak {
    pub fn label(&self) -> String {
        format!("Max: {:.3}s | {}", self.value, format_seconds(self.time))
    }
}

/// First index holding the largest value. NaN never wins.
pub fn argmax(values: &[f64]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best
}

/// One stacked subplot.
#[derive(Debug, Clone)]
pub struct Panel {
    pub column: Column,
    pub values: Vec<f64>,
    pub max: f64,
    pub y_range: (f64, f64),
    pub tick_format: TickFormat,
    /// Dashed reference line
    pub threshold: Option<f64>,
    /// Highlighted maximum
    pub peak: Option<Peak>,
}

impl Panel {
    fn build(column: Column, values: Vec<f64>, times: &[f64]) -> Self {
        let top = argmax(&values);
        let max = top.map_or(0.0, |(_, v)| v);
        let tick_format = TickFormat::for_unit(column.unit(), max);

        let (y_range, threshold, peak) = match column {
            Column::TimeBenchmark => {
                let peak = top.map(|(index, value)| Peak {
                    index,
                    time: times[index],
                    value,
                });
                (
                    (0.0, RENDER_TIME_CEILING),
                    Some(RENDER_TIME_THRESHOLD),
                    peak,
                )
            }
            _ => ((0.0, if max > 0.0 { max } else { 1.0 }), None, None),
        };

        debug!(
            column = column.name(),
            max,
            ?tick_format,
            "built panel"
        );

        Self {
            column,
            values,
            max,
            y_range,
            tick_format,
            threshold,
            peak,
        }
    }

    pub fn title(&self) -> &'static str {
        self.column.title()
    }

    /// Axis description, only shown for panels without a unit in the labels.
    pub fn y_desc(&self) -> Option<&'static str> {
        match self.column.unit() {
            Unit::Seconds => Some(Unit::Seconds.as_str()),
            Unit::Bytes | Unit::Counts => None,
        }
    }

    pub fn format_tick(&self, value: f64) -> String {
        self.tick_format.format(value)
    }
}

/// The whole chart: one shared time axis and four panels.
#[derive(Debug, Clone)]
pub struct Figure {
    pub heading: String,
    pub times: Vec<f64>,
    pub x_range: (f64, f64),
    pub major_ticks: Vec<f64>,
    pub minor_ticks: Vec<f64>,
    pub panels: Vec<Panel>,
}

impl Figure {
    /// Convert a dataset into a figure with major time ticks every
    /// `xtick_interval` seconds.
    pub fn build(dataset: &Dataset, xtick_interval: u32) -> Result<Self> {
        let times = dataset.elapsed_seconds()?;

        let first = times.first().copied().unwrap_or(0.0);
        let last = times.last().copied().unwrap_or(first);
        // A single sample still needs a non-empty axis
        let x_range = if last > first {
            (first, last)
        } else {
            (first, first + 1.0)
        };

        let spacing = TickSpacing::from_interval(xtick_interval);
        let major_ticks = spacing.major_ticks(x_range.0, x_range.1);
        let minor_ticks = spacing.minor_ticks(x_range.0, x_range.1);

        let panels = Column::ALL
            .iter()
            .map(|&column| Ok(Panel::build(column, dataset.column_values(column)?, &times)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            heading: dataset.display_title(),
            times,
            x_range,
            major_ticks,
            minor_ticks,
            panels,
        })
    }

    pub fn format_time(&self, seconds: f64) -> String {
        format_seconds(seconds)
    }

    /// `(time, value)` pairs of one panel.
    pub fn series<'a>(&'a self, panel: &'a Panel) -> impl Iterator<Item = (f64, f64)> + 'a {
        self.times.iter().copied().zip(panel.values.iter().copied())
    }
}
