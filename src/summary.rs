//! Per-column summary of a loaded dataset, printed as text or written as JSON.

use crate::axis::Unit;
use crate::dataset::Column;
use crate::figure::{argmax, Figure};
use crate::timecode::format_seconds;
use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use num_format::{Locale, ToFormattedString};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Statistics of one column
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub column: Column,
    pub unit: Unit,
    pub max: f64,
    /// Elapsed seconds of the first sample holding the maximum
    pub max_at: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub source: String,
    pub generated_at: String,
    pub frames: usize,
    pub start: f64,
    pub end: f64,
    pub columns: Vec<ColumnSummary>,
}

impl Summary {
    pub fn from_figure<Tz>(figure: &Figure, source: &str, generated_at: DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let columns = figure
            .panels
            .iter()
            .map(|panel| {
                let index = argmax(&panel.values).map_or(0, |(i, _)| i);
                let mean = if panel.values.is_empty() {
                    0.0
                } else {
                    panel.values.iter().sum::<f64>() / panel.values.len() as f64
                };
                ColumnSummary {
                    column: panel.column,
                    unit: panel.column.unit(),
                    max: panel.max,
                    max_at: figure.times.get(index).copied().unwrap_or(0.0),
                    mean,
                }
            })
            .collect();

        Self {
            source: source.to_string(),
            generated_at: generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            frames: figure.times.len(),
            start: figure.times.first().copied().unwrap_or(0.0),
            end: figure.times.last().copied().unwrap_or(0.0),
            columns,
        }
    }

    /// Write the human-readable report
    pub fn write_text<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "{}", "=".repeat(60))?;
        writeln!(out, "                 FRAME STATISTICS SUMMARY")?;
        writeln!(out, "{}", "=".repeat(60))?;
        writeln!(out, "Source: {}", self.source)?;
        writeln!(out, "Generated: {}", self.generated_at)?;
        writeln!(
            out,
            "Frames: {}  Span: {} - {}",
            self.frames.to_formatted_string(&Locale::en),
            format_seconds(self.start),
            format_seconds(self.end)
        )?;

        for col in &self.columns {
            writeln!(out)?;
            writeln!(out, "{}:", col.column.title())?;
            writeln!(
                out,
                "  max {} at {}, mean {}",
                format_value(col.unit, col.max),
                format_seconds(col.max_at),
                format_value(col.unit, col.mean)
            )?;
        }
        writeln!(out, "{}", "=".repeat(60))?;
        Ok(())
    }

    /// Write the report as pretty-printed JSON
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create summary file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

fn format_value(unit: Unit, value: f64) -> String {
    match unit {
        Unit::Bytes => format!(
            "{} bytes",
            (value.round() as u64).to_formatted_string(&Locale::en)
        ),
        Unit::Counts => {
            if value.fract() == 0.0 {
                (value as u64).to_formatted_string(&Locale::en)
            } else {
                format!("{:.1}", value)
            }
        }
        Unit::Seconds => format!("{:.3}s", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn summary() -> Summary {
        let input = "\
subs/movie.ass
time,total_image_size,largest_image_size,image_count,time_benchmark
0:00:00.00,1500,1000,3,0.1
0:00:30.00,2000000,1500000,12,0.35
0:01:00.00,1000,400,12,0.2
";
        let dataset = Dataset::from_reader(input.as_bytes()).unwrap();
        let figure = Figure::build(&dataset, 180).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        Summary::from_figure(&figure, dataset.title(), at)
    }

    #[test]
    fn column_max_and_mean() {
        let summary = summary();
        assert_eq!(summary.frames, 3);
        assert_eq!((summary.start, summary.end), (0.0, 60.0));

        let counts = &summary.columns[2];
        assert_eq!(counts.column, Column::ImageCount);
        assert_eq!(counts.max, 12.0);
        assert_eq!(counts.max_at, 30.0);
        assert_eq!(counts.mean, 9.0);

        let render = &summary.columns[3];
        assert_eq!(render.max, 0.35);
        assert_eq!(render.max_at, 30.0);
    }

    #[test]
    fn text_report() {
        let mut out = Vec::new();
        summary().write_text(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Source: subs/movie.ass"));
        assert!(text.contains("Generated: 2024-03-01 12:30:00"));
        assert!(text.contains("Frames: 3  Span: 00:00 - 01:00"));
        assert!(text.contains("total bitmap sizes for frame:\n  max 2,000,000 bytes at 00:30"));
        assert!(text.contains("bitmap counts:\n  max 12 at 00:30, mean 9"));
        assert!(text.contains("frame render time:\n  max 0.350s at 00:30, mean 0.217s"));
    }

    #[test]
    fn json_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        summary().write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["frames"], 3);
        assert_eq!(value["columns"][0]["column"], "total_image_size");
        assert_eq!(value["columns"][0]["unit"], "bytes");
        assert_eq!(value["columns"][3]["max"], 0.35);
    }

    #[test]
    fn value_formatting_by_unit() {
        assert_eq!(format_value(Unit::Bytes, 1234567.4), "1,234,567 bytes");
        assert_eq!(format_value(Unit::Counts, 1500.0), "1,500");
        assert_eq!(format_value(Unit::Counts, 2.5), "2.5");
        assert_eq!(format_value(Unit::Seconds, 0.0126), "0.013s");
    }
}
