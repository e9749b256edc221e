//! Loading per-frame statistics written by the libass profiler.
//!
//! File layout:
//!
//! ```text
//! /path/to/subtitles.ass            <- title, first field only
//! time,total_image_size,...         <- header, ignored
//! 0:00:01.04,123456,65536,12,0.012  <- one row per frame
//! ```
//!
//! Values are kept as the strings found in the file. Conversion to numbers
//! happens when a chart asks for a column.

use crate::axis::Unit;
use crate::error::{Result, StatsError};
use crate::timecode::parse_timestamp;
use serde::{Deserialize, Serialize};
use std::fs::File;
use csv::StringRecord;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Number of fields in every data row.
pub const FIELD_COUNT: usize = 5;

/// One frame sample, bound positionally from a CSV row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameStatistics {
    pub time: String,
    pub total_image_size: String,
    pub largest_image_size: String,
    pub image_count: String,
    pub time_benchmark: String,
}

/// Statistic columns, in the order they are charted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    TotalImageSize,
    LargestImageSize,
    ImageCount,
    TimeBenchmark,
}

impl Column {
    pub const ALL: [Column; 4] = [
        Column::TotalImageSize,
        Column::LargestImageSize,
        Column::ImageCount,
        Column::TimeBenchmark,
    ];

    /// Field name as written in the profiler header.
    pub fn name(self) -> &'static str {
        match self {
            Column::TotalImageSize => "total_image_size",
            Column::LargestImageSize => "largest_image_size",
            Column::ImageCount => "image_count",
            Column::TimeBenchmark => "time_benchmark",
        }
    }

    /// Panel title.
    pub fn title(self) -> &'static str {
        match self {
            Column::TotalImageSize => "total bitmap sizes for frame",
            Column::LargestImageSize => "largest bitmap size in frame",
            Column::ImageCount => "bitmap counts",
            Column::TimeBenchmark => "frame render time",
        }
    }

    pub fn unit(self) -> Unit {
        match self {
            Column::TotalImageSize | Column::LargestImageSize => Unit::Bytes,
            Column::ImageCount => Unit::Counts,
            Column::TimeBenchmark => Unit::Seconds,
        }
    }

    fn raw(self, record: &FrameStatistics) -> &str {
        match self {
            Column::TotalImageSize => &record.total_image_size,
            Column::LargestImageSize => &record.largest_image_size,
            Column::ImageCount => &record.image_count,
            Column::TimeBenchmark => &record.time_benchmark,
        }
    }
}

/// A titled, ordered sequence of frame samples from one file.
#[derive(Debug, Clone)]
pub struct Dataset {
    title: String,
    records: Vec<FrameStatistics>,
    // Source line of each record, for error messages.
    lines: Vec<u64>,
}

impl Dataset {
    /// Build a dataset from records that did not come from a file.
    #[cfg(test)]
    pub fn new(title: impl Into<String>, records: Vec<FrameStatistics>) -> Self {
        let lines = (3..).take(records.len()).collect();
        Self {
            title: title.into(),
            records,
            lines,
        }
    }

    /// Load a profiler CSV file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| StatsError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;

        let dataset = Self::from_reader(file).map_err(|e| match e {
            StatsError::Read(source) => StatsError::FileAccess {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        if dataset.is_empty() {
            return Err(StatsError::EmptyDataset(path.to_path_buf()));
        }

        debug!(
            path = %path.display(),
            rows = dataset.records.len(),
            "loaded frame statistics"
        );
        Ok(dataset)
    }

    /// Parse profiler CSV from any reader. An input with a title and header
    /// but no data rows yields an empty dataset.
    ///
    /// Each physical line is one row. A blank line is a row with no fields.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut input = BufReader::new(reader).split(b'\n').zip(1u64..);

        let title_row = match input.next() {
            Some((line, _)) => split_fields(&line?)?,
            None => StringRecord::new(),
        };
        let title = title_row.get(0).ok_or(StatsError::MalformedRow {
            line: 1,
            expected: 1,
            found: 0,
        })?;
        let title = title.to_string();

        // Header is skipped unvalidated, but it has to be there
        let header = match input.next() {
            Some((line, _)) => split_fields(&line?)?,
            None => StringRecord::new(),
        };
        if header.is_empty() {
            return Err(StatsError::MalformedRow {
                line: 2,
                expected: FIELD_COUNT,
                found: 0,
            });
        }

        let mut records = Vec::new();
        let mut lines = Vec::new();
        for (raw, line) in input {
            let row = split_fields(&raw?)?;
            if row.len() != FIELD_COUNT {
                return Err(StatsError::MalformedRow {
                    line,
                    expected: FIELD_COUNT,
                    found: row.len(),
                });
            }
            records.push(row.deserialize::<FrameStatistics>(None)?);
            lines.push(line);
        }

        Ok(Self {
            title,
            records,
            lines,
        })
    }

    /// Title line as found in the file
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Figure heading: the title's final path component.
    pub fn display_title(&self) -> String {
        let base = self.title.rsplit('/').next().unwrap_or(&self.title);
        format!("Analytics for {}", base)
    }

    #[cfg(test)]
    pub fn records(&self) -> &[FrameStatistics] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Elapsed seconds of every record, in file order.
    pub fn elapsed_seconds(&self) -> Result<Vec<f64>> {
        self.records
            .iter()
            .zip(&self.lines)
            .map(|(record, &line)| parse_timestamp(&record.time).map_err(|e| e.at_line(line)))
            .collect()
    }

    /// Numeric values of one statistic column, in file order.
    pub fn column_values(&self, column: Column) -> Result<Vec<f64>> {
        self.records
            .iter()
            .zip(&self.lines)
            .map(|(record, &line)| {
                let raw = column.raw(record);
                raw.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| StatsError::Format {
                        field: column.name(),
                        value: raw.to_string(),
                        line,
                    })
            })
            .collect()
    }
}

/// Fields of one physical line, without its line terminator.
fn split_fields(line: &[u8]) -> Result<StringRecord> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.is_empty() {
        return Ok(StringRecord::new());
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line);
    Ok(reader
        .records()
        .next()
        .transpose()?
        .unwrap_or_else(StringRecord::new))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const SAMPLE: &str = "\
/home/user/subs/show.ass
time,total_image_size,largest_image_size,image_count,time_benchmark
0:00:00.00,1500,1000,3,0.1
0:00:01.50,2000000,1500000,12,0.35
0:00:03.00,500,400,1,0.2
";

    #[test]
    fn loads_title_and_rows_as_strings() {
        let dataset = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.title(), "/home/user/subs/show.ass");
        assert_eq!(dataset.len(), 3);
        assert_eq!(
            dataset.records()[1],
            FrameStatistics {
                time: "0:00:01.50".into(),
                total_image_size: "2000000".into(),
                largest_image_size: "1500000".into(),
                image_count: "12".into(),
                time_benchmark: "0.35".into(),
            }
        );
    }

    #[test]
    fn header_row_is_not_validated() {
        let input = "title\nwhatever\n0:00:01.00,1,2,3,0.5\n";
        let dataset = Dataset::from_reader(input.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn display_title_uses_basename() {
        let dataset = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.display_title(), "Analytics for show.ass");

        let plain = Dataset::new("episode 01", Vec::new());
        assert_eq!(plain.display_title(), "Analytics for episode 01");
    }

    #[test]
    fn short_row_is_malformed() {
        let input = "title\nheader\n0:00:00.00,1,2,3,0.1\n0:00:01.00,1,2,3\n";
        let err = Dataset::from_reader(input.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            StatsError::MalformedRow {
                line: 4,
                expected: 5,
                found: 4
            }
        ));
    }

    #[test]
    fn missing_header_is_malformed() {
        let err = Dataset::from_reader("only a title\n".as_bytes()).unwrap_err();
        assert!(matches!(err, StatsError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn blank_first_line_is_a_missing_title() {
        let input = "\nheader\n0:00:00.00,1,2,3,0.1\n0:00:01.00,1,2,3,0.2\n";
        let err = Dataset::from_reader(input.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            StatsError::MalformedRow {
                line: 1,
                found: 0,
                ..
            }
        ));
    }

    #[test]
    fn blank_header_line_is_malformed() {
        let input = "title\n\n0:00:00.00,1,2,3,0.1\n";
        let err = Dataset::from_reader(input.as_bytes()).unwrap_err();
        assert!(matches!(err, StatsError::MalformedRow { line: 2, found: 0, .. }));
    }

    #[test]
    fn blank_line_between_rows_is_malformed() {
        let input = "title\nheader\n0:00:00.00,1,2,3,0.1\n\n0:00:01.00,1,2,3,0.2\n";
        let err = Dataset::from_reader(input.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            StatsError::MalformedRow {
                line: 4,
                expected: 5,
                found: 0
            }
        ));
    }

    #[test]
    fn crlf_rows_keep_their_line_numbers() {
        let input = "title\r\nheader\r\n0:00:00.00,1,2,3,0.1\r\n0:00:01.00,1,2,3\r\n";
        let err = Dataset::from_reader(input.as_bytes()).unwrap_err();
        assert!(matches!(err, StatsError::MalformedRow { line: 4, found: 4, .. }));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        for bad in ["inf", "NaN", "-inf", "1e400"] {
            let input = format!("t\nh\n0:00:00.00,1,2,3,0.1\n0:00:01.00,{bad},2,3,0.1\n");
            let dataset = Dataset::from_reader(input.as_bytes()).unwrap();
            let err = dataset.column_values(Column::TotalImageSize).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Invalid total_image_size '{bad}' at line 4")
            );
        }
    }

    #[test]
    fn converts_columns_on_demand() {
        let dataset = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.elapsed_seconds().unwrap(), vec![0.0, 1.5, 3.0]);
        assert_eq!(
            dataset.column_values(Column::TimeBenchmark).unwrap(),
            vec![0.1, 0.35, 0.2]
        );
        assert_eq!(
            dataset.column_values(Column::ImageCount).unwrap(),
            vec![3.0, 12.0, 1.0]
        );
    }

    #[test]
    fn bad_number_reports_column_and_line() {
        let input = "t\nh\n0:00:00.00,1,2,3,0.1\n0:00:01.00,1,2,lots,0.1\n";
        let dataset = Dataset::from_reader(input.as_bytes()).unwrap();
        let err = dataset.column_values(Column::ImageCount).unwrap_err();
        assert_eq!(err.to_string(), "Invalid image_count 'lots' at line 4");
    }

    #[test]
    fn bad_timestamp_reports_line() {
        let input = "t\nh\n00:01,1,2,3,0.1\n";
        let dataset = Dataset::from_reader(input.as_bytes()).unwrap();
        let err = dataset.elapsed_seconds().unwrap_err();
        assert_eq!(err.to_string(), "Invalid timestamp '00:01' at line 3");
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Dataset::load("/nonexistent/statistics.csv").unwrap_err();
        assert!(matches!(err, StatsError::FileAccess { .. }));
    }

    #[test]
    fn load_rejects_file_without_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "title\nheader\n").unwrap();
        let err = Dataset::load(file.path()).unwrap_err();
        assert!(matches!(err, StatsError::EmptyDataset(_)));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let dataset = Dataset::load(file.path()).unwrap();
        assert_eq!(dataset.len(), 3);
    }
}
