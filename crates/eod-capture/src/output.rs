//! Session output files
//!
//! The cleaned trace holds one corrected value per line followed by three
//! summary lines: event count, events per second and samples per second.
//! The interval file holds one inter-event interval in seconds per line.

use chrono::{DateTime, Utc};
use eod_core::{CorrectedSample, EodError, EodResult, SessionSummary};
use eod_processing::SessionOutput;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Where session results go
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub trace: PathBuf,
    pub intervals: PathBuf,
    pub summary_json: Option<PathBuf>,
}

/// Machine readable session record
#[derive(Debug, Serialize)]
struct SummaryRecord<'a> {
    stream_name: &'a str,
    stream_id: Uuid,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    #[serde(flatten)]
    summary: &'a SessionSummary,
    intervals_seconds: Vec<f64>,
}

/// Writes the cleaned trace while the session runs and the rest at the end
pub struct TraceFileWriter {
    paths: OutputPaths,
    trace: BufWriter<File>,
    stream_name: String,
    stream_id: Uuid,
    started_at: DateTime<Utc>,
    written: u64,
}

fn output_error(path: &Path, e: impl std::fmt::Display) -> EodError {
    EodError::output(path.display(), e)
}

impl TraceFileWriter {
    /// Create the trace file; existing files are truncated
    pub fn create(paths: OutputPaths, stream_name: &str, stream_id: Uuid) -> EodResult<Self> {
        let file = File::create(&paths.trace).map_err(|e| output_error(&paths.trace, e))?;

        Ok(Self {
            trace: BufWriter::new(file),
            paths,
            stream_name: stream_name.to_string(),
            stream_id,
            started_at: Utc::now(),
            written: 0,
        })
    }

    fn write_intervals(&self, intervals: &[Duration]) -> EodResult<()> {
        let path = &self.paths.intervals;
        let file = File::create(path).map_err(|e| output_error(path, e))?;
        let mut writer = BufWriter::new(file);
        for interval in intervals {
            writeln!(writer, "{}", interval.as_secs_f64()).map_err(|e| output_error(path, e))?;
        }
        writer.flush().map_err(|e| output_error(path, e))
    }

    fn write_summary_json(
        &self,
        path: &Path,
        intervals: &[Duration],
        summary: &SessionSummary,
    ) -> EodResult<()> {
        let record = SummaryRecord {
            stream_name: &self.stream_name,
            stream_id: self.stream_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            summary,
            intervals_seconds: intervals.iter().map(Duration::as_secs_f64).collect(),
        };
        let file = File::create(path).map_err(|e| output_error(path, e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &record)
            .map_err(|e| output_error(path, e))
    }
}

impl SessionOutput for TraceFileWriter {
    fn corrected(&mut self, sample: CorrectedSample) -> EodResult<()> {
        writeln!(self.trace, "{}", sample.value).map_err(|e| output_error(&self.paths.trace, e))?;
        self.written += 1;
        Ok(())
    }

    /// Every file is attempted even when an earlier one fails; the first
    /// error is returned
    fn finish(&mut self, intervals: &[Duration], summary: &SessionSummary) -> EodResult<()> {
        let trace_path = self.paths.trace.clone();
        let trace = writeln!(self.trace, "{}", summary.detected_events)
            .and_then(|_| writeln!(self.trace, "{}", summary.events_per_second))
            .and_then(|_| writeln!(self.trace, "{}", summary.samples_per_second))
            .and_then(|_| self.trace.flush())
            .map_err(|e| output_error(&trace_path, e));

        let interval_log = self.write_intervals(intervals);

        let json = match self.paths.summary_json.clone() {
            Some(path) => self.write_summary_json(&path, intervals, summary),
            None => Ok(()),
        };

        trace.and(interval_log).and(json)?;

        info!(
            trace = %self.paths.trace.display(),
            intervals = %self.paths.intervals.display(),
            values = self.written,
            "session output written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eod_core::StopReason;

    fn paths(dir: &Path, json: bool) -> OutputPaths {
        OutputPaths {
            trace: dir.join("Data.txt"),
            intervals: dir.join("DataSPI.txt"),
            summary_json: json.then(|| dir.join("summary.json")),
        }
    }

    #[test]
    fn test_trace_and_interval_layout() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = TraceFileWriter::create(paths(dir.path(), false), "HackEEG", Uuid::new_v4()).unwrap();

        for (index, value) in [(1u64, 10), (2, -20), (3, 30)] {
            writer.corrected(CorrectedSample { index, value }).unwrap();
        }
        let intervals = [Duration::from_millis(1500), Duration::from_millis(500)];
        let summary = SessionSummary::new(1000, 2, 0, 0, Duration::from_secs(2), StopReason::SampleLimit);
        writer.finish(&intervals, &summary).unwrap();
        assert_eq!(writer.written, 3);

        let trace = std::fs::read_to_string(dir.path().join("Data.txt")).unwrap();
        let lines: Vec<&str> = trace.lines().collect();
        assert_eq!(lines, vec!["10", "-20", "30", "2", "1", "500"]);

        let spi = std::fs::read_to_string(dir.path().join("DataSPI.txt")).unwrap();
        assert_eq!(spi.lines().collect::<Vec<_>>(), vec!["1.5", "0.5"]);
        assert!(!dir.path().join("summary.json").exists());
    }

    #[test]
    fn test_summary_json() {
        let dir = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let mut writer = TraceFileWriter::create(paths(dir.path(), true), "tank-3", id).unwrap();

        let summary = SessionSummary::new(500, 1, 4, 0, Duration::from_secs(1), StopReason::EndOfStream);
        writer.finish(&[Duration::from_millis(250)], &summary).unwrap();

        let text = std::fs::read_to_string(dir.path().join("summary.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["stream_name"], "tank-3");
        assert_eq!(json["stream_id"], id.to_string());
        assert_eq!(json["detected_events"], 1);
        assert_eq!(json["dropped_samples"], 4);
        assert_eq!(json["intervals_seconds"][0], 0.25);
    }

    #[test]
    fn test_unwritable_trace_is_output_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut bad = paths(dir.path(), false);
        bad.trace = dir.path().join("missing").join("Data.txt");

        let err = TraceFileWriter::create(bad, "HackEEG", Uuid::new_v4()).err().unwrap();
        assert!(matches!(err, EodError::OutputError { .. }));
    }

    #[test]
    fn test_failed_summary_keeps_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = paths(dir.path(), false);
        paths.summary_json = Some(dir.path().join("missing").join("summary.json"));
        let mut writer = TraceFileWriter::create(paths, "HackEEG", Uuid::new_v4()).unwrap();

        writer.corrected(CorrectedSample { index: 1, value: 7 }).unwrap();
        let summary = SessionSummary::new(10, 1, 0, 0, Duration::from_secs(1), StopReason::EndOfStream);
        let err = writer.finish(&[Duration::from_millis(750)], &summary).unwrap_err();
        assert!(err.to_string().contains("summary.json"));

        let trace = std::fs::read_to_string(dir.path().join("Data.txt")).unwrap();
        assert_eq!(trace.lines().collect::<Vec<_>>(), vec!["7", "1", "1", "10"]);
        let spi = std::fs::read_to_string(dir.path().join("DataSPI.txt")).unwrap();
        assert_eq!(spi.trim(), "0.75");
    }
}
