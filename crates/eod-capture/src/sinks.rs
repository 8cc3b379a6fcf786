//! Display and alert sinks of the capture tool

use eod_core::{EodError, EodResult, Event};
use eod_processing::{AlertSink, DisplaySink, WaveformScale};
use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

/// Renders each detection window as an SVG file
pub struct SvgSnapshotSink {
    dir: PathBuf,
    scale: WaveformScale,
    rendered: u64,
}

impl SvgSnapshotSink {
    /// Create the sink, creating `dir` if needed
    pub fn new(dir: impl Into<PathBuf>, scale: WaveformScale) -> EodResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| EodError::output(dir.display(), e))?;
        Ok(Self {
            dir,
            scale,
            rendered: 0,
        })
    }

    fn svg(&self, samples: &[i32]) -> String {
        let mut points = String::new();
        for (x, y) in self.scale.polyline(samples) {
            let _ = write!(points, "{},{} ", x, y);
        }

        format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
                r#"<rect width="100%" height="100%" fill="black"/>"#,
                r#"<polyline fill="none" stroke="lime" stroke-width="1" points="{p}"/>"#,
                "</svg>\n"
            ),
            w = self.scale.width,
            h = self.scale.height,
            p = points.trim_end()
        )
    }
}

impl DisplaySink for SvgSnapshotSink {
    fn render_window(&mut self, samples: &[i32]) -> EodResult<()> {
        let path = self.dir.join(format!("eod_{:05}.svg", self.rendered));
        std::fs::write(&path, self.svg(samples)).map_err(|e| EodError::output(path.display(), e))?;
        self.rendered += 1;
        debug!(path = %path.display(), "waveform snapshot written");
        Ok(())
    }
}

/// Logs the extent of each detection window
#[derive(Debug, Default)]
pub struct LogDisplaySink;

impl DisplaySink for LogDisplaySink {
    fn render_window(&mut self, samples: &[i32]) -> EodResult<()> {
        let min = samples.iter().min().copied().unwrap_or_default();
        let max = samples.iter().max().copied().unwrap_or_default();
        info!(points = samples.len(), min, max, "discharge window");
        Ok(())
    }
}

/// Rings the terminal bell on stderr for every detection
#[derive(Debug, Default)]
pub struct TerminalBellAlert;

impl AlertSink for TerminalBellAlert {
    fn play_alert(&mut self, event: &Event) -> EodResult<()> {
        {
            let mut stderr = std::io::stderr().lock();
            stderr
                .write_all(b"\x07")
                .and_then(|_| stderr.flush())
                .map_err(|e| EodError::output("stderr", e))?;
        }
        info!(sample_index = event.sample_index, "alert");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svg_snapshot_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = SvgSnapshotSink::new(dir.path().join("windows"), WaveformScale::default()).unwrap();

        sink.render_window(&vec![0; 200]).unwrap();
        sink.render_window(&vec![500_000; 200]).unwrap();
        assert_eq!(sink.rendered, 2);

        let first = std::fs::read_to_string(dir.path().join("windows/eod_00000.svg")).unwrap();
        assert!(first.starts_with("<svg"));
        assert!(first.contains(r#"points="0,454 5,454"#));

        let second = std::fs::read_to_string(dir.path().join("windows/eod_00001.svg")).unwrap();
        assert!(second.contains("995,0\"/>"));
    }

    #[test]
    fn test_log_display_accepts_empty_window() {
        assert!(LogDisplaySink.render_window(&[]).is_ok());
    }
}
