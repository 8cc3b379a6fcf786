use clap::{Parser, ValueEnum};
use eod_core::{AcquisitionSettings, EodError, EodResult};
use eod_processing::SessionLimits;
use eod_simulation::SimulationConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Synthetic discharge generator
    Simulate,
    /// Recorded text trace
    Replay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClockKind {
    /// Host time since session start
    Wall,
    /// Tick index divided by the sample rate
    Sample,
}

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Detect electric organ discharges in a streamed biosignal.")]
pub struct Cli {
    /// Where samples come from
    #[arg(long, value_enum, default_value_t = SourceKind::Simulate)]
    pub source: SourceKind,

    /// Recorded trace for `--source replay`, one frame per line
    #[arg(long, required_if_eq("source", "replay"))]
    pub replay_file: Option<PathBuf>,

    /// How many samples to capture
    #[arg(long, short = 'S', default_value_t = 50_000)]
    pub samples: u64,

    /// Read data continuously (until <return> is pressed or Ctrl-C)
    #[arg(long, short = 'C')]
    pub continuous: bool,

    /// Samples per second, one of 250, 500, 1024, 2048, 4096, 8192, 16384
    #[arg(long, short = 's', default_value_t = 500)]
    pub sps: u32,

    /// Gain for all channels, one of 1, 2, 4, 6, 8, 12, 24
    #[arg(long, short = 'g', default_value_t = 1)]
    pub gain: u32,

    /// Channel fed to the detector
    #[arg(long, default_value_t = 0)]
    pub channel: usize,

    /// Channels per frame
    #[arg(long, default_value_t = 8)]
    pub channels: usize,

    /// Cleaned trace output
    #[arg(long, short = 'F', default_value = "Data.txt")]
    pub file_name: PathBuf,

    /// Inter-event interval output, seconds per line
    #[arg(long, default_value = "DataSPI.txt")]
    pub intervals_file: PathBuf,

    /// Also write the session summary as JSON
    #[arg(long)]
    pub summary_json: Option<PathBuf>,

    /// Send raw frames as UDP telemetry
    #[arg(long, short = 'L')]
    pub telemetry: bool,

    /// Telemetry destination
    #[arg(long, default_value = "127.0.0.1:16571")]
    pub telemetry_addr: String,

    /// Name of the telemetry stream
    #[arg(long, short = 'N', default_value = "HackEEG")]
    pub stream_name: String,

    /// Write an SVG snapshot of each detected discharge into this directory
    #[arg(long)]
    pub display_dir: Option<PathBuf>,

    /// Do not ring the terminal bell on detections
    #[arg(long)]
    pub no_alert: bool,

    /// Only warnings and the final summary
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Enable debugging output
    #[arg(long, short = 'd')]
    pub debug: bool,

    /// Detection parameters as JSON
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Seed of the simulated source
    #[arg(long)]
    pub seed: Option<u64>,

    /// Pace the simulated source to the sample rate
    #[arg(long)]
    pub realtime: bool,

    /// Session clock; defaults to wall time for paced sources
    #[arg(long, value_enum)]
    pub clock: Option<ClockKind>,
}

impl Cli {
    pub fn acquisition_settings(&self) -> AcquisitionSettings {
        AcquisitionSettings {
            samples_per_second: self.sps,
            gain: self.gain,
            channel_count: self.channels,
            channel: self.channel,
            stream_name: self.stream_name.clone(),
            stream_id: Uuid::new_v4(),
        }
    }

    /// Parsed telemetry destination, `None` when telemetry is off
    pub fn telemetry_target(&self) -> EodResult<Option<SocketAddr>> {
        if !self.telemetry {
            return Ok(None);
        }
        self.telemetry_addr
            .parse()
            .map(Some)
            .map_err(|_| {
                EodError::config("telemetry address", &self.telemetry_addr, "an IP:port pair")
            })
    }

    pub fn limits(&self) -> SessionLimits {
        SessionLimits {
            max_samples: if self.continuous {
                None
            } else {
                Some(self.samples)
            },
        }
    }

    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            realtime: self.realtime,
            seed: self.seed,
            ..Default::default()
        }
    }

    pub fn clock_kind(&self) -> ClockKind {
        match self.clock {
            Some(kind) => kind,
            None if self.source == SourceKind::Simulate && self.realtime => ClockKind::Wall,
            None => ClockKind::Sample,
        }
    }

    /// Default tracing directives when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "eod_capture=debug,eod_processing=debug,eod_simulation=debug"
        } else if self.quiet {
            "warn"
        } else {
            "eod_capture=info,eod_processing=info,eod_simulation=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["eod-capture"]);
        assert_eq!(cli.source, SourceKind::Simulate);
        assert_eq!(cli.samples, 50_000);
        assert_eq!(cli.file_name, PathBuf::from("Data.txt"));
        assert_eq!(cli.intervals_file, PathBuf::from("DataSPI.txt"));
        assert_eq!(cli.limits().max_samples, Some(50_000));
        assert_eq!(cli.clock_kind(), ClockKind::Sample);

        let settings = cli.acquisition_settings();
        assert_eq!(settings.samples_per_second, 500);
        assert_eq!(settings.stream_name, "HackEEG");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from(["eod-capture", "-s", "1024", "-g", "24", "-C", "-F", "out.txt", "-q"]);
        assert_eq!(cli.sps, 1024);
        assert_eq!(cli.gain, 24);
        assert!(cli.quiet);
        assert_eq!(cli.limits().max_samples, None);
        assert_eq!(cli.file_name, PathBuf::from("out.txt"));
        assert_eq!(cli.log_filter(), "warn");
    }

    #[test]
    fn test_replay_requires_file() {
        assert!(Cli::try_parse_from(["eod-capture", "--source", "replay"]).is_err());
        let cli = Cli::try_parse_from(["eod-capture", "--source", "replay", "--replay-file", "trace.txt"]).unwrap();
        assert_eq!(cli.replay_file, Some(PathBuf::from("trace.txt")));
    }

    #[test]
    fn test_invalid_rate_is_reported_by_settings() {
        let cli = Cli::parse_from(["eod-capture", "--sps", "300"]);
        let err = cli.acquisition_settings().validate().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("16384"));
    }

    #[test]
    fn test_telemetry_target() {
        let cli = Cli::parse_from(["eod-capture", "--telemetry-addr", "nowhere"]);
        assert_eq!(cli.telemetry_target().unwrap(), None);

        let cli = Cli::parse_from(["eod-capture", "-L"]);
        assert_eq!(
            cli.telemetry_target().unwrap(),
            Some("127.0.0.1:16571".parse().unwrap())
        );

        let cli = Cli::parse_from(["eod-capture", "-L", "--telemetry-addr", "nowhere"]);
        assert!(cli.telemetry_target().unwrap_err().is_configuration());
    }

    #[test]
    fn test_realtime_simulation_uses_wall_clock() {
        let cli = Cli::parse_from(["eod-capture", "--realtime"]);
        assert_eq!(cli.clock_kind(), ClockKind::Wall);
        let cli = Cli::parse_from(["eod-capture", "--realtime", "--clock", "sample"]);
        assert_eq!(cli.clock_kind(), ClockKind::Sample);
    }
}
