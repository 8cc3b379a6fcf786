//! EOD Capture - streaming electric organ discharge detection
//!
//! Signal flow: sample source → detection pipeline → trace files, alerts,
//! waveform snapshots and UDP telemetry.

mod args;
mod output;
mod sinks;
mod telemetry;

use anyhow::{Context, Result};
use args::{Cli, ClockKind, SourceKind};
use clap::Parser;
use eod_core::{EodError, SampleSource};
use eod_processing::{
    CaptureSession, Clock, DetectionConfig, Pipeline, SampleClock, SessionReport, SinkSet,
    WallClock, WaveformScale,
};
use eod_simulation::{DischargeSimulator, ReplaySource};
use output::{OutputPaths, TraceFileWriter};
use sinks::{LogDisplaySink, SvgSnapshotSink, TerminalBellAlert};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use telemetry::{BroadcastTelemetry, UdpPublisher};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Frames buffered for the telemetry publisher
const TELEMETRY_CAPACITY: usize = 4096;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| cli.log_filter().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli).await;
    match &result {
        Ok(report) => {
            println!("{}", report.summary);
            if let Some(e) = &report.failure {
                error!("session ended early: {}", e);
            }
        }
        Err(e) => eprintln!("Error: {:#}", e),
    }
    ExitCode::from(exit_status(&result))
}

/// 2 for configuration errors, 1 for any other failure
fn exit_status(result: &Result<SessionReport>) -> u8 {
    match result {
        Ok(report) if report.failure.is_none() => 0,
        Ok(_) => 1,
        Err(e) => match e.downcast_ref::<EodError>() {
            Some(e) if e.is_configuration() => 2,
            _ => 1,
        },
    }
}

fn load_detection_config(cli: &Cli) -> Result<DetectionConfig> {
    match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                let valid = format!("a readable file ({})", e);
                EodError::config("detection config", path.display(), valid)
            })?;
            Ok(DetectionConfig::from_json(&text)?)
        }
        None => Ok(DetectionConfig::default()),
    }
}

fn open_source(cli: &Cli) -> Result<Box<dyn SampleSource>> {
    let settings = cli.acquisition_settings();
    settings.validate()?;

    let source: Box<dyn SampleSource> = match cli.source {
        SourceKind::Simulate => {
            Box::new(DischargeSimulator::new(settings, cli.simulation_config())?)
        }
        SourceKind::Replay => {
            let path = cli.replay_file.as_ref().ok_or_else(|| {
                EodError::config("replay file", "none", "a path given with --replay-file")
            })?;
            Box::new(ReplaySource::open(path, settings)?)
        }
    };
    Ok(source)
}

/// Inputs checked before anything is written to disk
struct Prepared {
    pipeline: Pipeline,
    source: Box<dyn SampleSource>,
    telemetry_target: Option<SocketAddr>,
}

fn prepare(cli: &Cli) -> Result<Prepared> {
    let config = load_detection_config(cli)?;
    let pipeline = Pipeline::new(config)?;
    let source = open_source(cli)?;
    let telemetry_target = cli.telemetry_target()?;

    Ok(Prepared {
        pipeline,
        source,
        telemetry_target,
    })
}

/// Stop flag raised by Ctrl-C and, in continuous mode, by <return>
fn install_stop_triggers(continuous: bool) -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));

    let flag = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping");
            flag.store(true, Ordering::SeqCst);
        }
    });

    if continuous {
        let flag = stop.clone();
        // Plain thread: a pending stdin read must not hold up runtime shutdown
        std::thread::spawn(move || {
            let mut line = String::new();
            if std::io::stdin().read_line(&mut line).is_ok() {
                info!("return pressed, stopping");
                flag.store(true, Ordering::SeqCst);
            }
        });
        info!("continuous mode, press <return> to stop");
    }

    stop
}

async fn run(cli: Cli) -> Result<SessionReport> {
    let Prepared {
        pipeline,
        mut source,
        telemetry_target,
    } = prepare(&cli)?;
    let settings = source.settings().clone();

    let mut sinks = SinkSet::new();
    let publisher = match telemetry_target {
        Some(target) => {
            let telemetry = BroadcastTelemetry::new(
                &settings.stream_name,
                settings.stream_id,
                TELEMETRY_CAPACITY,
            );
            let publisher = UdpPublisher::connect(target).await?;
            let task = tokio::spawn(publisher.run(telemetry.subscribe()));
            sinks.add_telemetry(Box::new(telemetry));
            info!(
                addr = %target,
                stream = %settings.stream_name,
                id = %settings.stream_id,
                "telemetry enabled"
            );
            Some(task)
        }
        None => None,
    };

    if let Some(dir) = &cli.display_dir {
        let scale = WaveformScale {
            points: pipeline.config().visualization_window,
            ..Default::default()
        };
        sinks.add_display(Box::new(SvgSnapshotSink::new(dir, scale)?));
    }
    if !cli.quiet {
        sinks.add_display(Box::new(LogDisplaySink));
    }
    if !cli.no_alert {
        sinks.add_alert(Box::new(TerminalBellAlert));
    }

    let mut output = TraceFileWriter::create(
        OutputPaths {
            trace: cli.file_name.clone(),
            intervals: cli.intervals_file.clone(),
            summary_json: cli.summary_json.clone(),
        },
        &settings.stream_name,
        settings.stream_id,
    )?;

    let stop = install_stop_triggers(cli.continuous);
    let limits = cli.limits();
    let clock: Box<dyn Clock> = match cli.clock_kind() {
        ClockKind::Wall => Box::new(WallClock::start()),
        ClockKind::Sample => Box::new(SampleClock::new(settings.samples_per_second)),
    };

    let report = tokio::task::spawn_blocking(move || {
        CaptureSession::new(pipeline, source.as_mut(), sinks, &mut output, clock)
            .with_limits(limits)
            .with_stop_flag(stop)
            .run()
    })
    .await
    .context("capture task failed")?;

    if let Some(task) = publisher {
        match tokio::time::timeout(Duration::from_secs(2), task).await {
            Ok(Ok(sent)) => info!(sent, "telemetry flushed"),
            Ok(Err(e)) => warn!("telemetry task failed: {}", e),
            Err(_) => warn!("telemetry publisher did not finish in time"),
        }
    }

    Ok(report)
}
