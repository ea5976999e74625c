//! Facetone CLI - offline harness for the gesture pipeline
//!
//! Commands:
//! - replay: feed recorded landmark frames through the full pipeline and
//!   emit the resulting audio commands as NDJSON
//! - doctor: diagnose a calibration snapshot and the replay environment

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use facetone::audio::{AudioClip, NoteSynth};
use facetone::detector::ScriptedDetector;
use facetone::modulators::{
    LevelConfig, LevelModulator, ModulatorKey, ModulatorRegistry, MorseConfig, MorseModulator,
    TonalModulator, TriggerConfig, TriggerModulator,
};
use facetone::{
    Calibration, FrameOutcome, GesturePipeline, Geometry, GestureSignal, LandmarkSet, Point,
    SignalMirror, FACETONE_VERSION,
};

/// Facetone - mouth-gesture audio engine
#[derive(Parser)]
#[command(name = "facetone")]
#[command(version = FACETONE_VERSION)]
#[command(about = "Replay landmark recordings through the gesture pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded landmark frames and print audio commands as NDJSON
    Replay {
        /// Input NDJSON file, one frame per line (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Modulator to select
        #[arg(long, default_value = "tones")]
        modulator: String,

        /// Calibration snapshot JSON file; defaults to the stock reference
        #[arg(long)]
        calibration: Option<PathBuf>,

        /// Pace the replay at this frame rate instead of running flat out
        #[arg(long)]
        fps: Option<f64>,

        /// Also print per-frame signal mirror lines
        #[arg(long)]
        mirror: bool,
    },

    /// Diagnose a calibration snapshot and the replay environment
    Doctor {
        /// Calibration snapshot to check
        #[arg(long)]
        calibration: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("facetone: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Replay {
            input,
            modulator,
            calibration,
            fps,
            mirror,
        } => cmd_replay(&input, &modulator, calibration.as_deref(), fps, mirror),
        Commands::Doctor { calibration, json } => cmd_doctor(calibration.as_deref(), json),
    }
}

// ── replay ──────────────────────────────────────────────────────────────────

/// One recorded frame: a timestamp and the landmark points, or `null`
/// landmarks for a frame in which no face was visible.
#[derive(Deserialize)]
struct ReplayFrame {
    t_ms: Option<f64>,
    landmarks: Option<Vec<[f64; 2]>>,
}

/// Audio command emitted by the replay backends, one JSON object per line.
#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ReplayEvent<'a> {
    Attack { note: &'a str, t_ms: f64 },
    Release { t_ms: f64 },
    Play { clip: &'a str },
    Pause { clip: &'a str },
    Seek { clip: &'a str, seconds: f64 },
    Volume { clip: &'a str, value: f64 },
    Rate { clip: &'a str, value: f64 },
    Looped { clip: &'a str, value: bool },
    Signal { width_pct: f64, height_pct: f64, face_delta_pct: f64 },
    NoFace,
}

fn emit(event: &ReplayEvent<'_>) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{}", line),
        Err(e) => eprintln!("facetone: encode error: {}", e),
    }
}

/// Synth backend that prints its commands.
struct NdjsonSynth;

impl NoteSynth for NdjsonSynth {
    fn attack(&mut self, note: &str, at_ms: f64) {
        emit(&ReplayEvent::Attack { note, t_ms: at_ms });
    }

    fn release(&mut self, at_ms: f64) {
        emit(&ReplayEvent::Release { t_ms: at_ms });
    }
}

/// Clip backend that prints its commands and tracks its own paused flag.
struct NdjsonClip {
    name: &'static str,
    paused: bool,
    volume: f64,
}

impl NdjsonClip {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            paused: true,
            volume: 1.0,
        }
    }
}

impl AudioClip for NdjsonClip {
    fn play(&mut self) {
        self.paused = false;
        emit(&ReplayEvent::Play { clip: self.name });
    }

    fn pause(&mut self) {
        self.paused = true;
        emit(&ReplayEvent::Pause { clip: self.name });
    }

    fn paused(&self) -> bool {
        self.paused
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
        emit(&ReplayEvent::Volume {
            clip: self.name,
            value: volume,
        });
    }

    fn set_playback_rate(&mut self, rate: f64) {
        emit(&ReplayEvent::Rate {
            clip: self.name,
            value: rate,
        });
    }

    fn seek(&mut self, seconds: f64) {
        emit(&ReplayEvent::Seek {
            clip: self.name,
            seconds,
        });
    }

    fn set_loop(&mut self, looped: bool) {
        emit(&ReplayEvent::Looped {
            clip: self.name,
            value: looped,
        });
    }
}

struct NdjsonMirror;

impl SignalMirror for NdjsonMirror {
    fn on_signal(&mut self, signal: &GestureSignal) {
        emit(&ReplayEvent::Signal {
            width_pct: signal.width_pct,
            height_pct: signal.height_pct,
            face_delta_pct: signal.face_delta_pct,
        });
    }

    fn on_no_face(&mut self) {
        emit(&ReplayEvent::NoFace);
    }
}

fn full_registry() -> ModulatorRegistry {
    let mut registry = ModulatorRegistry::new();
    registry.insert(Box::new(TonalModulator::new(NdjsonSynth)));
    registry.insert(Box::new(MorseModulator::new(
        NdjsonSynth,
        MorseConfig::default(),
    )));
    registry.insert(Box::new(LevelModulator::new(
        NdjsonClip::new("level"),
        LevelConfig::default(),
    )));
    registry.insert(Box::new(TriggerModulator::new(
        NdjsonClip::new("trigger"),
        TriggerConfig::default(),
    )));
    registry
}

fn cmd_replay(
    input: &PathBuf,
    modulator: &str,
    calibration: Option<&std::path::Path>,
    fps: Option<f64>,
    mirror: bool,
) -> Result<(), CliError> {
    let input_data = read_input(input)?;

    let mut frames = Vec::new();
    let mut timestamps = Vec::new();
    for (index, line) in input_data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let frame: ReplayFrame = serde_json::from_str(trimmed)
            .map_err(|e| CliError::Parse(format!("frame {}: {}", index + 1, e)))?;

        let landmarks = match frame.landmarks {
            Some(raw) => {
                let points = raw.iter().map(|[x, y]| Point::new(*x, *y)).collect();
                Some(
                    LandmarkSet::from_points(points)
                        .map_err(|e| CliError::Parse(format!("frame {}: {}", index + 1, e)))?,
                )
            }
            None => None,
        };
        timestamps.push(frame.t_ms.unwrap_or(index as f64 * 1000.0 / 30.0));
        frames.push(landmarks);
    }

    if frames.is_empty() {
        return Err(CliError::NoFrames);
    }

    let key: ModulatorKey = modulator
        .parse()
        .map_err(|_| CliError::UnknownModulator(modulator.to_string()))?;

    let calibration = match calibration {
        Some(path) => Calibration::from_json(&fs::read_to_string(path)?)?,
        None => Calibration::precalibrated(Default::default())?,
    };

    let mut pipeline = GesturePipeline::new(
        ScriptedDetector::new(frames),
        Geometry::default(),
        full_registry(),
    )
    .with_calibration(calibration);
    if mirror {
        pipeline = pipeline.with_mirror(Box::new(NdjsonMirror));
    }
    pipeline.select_modulator(key, timestamps.first().copied().unwrap_or(0.0))?;

    let frame_gap = fps.map(|fps| Duration::from_secs_f64(1.0 / fps.max(1.0)));
    let end_ms = timestamps.last().copied().unwrap_or(0.0);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(CliError::Io)?;

    runtime.block_on(async {
        for now_ms in timestamps {
            match pipeline.step(now_ms).await {
                Ok(FrameOutcome::NoFace) | Ok(FrameOutcome::Signal(_)) => {}
                // Detector errors are not retried; keep requesting frames
                // anyway, matching a best-effort scheduling wrapper.
                Err(e) => eprintln!("facetone: frame at {} ms: {}", now_ms, e),
            }
            if let Some(gap) = frame_gap {
                tokio::time::sleep(gap).await;
            }
        }
        // End of the recording behaves like losing focus: nothing may keep
        // sounding.
        pipeline.set_focused(false, end_ms);
    });

    Ok(())
}

fn read_input(input: &PathBuf) -> Result<String, CliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            eprintln!("facetone: reading frames from interactive stdin; pipe a recording or press Ctrl-D");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

// ── doctor ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct DoctorReport {
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

fn cmd_doctor(calibration: Option<&std::path::Path>, json: bool) -> Result<(), CliError> {
    let mut checks = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("facetone {}", FACETONE_VERSION),
    });

    if let Some(path) = calibration {
        let check = match fs::read_to_string(path) {
            Ok(content) => match Calibration::from_json(&content) {
                Ok(calibration) => DoctorCheck {
                    name: "calibration".to_string(),
                    status: if calibration.is_complete() {
                        CheckStatus::Ok
                    } else {
                        CheckStatus::Warning
                    },
                    message: format!(
                        "snapshot valid; complete={}, step={:?}",
                        calibration.is_complete(),
                        calibration.step()
                    ),
                },
                Err(e) => DoctorCheck {
                    name: "calibration".to_string(),
                    status: CheckStatus::Error,
                    message: format!("invalid snapshot: {}", e),
                },
            },
            Err(e) => DoctorCheck {
                name: "calibration".to_string(),
                status: CheckStatus::Error,
                message: format!("cannot read snapshot: {}", e),
            },
        };
        checks.push(check);
    } else {
        checks.push(DoctorCheck {
            name: "calibration".to_string(),
            status: CheckStatus::Warning,
            message: "no snapshot given; replay will use the stock reference".to_string(),
        });
    }

    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: if atty::is(atty::Stream::Stdin) {
            "stdin is a TTY (interactive mode)".to_string()
        } else {
            "stdin is a pipe (replay-ready)".to_string()
        },
    });

    let report = DoctorReport {
        version: FACETONE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Facetone Doctor Report");
        println!("======================");
        for check in &report.checks {
            let icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", icon, check.name, check.message);
        }
    }

    if report.checks.iter().any(|c| c.status == CheckStatus::Error) {
        Err(CliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// ── errors ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum CliError {
    Io(io::Error),
    Gesture(facetone::GestureError),
    Json(serde_json::Error),
    Parse(String),
    UnknownModulator(String),
    NoFrames,
    DoctorFailed,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "io error: {}", e),
            CliError::Gesture(e) => write!(f, "{}", e),
            CliError::Json(e) => write!(f, "json error: {}", e),
            CliError::Parse(msg) => write!(f, "parse error: {}", msg),
            CliError::UnknownModulator(key) => write!(
                f,
                "unknown modulator '{}' (expected tones, morse, clip-level, clip-trigger)",
                key
            ),
            CliError::NoFrames => write!(f, "no frames found in input"),
            CliError::DoctorFailed => write!(f, "one or more health checks failed"),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<facetone::GestureError> for CliError {
    fn from(e: facetone::GestureError) -> Self {
        CliError::Gesture(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}
