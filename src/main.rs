use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

use ppg_pulse::local::process_file::replay;
use ppg_pulse::local::synthetic::{PulseParams, SyntheticPpg};
use ppg_pulse::utils::log::{init_logger, log_csv, log_with_header};
use ppg_pulse::{
    load_config, save_config, Config, LoggingConfig, MetricsRecord, PipelineController,
    PipelineState, StressLevel,
};

const SESSION_HEADERS: [&str; 9] = [
    "timestamp",
    "source",
    "state",
    "bpm",
    "average_bpm",
    "confidence",
    "hrv_ms",
    "stress_level",
    "accepted_estimates",
];

#[derive(Parser)]
#[command(name = "ppg-pulse", about = "Heart rate, HRV and stress from a skin-brightness signal")]
struct Cli {
    /// YAML configuration; defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stream a one-column CSV of intensities through the pipeline
    Replay {
        input: PathBuf,
        /// Write one metrics row per sample here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Drive the pipeline with a synthetic pulse
    Simulate {
        #[arg(long, default_value_t = 72.0)]
        bpm: f64,
        #[arg(long, default_value_t = 30.0)]
        seconds: f64,
        #[arg(long, default_value_t = 0.0)]
        noise: f64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Write the default configuration as YAML
    DefaultConfig { path: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    if let Err(e) = init_logger(&config.logging) {
        eprintln!("logger already initialised: {}", e);
    }

    let result = match cli.command {
        Command::Replay { input, output } => {
            let source = input.display().to_string();
            run_replay(&config, input, output)
                .map(|record| record_session(&config.logging, &source, &record))
        }
        Command::Simulate {
            bpm,
            seconds,
            noise,
            seed,
        } => {
            let source = format!("simulated {} bpm, noise {}, seed {}", bpm, noise, seed);
            run_simulation(&config, bpm, seconds, noise, seed)
                .map(|record| record_session(&config.logging, &source, &record))
        }
        Command::DefaultConfig { path } => save_config(&Config::default(), &path)
            .map(|()| println!("Wrote default configuration to {}", path.display()))
            .map_err(|e| e.to_string()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{} {}", "error:".red().bold(), message);
            ExitCode::FAILURE
        }
    }
}

fn run_replay(
    config: &Config,
    input: PathBuf,
    output: Option<PathBuf>,
) -> Result<MetricsRecord, String> {
    let summary =
        replay(&input, output.as_deref(), config.pipeline.clone()).map_err(|e| e.to_string())?;

    println!(
        "Processed {} samples ({} skipped) in {:?}",
        summary.samples, summary.skipped, summary.duration
    );
    print_record(&summary.final_record);
    Ok(summary.final_record)
}

fn run_simulation(
    config: &Config,
    bpm: f64,
    seconds: f64,
    noise: f64,
    seed: u64,
) -> Result<MetricsRecord, String> {
    let pipeline = config.pipeline.clone();
    let fs = pipeline.sample_rate_hz;
    let mut controller = PipelineController::new(pipeline).map_err(|e| e.to_string())?;
    controller.start();

    let params = PulseParams {
        sample_rate_hz: fs,
        bpm,
        noise_amplitude: noise,
        seed,
        ..PulseParams::default()
    };
    let total = (seconds * fs).max(0.0) as usize;
    let report_every = fs.round().max(1.0) as usize;

    for (i, sample) in SyntheticPpg::new(params).take(total).enumerate() {
        let record = controller.feed_sample(sample).map_err(|e| e.to_string())?;
        if (i + 1) % report_every == 0 {
            print_bar(&record);
        }
    }

    let record = controller.latest();
    print_record(&record);
    Ok(record)
}

// Failures here are reported but never fail the run.
fn record_session(logging: &LoggingConfig, source: &str, record: &MetricsRecord) {
    if let Some(filename) = &logging.log_file {
        if let Err(e) = log_with_header(filename, source, &summary_text(record)) {
            eprintln!("failed to write log file {}: {}", filename, e);
        }
    }

    if let Some(filename) = &logging.session_csv {
        let row = vec![
            chrono::Local::now().to_rfc3339(),
            source.to_string(),
            record.state.name().to_string(),
            format!("{:.2}", record.bpm),
            format!("{:.2}", record.average_bpm),
            format!("{:.3}", record.confidence),
            format!("{:.2}", record.hrv_ms),
            record.stress_level.to_string(),
            record.accepted_estimates.to_string(),
        ];
        if let Err(e) = log_csv(filename, &SESSION_HEADERS, &row) {
            eprintln!("failed to append session to {}: {}", filename, e);
        }
    }
}

fn summary_text(record: &MetricsRecord) -> String {
    format!(
        "state: {}\nbpm: {:.1}\naverage bpm: {:.1}\nconfidence: {:.2}\nhrv: {:.1} ms\nquality: {}\nstress: {}",
        record.state,
        record.bpm,
        record.average_bpm,
        record.confidence,
        record.hrv_ms,
        record.quality,
        record.stress_level
    )
}

fn stress_label(level: StressLevel) -> colored::ColoredString {
    match level {
        StressLevel::Calm => "calm".cyan(),
        StressLevel::Normal => "normal".green(),
        StressLevel::Elevated => "elevated".yellow(),
        StressLevel::High => "high".red().bold(),
    }
}

// One line per second: a bar scaled to the current rate.
fn print_bar(record: &MetricsRecord) {
    let bar_len = (record.bpm / 4.0).round().clamp(0.0, 60.0) as usize;
    let bar = "|".repeat(bar_len);
    let bar = if record.state == PipelineState::Active {
        bar.red()
    } else {
        bar.white()
    };
    println!(
        "{:>11} {:>6.1} bpm {:>4.2} {}",
        record.state.name(),
        record.bpm,
        record.confidence,
        bar
    );
}

fn print_record(record: &MetricsRecord) {
    println!("state:       {}", record.state);
    println!("bpm:         {:.1}", record.bpm);
    println!("average bpm: {:.1}", record.average_bpm);
    println!("confidence:  {:.2}", record.confidence);
    println!("hrv:         {:.1} ms", record.hrv_ms);
    println!("quality:     {}", record.quality);
    println!("stress:      {}", stress_label(record.stress_level));
}
