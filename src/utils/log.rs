use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use chrono::Local;
use colored::Colorize;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::config::LoggingConfig;

const LOG_DIR: &str = "logs";

/// Appends a timestamped line to `logs/<filename>`, creating the directory
/// and file as needed.
pub fn log_to_file(filename: &str, message: &str) -> io::Result<()> {
    log_to_file_in(Path::new(LOG_DIR), filename, message)
}

pub fn log_to_file_in(log_dir: &Path, filename: &str, message: &str) -> io::Result<()> {
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(filename))?;

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    writeln!(file, "{} {}", timestamp, message)?;
    file.flush()?;

    Ok(())
}

/// Writes `message` framed by a `===== header =====` banner.
pub fn log_with_header(filename: &str, header: &str, message: &str) -> io::Result<()> {
    log_with_header_in(Path::new(LOG_DIR), filename, header, message)
}

pub fn log_with_header_in(
    log_dir: &Path,
    filename: &str,
    header: &str,
    message: &str,
) -> io::Result<()> {
    let formatted = format!("===== {} =====\n{}\n====================", header, message);
    log_to_file_in(log_dir, filename, &formatted)
}

/// Appends one row to `logs/<filename>`. `headers` are written only when
/// the file is created.
pub fn log_csv(filename: &str, headers: &[&str], row: &[String]) -> io::Result<()> {
    log_csv_in(Path::new(LOG_DIR), filename, headers, row)
}

pub fn log_csv_in(
    log_dir: &Path,
    filename: &str,
    headers: &[&str],
    row: &[String],
) -> io::Result<()> {
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir)?;
    }

    let path = log_dir.join(filename);
    let is_new = !path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut writer = csv::Writer::from_writer(file);
    if is_new && !headers.is_empty() {
        writer.write_record(headers)?;
    }
    writer.write_record(row)?;
    writer.flush()?;

    Ok(())
}

/// `log` backend for the binaries: level-tagged lines on stderr, mirrored to
/// a file under `logs/` when one is configured.
pub struct PipelineLogger {
    level: LevelFilter,
    colored: bool,
    log_file: Option<String>,
}

impl PipelineLogger {
    pub fn new(config: &LoggingConfig) -> Self {
        let parsed = config.level.parse().unwrap_or(LevelFilter::Info);
        let level = if config.enable_debug_logging {
            parsed.max(LevelFilter::Debug)
        } else {
            parsed
        };
        Self {
            level,
            colored: config.colored,
            log_file: config.log_file.clone(),
        }
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    fn tag(&self, level: Level) -> String {
        let plain = format!("{:<5}", level);
        if !self.colored {
            return plain;
        }
        match level {
            Level::Error => plain.red().bold().to_string(),
            Level::Warn => plain.yellow().bold().to_string(),
            Level::Info => plain.green().to_string(),
            Level::Debug => plain.blue().to_string(),
            Level::Trace => plain.dimmed().to_string(),
        }
    }
}

impl Log for PipelineLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format!("{}: {}", record.target(), record.args());
        eprintln!("{} {}", self.tag(record.level()), line);

        if let Some(filename) = &self.log_file {
            if let Err(e) = log_to_file(filename, &format!("[{}] {}", record.level(), line)) {
                eprintln!("failed to write log file {}: {}", filename, e);
            }
        }
    }

    fn flush(&self) {}
}

/// Installs [`PipelineLogger`] as the global logger. Fails if one is
/// already set.
pub fn init_logger(config: &LoggingConfig) -> Result<(), SetLoggerError> {
    let logger = PipelineLogger::new(config);
    let level = logger.level();
    log::set_logger(Box::leak(Box::new(logger)))?;
    log::set_max_level(level);
    Ok(())
}
