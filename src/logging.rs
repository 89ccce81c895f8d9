//! Logging Setup
//!
//! Builds the `env_logger` backend behind the `log` facade from the
//! configuration's `settings.logging` block. Output goes to stdout, either
//! as human-readable lines (`pretty: true`) or as one JSON object per line.
//! `RUST_LOG` still takes precedence over the configured level.

use std::io::Write;

use chrono::{DateTime, Local, SecondsFormat};
use colored::Colorize;
use log::{warn, Level, LevelFilter, SetLoggerError};

use crate::config::Logging;

/// Level used when the configuration does not name one.
pub const DEFAULT_LEVEL: LevelFilter = LevelFilter::Debug;

/// Parses a level name, case-insensitively.
///
/// Besides the `log` level names, `fatal` and `panic` map to `error`,
/// and `disabled` turns logging off.
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(LevelFilter::Trace),
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "error" | "fatal" | "panic" => Some(LevelFilter::Error),
        "disabled" | "off" => Some(LevelFilter::Off),
        _ => None,
    }
}

/// Picks the effective level for the given settings.
///
/// Returns the level and, when the configured name was not recognized,
/// that name so the caller can report it once logging is up.
pub fn resolve_level(logging: &Logging, verbose: bool) -> (LevelFilter, Option<String>) {
    let (level, invalid) = if logging.level.trim().is_empty() {
        (DEFAULT_LEVEL, None)
    } else {
        match parse_level(&logging.level) {
            Some(level) => (level, None),
            None => (DEFAULT_LEVEL, Some(logging.level.clone())),
        }
    };

    let level = if verbose {
        level.max(LevelFilter::Debug)
    } else {
        level
    };

    (level, invalid)
}

fn level_tag(level: Level) -> String {
    match level {
        Level::Trace => "TRC".magenta().to_string(),
        Level::Debug => "DBG".yellow().to_string(),
        Level::Info => "INF".green().to_string(),
        Level::Warn => "WRN".red().to_string(),
        Level::Error => "ERR".red().bold().to_string(),
    }
}

/// Renders a human-readable log line.
pub fn format_pretty(time: &DateTime<Local>, level: Level, message: &str) -> String {
    format!(
        "{} {} {}",
        time.format("%H:%M:%S").to_string().dimmed(),
        level_tag(level),
        message
    )
}

/// Renders a JSON log line.
pub fn format_json(time: &DateTime<Local>, level: Level, message: &str) -> String {
    serde_json::json!({
        "level": level.as_str().to_ascii_lowercase(),
        "time": time.to_rfc3339_opts(SecondsFormat::Secs, true),
        "message": message,
    })
    .to_string()
}

/// Installs the global logger.
///
/// # Arguments
///
/// * `logging` - Level and format settings from the configuration
/// * `verbose` - Raise the level to at least debug
pub fn init(logging: &Logging, verbose: bool) -> Result<(), SetLoggerError> {
    let (level, invalid) = resolve_level(logging, verbose);
    let pretty = logging.pretty;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.to_string()))
        .target(env_logger::Target::Stdout)
        .format(move |buf, record| {
            let message = record.args().to_string();
            let now = Local::now();
            let line = if pretty {
                format_pretty(&now, record.level(), &message)
            } else {
                format_json(&now, record.level(), &message)
            };
            writeln!(buf, "{}", line)
        })
        .try_init()?;

    if let Some(name) = invalid {
        warn!(
            "Invalid log level {:?}, using the default level instead",
            name
        );
    }

    Ok(())
}
