//! Logging setup for newsgrab.
//!
//! `[logging] level` takes either a bare level or a comma separated list of
//! `EnvFilter` directives such as `info,newsgrab::sync=debug`. `RUST_LOG` is
//! read first and the configured directives are layered on top. An empty
//! `[logging] file` logs to the console only.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::Result;

/// Parse log level string to tracing Level.
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Split a level setting into filter directives.
///
/// Bare words go through [`parse_level`]. `target=level` pairs that fail to
/// parse are reported on stderr and skipped, since no subscriber exists yet.
fn directives(setting: &str) -> Vec<Directive> {
    setting
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            if !part.contains('=') {
                return Some(parse_level(part).into());
            }
            match part.parse::<Directive>() {
                Ok(directive) => Some(directive),
                Err(e) => {
                    eprintln!("ignoring log directive {:?}: {}", part, e);
                    None
                }
            }
        })
        .collect()
}

fn build_filter(setting: &str) -> EnvFilter {
    directives(setting)
        .into_iter()
        .fold(EnvFilter::from_default_env(), EnvFilter::add_directive)
}

/// Open the log file for appending, creating its directory.
///
/// Returns `None` when no file is configured.
fn open_log_file(path: &str) -> Result<Option<File>> {
    let path = path.trim();
    if path.is_empty() {
        return Ok(None);
    }

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::options().create(true).append(true).open(path)?;
    Ok(Some(file))
}

/// Initialize logging to stdout and, when configured, the log file.
///
/// The log file is appended to so restarts keep the history of earlier sweeps.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let Some(log_file) = open_log_file(&config.file)? else {
        init_console_only(&config.level);
        return Ok(());
    };
    let writer = std::io::stdout.and(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .with(build_filter(&config.level))
        .init();

    Ok(())
}

/// Initialize console-only logging (fallback when the log file is unusable).
pub fn init_console_only(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_ansi(true)
                .with_target(true),
        )
        .with(build_filter(level))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_level_known() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("info"), Level::INFO);
        assert_eq!(parse_level("warning"), Level::WARN);
        assert_eq!(parse_level("Error"), Level::ERROR);
    }

    #[test]
    fn test_parse_level_default() {
        assert_eq!(parse_level("verbose"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_directives_bare_level() {
        let parsed = directives("DEBUG");
        assert_eq!(parsed.len(), 1);
        assert_eq!(
            parsed[0].to_string(),
            Directive::from(Level::DEBUG).to_string()
        );
    }

    #[test]
    fn test_directives_per_target() {
        let parsed = directives("warn, newsgrab::sync=debug,");
        assert_eq!(parsed.len(), 2);
        assert_eq!(
            parsed[0].to_string(),
            Directive::from(Level::WARN).to_string()
        );
        assert_eq!(parsed[1].to_string(), "newsgrab::sync=debug");
    }

    #[test]
    fn test_directives_skip_invalid_target_level() {
        let parsed = directives("info,newsgrab=loud");
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_open_log_file_empty_path() {
        assert!(open_log_file("").unwrap().is_none());
        assert!(open_log_file("   ").unwrap().is_none());
    }

    #[test]
    fn test_open_log_file_creates_dir_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("newsgrab.log");
        let path = path.to_str().unwrap();

        let mut file = open_log_file(path).unwrap().unwrap();
        writeln!(file, "first").unwrap();
        drop(file);

        let mut file = open_log_file(path).unwrap().unwrap();
        writeln!(file, "second").unwrap();
        drop(file);

        assert_eq!(std::fs::read_to_string(path).unwrap(), "first\nsecond\n");
    }
}
