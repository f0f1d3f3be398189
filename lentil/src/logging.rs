//! Logging setup and per-component logger handles.
//!
//! `init_logging` installs the `env_logger` backend once per process.
//! Components receive a [`Logger`] created from the same
//! [`LogConfig`] instead of consulting a global verbosity setting.

use log::{Level, LevelFilter};
use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    Error,
    Warning,
    #[default]
    Info,
    Hint,
    Debug,
}

impl Verbosity {
    pub fn level_filter(&self) -> LevelFilter {
        match self {
            Verbosity::Error => LevelFilter::Error,
            Verbosity::Warning => LevelFilter::Warn,
            Verbosity::Info | Verbosity::Hint => LevelFilter::Info,
            Verbosity::Debug => LevelFilter::Debug,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LogConfig {
    pub verbosity: Verbosity,
}

impl LogConfig {
    /// `-q` silences everything but errors; each `-v` adds a level
    /// above the default `warning`
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        let verbosity = if quiet {
            Verbosity::Error
        } else {
            match verbose {
                0 => Verbosity::Warning,
                1 => Verbosity::Info,
                2 => Verbosity::Hint,
                _ => Verbosity::Debug,
            }
        };
        LogConfig { verbosity }
    }

    pub fn logger(&self, target: &'static str) -> Logger {
        Logger {
            target,
            verbosity: self.verbosity,
        }
    }
}

/// Install the `env_logger` backend. `RUST_LOG`, when set, takes
/// precedence over the configured verbosity.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let default_filter = config.verbosity.level_filter().to_string().to_lowercase();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .try_init()?;
    Ok(())
}

/// A logger handle bound to one component
#[derive(Clone, Copy, Debug)]
pub struct Logger {
    target: &'static str,
    verbosity: Verbosity,
}

impl Default for Logger {
    fn default() -> Self {
        LogConfig::default().logger("lentil")
    }
}

impl Logger {
    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn enabled(&self, level: Verbosity) -> bool {
        level <= self.verbosity
    }

    fn emit(&self, level: Verbosity, msg: &str) {
        if !self.enabled(level) {
            return;
        }
        match level {
            Verbosity::Error => log::log!(target: self.target, Level::Error, "{}", msg),
            Verbosity::Warning => log::log!(target: self.target, Level::Warn, "{}", msg),
            Verbosity::Info => log::log!(target: self.target, Level::Info, "{}", msg),
            Verbosity::Hint => log::log!(target: self.target, Level::Info, "--> {}", msg),
            Verbosity::Debug => log::log!(target: self.target, Level::Debug, "{}", msg),
        }
    }

    pub fn error(&self, msg: &str) {
        self.emit(Verbosity::Error, msg);
    }

    pub fn warning(&self, msg: &str) {
        self.emit(Verbosity::Warning, msg);
    }

    pub fn info(&self, msg: &str) {
        self.emit(Verbosity::Info, msg);
    }

    pub fn hint(&self, msg: &str) {
        self.emit(Verbosity::Hint, msg);
    }

    pub fn debug(&self, msg: &str) {
        self.emit(Verbosity::Debug, msg);
    }

    /// Log `msg` at info level with the time elapsed since `start`
    pub fn finish(&self, msg: &str, start: Instant) {
        self.info(&format!("{} ({})", msg, format_elapsed(start)));
    }
}

/// Elapsed wall time as `H:MM:SS`
pub fn format_elapsed(start: Instant) -> String {
    format_seconds(start.elapsed().as_secs())
}

fn format_seconds(secs: u64) -> String {
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}
