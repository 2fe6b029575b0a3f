//! Logging from bindzone.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::Layer as FmtLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogLevel, LogTarget, LoggingConfig};

//----------- launch() ---------------------------------------------------------

/// Launch the bindzone logger.
///
/// ## Panics
///
/// Panics if a global [`tracing`] logger has been set already.
pub fn launch(config: &LoggingConfig) -> Result<(), String> {
    let filter = make_env_filter(config)?;

    let target = PrimaryLogger::new(&config.target)
        .map_err(|e| format!("could not open the log target: {e}"))?;

    match target {
        PrimaryLogger::File { file } => {
            // We never emit colors to files.
            let layer = FmtLayer::new().with_ansi(false).with_writer(file);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .init()
        }
        PrimaryLogger::Stdout => {
            // tracing only looks at `NO_COLOR`; supports-color also checks
            // whether the stream is a terminal.
            let layer = FmtLayer::new()
                .with_ansi(supports_color::on(supports_color::Stream::Stdout).is_some())
                .with_writer(std::io::stdout);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .init()
        }
        PrimaryLogger::Stderr => {
            let layer = FmtLayer::new()
                .with_ansi(supports_color::on(supports_color::Stream::Stderr).is_some())
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .init()
        }
    }

    Ok(())
}

/// Make a new [`EnvFilter`] based on the config.
///
/// `RUST_LOG` is not consulted; the configuration is authoritative.
fn make_env_filter(config: &LoggingConfig) -> Result<EnvFilter, String> {
    // Start from a filter which doesn't read any env vars, then raise it to
    // the configured level.
    let mut filter = EnvFilter::default();
    filter = filter.add_directive(LevelFilter::from(config.level).into());

    // Add all of our trace targets to the filter.
    for target in &config.trace_targets {
        filter = filter.add_directive(
            target
                .parse()
                .map_err(|_| format!("invalid trace target: '{target}'"))?,
        );
    }

    Ok(filter)
}

/// A primary logger.
enum PrimaryLogger {
    /// A file logger.
    File {
        /// The actual file.
        file: std::fs::File,
    },

    /// A logger to stdout.
    Stdout,

    /// A logger to stderr.
    Stderr,
}

impl PrimaryLogger {
    /// Initialize a new [`PrimaryLogger`].
    pub fn new(config: &LogTarget) -> Result<Self, std::io::Error> {
        match config {
            LogTarget::File(path) => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;

                Ok(Self::File { file })
            }
            LogTarget::Stdout => Ok(Self::Stdout),
            LogTarget::Stderr => Ok(Self::Stderr),
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Critical => LevelFilter::ERROR,
        }
    }
}

//============ Tests ===========================================================

#[cfg(test)]
mod tests {
    use tracing_subscriber::filter::LevelFilter;

    use super::make_env_filter;
    use crate::config::{LogLevel, LoggingConfig};

    #[test]
    fn env_filter() {
        let mut config = LoggingConfig {
            level: LogLevel::Warning,
            ..Default::default()
        };
        let filter = make_env_filter(&config).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));

        config.trace_targets = vec!["bindzone::editor=trace".into()];
        let filter = make_env_filter(&config).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));

        config.trace_targets = vec!["bindzone=verbose".into()];
        assert!(make_env_filter(&config).is_err());
    }
}
