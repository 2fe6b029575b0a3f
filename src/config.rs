//! Configuring bindzone.
//!
//! bindzone reads a single TOML file.  Every setting has a default, so the
//! file may be absent or only mention the settings that differ.

use std::{fmt, fs, io, net::Ipv4Addr, str::FromStr};

use bindzone_zonedata::{Domain, Timer};
use camino::{Utf8Path, Utf8PathBuf};
use clap::builder::PossibleValue;
use domain::base::{Serial, Ttl};
use jiff::{Timestamp, Zoned, tz::TimeZone};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The configuration file used when none is given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/bindzone/config.toml";

//----------- Config -----------------------------------------------------------

/// The configuration of bindzone.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct Config {
    /// The directory holding the zone files.
    pub zone_dir: Utf8PathBuf,

    /// The TTL of records without one of their own, in seconds.
    pub default_ttl: u32,

    /// How serial numbers change when a zone is saved.
    pub serial_policy: SerialPolicy,

    /// The public IPv4 address of this server.
    ///
    /// Used by first-time setup when no address is given explicitly.
    pub public_address: Option<Ipv4Addr>,

    /// The zone file canonicalizer.
    pub canonicalizer: CanonicalizerConfig,

    /// Interaction with the DNS daemon.
    pub daemon: DaemonConfig,

    /// Logging.
    pub logging: LoggingConfig,

    /// The records synthesized by first-time setup.
    pub setup: SetupConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zone_dir: "/etc/bind".into(),
            default_ttl: 3600,
            serial_policy: SerialPolicy::default(),
            public_address: None,
            canonicalizer: CanonicalizerConfig::default(),
            daemon: DaemonConfig::default(),
            logging: LoggingConfig::default(),
            setup: SetupConfig::default(),
        }
    }
}

impl Config {
    /// Load the configuration from a file.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.into(),
            error,
        })?;
        Self::parse(path, &text)
    }

    /// Load the configuration, tolerating a missing file.
    ///
    /// The defaults are used if `path` does not exist.
    pub fn load_or_default(path: &Utf8Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Read { error, .. }) if error.kind() == io::ErrorKind::NotFound => {
                debug!("No configuration file at '{path}'; using the defaults");
                Ok(Self::default())
            }
            result => result,
        }
    }

    /// Parse the configuration from TOML text.
    pub fn parse(path: &Utf8Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|error| ConfigError::Parse {
            path: path.into(),
            error,
        })
    }

    /// The path of the zone file of a domain.
    pub fn zone_path(&self, domain: &Domain) -> Utf8PathBuf {
        self.zone_dir.join(format!("db.{domain}"))
    }

    /// The TTL of records without one of their own.
    pub fn default_ttl(&self) -> Ttl {
        Ttl::from_secs(self.default_ttl)
    }
}

//----------- CanonicalizerConfig ----------------------------------------------

/// Configuration of the zone file canonicalizer.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct CanonicalizerConfig {
    /// The `named-checkzone` binary.
    ///
    /// A bare name is looked up in `PATH`.
    pub binary_path: Utf8PathBuf,

    /// Where to place canonicalized zone files.
    ///
    /// The system's temporary directory is used if this is not set.
    pub temp_dir: Option<Utf8PathBuf>,
}

impl Default for CanonicalizerConfig {
    fn default() -> Self {
        Self {
            binary_path: "named-checkzone".into(),
            temp_dir: None,
        }
    }
}

//----------- DaemonConfig -----------------------------------------------------

/// Configuration of the interaction with the DNS daemon.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct DaemonConfig {
    /// The command that makes the daemon reload its zones.
    ///
    /// An empty command disables reloading.
    pub reload_command: Vec<String>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            reload_command: vec!["rndc".into(), "reload".into()],
        }
    }
}

//----------- LoggingConfig ----------------------------------------------------

/// Logging configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// The minimum severity of messages to log.
    pub level: LogLevel,

    /// Where to log messages to.
    pub target: LogTarget,

    /// Targets to log trace messages for.
    ///
    /// These are `tracing` filter directives, e.g. `bindzone::editor=trace`.
    pub trace_targets: Vec<String>,
}

//----------- LogLevel ---------------------------------------------------------

/// A severity level for logging.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum LogLevel {
    /// A function or variable was interacted with, for debugging.
    Trace,

    /// Something occurred that may be relevant to debugging.
    Debug,

    /// Things are proceeding as expected.
    #[default]
    Info,

    /// Something does not appear to be correct.
    Warning,

    /// Something is wrong (but bindzone can recover).
    Error,

    /// Something is wrong and bindzone can't function at all.
    Critical,
}

impl LogLevel {
    /// Represent a [`LogLevel`] as a string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl clap::ValueEnum for LogLevel {
    fn value_variants<'a>() -> &'a [Self] {
        &[
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warning,
            LogLevel::Error,
            LogLevel::Critical,
        ]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(PossibleValue::new(self.as_str()))
    }
}

//----------- LogTarget --------------------------------------------------------

/// A logging target.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogTarget {
    /// Append logs to a file.
    File(Utf8PathBuf),

    /// Write logs to stdout.
    Stdout,

    /// Write logs to stderr.
    #[default]
    Stderr,
}

impl FromStr for LogTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdout" => Ok(Self::Stdout),
            "stderr" => Ok(Self::Stderr),
            _ => match s.strip_prefix("file:") {
                Some(path) if !path.is_empty() => Ok(Self::File(path.into())),
                _ => Err(format!(
                    "unknown log target '{s}', expected 'stdout', 'stderr' or 'file:<path>'"
                )),
            },
        }
    }
}

impl TryFrom<String> for LogTarget {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LogTarget> for String {
    fn from(value: LogTarget) -> Self {
        match value {
            LogTarget::File(path) => format!("file:{path}"),
            LogTarget::Stdout => "stdout".into(),
            LogTarget::Stderr => "stderr".into(),
        }
    }
}

//----------- SetupConfig ------------------------------------------------------

/// The values used when a zone is set up for the first time.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct SetupConfig {
    /// The SOA refresh timer.
    pub refresh: Timer,

    /// The SOA retry timer.
    pub update_retry: Timer,

    /// The SOA expire timer.
    pub expiry: Timer,

    /// The SOA minimum (negative caching) timer.
    pub minimum: Timer,

    /// The TTL of the synthesized address and alias records, in seconds.
    pub ttl: u32,
}

impl Default for SetupConfig {
    fn default() -> Self {
        fn timer(text: &str) -> Timer {
            text.parse().expect("the default timers are valid")
        }

        Self {
            refresh: timer("12h"),
            update_retry: timer("15m"),
            expiry: timer("3w"),
            minimum: timer("3h"),
            ttl: 300,
        }
    }
}

//----------- SerialPolicy -----------------------------------------------------

/// Policy for changing serial numbers when a zone is saved.
///
/// The policy only applies to zones that were loaded from an existing file
/// and changed since.  Newly created zones keep their seeded serial.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SerialPolicy {
    /// Never change the serial number.
    ///
    /// Secondaries will not pick up changes unless the serial is changed by
    /// other means.
    Keep,

    /// Increment the serial number on every change.
    #[default]
    Counter,

    /// Use the current Unix time, in seconds.
    UnixTime,

    /// Use the UTC date of the save, as `<YYYY><MM><DD>00`.
    ///
    /// Saving again on the same day (or with a serial already ahead of the
    /// date) increments the previous serial instead.
    DateCounter,
}

impl SerialPolicy {
    /// The serial number to save a changed zone with.
    ///
    /// Except for [`SerialPolicy::Keep`], the result is always greater than
    /// `previous` in serial number arithmetic.
    pub fn advance(self, previous: Serial, now: Timestamp) -> Serial {
        let candidate = match self {
            Self::Keep => return previous,
            Self::Counter => previous.add(1),
            Self::UnixTime => Serial::from(now.as_second() as u32),
            Self::DateCounter => {
                let date = Zoned::new(now, TimeZone::UTC);
                let serial = ((date.year() as u32 * 100 + date.month() as u32) * 100
                    + date.day() as u32)
                    * 100;
                Serial::from(serial)
            }
        };

        if candidate > previous {
            candidate
        } else {
            previous.add(1)
        }
    }
}

impl fmt::Display for SerialPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerialPolicy::Keep => f.write_str("keep"),
            SerialPolicy::Counter => f.write_str("counter"),
            SerialPolicy::UnixTime => f.write_str("unix time"),
            SerialPolicy::DateCounter => f.write_str("date counter"),
        }
    }
}

//----------- ConfigError ------------------------------------------------------

/// The configuration could not be loaded.
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read.
    Read {
        path: Utf8PathBuf,
        error: io::Error,
    },

    /// The file is not valid configuration.
    Parse {
        path: Utf8PathBuf,
        error: toml::de::Error,
    },
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { error, .. } => Some(error),
            Self::Parse { error, .. } => Some(error),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, error } => write!(f, "could not read '{path}': {error}"),
            Self::Parse { path, error } => write!(f, "invalid configuration in '{path}': {error}"),
        }
    }
}

//============ Tests ===========================================================
