use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;

use super::commands::Command;
use crate::config::{Config, ConfigError, DEFAULT_CONFIG_PATH, LogLevel};

#[derive(Clone, Debug, Parser)]
#[command(version, about, disable_help_subcommand = true)]
pub struct Args {
    /// The configuration file to use
    ///
    /// Without this option, '/etc/bindzone/config.toml' is read if it exists.
    #[arg(short = 'c', long = "config", value_name = "PATH", global = true)]
    pub config: Option<Utf8PathBuf>,

    /// The minimum severity of messages to log
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// The directory holding the zone files
    #[arg(long = "zone-dir", value_name = "DIR", global = true)]
    pub zone_dir: Option<Utf8PathBuf>,

    /// Do not reload the DNS daemon after changing a zone
    #[arg(long = "no-reload", global = true)]
    pub no_reload: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// Load the configuration, with command-line overrides applied.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::load_or_default(Utf8Path::new(DEFAULT_CONFIG_PATH))?,
        };

        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(zone_dir) = &self.zone_dir {
            config.zone_dir = zone_dir.clone();
        }
        if self.no_reload {
            config.daemon.reload_command.clear();
        }

        Ok(config)
    }

    pub fn execute(self, config: &Config) -> Result<(), String> {
        self.command.execute(config)
    }
}

//============ Tests ===========================================================

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Args;
    use crate::cli::commands::Command;
    use crate::config::LogLevel;

    #[test]
    fn overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "zone-dir = \"/var/lib/bind\"\n").unwrap();
        let path = path.to_str().unwrap();

        let args = Args::try_parse_from(["bindzone", "show", "example.com", "--config", path])
            .unwrap();
        let config = args.load_config().unwrap();
        assert_eq!(config.zone_dir, "/var/lib/bind");
        assert_eq!(config.daemon.reload_command, ["rndc", "reload"]);

        let args = Args::try_parse_from([
            "bindzone",
            "--config",
            path,
            "--zone-dir",
            "/srv/zones",
            "--log-level",
            "debug",
            "--no-reload",
            "show",
            "example.com",
        ])
        .unwrap();
        let config = args.load_config().unwrap();
        assert_eq!(config.zone_dir, "/srv/zones");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.daemon.reload_command.is_empty());
    }

    #[test]
    fn record_fields() {
        let args = Args::try_parse_from([
            "bindzone",
            "add",
            "example.com",
            "rr=A",
            "alias=www",
            "addr=10.0.0.5",
        ])
        .unwrap();
        let Command::Add(record) = args.command else {
            panic!("expected the add command");
        };
        let fields = record.fields();
        assert_eq!(fields.get("rr"), Some("A"));
        assert_eq!(fields.get("addr"), Some("10.0.0.5"));

        assert!(Args::try_parse_from(["bindzone", "add", "example.com", "rr"]).is_err());
        assert!(Args::try_parse_from(["bindzone", "add", "example..com", "rr=A"]).is_err());
    }
}
