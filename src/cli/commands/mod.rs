//! The commands of _bindzone_.

pub mod record;
pub mod setup;
pub mod show;

use crate::config::Config;
use crate::normalize::NamedCheckzone;
use crate::provider::{self, Provider, daemon_control};

#[derive(Clone, Debug, clap::Subcommand)]
pub enum Command {
    /// Set up the zone of a domain, if it does not exist yet
    #[command(name = "setup")]
    Setup(self::setup::Setup),

    /// Add a record to the zone of a domain
    #[command(name = "add")]
    Add(self::record::Record),

    /// Remove a record from the zone of a domain
    #[command(name = "remove")]
    Remove(self::record::Record),

    /// Print the zone of a domain
    #[command(name = "show")]
    Show(self::show::Show),

    /// Check the configuration and print the effective settings
    #[command(name = "check-config")]
    CheckConfig,
}

impl Command {
    pub fn execute(self, config: &Config) -> Result<(), String> {
        match self {
            Self::Setup(setup) => setup
                .execute(config)
                .map_err(|err| format!("setup failed: {err}")),
            Self::Add(record) => record
                .add(config)
                .map_err(|err| format!("adding the record failed: {err}")),
            Self::Remove(record) => record
                .remove(config)
                .map_err(|err| format!("removing the record failed: {err}")),
            Self::Show(show) => show
                .execute(config)
                .map_err(|err| format!("show failed: {err}")),
            Self::CheckConfig => {
                let text = toml::to_string(config)
                    .map_err(|err| format!("could not print the configuration: {err}"))?;
                print!("{text}");
                Ok(())
            }
        }
    }
}

/// Run an operation against the DNS daemon.
fn provide<T>(
    config: &Config,
    op: impl FnOnce(&Provider<'_>) -> Result<T, provider::Error>,
) -> Result<T, provider::Error> {
    let canonicalizer = NamedCheckzone::new(&config.canonicalizer);
    let daemon = daemon_control(&config.daemon);
    op(&Provider::new(config, &canonicalizer, &*daemon))
}
