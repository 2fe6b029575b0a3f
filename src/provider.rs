//! Serving a domain through the DNS daemon.
//!
//! The [`Provider`] ties zone editing to the daemon: every handler loads the
//! zone, applies a change, saves the zone file and asks the daemon to reload
//! it.  Installing the daemon and opening its port are left to the operator.

use std::{
    fmt, io,
    net::Ipv4Addr,
    process::{Command, ExitStatus},
};

use bindzone_zonedata::{Domain, Fields};
use rand::Rng;
use tracing::{debug, info};

use crate::{
    config::{Config, DaemonConfig},
    editor::{self, ZoneEditor},
    normalize::Canonicalizer,
};

//----------- DaemonControl ----------------------------------------------------

/// Control over the DNS daemon.
pub trait DaemonControl {
    /// Make the daemon pick up a changed zone file.
    fn reload(&self, domain: &Domain) -> Result<(), ReloadError>;
}

/// Build the daemon control described by the configuration.
pub fn daemon_control(config: &DaemonConfig) -> Box<dyn DaemonControl> {
    match CommandReload::new(&config.reload_command) {
        Some(reload) => Box::new(reload),
        None => Box::new(NoReload),
    }
}

//----------- CommandReload ----------------------------------------------------

/// Reloading the daemon by running a command.
///
/// The domain is passed to the command in the `BINDZONE_DOMAIN` environment
/// variable.
#[derive(Clone, Debug)]
pub struct CommandReload {
    program: String,
    args: Vec<String>,
}

impl CommandReload {
    /// Construct a new [`CommandReload`].
    ///
    /// Returns [`None`] if `command` is empty.
    pub fn new(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl DaemonControl for CommandReload {
    fn reload(&self, domain: &Domain) -> Result<(), ReloadError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).env("BINDZONE_DOMAIN", domain.as_str());
        debug!("Reloading the DNS daemon for '{domain}': {cmd:?}");

        let output = cmd.output().map_err(|error| ReloadError::Spawn {
            program: self.program.clone(),
            error,
        })?;

        if !output.status.success() {
            let mut report = String::from_utf8_lossy(&output.stdout).into_owned();
            report.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(ReloadError::Failed {
                status: output.status,
                report: report.trim().into(),
            });
        }

        Ok(())
    }
}

//----------- NoReload ---------------------------------------------------------

/// Leaving the daemon alone.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoReload;

impl DaemonControl for NoReload {
    fn reload(&self, domain: &Domain) -> Result<(), ReloadError> {
        debug!("Not reloading the DNS daemon for '{domain}'");
        Ok(())
    }
}

//----------- Provider ---------------------------------------------------------

/// Zone management for a DNS daemon.
pub struct Provider<'a> {
    config: &'a Config,
    canonicalizer: &'a dyn Canonicalizer,
    daemon: &'a dyn DaemonControl,
}

impl<'a> Provider<'a> {
    /// Construct a new [`Provider`].
    pub fn new(
        config: &'a Config,
        canonicalizer: &'a dyn Canonicalizer,
        daemon: &'a dyn DaemonControl,
    ) -> Self {
        Self {
            config,
            canonicalizer,
            daemon,
        }
    }

    /// Load the zone of a domain for editing.
    pub fn load(&self, domain: &Domain) -> Result<ZoneEditor, Error> {
        Ok(ZoneEditor::load(
            self.config,
            self.canonicalizer,
            domain.clone(),
        )?)
    }

    /// React to a (possibly) new domain.
    ///
    /// If the domain has no zone file yet, a skeleton zone is set up with
    /// records pointing at `public_address` (or the configured one).
    /// Returns whether the zone was set up.
    pub fn config_changed<R: Rng>(
        &self,
        domain: &Domain,
        public_address: Option<Ipv4Addr>,
        rng: &mut R,
    ) -> Result<bool, Error> {
        let mut editor = self.load(domain)?;
        if !editor.needs_setup() {
            debug!("Zone '{domain}' exists already; nothing to set up");
            return Ok(false);
        }

        let public_address = public_address
            .or(self.config.public_address)
            .ok_or(Error::NoPublicAddress)?;

        editor.first_setup(&self.config.setup, public_address, rng)?;
        editor.save()?;
        self.reload(domain)?;
        Ok(true)
    }

    /// Add a record to the zone of a domain.
    ///
    /// The zone must have been set up by [`config_changed()`] first.
    ///
    /// [`config_changed()`]: Self::config_changed
    pub fn add_record(&self, domain: &Domain, fields: &Fields) -> Result<(), Error> {
        let mut editor = self.load_existing(domain)?;
        let record = editor.add_record(fields)?;
        info!("Adding {} record '{}' to '{domain}'", record.kind(), record.alias());
        editor.save()?;
        self.reload(domain)
    }

    /// Remove a record from the zone of a domain.
    ///
    /// Returns whether a matching record was found.  The zone must have
    /// been set up first.
    pub fn remove_record(&self, domain: &Domain, fields: &Fields) -> Result<bool, Error> {
        let mut editor = self.load_existing(domain)?;
        let removed = editor.remove_record(fields)?;
        editor.save()?;
        self.reload(domain)?;
        Ok(removed)
    }

    /// Load a zone that has been set up already.
    fn load_existing(&self, domain: &Domain) -> Result<ZoneEditor, Error> {
        let editor = self.load(domain)?;
        if editor.needs_setup() {
            return Err(Error::NotSetUp(domain.clone()));
        }
        Ok(editor)
    }

    fn reload(&self, domain: &Domain) -> Result<(), Error> {
        self.daemon.reload(domain).map_err(Error::Reload)
    }
}

//----------- ReloadError ------------------------------------------------------

/// The DNS daemon could not be reloaded.
#[derive(Debug)]
pub enum ReloadError {
    /// The reload command could not be run.
    Spawn { program: String, error: io::Error },

    /// The reload command failed.
    Failed { status: ExitStatus, report: Box<str> },
}

impl std::error::Error for ReloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn { error, .. } => Some(error),
            Self::Failed { .. } => None,
        }
    }
}

impl fmt::Display for ReloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { program, error } => write!(f, "could not run '{program}': {error}"),
            Self::Failed { status, report } if report.is_empty() => {
                write!(f, "the reload command failed ({status})")
            }
            Self::Failed { status, report } => {
                write!(f, "the reload command failed ({status}):\n{report}")
            }
        }
    }
}

//----------- Error ------------------------------------------------------------

/// A provider operation failed.
#[derive(Debug)]
pub enum Error {
    /// The zone could not be edited.
    Editor(editor::Error),

    /// The daemon could not be reloaded.
    ///
    /// The zone file has been saved.
    Reload(ReloadError),

    /// No public address is known for first-time setup.
    NoPublicAddress,

    /// The zone has no zone file yet and needs to be set up first.
    NotSetUp(Domain),
}

impl From<editor::Error> for Error {
    fn from(value: editor::Error) -> Self {
        Self::Editor(value)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Editor(error) => Some(error),
            Self::Reload(error) => Some(error),
            Self::NoPublicAddress | Self::NotSetUp(_) => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Editor(error) => error.fmt(f),
            Self::Reload(error) => write!(f, "the zone was saved, but {error}"),
            Self::NoPublicAddress => {
                f.write_str("no public address was given or configured for the new zone")
            }
            Self::NotSetUp(domain) => {
                write!(f, "the zone '{domain}' has not been set up yet")
            }
        }
    }
}

//============ Tests ===========================================================

#[cfg(test)]
mod tests {
    use bindzone_zonedata::Domain;

    use super::{CommandReload, DaemonControl, ReloadError, daemon_control};
    use crate::config::DaemonConfig;

    #[test]
    fn empty_command_disables_reload() {
        assert!(CommandReload::new(&[]).is_none());

        let daemon = daemon_control(&DaemonConfig {
            reload_command: vec![],
        });
        let domain = Domain::new("example.com").unwrap();
        assert!(daemon.reload(&domain).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn reload_command() {
        let domain = Domain::new("example.com").unwrap();

        let command = ["sh", "-c", "test \"$BINDZONE_DOMAIN\" = example.com"].map(String::from);
        let reload = CommandReload::new(&command).unwrap();
        assert!(reload.reload(&domain).is_ok());

        let command = ["sh", "-c", "echo broken >&2; exit 3"].map(String::from);
        let reload = CommandReload::new(&command).unwrap();
        match reload.reload(&domain) {
            Err(ReloadError::Failed { status, report }) => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(&*report, "broken");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
