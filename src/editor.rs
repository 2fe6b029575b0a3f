//! Editing the zone file of a domain.
//!
//! A [`ZoneEditor`] covers one load, mutate and save cycle.  The existing
//! zone file (if any) is normalized and parsed, records are added or removed
//! in memory, and the result is rendered and written back atomically.

use std::{fmt, io, net::Ipv4Addr};

use bindzone_zonedata::{
    AddError, Domain, Fields, FieldsError, ParseError, Record, Zone, reader,
};
use camino::{Utf8Path, Utf8PathBuf};
use domain::base::Ttl;
use jiff::Timestamp;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::{
    config::{Config, SerialPolicy, SetupConfig},
    normalize::{Canonicalizer, NormalizeError},
    util,
};

/// The range that the serial of a new zone is picked from.
const SEED_SERIALS: std::ops::RangeInclusive<u32> = 12345678..=22345678;

//----------- ZoneEditor -------------------------------------------------------

/// The zone of a domain, loaded for editing.
#[derive(Debug)]
pub struct ZoneEditor {
    /// The records.
    zone: Zone,

    /// The zone file.
    path: Utf8PathBuf,

    /// Whether the zone was loaded from an existing file.
    existing: bool,

    /// The TTL of records without one of their own.
    default_ttl: Ttl,

    /// How the serial changes on save.
    serial_policy: SerialPolicy,
}

impl ZoneEditor {
    /// Load the zone of a domain.
    ///
    /// If the zone file exists, it is normalized by `canonicalizer` and
    /// parsed.  Otherwise, the zone starts out empty and
    /// [`needs_setup()`](Self::needs_setup) returns `true`.
    pub fn load(
        config: &Config,
        canonicalizer: &dyn Canonicalizer,
        domain: Domain,
    ) -> Result<Self, Error> {
        let path = config.zone_path(&domain);

        let exists = path.as_std_path().try_exists().map_err(|error| Error::Read {
            path: path.clone(),
            error,
        })?;

        let zone = if exists {
            // The normalized file is removed at the end of this block.
            let normalized = canonicalizer.canonicalize(&domain, &path)?;
            let text = normalized.read()?;
            let zone = reader::parse(domain, &text).map_err(|error| Error::Parse {
                path: path.clone(),
                error,
            })?;
            debug!("Loaded {} records from '{path}'", zone.len());
            zone
        } else {
            debug!("No zone file at '{path}'; '{domain}' needs to be set up");
            Zone::new(domain)
        };

        Ok(Self {
            zone,
            path,
            existing: exists,
            default_ttl: config.default_ttl(),
            serial_policy: config.serial_policy,
        })
    }

    /// Whether the zone file did not exist yet.
    pub fn needs_setup(&self) -> bool {
        !self.existing
    }

    /// The records of the zone.
    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    /// The path of the zone file.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Render the zone file text.
    pub fn render(&self) -> String {
        self.zone.render(self.default_ttl)
    }
}

//--- Mutation

impl ZoneEditor {
    /// Populate a new zone with a skeleton of records.
    ///
    /// This adds a SOA record with a random serial, an NS record for
    /// `ns1.<domain>.`, A records for the apex and `ns1` pointing at
    /// `public_address`, and a CNAME record from `ns` to `ns1`.
    pub fn first_setup<R: Rng>(
        &mut self,
        setup: &SetupConfig,
        public_address: Ipv4Addr,
        rng: &mut R,
    ) -> Result<(), Error> {
        if self.existing {
            return Err(Error::AlreadySetUp(self.path.clone()));
        }

        let fqdn = self.zone.domain().fqdn();
        let nameserver = format!("ns1.{fqdn}");
        let serial = rng.gen_range(SEED_SERIALS);

        let records = [
            Fields::new()
                .with("rr", "SOA")
                .with("addr", &nameserver)
                .with("owner", format!("root.{fqdn}"))
                .with("serial", serial)
                .with("refresh", &setup.refresh)
                .with("update-retry", &setup.update_retry)
                .with("expiry", &setup.expiry)
                .with("minimum", &setup.minimum),
            Fields::new()
                .with("rr", "NS")
                .with("alias", "@")
                .with("addr", &nameserver),
            Fields::new()
                .with("rr", "A")
                .with("alias", "@")
                .with("addr", public_address)
                .with("ttl", setup.ttl),
            Fields::new()
                .with("rr", "A")
                .with("alias", "ns1")
                .with("addr", public_address)
                .with("ttl", setup.ttl),
            Fields::new()
                .with("rr", "CNAME")
                .with("alias", "ns")
                .with("addr", &nameserver)
                .with("ttl", setup.ttl),
        ];
        for fields in &records {
            self.add_record(fields)?;
        }

        info!(
            "Set up zone '{}' with serial {serial}",
            self.zone.domain()
        );
        Ok(())
    }

    /// Add a record.
    ///
    /// The record kind is named by the `rr` field.
    pub fn add_record(&mut self, fields: &Fields) -> Result<&Record, Error> {
        let kind = fields.get("rr").ok_or(FieldsError::Missing("rr"))?;
        let record = self.zone.add(kind, fields)?;
        debug!("Added {} record '{}'", record.kind(), record.alias());
        Ok(record)
    }

    /// Remove a record.
    ///
    /// The first record of the kind named by the `rr` field whose alias
    /// matches the `alias` field is removed.  Returns whether a record was
    /// found.
    pub fn remove_record(&mut self, fields: &Fields) -> Result<bool, Error> {
        let kind = fields.kind()?;
        let alias = fields.get("alias").ok_or(FieldsError::Missing("alias"))?;

        let removed = self.zone.remove(kind, "alias", alias);
        if removed {
            debug!("Removed {kind} record '{alias}'");
        } else {
            warn!(
                "No {kind} record '{alias}' in zone '{}'",
                self.zone.domain()
            );
        }
        Ok(removed)
    }
}

//--- Persistence

impl ZoneEditor {
    /// Write the zone file.
    ///
    /// If the zone was loaded from an existing file and has changed since,
    /// its serial is first advanced according to the serial policy.
    pub fn save(&mut self) -> Result<&Utf8Path, Error> {
        self.save_at(Timestamp::now())
    }

    /// Write the zone file, as if at the given time.
    pub fn save_at(&mut self, now: Timestamp) -> Result<&Utf8Path, Error> {
        if self.existing && self.zone.is_changed() {
            self.advance_serial(now);
        }

        // The whole file is rendered before anything is written.
        let text = self.render();
        util::write_file(&self.path, text.as_bytes()).map_err(|error| Error::Write {
            path: self.path.clone(),
            error,
        })?;

        info!("Saved zone '{}' to '{}'", self.zone.domain(), self.path);
        self.zone.mark_unchanged();
        self.existing = true;
        Ok(&self.path)
    }

    fn advance_serial(&mut self, now: Timestamp) {
        let Some(soa) = self.zone.soa() else {
            warn!(
                "Zone '{}' has no SOA record; its serial cannot be advanced",
                self.zone.domain()
            );
            return;
        };

        let previous = soa.serial;
        let serial = self.serial_policy.advance(previous, now);
        if serial != previous {
            debug!(
                "Advancing the serial of '{}' from {previous} to {serial} ({} policy)",
                self.zone.domain(),
                self.serial_policy
            );
            self.zone.set_serial(serial);
        }
    }
}

//----------- Error ------------------------------------------------------------

/// An error while editing a zone.
#[derive(Debug)]
pub enum Error {
    /// The record kind could not be determined.
    Fields(FieldsError),

    /// A record could not be added.
    Add(AddError),

    /// The zone file could not be normalized.
    Normalize(NormalizeError),

    /// The normalized zone file could not be parsed.
    Parse {
        path: Utf8PathBuf,
        error: ParseError,
    },

    /// The zone file could not be accessed.
    Read {
        path: Utf8PathBuf,
        error: io::Error,
    },

    /// The zone file could not be written.
    Write {
        path: Utf8PathBuf,
        error: io::Error,
    },

    /// First-time setup was requested for an existing zone.
    AlreadySetUp(Utf8PathBuf),
}

//--- Conversion

impl From<FieldsError> for Error {
    fn from(value: FieldsError) -> Self {
        Self::Fields(value)
    }
}

impl From<AddError> for Error {
    fn from(value: AddError) -> Self {
        Self::Add(value)
    }
}

impl From<NormalizeError> for Error {
    fn from(value: NormalizeError) -> Self {
        Self::Normalize(value)
    }
}

//--- Formatting

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fields(error) => Some(error),
            Self::Add(error) => Some(error),
            Self::Normalize(error) => Some(error),
            Self::Parse { error, .. } => Some(error),
            Self::Read { error, .. } => Some(error),
            Self::Write { error, .. } => Some(error),
            Self::AlreadySetUp(_) => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fields(error) => error.fmt(f),
            Self::Add(error) => error.fmt(f),
            Self::Normalize(error) => error.fmt(f),
            Self::Parse { path, error } => write!(f, "could not parse '{path}': {error}"),
            Self::Read { path, error } => write!(f, "could not access '{path}': {error}"),
            Self::Write { path, error } => write!(f, "could not write '{path}': {error}"),
            Self::AlreadySetUp(path) => write!(f, "the zone file '{path}' already exists"),
        }
    }
}
