//! Normalizing zone files.
//!
//! Zone files are handed to a [`Canonicalizer`] before they are parsed.  The
//! canonicalizer checks the file and rewrites it into the tab-separated form
//! that [`bindzone_zonedata::reader`] understands.

use std::{
    fmt, fs, io,
    path::Path,
    process::{Command, ExitStatus},
};

use bindzone_zonedata::Domain;
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempPath;
use tracing::{debug, trace};

use crate::config::CanonicalizerConfig;

//----------- Canonicalizer ----------------------------------------------------

/// A zone file canonicalizer.
pub trait Canonicalizer {
    /// Canonicalize the zone file at `input`.
    ///
    /// The normalized text is placed in a temporary file owned by the
    /// returned [`NormalizedZone`].
    fn canonicalize(
        &self,
        domain: &Domain,
        input: &Utf8Path,
    ) -> Result<NormalizedZone, NormalizeError>;
}

//----------- NormalizedZone ---------------------------------------------------

/// A normalized zone file.
///
/// The file is deleted when this is dropped.
#[derive(Debug)]
pub struct NormalizedZone {
    path: TempPath,
}

impl NormalizedZone {
    /// Take ownership of a temporary file holding normalized zone text.
    pub fn new(path: TempPath) -> Self {
        Self { path }
    }

    /// Create an empty temporary file to normalize a zone into.
    ///
    /// The file is created in `dir`, or in the system's temporary directory.
    pub fn create(dir: Option<&Utf8Path>) -> Result<Self, NormalizeError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("bindzone-").suffix(".zone");
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(NormalizeError::TempFile)?;

        Ok(Self::new(file.into_temp_path()))
    }

    /// The path of the normalized file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the normalized text.
    pub fn read(&self) -> Result<String, NormalizeError> {
        fs::read_to_string(&self.path).map_err(NormalizeError::Read)
    }
}

//----------- NamedCheckzone ---------------------------------------------------

/// Canonicalization through BIND's `named-checkzone`.
///
/// The tool is run as `named-checkzone -o <output> <domain> <input>`.  It
/// blocks the calling thread; there is no timeout.
#[derive(Clone, Debug)]
pub struct NamedCheckzone {
    /// The `named-checkzone` binary.
    binary: Utf8PathBuf,

    /// Where to place output files.
    temp_dir: Option<Utf8PathBuf>,
}

impl NamedCheckzone {
    /// Construct a new [`NamedCheckzone`].
    pub fn new(config: &CanonicalizerConfig) -> Self {
        Self {
            binary: config.binary_path.clone(),
            temp_dir: config.temp_dir.clone(),
        }
    }
}

impl Canonicalizer for NamedCheckzone {
    fn canonicalize(
        &self,
        domain: &Domain,
        input: &Utf8Path,
    ) -> Result<NormalizedZone, NormalizeError> {
        let output = NormalizedZone::create(self.temp_dir.as_deref())?;

        let mut cmd = Command::new(self.binary.as_std_path());
        cmd.arg("-o")
            .arg(output.path())
            .arg(domain.as_str())
            .arg(input.as_std_path());
        debug!("Canonicalizing '{input}' for '{domain}': {cmd:?}");

        let result = cmd.output().map_err(|error| NormalizeError::Unavailable {
            binary: self.binary.clone(),
            error,
        })?;

        if !result.status.success() {
            // named-checkzone reports problems on stdout.
            let mut report = String::from_utf8_lossy(&result.stdout).into_owned();
            report.push_str(&String::from_utf8_lossy(&result.stderr));
            return Err(NormalizeError::Rejected {
                status: result.status,
                report: report.trim().into(),
            });
        }

        trace!(
            "named-checkzone: {}",
            String::from_utf8_lossy(&result.stdout).trim()
        );
        Ok(output)
    }
}

//----------- NormalizeError ---------------------------------------------------

/// A zone file could not be normalized.
#[derive(Debug)]
pub enum NormalizeError {
    /// The canonicalizer could not be run.
    Unavailable {
        binary: Utf8PathBuf,
        error: io::Error,
    },

    /// The canonicalizer rejected the zone file.
    Rejected { status: ExitStatus, report: Box<str> },

    /// A temporary output file could not be created.
    TempFile(io::Error),

    /// The normalized output could not be read.
    Read(io::Error),
}

impl std::error::Error for NormalizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unavailable { error, .. } => Some(error),
            Self::Rejected { .. } => None,
            Self::TempFile(error) => Some(error),
            Self::Read(error) => Some(error),
        }
    }
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { binary, error } => {
                write!(f, "could not run '{binary}': {error}")
            }
            Self::Rejected { status, report } if report.is_empty() => {
                write!(f, "the zone file was rejected ({status})")
            }
            Self::Rejected { status, report } => {
                write!(f, "the zone file was rejected ({status}):\n{report}")
            }
            Self::TempFile(error) => write!(f, "could not create a temporary file: {error}"),
            Self::Read(error) => write!(f, "could not read the normalized zone: {error}"),
        }
    }
}

//============ Tests ===========================================================

#[cfg(test)]
mod tests {
    use bindzone_zonedata::Domain;
    use camino::{Utf8Path, Utf8PathBuf};

    use super::{Canonicalizer, NamedCheckzone, NormalizeError, NormalizedZone};
    use crate::config::CanonicalizerConfig;

    fn temp_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().to_path_buf();
        (dir, path)
    }

    #[test]
    fn normalized_zone_is_removed_on_drop() {
        let (_guard, dir) = temp_dir();
        let zone = NormalizedZone::create(Some(&dir)).unwrap();
        let path = zone.path().to_path_buf();
        assert!(path.exists());
        assert!(path.starts_with(&dir));
        assert_eq!(zone.read().unwrap(), "");

        drop(zone);
        assert!(!path.exists());
    }

    #[test]
    fn missing_binary() {
        let (_guard, dir) = temp_dir();
        let checkzone = NamedCheckzone::new(&CanonicalizerConfig {
            binary_path: dir.join("no-such-named-checkzone"),
            temp_dir: Some(dir.clone()),
        });

        let domain = Domain::new("example.com").unwrap();
        let error = checkzone
            .canonicalize(&domain, &dir.join("db.example.com"))
            .unwrap_err();
        assert!(matches!(error, NormalizeError::Unavailable { .. }));

        // The output file was cleaned up.
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn rejected() {
        let (_guard, dir) = temp_dir();
        let checkzone = NamedCheckzone::new(&CanonicalizerConfig {
            binary_path: "false".into(),
            temp_dir: Some(dir.clone()),
        });

        let domain = Domain::new("example.com").unwrap();
        let error = checkzone
            .canonicalize(&domain, &dir.join("db.example.com"))
            .unwrap_err();
        assert!(matches!(error, NormalizeError::Rejected { .. }));
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }
}
