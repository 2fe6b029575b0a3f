//! Zone apex names.

use std::{fmt, str::FromStr};

use domain::base::{Name, name::FromStrError};

//----------- Domain -----------------------------------------------------------

/// The apex of a zone, e.g. `example.com`.
///
/// The name is kept without its trailing dot; [`Domain::fqdn()`] returns the
/// absolute form used inside zone files.
#[derive(Clone)]
pub struct Domain {
    /// The name, as given, without the trailing dot.
    text: Box<str>,

    /// The parsed name, for label-wise comparisons.
    apex: Name<Vec<u8>>,
}

impl Domain {
    /// Validate a domain name.
    pub fn new(name: &str) -> Result<Self, DomainError> {
        let text = name.trim().trim_end_matches('.');
        if text.is_empty() {
            return Err(DomainError::Empty);
        }
        if let Some(ch) = illegal_char(text) {
            return Err(DomainError::IllegalCharacter(ch));
        }

        let apex = Name::<Vec<u8>>::from_str(text).map_err(DomainError::Invalid)?;
        if apex.is_root() {
            return Err(DomainError::Empty);
        }

        Ok(Self {
            text: text.into(),
            apex,
        })
    }

    /// The name, without a trailing dot.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The absolute name, with a trailing dot.
    pub fn fqdn(&self) -> String {
        format!("{}.", self.text)
    }

    /// The fully qualified form of a host in this zone.
    ///
    /// `@` refers to the apex itself.
    pub fn qualify(&self, host: &str) -> String {
        match host {
            "@" => self.fqdn(),
            host if host.ends_with('.') => host.into(),
            host => format!("{host}.{}.", self.text),
        }
    }

    /// The alias of an owner name relative to this zone.
    ///
    /// Names below the apex map to their leading labels (`ns1.example.com.`
    /// becomes `ns1`).  The apex itself, names outside the zone and names that
    /// do not parse all map to `@`.
    pub fn alias_of(&self, owner: &str) -> Box<str> {
        let Ok(name) = Name::<Vec<u8>>::from_str(owner.trim()) else {
            return "@".into();
        };

        if !name.ends_with(&self.apex) {
            return "@".into();
        }

        let depth = name.label_count() - self.apex.label_count();
        if depth == 0 {
            return "@".into();
        }

        let labels: Vec<String> = name.iter().take(depth).map(|l| l.to_string()).collect();
        labels.join(".").into()
    }
}

impl PartialEq for Domain {
    fn eq(&self, other: &Self) -> bool {
        self.text.eq_ignore_ascii_case(&other.text)
    }
}

impl Eq for Domain {}

impl fmt::Debug for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Domain").field(&self.text).finish()
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Domain {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

//----------- Name checks -----------------------------------------------------

/// The first character of `name` that may not appear in a zone file name.
///
/// Names are written into tab-separated zone file lines, so only printable
/// ASCII is allowed and characters with a meaning in zone file syntax
/// (comments, quotes, parentheses, directives and `@`) are rejected.
/// Backslash escapes are left to [`Name`].
fn illegal_char(name: &str) -> Option<char> {
    name.chars()
        .find(|&ch| !ch.is_ascii_graphic() || matches!(ch, ';' | '(' | ')' | '"' | '$' | '@'))
}

/// Whether `name` is a relative or absolute domain name that can be written
/// into a zone file as is.
///
/// `@`, the zone apex, is accepted as well.
pub(crate) fn is_zone_name(name: &str) -> bool {
    if name == "@" {
        return true;
    }
    !name.is_empty()
        && illegal_char(name).is_none()
        && Name::<Vec<u8>>::from_str(name).is_ok()
}

//----------- DomainError ------------------------------------------------------

/// An invalid zone apex.
#[derive(Debug)]
pub enum DomainError {
    /// The name was empty or the root.
    Empty,

    /// The name contains a character that zone files cannot hold.
    IllegalCharacter(char),

    /// The name is not a valid domain name.
    Invalid(FromStrError),
}

impl std::error::Error for DomainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Empty | Self::IllegalCharacter(_) => None,
            Self::Invalid(error) => Some(error),
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("the domain name is empty"),
            Self::IllegalCharacter(ch) => {
                write!(f, "the domain name contains the character {ch:?}")
            }
            Self::Invalid(error) => write!(f, "invalid domain name: {error}"),
        }
    }
}

//============ Tests ===========================================================

#[cfg(test)]
mod tests {
    use super::{Domain, DomainError, is_zone_name};

    #[test]
    fn new() {
        let domain = Domain::new("example.com.").unwrap();
        assert_eq!(domain.as_str(), "example.com");
        assert_eq!(domain.fqdn(), "example.com.");

        assert!(Domain::new("").is_err());
        assert!(Domain::new(".").is_err());
        assert!(Domain::new("example..com").is_err());
        assert!(matches!(
            Domain::new("example.com\n$INCLUDE /etc/passwd"),
            Err(DomainError::IllegalCharacter('\n'))
        ));
    }

    #[test]
    fn zone_names() {
        for name in ["@", "www", "a.b", "*.example.com.", "ns1.example.net.", "_dmarc"] {
            assert!(is_zone_name(name), "{name:?} should be accepted");
        }

        for name in [
            "",
            "www\tx",
            "www\t\tIN\tNS\tevil.example.net.",
            "www mail",
            "www\nmail",
            "bell\u{7}",
            "www;comment",
            "(www)",
            "$INCLUDE",
            "root@example.com.",
            "caf\u{e9}",
            "www..example.com.",
        ] {
            assert!(!is_zone_name(name), "{name:?} should be rejected");
        }
    }

    #[test]
    fn alias_of() {
        let domain = Domain::new("example.com").unwrap();
        assert_eq!(&*domain.alias_of("example.com."), "@");
        assert_eq!(&*domain.alias_of("EXAMPLE.com."), "@");
        assert_eq!(&*domain.alias_of("ns1.example.com."), "ns1");
        assert_eq!(&*domain.alias_of("a.b.example.com."), "a.b");
        assert_eq!(&*domain.alias_of("www.example.org."), "@");
        assert_eq!(&*domain.alias_of("bad..name"), "@");
    }

    #[test]
    fn qualify() {
        let domain = Domain::new("example.com").unwrap();
        assert_eq!(domain.qualify("@"), "example.com.");
        assert_eq!(domain.qualify("ns1"), "ns1.example.com.");
        assert_eq!(domain.qualify("ns1.example.net."), "ns1.example.net.");
    }
}
