//! The supported DNS records.
//!
//! A zone managed by bindzone holds records of five kinds: `SOA`, `NS`, `A`,
//! `AAAA` and `CNAME`.  Each kind has its own record type, and [`Record`]
//! unifies them.  Records are built from [`Fields`], a mapping of named
//! values as they are supplied by callers (or decoded from a zone file).

use std::{
    collections::BTreeMap,
    fmt,
    net::{Ipv4Addr, Ipv6Addr},
    str::FromStr,
};

use domain::base::{Serial, Ttl};
use serde::{Deserialize, Serialize};

use crate::{Domain, Timer, TimerError, apex::is_zone_name};

//----------- RecordKind -------------------------------------------------------

/// The kind of a [`Record`].
///
/// The order of the variants is the order of records in a zone file.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKind {
    Soa,
    Ns,
    A,
    Aaaa,
    Cname,
}

impl RecordKind {
    /// All record kinds, in zone file order.
    pub const ALL: [Self; 5] = [Self::Soa, Self::Ns, Self::A, Self::Aaaa, Self::Cname];

    /// The mnemonic of this kind, as used in zone files.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Soa => "SOA",
            Self::Ns => "NS",
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = UnknownRecordKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownRecordKind(s.into()))
    }
}

//----------- Fields -----------------------------------------------------------

/// Named record fields, as supplied by a caller.
///
/// The recognized names are `rr` (the record kind), `ttl`, `alias`, `addr`,
/// `owner`, `owner-name`, `serial`, `refresh`, `update-retry`, `expiry` and
/// `minimum`.  Which of them are required depends on the record kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Fields(BTreeMap<String, String>);

impl Fields {
    /// An empty set of fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any earlier value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Set a field, returning the updated set.
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.0.insert(name.into(), value.to_string());
        self
    }

    /// Look up a field.
    ///
    /// Fields set to an empty string are treated as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// The record kind named by the `rr` field.
    pub fn kind(&self) -> Result<RecordKind, FieldsError> {
        let kind = self.get("rr").ok_or(FieldsError::Missing("rr"))?;
        kind.parse().map_err(FieldsError::Kind)
    }

    fn require(&self, kind: RecordKind, field: &'static str) -> Result<&str, ValidationError> {
        self.get(field)
            .ok_or(ValidationError::MissingField { kind, field })
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

//----------- Record types -----------------------------------------------------

/// An `A` record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ARecord {
    /// The host, relative to the zone apex (`@` for the apex).
    pub alias: Box<str>,

    /// The IPv4 address.
    pub addr: Ipv4Addr,

    pub ttl: Option<Ttl>,
}

/// An `AAAA` record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AaaaRecord {
    /// The host, relative to the zone apex (`@` for the apex).
    pub alias: Box<str>,

    /// The IPv6 address.
    pub addr: Ipv6Addr,

    pub ttl: Option<Ttl>,
}

/// A `CNAME` record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CnameRecord {
    /// The host, relative to the zone apex.
    pub alias: Box<str>,

    /// The absolute name the alias points to.
    pub target: Box<str>,

    pub ttl: Option<Ttl>,
}

/// An `NS` record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NsRecord {
    /// The absolute owner name, normally the zone apex.
    pub owner: Box<str>,

    /// The name server host.
    pub nameserver: Box<str>,

    pub ttl: Option<Ttl>,
}

/// A `SOA` record.
///
/// The timers are optional: a record decoded from a zone file with a short
/// tail of timers keeps the missing ones empty rather than failing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoaRecord {
    /// The primary name server.
    pub nameserver: Box<str>,

    /// The mailbox of the responsible party, with `@` encoded as a dot.
    pub mailbox: Box<str>,

    pub serial: Serial,
    pub refresh: Option<Timer>,
    pub retry: Option<Timer>,
    pub expire: Option<Timer>,
    pub minimum: Option<Timer>,
    pub ttl: Option<Ttl>,
}

impl SoaRecord {
    /// This record with a different serial.
    pub fn with_serial(&self, serial: Serial) -> Self {
        Self {
            serial,
            ..self.clone()
        }
    }

    /// The timers in zone file order, up to the first missing one.
    pub fn timers(&self) -> impl Iterator<Item = &Timer> {
        [&self.refresh, &self.retry, &self.expire, &self.minimum]
            .into_iter()
            .map_while(Option::as_ref)
    }
}

//----------- Record -----------------------------------------------------------

/// A record in a zone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Record {
    Soa(SoaRecord),
    Ns(NsRecord),
    A(ARecord),
    Aaaa(AaaaRecord),
    Cname(CnameRecord),
}

impl Record {
    /// The kind of this record.
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::Soa(_) => RecordKind::Soa,
            Self::Ns(_) => RecordKind::Ns,
            Self::A(_) => RecordKind::A,
            Self::Aaaa(_) => RecordKind::Aaaa,
            Self::Cname(_) => RecordKind::Cname,
        }
    }

    /// The explicit TTL of this record, if any.
    pub fn ttl(&self) -> Option<Ttl> {
        match self {
            Self::Soa(r) => r.ttl,
            Self::Ns(r) => r.ttl,
            Self::A(r) => r.ttl,
            Self::Aaaa(r) => r.ttl,
            Self::Cname(r) => r.ttl,
        }
    }

    /// The alias of this record.
    ///
    /// This is the relative host for `A`, `AAAA` and `CNAME` records, the
    /// name server for `NS` records and the mailbox for `SOA` records.
    /// Records are identified for removal by their kind and alias.
    pub fn alias(&self) -> &str {
        match self {
            Self::Soa(r) => &r.mailbox,
            Self::Ns(r) => &r.nameserver,
            Self::A(r) => &r.alias,
            Self::Aaaa(r) => &r.alias,
            Self::Cname(r) => &r.alias,
        }
    }

    /// The value of a named field, in the naming used by [`Fields`].
    pub fn field(&self, name: &str) -> Option<String> {
        if name == "rr" {
            return Some(self.kind().to_string());
        }
        if name == "ttl" {
            return self.ttl().map(|ttl| ttl.as_secs().to_string());
        }
        if name == "alias" {
            return Some(self.alias().into());
        }

        match (self, name) {
            (Self::A(r), "addr") => Some(r.addr.to_string()),
            (Self::Aaaa(r), "addr") => Some(r.addr.to_string()),
            (Self::Cname(r), "addr") => Some(r.target.to_string()),
            (Self::Ns(r), "owner-name") => Some(r.owner.to_string()),
            (Self::Soa(r), "addr") => Some(r.nameserver.to_string()),
            (Self::Soa(r), "owner") => Some(r.mailbox.to_string()),
            (Self::Soa(r), "serial") => Some(r.serial.to_string()),
            (Self::Soa(r), "refresh") => r.refresh.as_ref().map(Timer::to_string),
            (Self::Soa(r), "update-retry") => r.retry.as_ref().map(Timer::to_string),
            (Self::Soa(r), "expiry") => r.expire.as_ref().map(Timer::to_string),
            (Self::Soa(r), "minimum") => r.minimum.as_ref().map(Timer::to_string),
            _ => None,
        }
    }
}

//--- Construction

impl Record {
    /// Build a record of the given kind from named fields.
    ///
    /// The domain supplies the default owner of `NS` records.  Every name
    /// field must be `@` or a domain name that can be written into a zone
    /// file as is.
    pub fn from_fields(
        kind: RecordKind,
        fields: &Fields,
        domain: &Domain,
    ) -> Result<Self, ValidationError> {
        let ttl = parse_ttl(fields)?;
        let alias = || -> Result<Box<str>, ValidationError> {
            Ok(check_name("alias", fields.get("alias").unwrap_or("@"))?.into())
        };

        match kind {
            RecordKind::A => {
                let addr = fields.require(kind, "addr")?;
                Ok(Self::A(ARecord {
                    alias: alias()?,
                    addr: addr.parse().map_err(|_| invalid_addr(kind, addr))?,
                    ttl,
                }))
            }

            RecordKind::Aaaa => {
                let addr = fields.require(kind, "addr")?;
                Ok(Self::Aaaa(AaaaRecord {
                    alias: alias()?,
                    addr: addr.parse().map_err(|_| invalid_addr(kind, addr))?,
                    ttl,
                }))
            }

            RecordKind::Cname => {
                let target = fields.require(kind, "addr")?;
                if !target.ends_with('.') {
                    return Err(ValidationError::RelativeTarget(target.into()));
                }
                Ok(Self::Cname(CnameRecord {
                    alias: check_name("alias", fields.require(kind, "alias")?)?.into(),
                    target: check_name("addr", target)?.into(),
                    ttl,
                }))
            }

            RecordKind::Ns => {
                // Callers either name the server in 'addr' (and may use
                // 'alias' to designate the owner) or directly in 'alias'.
                let (nameserver, owner_alias) = match fields.get("addr") {
                    Some(addr) => (check_name("addr", addr)?, fields.get("alias")),
                    None => (check_name("alias", fields.require(kind, "alias")?)?, None),
                };
                let owner = match (fields.get("owner-name"), owner_alias) {
                    (Some(owner), _) => check_name("owner-name", owner)?.into(),
                    (None, Some(alias)) => domain.qualify(check_name("alias", alias)?),
                    (None, None) => domain.fqdn(),
                };
                Ok(Self::Ns(NsRecord {
                    owner: owner.into(),
                    nameserver: nameserver.into(),
                    ttl,
                }))
            }

            RecordKind::Soa => {
                let mailbox = match (fields.get("alias"), fields.get("owner")) {
                    (Some(alias), _) => check_name("alias", alias)?,
                    (None, Some(owner)) => check_name("owner", owner)?,
                    (None, None) => {
                        return Err(ValidationError::MissingField { kind, field: "alias" });
                    }
                };
                let serial = fields.require(kind, "serial")?;
                let serial = serial
                    .parse::<u32>()
                    .map_err(|_| ValidationError::InvalidSerial(serial.into()))?;

                Ok(Self::Soa(SoaRecord {
                    nameserver: check_name("addr", fields.require(kind, "addr")?)?.into(),
                    mailbox: mailbox.into(),
                    serial: Serial::from(serial),
                    refresh: parse_timer(fields, "refresh")?,
                    retry: parse_timer(fields, "update-retry")?,
                    expire: parse_timer(fields, "expiry")?,
                    minimum: parse_timer(fields, "minimum")?,
                    ttl,
                }))
            }
        }
    }
}

fn check_name<'a>(field: &'static str, name: &'a str) -> Result<&'a str, ValidationError> {
    if is_zone_name(name) {
        Ok(name)
    } else {
        Err(ValidationError::InvalidName {
            field,
            name: name.into(),
        })
    }
}

fn parse_ttl(fields: &Fields) -> Result<Option<Ttl>, ValidationError> {
    fields
        .get("ttl")
        .map(|ttl| {
            ttl.parse::<u32>()
                .map(Ttl::from_secs)
                .map_err(|_| ValidationError::InvalidTtl(ttl.into()))
        })
        .transpose()
}

fn parse_timer(fields: &Fields, field: &'static str) -> Result<Option<Timer>, ValidationError> {
    fields
        .get(field)
        .map(|timer| {
            timer
                .parse()
                .map_err(|error| ValidationError::InvalidTimer { field, error })
        })
        .transpose()
}

fn invalid_addr(kind: RecordKind, addr: &str) -> ValidationError {
    ValidationError::InvalidAddress {
        kind,
        addr: addr.into(),
    }
}

//----------- UnknownRecordKind ------------------------------------------------

/// A record kind that bindzone does not manage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownRecordKind(pub Box<str>);

impl std::error::Error for UnknownRecordKind {}

impl fmt::Display for UnknownRecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown record kind '{}'", self.0)
    }
}

//----------- FieldsError ------------------------------------------------------

/// The record kind of some [`Fields`] could not be determined.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldsError {
    /// A field naming the record was missing.
    Missing(&'static str),

    /// The named kind is not supported.
    Kind(UnknownRecordKind),
}

impl std::error::Error for FieldsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Missing(_) => None,
            Self::Kind(error) => Some(error),
        }
    }
}

impl fmt::Display for FieldsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(field) => write!(f, "the '{field}' field is required"),
            Self::Kind(error) => error.fmt(f),
        }
    }
}

//----------- ValidationError --------------------------------------------------

/// The fields of a record are missing or invalid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was not given.
    MissingField {
        kind: RecordKind,
        field: &'static str,
    },

    /// The TTL is not a number of seconds.
    InvalidTtl(Box<str>),

    /// The address does not match the record kind.
    InvalidAddress { kind: RecordKind, addr: Box<str> },

    /// A `CNAME` target is not an absolute name.
    RelativeTarget(Box<str>),

    /// A name field does not hold a domain name.
    InvalidName { field: &'static str, name: Box<str> },

    /// The SOA serial is not an unsigned 32-bit number.
    InvalidSerial(Box<str>),

    /// A SOA timer is invalid.
    InvalidTimer {
        field: &'static str,
        error: TimerError,
    },
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidTimer { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { kind, field } => {
                write!(f, "{kind} records require the '{field}' field")
            }
            Self::InvalidTtl(ttl) => write!(f, "'{ttl}' is not a valid TTL"),
            Self::InvalidAddress { kind, addr } => {
                write!(f, "'{addr}' is not a valid address for a {kind} record")
            }
            Self::RelativeTarget(target) => {
                write!(f, "the CNAME target '{target}' must end with a '.'")
            }
            Self::InvalidName { field, name } => {
                write!(f, "the '{field}' field {name:?} is not a valid domain name")
            }
            Self::InvalidSerial(serial) => write!(f, "'{serial}' is not a valid SOA serial"),
            Self::InvalidTimer { field, error } => write!(f, "invalid SOA {field}: {error}"),
        }
    }
}

//============ Tests ===========================================================

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use domain::base::{Serial, Ttl};

    use super::*;

    fn domain() -> Domain {
        Domain::new("example.com").unwrap()
    }

    #[test]
    fn kind_from_str() {
        assert_eq!("AAAA".parse(), Ok(RecordKind::Aaaa));
        assert_eq!("cname".parse(), Ok(RecordKind::Cname));
        assert_eq!(
            "MX".parse::<RecordKind>(),
            Err(UnknownRecordKind("MX".into()))
        );
    }

    #[test]
    fn a_from_fields() {
        let fields = Fields::new()
            .with("alias", "www")
            .with("addr", "10.0.0.5")
            .with("ttl", 300);
        let record = Record::from_fields(RecordKind::A, &fields, &domain()).unwrap();
        assert_eq!(
            record,
            Record::A(ARecord {
                alias: "www".into(),
                addr: Ipv4Addr::new(10, 0, 0, 5),
                ttl: Some(Ttl::from_secs(300)),
            })
        );
        assert_eq!(record.field("addr").as_deref(), Some("10.0.0.5"));
        assert_eq!(record.field("ttl").as_deref(), Some("300"));
    }

    #[test]
    fn a_defaults_to_apex() {
        let fields = Fields::new().with("addr", "192.0.2.1");
        let record = Record::from_fields(RecordKind::A, &fields, &domain()).unwrap();
        assert_eq!(record.alias(), "@");
        assert_eq!(record.ttl(), None);
    }

    #[test]
    fn invalid_fields() {
        let domain = domain();

        let fields = Fields::new().with("alias", "www");
        assert_eq!(
            Record::from_fields(RecordKind::A, &fields, &domain),
            Err(ValidationError::MissingField {
                kind: RecordKind::A,
                field: "addr"
            })
        );

        let fields = Fields::new().with("addr", "2001:db8::1");
        assert!(matches!(
            Record::from_fields(RecordKind::A, &fields, &domain),
            Err(ValidationError::InvalidAddress { .. })
        ));

        let fields = Fields::new().with("addr", "10.0.0.1").with("ttl", "5m");
        assert_eq!(
            Record::from_fields(RecordKind::A, &fields, &domain),
            Err(ValidationError::InvalidTtl("5m".into()))
        );

        let fields = Fields::new().with("alias", "ns").with("addr", "ns1");
        assert_eq!(
            Record::from_fields(RecordKind::Cname, &fields, &domain),
            Err(ValidationError::RelativeTarget("ns1".into()))
        );
    }

    #[test]
    fn names_cannot_split_lines() {
        let domain = domain();

        let fields = Fields::new()
            .with("alias", "www\t\tIN\tNS\tevil.example.net.\nmail")
            .with("addr", "10.0.0.5");
        assert!(matches!(
            Record::from_fields(RecordKind::A, &fields, &domain),
            Err(ValidationError::InvalidName { field: "alias", .. })
        ));

        let fields = Fields::new()
            .with("alias", "ns")
            .with("addr", "x.\n@\t\tIN\tA\t6.6.6.6\nz.");
        assert!(matches!(
            Record::from_fields(RecordKind::Cname, &fields, &domain),
            Err(ValidationError::InvalidName { field: "addr", .. })
        ));

        let fields = Fields::new().with("alias", "mail server").with("addr", "2001:db8::1");
        assert!(matches!(
            Record::from_fields(RecordKind::Aaaa, &fields, &domain),
            Err(ValidationError::InvalidName { field: "alias", .. })
        ));

        let fields = Fields::new()
            .with("addr", "ns1.example.com.")
            .with("owner-name", "example.com.\u{0}");
        assert!(matches!(
            Record::from_fields(RecordKind::Ns, &fields, &domain),
            Err(ValidationError::InvalidName { field: "owner-name", .. })
        ));

        let fields = Fields::new()
            .with("addr", "ns1.example.com. ; x")
            .with("owner", "root.example.com.")
            .with("serial", 1);
        assert!(matches!(
            Record::from_fields(RecordKind::Soa, &fields, &domain),
            Err(ValidationError::InvalidName { field: "addr", .. })
        ));

        let fields = Fields::new()
            .with("addr", "ns1.example.com.")
            .with("owner", "root@example.com.")
            .with("serial", 1);
        assert!(matches!(
            Record::from_fields(RecordKind::Soa, &fields, &domain),
            Err(ValidationError::InvalidName { field: "owner", .. })
        ));
    }

    #[test]
    fn ns_from_fields() {
        let domain = domain();

        // As produced by first-time setup.
        let fields = Fields::new()
            .with("alias", "@")
            .with("addr", "ns1.example.com.");
        let Record::Ns(ns) = Record::from_fields(RecordKind::Ns, &fields, &domain).unwrap() else {
            panic!("expected an NS record");
        };
        assert_eq!(&*ns.owner, "example.com.");
        assert_eq!(&*ns.nameserver, "ns1.example.com.");

        // As decoded from a zone file.
        let fields = Fields::new()
            .with("alias", "ns2.example.net.")
            .with("owner-name", "example.com.");
        let record = Record::from_fields(RecordKind::Ns, &fields, &domain).unwrap();
        assert_eq!(record.alias(), "ns2.example.net.");
        assert_eq!(record.field("owner-name").as_deref(), Some("example.com."));
    }

    #[test]
    fn soa_from_fields() {
        let fields = Fields::new()
            .with("addr", "ns1.example.com.")
            .with("owner", "root.example.com.")
            .with("serial", 12345678)
            .with("refresh", "12h")
            .with("update-retry", "15m");
        let Record::Soa(soa) = Record::from_fields(RecordKind::Soa, &fields, &domain()).unwrap()
        else {
            panic!("expected a SOA record");
        };
        assert_eq!(&*soa.mailbox, "root.example.com.");
        assert_eq!(soa.serial, Serial::from(12345678));
        assert_eq!(soa.refresh.as_ref().map(Timer::as_secs), Some(12 * 3600));
        assert_eq!(soa.expire, None);
        assert_eq!(soa.timers().count(), 2);

        let fields = fields.with("serial", "4294967296");
        assert_eq!(
            Record::from_fields(RecordKind::Soa, &fields, &domain()),
            Err(ValidationError::InvalidSerial("4294967296".into()))
        );
    }

    #[test]
    fn fields_deserialize() {
        let fields: Fields = toml::from_str(
            r#"
            rr = "A"
            alias = "www"
            addr = "10.0.0.5"
            "#,
        )
        .unwrap();
        assert_eq!(fields.kind(), Ok(RecordKind::A));
        assert_eq!(fields.get("alias"), Some("www"));
        assert_eq!(Fields::new().kind(), Err(FieldsError::Missing("rr")));
    }
}
