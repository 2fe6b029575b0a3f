//! The in-memory zone.
//!
//! A [`Zone`] collects the records of one domain, grouped by kind.  It lives
//! for a single load, mutate and save cycle; the zone file on disk is the
//! durable state.

use std::{collections::BTreeMap, fmt};

use domain::base::{Serial, Ttl};
use tracing::debug;

use crate::{
    Domain, Fields, Record, RecordKind, SoaRecord, UnknownRecordKind, ValidationError, writer,
};

//----------- Zone -------------------------------------------------------------

/// The records of a zone.
///
/// Records are grouped by kind; within a kind they keep the order in which
/// they were added.  There is at most one SOA record: adding another one
/// replaces it.
#[derive(Clone, Debug)]
pub struct Zone {
    /// The apex of the zone.
    domain: Domain,

    /// The records, by kind.
    records: BTreeMap<RecordKind, Vec<Record>>,

    /// Whether the records changed since the zone was loaded.
    changed: bool,
}

impl Zone {
    /// Construct a new, empty [`Zone`].
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            records: BTreeMap::new(),
            changed: false,
        }
    }

    /// The apex of the zone.
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// The SOA record, if any.
    pub fn soa(&self) -> Option<&SoaRecord> {
        match self.records(RecordKind::Soa).first() {
            Some(Record::Soa(soa)) => Some(soa),
            _ => None,
        }
    }

    /// The records of one kind.
    pub fn records(&self, kind: RecordKind) -> &[Record] {
        self.records.get(&kind).map_or(&[][..], Vec::as_slice)
    }

    /// All records, in zone file order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values().flatten()
    }

    /// The number of records.
    pub fn len(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    /// Whether the zone has no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether records were added or removed since the zone was loaded.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Forget about earlier changes, e.g. once the zone has been saved.
    pub fn mark_unchanged(&mut self) {
        self.changed = false;
    }
}

//--- Mutation

impl Zone {
    /// Validate and add a record.
    ///
    /// `kind` is the record kind as named by a caller, e.g. `"A"`.
    pub fn add(&mut self, kind: &str, fields: &Fields) -> Result<&Record, AddError> {
        let kind: RecordKind = kind.parse().map_err(AddError::UnknownKind)?;
        let record = Record::from_fields(kind, fields, &self.domain).map_err(AddError::Invalid)?;
        Ok(self.insert(record))
    }

    /// Add a record.
    ///
    /// A SOA record replaces any existing one.
    pub fn insert(&mut self, record: Record) -> &Record {
        let kind = record.kind();
        let records = self.records.entry(kind).or_default();
        if kind == RecordKind::Soa && !records.is_empty() {
            debug!("Replacing the SOA record of '{}'", self.domain);
            records.clear();
        }
        records.push(record);
        self.changed = true;

        records.last().expect("a record was just pushed")
    }

    /// Remove the first record of a kind whose field has the given value.
    ///
    /// Returns whether a record was removed.
    pub fn remove(&mut self, kind: RecordKind, field: &str, value: &str) -> bool {
        let Some(records) = self.records.get_mut(&kind) else {
            return false;
        };

        let Some(index) = records
            .iter()
            .position(|record| record.field(field).as_deref() == Some(value))
        else {
            return false;
        };

        records.remove(index);
        if records.is_empty() {
            self.records.remove(&kind);
        }
        self.changed = true;
        true
    }

    /// Change the serial of the SOA record.
    ///
    /// Returns whether the zone has a SOA record.
    pub fn set_serial(&mut self, serial: Serial) -> bool {
        let Some(soa) = self.soa() else {
            return false;
        };

        let soa = soa.with_serial(serial);
        self.records.insert(RecordKind::Soa, vec![Record::Soa(soa)]);
        true
    }

    /// Render the zone file text.
    ///
    /// Records without a TTL of their own use `default_ttl`.
    pub fn render(&self, default_ttl: Ttl) -> String {
        writer::render(self, default_ttl)
    }
}

//----------- AddError ---------------------------------------------------------

/// A record could not be added to a [`Zone`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddError {
    /// The record kind is not supported.
    UnknownKind(UnknownRecordKind),

    /// The record fields are invalid.
    Invalid(ValidationError),
}

impl std::error::Error for AddError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnknownKind(error) => Some(error),
            Self::Invalid(error) => Some(error),
        }
    }
}

impl fmt::Display for AddError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKind(error) => error.fmt(f),
            Self::Invalid(error) => error.fmt(f),
        }
    }
}

//============ Tests ===========================================================

#[cfg(test)]
mod tests {
    use domain::base::{Serial, Ttl};

    use super::{AddError, Zone};
    use crate::{Domain, Fields, RecordKind, UnknownRecordKind, ValidationError};

    fn zone() -> Zone {
        Zone::new(Domain::new("example.com").unwrap())
    }

    fn soa(serial: u32) -> Fields {
        Fields::new()
            .with("addr", "ns1.example.com.")
            .with("alias", "root.example.com.")
            .with("serial", serial)
    }

    #[test]
    fn add_groups_by_kind() {
        let mut zone = zone();
        zone.add("CNAME", &Fields::new().with("alias", "ns").with("addr", "ns1.example.com."))
            .unwrap();
        zone.add("A", &Fields::new().with("alias", "www").with("addr", "10.0.0.5"))
            .unwrap();
        zone.add("A", &Fields::new().with("alias", "@").with("addr", "10.0.0.1"))
            .unwrap();
        zone.add("SOA", &soa(1)).unwrap();

        let kinds: Vec<_> = zone.iter().map(|r| r.kind()).collect();
        assert_eq!(
            kinds,
            [RecordKind::Soa, RecordKind::A, RecordKind::A, RecordKind::Cname]
        );
        let aliases: Vec<_> = zone.records(RecordKind::A).iter().map(|r| r.alias()).collect();
        assert_eq!(aliases, ["www", "@"]);
        assert!(zone.is_changed());
    }

    #[test]
    fn second_soa_replaces_first() {
        let mut zone = zone();
        zone.add("SOA", &soa(1)).unwrap();
        zone.add("SOA", &soa(2)).unwrap();

        assert_eq!(zone.records(RecordKind::Soa).len(), 1);
        assert_eq!(zone.soa().unwrap().serial, Serial::from(2));
    }

    #[test]
    fn unknown_kind() {
        let mut zone = zone();
        let fields = Fields::new().with("alias", "@").with("addr", "mail.example.com.");
        assert_eq!(
            zone.add("MX", &fields).unwrap_err(),
            AddError::UnknownKind(UnknownRecordKind("MX".into()))
        );
        assert!(zone.is_empty());
        assert!(!zone.is_changed());
    }

    #[test]
    fn invalid_names_leave_zone_alone() {
        let mut zone = zone();
        zone.add("SOA", &soa(1)).unwrap();
        let before = zone.render(Ttl::from_secs(300));

        let fields = Fields::new()
            .with("alias", "www\t\tIN\tNS\tevil.example.net.\nmail")
            .with("addr", "10.0.0.5");
        assert!(matches!(
            zone.add("A", &fields),
            Err(AddError::Invalid(ValidationError::InvalidName { .. }))
        ));

        let fields = Fields::new()
            .with("alias", "ns")
            .with("addr", "x.\n@\t\tIN\tA\t6.6.6.6\nz.");
        assert!(zone.add("CNAME", &fields).is_err());

        assert_eq!(zone.len(), 1);
        assert_eq!(zone.render(Ttl::from_secs(300)), before);
    }

    #[test]
    fn remove() {
        let mut zone = zone();
        zone.add("A", &Fields::new().with("alias", "www").with("addr", "10.0.0.5"))
            .unwrap();
        zone.add("A", &Fields::new().with("alias", "www").with("addr", "10.0.0.6"))
            .unwrap();
        zone.add("AAAA", &Fields::new().with("alias", "www").with("addr", "2001:db8::5"))
            .unwrap();

        assert!(zone.remove(RecordKind::A, "alias", "www"));
        assert_eq!(zone.records(RecordKind::A).len(), 1);
        assert_eq!(
            zone.records(RecordKind::A)[0].field("addr").as_deref(),
            Some("10.0.0.6")
        );
        assert_eq!(zone.records(RecordKind::Aaaa).len(), 1);

        assert!(!zone.remove(RecordKind::Cname, "alias", "www"));
        assert!(!zone.remove(RecordKind::A, "alias", "mail"));
    }

    #[test]
    fn set_serial() {
        let mut zone = zone();
        assert!(!zone.set_serial(Serial::from(5)));

        zone.add("SOA", &soa(1)).unwrap();
        assert!(zone.set_serial(Serial::from(5)));
        assert_eq!(zone.soa().unwrap().serial, Serial::from(5));
        assert_eq!(zone.soa().unwrap().nameserver.as_ref(), "ns1.example.com.");
    }
}
