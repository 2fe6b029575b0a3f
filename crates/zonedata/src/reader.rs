//! Reading normalized zone files.
//!
//! Zone files allow many equivalent spellings of the same records (comments,
//! parentheses, relative names, `$ORIGIN` and `$TTL` directives).  Rather
//! than understanding all of them, bindzone has `named-checkzone` rewrite a
//! zone file into a normalized form first, and only reads that form.
//!
//! Normalized record lines consist of tab-separated columns.  The columns
//! that matter are:
//!
//! | Column | Content                            |
//! |--------|------------------------------------|
//! | 0      | the absolute owner name            |
//! | 4      | the TTL, followed by the class     |
//! | 5      | the record type                    |
//! | 6      | the record data                    |

use std::fmt;

use tracing::{trace, warn};

use crate::{Domain, Fields, Record, RecordKind, ValidationError, Zone};

/// The minimum number of columns in a record line.
const MIN_COLUMNS: usize = 6;

//----------- parse() ----------------------------------------------------------

/// Parse a normalized zone file.
///
/// Record types bindzone does not manage are skipped with a warning; they
/// will be missing when the zone is saved again.  A text without any
/// supported records is [`ParseError::Empty`].
pub fn parse(domain: Domain, text: &str) -> Result<Zone, ParseError> {
    let mut zone = Zone::new(domain);

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let line_no = index + 1;
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < MIN_COLUMNS {
            return Err(ParseError::MalformedLine {
                line: line_no,
                columns: columns.len(),
            });
        }

        let rtype = columns[5].trim();
        let Ok(kind) = rtype.parse::<RecordKind>() else {
            warn!("Skipping unsupported {rtype} record on line {line_no} of '{}'", zone.domain());
            continue;
        };

        let fields = decode(kind, &columns, zone.domain()).ok_or(ParseError::MalformedLine {
            line: line_no,
            columns: columns.len(),
        })?;
        trace!("Decoded {kind} record on line {line_no}: {fields:?}");

        let record = Record::from_fields(kind, &fields, zone.domain())
            .map_err(|error| ParseError::InvalidRecord {
                line: line_no,
                error,
            })?;
        zone.insert(record);
    }

    if zone.is_empty() {
        return Err(ParseError::Empty);
    }

    zone.mark_unchanged();
    Ok(zone)
}

//----------- Decoders ---------------------------------------------------------

/// Decode the columns of a record line into record fields.
///
/// Returns [`None`] if the line lacks the record data.
fn decode(kind: RecordKind, columns: &[&str], domain: &Domain) -> Option<Fields> {
    let ttl = ttl_column(columns[4]);
    let value = columns
        .get(6)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())?;

    let mut fields = Fields::new();
    fields.insert("rr", kind.as_str());
    fields.insert("ttl", ttl);

    match kind {
        RecordKind::A | RecordKind::Aaaa | RecordKind::Cname => {
            fields
                .insert("alias", domain.alias_of(columns[0]))
                .insert("addr", value);
        }

        RecordKind::Ns => {
            fields
                .insert("alias", value)
                .insert("owner-name", domain.fqdn());
        }

        RecordKind::Soa => {
            let mut parts = value.split_whitespace();
            let (Some(addr), Some(alias), Some(serial)) = (parts.next(), parts.next(), parts.next())
            else {
                return None;
            };
            fields
                .insert("addr", addr)
                .insert("alias", alias)
                .insert("serial", serial);

            // Missing trailing timers stay empty.
            for name in ["refresh", "update-retry", "expiry", "minimum"] {
                fields.insert(name, parts.next().unwrap_or_default());
            }
        }
    }

    Some(fields)
}

/// Strip the class from a TTL column like `300 IN`.
fn ttl_column(column: &str) -> &str {
    let column = column.trim();
    match column.split_once(' ') {
        Some((ttl, _class)) => ttl.trim(),
        None => column,
    }
}

//----------- ParseError -------------------------------------------------------

/// A normalized zone file could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// The text did not contain any supported records.
    Empty,

    /// A record line does not have the expected columns.
    MalformedLine { line: usize, columns: usize },

    /// A record line holds invalid values.
    InvalidRecord {
        line: usize,
        error: ValidationError,
    },
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRecord { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("the zone has no SOA, NS, A, AAAA or CNAME records"),
            Self::MalformedLine { line, columns } => write!(
                f,
                "line {line} has {columns} columns and does not look like normalized zone data"
            ),
            Self::InvalidRecord { line, error } => write!(f, "line {line}: {error}"),
        }
    }
}

//============ Tests ===========================================================

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use domain::base::{Serial, Ttl};

    use super::{ParseError, parse};
    use crate::{Domain, Record, RecordKind};

    const NORMALIZED: &str = "\
example.com.\t\t\t\t86400 IN\tSOA\tns1.example.com. root.example.com. 12345679 43200 900 1814400 10800
example.com.\t\t\t\t86400 IN\tNS\tns1.example.com.
example.com.\t\t\t\t300 IN\tA\t192.0.2.1
example.com.\t\t\t\t300 IN\tMX\t10 mail.example.com.
ns.example.com.\t\t\t\t300 IN\tCNAME\tns1.example.com.
ns1.example.com.\t\t\t\t300 IN\tA\t192.0.2.1
www.example.com.\t\t\t\t3600 IN\tAAAA\t2001:db8::5
";

    fn domain() -> Domain {
        Domain::new("example.com").unwrap()
    }

    #[test]
    fn parse_normalized() {
        let zone = parse(domain(), NORMALIZED).unwrap();

        // The MX record is skipped.
        assert_eq!(zone.len(), 6);
        assert!(!zone.is_changed());

        let soa = zone.soa().unwrap();
        assert_eq!(soa.serial, Serial::from(12345679));
        assert_eq!(&*soa.mailbox, "root.example.com.");
        assert_eq!(soa.minimum.as_ref().unwrap().as_secs(), 10800);
        assert_eq!(soa.ttl, Some(Ttl::from_secs(86400)));

        let a: Vec<_> = zone.records(RecordKind::A).iter().collect();
        assert_eq!(a[0].alias(), "@");
        assert_eq!(a[1].alias(), "ns1");
        let Record::A(ns1) = a[1] else {
            panic!("expected an A record");
        };
        assert_eq!(ns1.addr, Ipv4Addr::new(192, 0, 2, 1));
        assert_eq!(ns1.ttl, Some(Ttl::from_secs(300)));

        let ns = &zone.records(RecordKind::Ns)[0];
        assert_eq!(ns.alias(), "ns1.example.com.");
        assert_eq!(ns.field("owner-name").as_deref(), Some("example.com."));

        assert_eq!(zone.records(RecordKind::Cname)[0].alias(), "ns");
        assert_eq!(zone.records(RecordKind::Aaaa)[0].alias(), "www");
    }

    #[test]
    fn short_soa_tail() {
        let text = "example.com.\t\t\t\t3600 IN\tSOA\tns1.example.com. root.example.com. 7 3600\n";
        let zone = parse(domain(), text).unwrap();
        let soa = zone.soa().unwrap();
        assert_eq!(soa.refresh.as_ref().unwrap().as_secs(), 3600);
        assert_eq!(soa.retry, None);
        assert_eq!(soa.expire, None);
        assert_eq!(soa.minimum, None);
    }

    #[test]
    fn malformed_line() {
        let text = "example.com.\t\t\t\t86400 IN\tNS\tns1.example.com.\nwww.example.com.\t300 IN\tA\t10.0.0.5\n";
        assert_eq!(
            parse(domain(), text).unwrap_err(),
            ParseError::MalformedLine {
                line: 2,
                columns: 4
            }
        );

        // Six columns, but no record data.
        let text = "www.example.com.\t\t\t\t300 IN\tA\n";
        assert!(matches!(
            parse(domain(), text),
            Err(ParseError::MalformedLine { line: 1, .. })
        ));

        let text = "example.com.\t\t\t\t86400 IN\tSOA\tns1.example.com. root.example.com.\n";
        assert!(matches!(
            parse(domain(), text),
            Err(ParseError::MalformedLine { line: 1, .. })
        ));
    }

    #[test]
    fn invalid_record() {
        let text = "www.example.com.\t\t\t\t300 IN\tA\t10.0.0.256\n";
        assert!(matches!(
            parse(domain(), text),
            Err(ParseError::InvalidRecord { line: 1, .. })
        ));
    }

    #[test]
    fn empty() {
        assert_eq!(parse(domain(), "").unwrap_err(), ParseError::Empty);
        assert_eq!(parse(domain(), "\n\n").unwrap_err(), ParseError::Empty);

        let text = "example.com.\t\t\t\t300 IN\tMX\t10 mail.example.com.\n\
                    example.com.\t\t\t\t300 IN\tTXT\t\"v=spf1 -all\"\n";
        assert_eq!(parse(domain(), text).unwrap_err(), ParseError::Empty);
    }
}
