//! Writing zone files.
//!
//! Every record is written as one line of tab-separated columns:
//!
//! ```text
//! <alias-or-owner>  <ttl>  IN  <KIND>  <value...>
//! ```
//!
//! The TTL column is empty for records without a TTL of their own; they fall
//! back to the `$TTL` directive at the top of the file.

use std::fmt::{self, Write};

use domain::base::Ttl;

use crate::{
    ARecord, AaaaRecord, CnameRecord, NsRecord, Record, SoaRecord, Zone,
};

//----------- render() ---------------------------------------------------------

/// Render a zone as zone file text.
pub fn render(zone: &Zone, default_ttl: Ttl) -> String {
    let mut text = String::new();

    // Writing to a 'String' cannot fail.
    let _ = writeln!(text, "$ORIGIN {}", zone.domain().fqdn());
    let _ = writeln!(text, "$TTL {}", default_ttl.as_secs());
    for record in zone.iter() {
        let _ = writeln!(text, "{record}");
    }

    text
}

//----------- Display ----------------------------------------------------------

/// The TTL column of a record.
struct TtlColumn(Option<Ttl>);

impl fmt::Display for TtlColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ttl) => write!(f, "{}", ttl.as_secs()),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Soa(r) => r.fmt(f),
            Self::Ns(r) => r.fmt(f),
            Self::A(r) => r.fmt(f),
            Self::Aaaa(r) => r.fmt(f),
            Self::Cname(r) => r.fmt(f),
        }
    }
}

impl fmt::Display for SoaRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            nameserver,
            mailbox,
            serial,
            ttl,
            ..
        } = self;

        write!(
            f,
            "@\t{}\tIN\tSOA\t{nameserver} {mailbox} {serial}",
            TtlColumn(*ttl)
        )?;
        for timer in self.timers() {
            write!(f, " {timer}")?;
        }
        Ok(())
    }
}

impl fmt::Display for NsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            owner,
            nameserver,
            ttl,
        } = self;

        write!(f, "{owner}\t{}\tIN\tNS\t{nameserver}", TtlColumn(*ttl))
    }
}

impl fmt::Display for ARecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { alias, addr, ttl } = self;

        write!(f, "{alias}\t{}\tIN\tA\t{addr}", TtlColumn(*ttl))
    }
}

impl fmt::Display for AaaaRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { alias, addr, ttl } = self;

        write!(f, "{alias}\t{}\tIN\tAAAA\t{addr}", TtlColumn(*ttl))
    }
}

impl fmt::Display for CnameRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { alias, target, ttl } = self;

        write!(f, "{alias}\t{}\tIN\tCNAME\t{target}", TtlColumn(*ttl))
    }
}

//============ Tests ===========================================================
