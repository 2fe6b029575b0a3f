//! Zone data for bindzone.
//!
//! This crate holds the records of a single zone and converts them to and
//! from zone file text.  It performs no I/O; loading and saving zone files is
//! left to the `bindzone` crate.
//!
//! # Design
//!
//! A zone managed by bindzone contains records of five kinds: one `SOA`
//! record, `NS` records, and `A`, `AAAA` and `CNAME` records for hosts in the
//! zone.  [`RecordKind`] enumerates them and [`Record`] holds one record of
//! any kind.  Callers describe records through [`Fields`], a mapping from
//! field names to textual values; [`Record::from_fields()`] validates them.
//!
//! A [`Zone`] groups records by kind.  Its text form is produced by
//! [`writer::render()`] and always lists the `SOA` record first, followed by
//! `NS`, `A`, `AAAA` and `CNAME` records.
//!
//! Zone files on disk may be written by hand and use any of the spellings
//! the zone file format allows.  They are not read directly: they are first
//! normalized by BIND's own tooling, and [`reader::parse()`] only reads that
//! normalized form.  Rendering a zone and then normalizing and parsing the
//! result reproduces the same records.

mod apex;
pub use apex::{Domain, DomainError};

mod record;
pub use record::{
    AaaaRecord, ARecord, CnameRecord, Fields, FieldsError, NsRecord, Record, RecordKind,
    SoaRecord, UnknownRecordKind, ValidationError,
};

mod timer;
pub use timer::{Timer, TimerError};

mod zone;
pub use zone::{AddError, Zone};

pub mod reader;
pub use reader::ParseError;

pub mod writer;
