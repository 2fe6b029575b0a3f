//! Manage the zone file of a domain served by BIND 9.
//!
//! A zone file is loaded by normalizing it with `named-checkzone`
//! ([`normalize`]) and parsing the result into a
//! [`Zone`](bindzone_zonedata::Zone).  The [`editor`] adds and removes
//! records and writes the zone file back, and the [`provider`] reloads the
//! DNS daemon afterwards.

pub use bindzone_zonedata as zonedata;

pub mod cli;
pub mod config;
pub mod editor;
pub mod log;
pub mod normalize;
pub mod provider;
pub mod util;
