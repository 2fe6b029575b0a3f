use bindzone_zonedata::{Domain, Fields};

use super::provide;
use crate::config::Config;
use crate::provider;

#[derive(Clone, Debug, clap::Args)]
pub struct Record {
    /// The domain whose zone to change
    domain: Domain,

    /// The record, e.g. 'rr=A alias=www addr=192.0.2.5'
    ///
    /// Known keys are 'rr', 'ttl', 'alias', 'addr', 'owner', 'owner-name',
    /// 'serial', 'refresh', 'update-retry', 'expiry' and 'minimum'.  Records
    /// are removed by their 'rr' and 'alias'.
    #[arg(value_name = "KEY=VALUE", value_parser = parse_field, required = true)]
    fields: Vec<(String, String)>,
}

impl Record {
    /// The record fields.
    pub fn fields(&self) -> Fields {
        self.fields.iter().cloned().collect()
    }

    pub fn add(self, config: &Config) -> Result<(), provider::Error> {
        let fields = self.fields();
        provide(config, |provider| provider.add_record(&self.domain, &fields))?;
        println!("Added the record to zone {}", self.domain);
        Ok(())
    }

    pub fn remove(self, config: &Config) -> Result<(), provider::Error> {
        let fields = self.fields();
        if provide(config, |provider| provider.remove_record(&self.domain, &fields))? {
            println!("Removed the record from zone {}", self.domain);
        } else {
            println!("No matching record in zone {}", self.domain);
        }
        Ok(())
    }
}

fn parse_field(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().into(), value.trim().into()))
        }
        _ => Err(format!("expected 'KEY=VALUE', found '{arg}'")),
    }
}
