use std::net::Ipv4Addr;

use bindzone_zonedata::Domain;

use super::provide;
use crate::config::Config;
use crate::provider;

#[derive(Clone, Debug, clap::Args)]
pub struct Setup {
    /// The domain to set up
    domain: Domain,

    /// The address the apex and 'ns1' records point at
    ///
    /// Defaults to the 'public-address' setting.
    #[arg(long = "public-address", value_name = "IPV4")]
    public_address: Option<Ipv4Addr>,
}

impl Setup {
    pub fn execute(self, config: &Config) -> Result<(), provider::Error> {
        let created = provide(config, |provider| {
            provider.config_changed(&self.domain, self.public_address, &mut rand::thread_rng())
        })?;

        if created {
            println!("Set up zone {}", self.domain);
        } else {
            println!("Zone {} exists already", self.domain);
        }
        Ok(())
    }
}
