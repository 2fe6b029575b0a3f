use bindzone_zonedata::Domain;

use super::provide;
use crate::config::Config;
use crate::provider;

#[derive(Clone, Debug, clap::Args)]
pub struct Show {
    /// The domain whose zone to print
    domain: Domain,
}

impl Show {
    pub fn execute(self, config: &Config) -> Result<(), String> {
        let editor = provide(config, |provider| provider.load(&self.domain))
            .map_err(|err: provider::Error| err.to_string())?;

        if editor.needs_setup() {
            return Err(format!(
                "there is no zone file for {} at '{}'",
                self.domain,
                editor.path()
            ));
        }

        print!("{}", editor.render());
        Ok(())
    }
}
