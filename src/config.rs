// Viewer configuration loaded with the 'config' crate and optional .env

use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_address: String,
    // Backend serving the advert collection
    pub backend_url: String,
    pub records_path: String,
    // Upper bound on one backend request, so a hung backend cannot pin a load
    pub request_timeout_secs: u64,
    // Durable credential slot
    pub credential_path: String,
    pub display_timezone: String,
}

impl Settings {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let builder = Config::builder()
            .set_default("server_address", "127.0.0.1:3000")?
            .set_default("backend_url", "http://localhost:8080")?
            .set_default("records_path", "/api/sent-adverts")?
            .set_default("request_timeout_secs", 30)?
            .set_default("credential_path", ".advisor_credential")?
            .set_default("display_timezone", "Europe/Lisbon")?
            // Optional config.toml next to the binary's working directory
            .add_source(File::with_name("config").required(false))
            // ADVISOR_BACKEND_URL, ADVISOR_SERVER_ADDRESS, ...
            .add_source(Environment::with_prefix("ADVISOR").prefix_separator("_").separator("__"));

        let settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.display_timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Invalid display_timezone '{}'", self.display_timezone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(tz: &str) -> Settings {
        Settings {
            server_address: "127.0.0.1:3000".into(),
            backend_url: "http://localhost:8080".into(),
            records_path: "/api/sent-adverts".into(),
            request_timeout_secs: 30,
            credential_path: ".advisor_credential".into(),
            display_timezone: tz.into(),
        }
    }

    #[test]
    fn timezone_parses_iana_names() {
        assert_eq!(settings("Europe/Lisbon").timezone().unwrap(), chrono_tz::Europe::Lisbon);
        assert!(settings("Mars/Olympus").timezone().is_err());
    }
}
