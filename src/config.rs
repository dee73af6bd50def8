use crate::error::Error;
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub type Shared = Arc<Config>;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_PATH_ENV: &str = "CERTCRAB_CONFIG";

/// Environment variable supplying the default target region.
pub const DEFAULT_REGION_ENV: &str = "AWS_DEFAULT_REGION";

#[serde_as]
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub max_attempts: u32,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub poll_interval: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub safety_margin: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub challenge_poll_interval: Duration,
    pub challenge_poll_attempts: u32,
    pub record_ttl: i64,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub callback_timeout: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub report_reserve: Duration,
    pub default_region: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_attempts: 10,
            poll_interval: Duration::from_secs(10),
            safety_margin: Duration::from_secs(10),
            challenge_poll_interval: Duration::from_secs(10),
            challenge_poll_attempts: 6,
            record_ttl: 300,
            callback_timeout: Duration::from_secs(10),
            report_reserve: Duration::from_secs(2),
            default_region: None,
        }
    }
}

impl Config {
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        let reader = BufReader::new(f);
        let conf: Config = serde_json::from_reader(reader)?;
        conf.validate()?;
        Ok(conf)
    }

    /// Load the config from the file named by [`CONFIG_PATH_ENV`] (or defaults when unset),
    /// then fill in [`Config::default_region`] from [`DEFAULT_REGION_ENV`] if the file didn't.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IO`] or [`Error::InvalidJSON`] if the config file can't be read, and
    /// [`Error::InvalidConfig`] if the loaded settings are inconsistent.
    pub fn from_env() -> Result<Self, Error> {
        let mut conf = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => {
                tracing::debug!("loading config from {path}");
                Self::try_from_file(path)?
            }
            Err(_) => Self::default(),
        };
        if conf.default_region.is_none() {
            conf.default_region = std::env::var(DEFAULT_REGION_ENV)
                .ok()
                .filter(|r| !r.trim().is_empty());
        }
        conf.validate()?;
        Ok(conf)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.poll_interval.is_zero() {
            return Err(Error::InvalidConfig("poll_interval must be non-zero".into()));
        }
        // The tail of the invocation must leave room for a last status check and the
        // re-invocation dispatch after the final sleep.
        if self.safety_margin < self.poll_interval {
            return Err(Error::InvalidConfig(format!(
                "safety_margin ({}s) must not be shorter than poll_interval ({}s)",
                self.safety_margin.as_secs(),
                self.poll_interval.as_secs()
            )));
        }
        if self.challenge_poll_attempts == 0 {
            return Err(Error::InvalidConfig(
                "challenge_poll_attempts must be at least 1".into(),
            ));
        }
        if self.record_ttl <= 0 {
            return Err(Error::InvalidConfig("record_ttl must be positive".into()));
        }
        Ok(())
    }
}
