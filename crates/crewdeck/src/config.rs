use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Message sent to a model endpoint when validating it.
pub const DEFAULT_PROBE_MESSAGE: &str = "Hello! This is a connectivity test. Reply with OK.";

/// Prefix the backend puts on `test_model` responses that failed.
pub const MODEL_TEST_FAILED_PREFIX: &str = "Model Test Failed";

/// Intervals, budgets and retry limits of the coordinator loops.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorConfig {
  pub discovery_interval: Duration,
  pub discovery_budget: Duration,
  pub monitor_interval: Duration,
  pub artifact_refresh_interval: Duration,
  pub validation_attempts: usize,
  pub validation_delay: Duration,
  pub validation_call_timeout: Duration,
  pub probe_message: String,
}

impl Default for CoordinatorConfig {
  fn default() -> Self {
    CoordinatorConfig {
      discovery_interval: Duration::from_secs(1),
      discovery_budget: Duration::from_secs(60),
      monitor_interval: Duration::from_secs(1),
      artifact_refresh_interval: Duration::from_secs(5),
      validation_attempts: 5,
      validation_delay: Duration::from_secs(3),
      validation_call_timeout: Duration::from_secs(1),
      probe_message: DEFAULT_PROBE_MESSAGE.to_string(),
    }
  }
}

/// Human-written form of [`CoordinatorConfig`]; durations use humantime
/// syntax such as `500ms`, `1s` or `1m`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserCoordinatorConfig {
  pub discovery_interval: Option<String>,
  pub discovery_budget: Option<String>,
  pub monitor_interval: Option<String>,
  pub artifact_refresh_interval: Option<String>,
  pub validation_attempts: Option<usize>,
  pub validation_delay: Option<String>,
  pub validation_call_timeout: Option<String>,
  pub probe_message: Option<String>,
}

impl CoordinatorConfig {
  pub fn builder() -> CoordinatorConfigBuilder {
    CoordinatorConfigBuilder::new()
  }

  pub fn from_yaml(yaml: &str) -> Result<Self> {
    let user_config: UserCoordinatorConfig = serde_yaml::from_str(yaml)?;

    CoordinatorConfig::try_from(user_config)
  }

  fn validate(&self) -> Result<()> {
    let positive = [
      ("discovery-interval", self.discovery_interval),
      ("monitor-interval", self.monitor_interval),
      ("artifact-refresh-interval", self.artifact_refresh_interval),
      ("validation-call-timeout", self.validation_call_timeout),
    ];

    for (name, duration) in positive {
      if duration.is_zero() {
        return Err(Error::config_error(format!("`{}` must be greater than zero", name)));
      }
    }

    if self.validation_attempts == 0 {
      return Err(Error::config_error(
        "`validation-attempts` must be at least 1",
      ));
    }

    Ok(())
  }
}

impl TryFrom<UserCoordinatorConfig> for CoordinatorConfig {
  type Error = Error;

  fn try_from(user_config: UserCoordinatorConfig) -> Result<Self> {
    let defaults = CoordinatorConfig::default();

    let config = CoordinatorConfig {
      discovery_interval: parse_duration(
        "discovery-interval",
        user_config.discovery_interval,
        defaults.discovery_interval,
      )?,
      discovery_budget: parse_duration(
        "discovery-budget",
        user_config.discovery_budget,
        defaults.discovery_budget,
      )?,
      monitor_interval: parse_duration(
        "monitor-interval",
        user_config.monitor_interval,
        defaults.monitor_interval,
      )?,
      artifact_refresh_interval: parse_duration(
        "artifact-refresh-interval",
        user_config.artifact_refresh_interval,
        defaults.artifact_refresh_interval,
      )?,
      validation_attempts: user_config
        .validation_attempts
        .unwrap_or(defaults.validation_attempts),
      validation_delay: parse_duration(
        "validation-delay",
        user_config.validation_delay,
        defaults.validation_delay,
      )?,
      validation_call_timeout: parse_duration(
        "validation-call-timeout",
        user_config.validation_call_timeout,
        defaults.validation_call_timeout,
      )?,
      probe_message: user_config
        .probe_message
        .unwrap_or(defaults.probe_message),
    };

    config.validate()?;

    Ok(config)
  }
}

fn parse_duration(name: &str, value: Option<String>, default: Duration) -> Result<Duration> {
  match value {
    Some(value) => humantime::parse_duration(&value).map_err(|err| {
      Error::config_error(format!("Invalid `{}` {:?}: {}", name, value, err))
    }),
    None => Ok(default),
  }
}

pub struct CoordinatorConfigBuilder {
  config: CoordinatorConfig,
}

impl CoordinatorConfigBuilder {
  pub fn new() -> Self {
    CoordinatorConfigBuilder {
      config: CoordinatorConfig::default(),
    }
  }

  pub fn discovery_interval(mut self, interval: Duration) -> Self {
    self.config.discovery_interval = interval;
    self
  }

  pub fn discovery_budget(mut self, budget: Duration) -> Self {
    self.config.discovery_budget = budget;
    self
  }

  pub fn monitor_interval(mut self, interval: Duration) -> Self {
    self.config.monitor_interval = interval;
    self
  }

  pub fn artifact_refresh_interval(mut self, interval: Duration) -> Self {
    self.config.artifact_refresh_interval = interval;
    self
  }

  pub fn validation_attempts(mut self, attempts: usize) -> Self {
    self.config.validation_attempts = attempts;
    self
  }

  pub fn validation_delay(mut self, delay: Duration) -> Self {
    self.config.validation_delay = delay;
    self
  }

  pub fn validation_call_timeout(mut self, timeout: Duration) -> Self {
    self.config.validation_call_timeout = timeout;
    self
  }

  pub fn probe_message(mut self, message: impl Into<String>) -> Self {
    self.config.probe_message = message.into();
    self
  }

  pub fn build(self) -> Result<CoordinatorConfig> {
    self.config.validate()?;

    Ok(self.config)
  }
}

impl Default for CoordinatorConfigBuilder {
  fn default() -> Self {
    Self::new()
  }
}
