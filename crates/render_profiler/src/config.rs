//! Profiler configuration: build environment gating and per-wrapper options.

use serde::{Deserialize, Serialize};

use crate::error::{ProfilerError, ProfilerResult};

/// Environment variable consulted by [`Environment::from_env`].
pub const ENVIRONMENT_VAR: &str = "RENDER_PROFILER_ENV";

/// Build environment the profiler runs in.
///
/// Instrumentation is only active in [`Environment::Development`]; in any
/// other environment wrapping a component is a pass-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development build, instrumentation active
    Development,
    /// Production build, instrumentation disabled
    Production,
}

impl Environment {
    /// Parse an environment name (`development`/`dev`, `production`/`prod`).
    pub fn parse(value: &str) -> ProfilerResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ProfilerError::InvalidEnvironment(other.to_string())),
        }
    }

    /// The environment implied by the build profile.
    pub fn from_build() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Production
        }
    }

    /// Read the environment from [`ENVIRONMENT_VAR`], falling back to the
    /// build profile when it is unset.
    #[cfg(feature = "instrument")]
    pub fn from_env() -> ProfilerResult<Self> {
        match std::env::var(ENVIRONMENT_VAR) {
            Ok(value) => Self::parse(&value),
            Err(std::env::VarError::NotPresent) => Ok(Self::from_build()),
            Err(err) => Err(ProfilerError::InvalidEnvironment(err.to_string())),
        }
    }

    /// Always production when instrumentation is compiled out.
    #[cfg(not(feature = "instrument"))]
    pub fn from_env() -> ProfilerResult<Self> {
        Ok(Self::Production)
    }

    /// Whether instrumentation should be active.
    ///
    /// Always false when the `instrument` feature is disabled.
    #[inline]
    pub fn is_development(self) -> bool {
        cfg!(feature = "instrument") && self == Self::Development
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::from_build()
    }
}

/// Options controlling how a single wrapped component reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeasureOptions {
    /// Open log groups collapsed
    pub is_collapsed: bool,
    /// Suppress all log output (recording still happens)
    pub is_muted: bool,
}

impl Default for MeasureOptions {
    fn default() -> Self {
        Self {
            is_collapsed: true,
            is_muted: false,
        }
    }
}

impl MeasureOptions {
    /// Builder method to set whether groups open collapsed.
    pub fn collapsed(mut self, is_collapsed: bool) -> Self {
        self.is_collapsed = is_collapsed;
        self
    }

    /// Builder method to mute log output.
    pub fn muted(mut self, is_muted: bool) -> Self {
        self.is_muted = is_muted;
        self
    }
}

/// Configuration for a [`Profiler`](crate::Profiler).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfilerConfig {
    /// Environment deciding whether instrumentation is active
    pub environment: Environment,
    /// Default options for components wrapped without explicit options
    pub options: MeasureOptions,
}

impl ProfilerConfig {
    /// Create a config for the given environment with default options.
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            options: MeasureOptions::default(),
        }
    }

    /// Config for a development build.
    pub fn development() -> Self {
        Self::new(Environment::Development)
    }

    /// Config for a production build.
    pub fn production() -> Self {
        Self::new(Environment::Production)
    }

    /// Build a config from the process environment.
    pub fn from_env() -> ProfilerResult<Self> {
        Ok(Self::new(Environment::from_env()?))
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> ProfilerResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the environment.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Set the default measure options.
    pub fn with_options(mut self, options: MeasureOptions) -> Self {
        self.options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_environment() {
        assert_eq!(Environment::parse("development").unwrap(), Environment::Development);
        assert_eq!(Environment::parse(" DEV ").unwrap(), Environment::Development);
        assert_eq!(Environment::parse("Production").unwrap(), Environment::Production);
        assert!(matches!(
            Environment::parse("staging"),
            Err(ProfilerError::InvalidEnvironment(name)) if name == "staging"
        ));
    }

    #[test]
    fn test_production_is_never_active() {
        assert!(!Environment::Production.is_development());
    }

    #[cfg(feature = "instrument")]
    #[test]
    fn test_development_is_active() {
        assert!(Environment::Development.is_development());
    }

    #[test]
    fn test_default_options() {
        let options = MeasureOptions::default();
        assert!(options.is_collapsed);
        assert!(!options.is_muted);

        let options = options.collapsed(false).muted(true);
        assert!(!options.is_collapsed);
        assert!(options.is_muted);
    }

    #[test]
    fn test_config_from_json() {
        let config =
            ProfilerConfig::from_json(r#"{"environment":"production","options":{"isMuted":true}}"#)
                .unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert!(config.options.is_muted);
        assert!(config.options.is_collapsed);
    }

    #[test]
    fn test_config_from_invalid_json() {
        let result = ProfilerConfig::from_json(r#"{"environment":"staging"}"#);
        assert!(matches!(result, Err(ProfilerError::Serialization(_))));
    }

    // Every case that touches the process environment lives in this one test
    // so no other test observes the variable mid-change.
    #[cfg(feature = "instrument")]
    #[test]
    fn test_environment_from_env() {
        let saved = std::env::var_os(ENVIRONMENT_VAR);

        std::env::set_var(ENVIRONMENT_VAR, "DEVELOPMENT");
        assert_eq!(Environment::from_env().unwrap(), Environment::Development);

        std::env::set_var(ENVIRONMENT_VAR, " Prod ");
        assert_eq!(Environment::from_env().unwrap(), Environment::Production);
        assert_eq!(ProfilerConfig::from_env().unwrap(), ProfilerConfig::production());

        std::env::set_var(ENVIRONMENT_VAR, "staging");
        assert!(matches!(
            Environment::from_env(),
            Err(ProfilerError::InvalidEnvironment(name)) if name == "staging"
        ));
        assert!(ProfilerConfig::from_env().is_err());

        std::env::remove_var(ENVIRONMENT_VAR);
        assert_eq!(Environment::from_env().unwrap(), Environment::from_build());

        if let Some(value) = saved {
            std::env::set_var(ENVIRONMENT_VAR, value);
        }
    }

    #[cfg(not(feature = "instrument"))]
    #[test]
    fn test_environment_from_env_without_instrument() {
        assert_eq!(Environment::from_env().unwrap(), Environment::Production);
        assert!(!ProfilerConfig::from_env().unwrap().environment.is_development());
    }
}
