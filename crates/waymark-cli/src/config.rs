//! CLI configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - errors only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// From the `-q` flag and `-v` count
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Default log filter when `RUST_LOG` is unset
    #[must_use]
    pub const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "waymark=error,error",
            Self::Normal => "waymark=info,warn",
            Self::Verbose => "waymark=debug,info",
            Self::Debug => "waymark=trace,debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stdout()),
        }
    }

    /// Apply to `console` styling for stdout and stderr
    pub fn apply(self) {
        let enabled = self.should_color();
        console::set_colors_enabled(enabled);
        console::set_colors_enabled_stderr(enabled);
    }
}

/// Settings shared by every subcommand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Active environment identifier
    pub environment: String,
    /// Directory holding `{env}-env.*` documents
    pub config_dir: PathBuf,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
            environment: waymark::DEFAULT_ENVIRONMENT.to_string(),
            config_dir: PathBuf::from("config"),
        }
    }
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set the environment
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Set the config directory
    #[must_use]
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    /// Resolve the active environment's configuration
    pub fn resolve(&self) -> waymark::WaymarkResult<waymark::RunContext> {
        waymark::ConfigResolver::new(&self.config_dir)
            .resolve(&waymark::EnvironmentId::new(self.environment.as_str()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(true, 3), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, 2), Verbosity::Debug);
    }

    #[test]
    fn test_log_filters_scope_waymark() {
        assert!(Verbosity::Normal.log_filter().starts_with("waymark=info"));
        assert!(Verbosity::Debug.log_filter().starts_with("waymark=trace"));
    }

    #[test]
    fn test_color_never() {
        assert!(!ColorChoice::Never.should_color());
        assert!(ColorChoice::Always.should_color());
    }

    #[test]
    fn test_defaults() {
        let config = CliConfig::new();
        assert_eq!(config.environment, "test");
        assert_eq!(config.config_dir, PathBuf::from("config"));
    }

    #[test]
    fn test_resolve_missing_environment() {
        let dir = std::env::temp_dir().join("waymark-cli-no-such-dir");
        let err = CliConfig::new()
            .with_environment("qa")
            .with_config_dir(dir)
            .resolve()
            .unwrap_err();
        assert!(err.to_string().contains("environment qa not found"));
    }
}
