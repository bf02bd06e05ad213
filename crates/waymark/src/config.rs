//! Environment configuration resolution.
//!
//! One configuration document exists per environment identifier, named
//! `{env}-env.json` (or `.yaml` / `.yml`) inside the config directory. The
//! document is read once, before any scenario is collected, and the result is
//! shared read-only through [`RunContext`] for the remainder of the run.

use crate::fixture::FixtureStore;
use crate::result::{WaymarkError, WaymarkResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Environment used when none is supplied
pub const DEFAULT_ENVIRONMENT: &str = "test";

/// Process environment variable selecting the active environment
pub const ENVIRONMENT_VAR: &str = "WAYMARK_ENV";

/// Default timeout for DOM commands (70 seconds)
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 70_000;

/// Default timeout for awaiting an intercepted response (90 seconds)
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 90_000;

/// Default timeout for an outbound request to be issued (90 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 90_000;

/// Default viewport width
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1090;

/// Default viewport height
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 1020;

/// Document suffixes probed in order
const DOCUMENT_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

// =============================================================================
// ENVIRONMENT IDENTIFIER
// =============================================================================

/// Token selecting which deployment a run targets (e.g. "test", "stage")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentId(String);

impl EnvironmentId {
    /// Create an identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Read the identifier from [`ENVIRONMENT_VAR`], falling back to
    /// [`DEFAULT_ENVIRONMENT`] when unset or blank
    #[must_use]
    pub fn from_process_env() -> Self {
        std::env::var(ENVIRONMENT_VAR)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map_or_else(Self::default, Self)
    }

    /// Get the identifier text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EnvironmentId {
    fn default() -> Self {
        Self(DEFAULT_ENVIRONMENT.to_string())
    }
}

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EnvironmentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EnvironmentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// =============================================================================
// ENVIRONMENT CONFIG
// =============================================================================

/// Resolved configuration document for one environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    /// Base URL of the application under test
    #[serde(default)]
    pub base_url: Option<String>,
    /// Timeout for DOM commands in milliseconds
    #[serde(default = "default_command_timeout")]
    pub default_command_timeout: u64,
    /// Timeout for awaited responses in milliseconds
    #[serde(default = "default_response_timeout")]
    pub response_timeout: u64,
    /// Timeout for outbound requests in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    /// Viewport width
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,
    /// Viewport height
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
    /// Fixture directory, relative to the config directory when not absolute
    #[serde(default)]
    pub fixtures_dir: Option<PathBuf>,
    /// Feature flags
    #[serde(default)]
    pub feature_flags: BTreeMap<String, bool>,
    /// Credentials (user names, API keys)
    #[serde(default)]
    pub credentials: BTreeMap<String, String>,
    /// Every other key of the document
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

const fn default_command_timeout() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_MS
}

const fn default_response_timeout() -> u64 {
    DEFAULT_RESPONSE_TIMEOUT_MS
}

const fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

const fn default_viewport_width() -> u32 {
    DEFAULT_VIEWPORT_WIDTH
}

const fn default_viewport_height() -> u32 {
    DEFAULT_VIEWPORT_HEIGHT
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            default_command_timeout: DEFAULT_COMMAND_TIMEOUT_MS,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT_MS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT_MS,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            fixtures_dir: None,
            feature_flags: BTreeMap::new(),
            credentials: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }
}

impl EnvironmentConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set response timeout in milliseconds
    #[must_use]
    pub const fn with_response_timeout(mut self, ms: u64) -> Self {
        self.response_timeout = ms;
        self
    }

    /// Set command timeout in milliseconds
    #[must_use]
    pub const fn with_command_timeout(mut self, ms: u64) -> Self {
        self.default_command_timeout = ms;
        self
    }

    /// Set a feature flag
    #[must_use]
    pub fn with_flag(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.feature_flags.insert(name.into(), enabled);
        self
    }

    /// Timeout for DOM commands
    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.default_command_timeout)
    }

    /// Timeout for awaited responses
    #[must_use]
    pub const fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout)
    }

    /// Timeout for outbound requests
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }

    /// Whether a feature flag is on (unknown flags are off)
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.feature_flags.get(name).copied().unwrap_or(false)
    }

    /// Look up a credential
    #[must_use]
    pub fn credential(&self, name: &str) -> Option<&str> {
        self.credentials.get(name).map(String::as_str)
    }

    /// Look up an arbitrary document key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra.get(key)
    }

    /// Parse a document, choosing the format by file extension
    pub fn load(path: &Path) -> WaymarkResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "yaml" || e == "yml");

        let parsed = if is_yaml {
            serde_yaml_ng::from_str(&text).map_err(|e| e.to_string())
        } else {
            serde_json::from_str(&text).map_err(|e| e.to_string())
        };

        parsed.map_err(|message| WaymarkError::ConfigInvalid {
            path: path.to_path_buf(),
            message,
        })
    }
}

// =============================================================================
// RUN CONTEXT
// =============================================================================

/// Immutable process context: the active environment and its configuration.
///
/// Cheap to clone; every component that needs configuration receives one
/// explicitly instead of reading global state.
#[derive(Debug, Clone)]
pub struct RunContext {
    environment: EnvironmentId,
    config: Arc<EnvironmentConfig>,
    config_dir: PathBuf,
}

impl RunContext {
    /// Build a context directly (embedding and tests)
    #[must_use]
    pub fn new(environment: impl Into<EnvironmentId>, config: EnvironmentConfig) -> Self {
        Self {
            environment: environment.into(),
            config: Arc::new(config),
            config_dir: PathBuf::from("config"),
        }
    }

    /// Set the directory relative paths in the config resolve against
    #[must_use]
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    /// Active environment
    #[must_use]
    pub const fn environment(&self) -> &EnvironmentId {
        &self.environment
    }

    /// Resolved configuration
    #[must_use]
    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Directory the configuration was read from
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Fixture store for this run.
    ///
    /// Defaults to a `fixtures` directory next to the config directory.
    #[must_use]
    pub fn fixtures(&self) -> FixtureStore {
        let root = match &self.config.fixtures_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.config_dir.join(dir),
            None => self
                .config_dir
                .parent()
                .map_or_else(|| PathBuf::from("fixtures"), |p| p.join("fixtures")),
        };
        FixtureStore::new(root)
    }
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Loads the configuration document for an environment, once per process
#[derive(Debug)]
pub struct ConfigResolver {
    config_dir: PathBuf,
    resolved: OnceLock<RunContext>,
}

impl ConfigResolver {
    /// Create a resolver reading from `config_dir`
    #[must_use]
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            resolved: OnceLock::new(),
        }
    }

    /// Directory documents are read from
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Candidate document paths for an environment, in probe order
    #[must_use]
    pub fn candidates(&self, environment: &EnvironmentId) -> Vec<PathBuf> {
        DOCUMENT_EXTENSIONS
            .iter()
            .map(|ext| {
                self.config_dir
                    .join(format!("{}-env.{}", environment.as_str(), ext))
            })
            .collect()
    }

    /// Resolve the configuration for `environment`.
    ///
    /// The first successful resolution is memoised; asking again for the same
    /// environment returns the cached context without touching the
    /// filesystem, and asking for a different one is an error.
    pub fn resolve(&self, environment: &EnvironmentId) -> WaymarkResult<RunContext> {
        if let Some(ctx) = self.resolved.get() {
            if ctx.environment() == environment {
                return Ok(ctx.clone());
            }
            return Err(WaymarkError::EnvironmentConflict {
                active: ctx.environment().to_string(),
                requested: environment.to_string(),
            });
        }

        let path = self
            .candidates(environment)
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| WaymarkError::ConfigNotFound {
                environment: environment.to_string(),
                dir: self.config_dir.clone(),
            })?;

        let config = EnvironmentConfig::load(&path)?;
        tracing::info!(
            environment = %environment,
            path = %path.display(),
            base_url = config.base_url.as_deref().unwrap_or("-"),
            "resolved environment configuration"
        );

        let ctx = RunContext {
            environment: environment.clone(),
            config: Arc::new(config),
            config_dir: self.config_dir.clone(),
        };
        Ok(self.resolved.get_or_init(|| ctx).clone())
    }

    /// The context resolved so far, if any
    #[must_use]
    pub fn resolved(&self) -> Option<&RunContext> {
        self.resolved.get()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    mod environment_id_tests {
        use super::*;

        #[test]
        fn test_default_is_test() {
            assert_eq!(EnvironmentId::default().as_str(), "test");
        }

        #[test]
        fn test_display() {
            assert_eq!(EnvironmentId::from("stage").to_string(), "stage");
        }
    }

    mod environment_config_tests {
        use super::*;

        #[test]
        fn test_defaults_match_suite_timeouts() {
            let config = EnvironmentConfig::default();
            assert_eq!(config.default_command_timeout, 70_000);
            assert_eq!(config.response_timeout, 90_000);
            assert_eq!(config.request_timeout, 90_000);
            assert_eq!(config.viewport_width, 1090);
            assert_eq!(config.viewport_height, 1020);
        }

        #[test]
        fn test_json_document_with_extra_keys() {
            let dir = TempDir::new().unwrap();
            write(
                dir.path(),
                "stage-env.json",
                r#"{
                    "baseUrl": "https://stage.example.com",
                    "responseTimeout": 5000,
                    "featureFlags": {"newCalendar": true},
                    "credentials": {"admin": "s3cret"},
                    "projectEnv": "stage"
                }"#,
            );

            let config = EnvironmentConfig::load(&dir.path().join("stage-env.json")).unwrap();
            assert_eq!(config.base_url.as_deref(), Some("https://stage.example.com"));
            assert_eq!(config.response_timeout(), Duration::from_millis(5000));
            assert_eq!(config.default_command_timeout, 70_000);
            assert!(config.flag("newCalendar"));
            assert!(!config.flag("unknown"));
            assert_eq!(config.credential("admin"), Some("s3cret"));
            assert_eq!(config.get("projectEnv"), Some(&serde_json::json!("stage")));
        }

        #[test]
        fn test_yaml_document() {
            let dir = TempDir::new().unwrap();
            write(
                dir.path(),
                "production-env.yaml",
                "baseUrl: https://example.com\nviewportWidth: 1280\n",
            );

            let config =
                EnvironmentConfig::load(&dir.path().join("production-env.yaml")).unwrap();
            assert_eq!(config.base_url.as_deref(), Some("https://example.com"));
            assert_eq!(config.viewport_width, 1280);
        }

        #[test]
        fn test_malformed_document_is_invalid() {
            let dir = TempDir::new().unwrap();
            write(dir.path(), "test-env.json", "{ not json");

            let err = EnvironmentConfig::load(&dir.path().join("test-env.json")).unwrap_err();
            assert!(matches!(err, WaymarkError::ConfigInvalid { .. }));
            assert!(err.is_fatal());
        }
    }

    mod resolver_tests {
        use super::*;

        #[test]
        fn test_candidates_follow_naming_convention() {
            let resolver = ConfigResolver::new("cfg");
            let names: Vec<_> = resolver
                .candidates(&EnvironmentId::from("stage"))
                .into_iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
                .collect();
            assert_eq!(
                names,
                vec!["stage-env.json", "stage-env.yaml", "stage-env.yml"]
            );
        }

        #[test]
        fn test_missing_environment_is_config_not_found() {
            let dir = TempDir::new().unwrap();
            let resolver = ConfigResolver::new(dir.path());

            let err = resolver.resolve(&EnvironmentId::from("qa")).unwrap_err();
            assert!(matches!(err, WaymarkError::ConfigNotFound { .. }));
            assert!(err.to_string().contains("environment qa not found"));
            assert!(resolver.resolved().is_none());
        }

        #[test]
        fn test_resolution_is_memoised() {
            let dir = TempDir::new().unwrap();
            write(dir.path(), "test-env.json", r#"{"baseUrl": "http://localhost"}"#);
            let resolver = ConfigResolver::new(dir.path());
            let env = EnvironmentId::default();

            let first = resolver.resolve(&env).unwrap();
            fs::remove_file(dir.path().join("test-env.json")).unwrap();
            let second = resolver.resolve(&env).unwrap();

            assert_eq!(first.config(), second.config());
            assert_eq!(second.environment().as_str(), "test");
        }

        #[test]
        fn test_switching_environment_is_rejected() {
            let dir = TempDir::new().unwrap();
            write(dir.path(), "test-env.json", "{}");
            write(dir.path(), "stage-env.json", "{}");
            let resolver = ConfigResolver::new(dir.path());

            resolver.resolve(&EnvironmentId::from("test")).unwrap();
            let err = resolver.resolve(&EnvironmentId::from("stage")).unwrap_err();
            assert!(matches!(err, WaymarkError::EnvironmentConflict { .. }));
        }

        #[test]
        fn test_json_preferred_over_yaml() {
            let dir = TempDir::new().unwrap();
            write(dir.path(), "test-env.json", r#"{"baseUrl": "json"}"#);
            write(dir.path(), "test-env.yml", "baseUrl: yaml\n");
            let resolver = ConfigResolver::new(dir.path());

            let ctx = resolver.resolve(&EnvironmentId::default()).unwrap();
            assert_eq!(ctx.config().base_url.as_deref(), Some("json"));
        }
    }

    mod run_context_tests {
        use super::*;

        #[test]
        fn test_default_fixture_dir_is_sibling_of_config() {
            let ctx = RunContext::new("test", EnvironmentConfig::default())
                .with_config_dir("suite/config");
            assert_eq!(ctx.fixtures().root(), Path::new("suite/fixtures"));
        }

        #[test]
        fn test_relative_fixture_dir_resolves_against_config_dir() {
            let mut config = EnvironmentConfig::default();
            config.fixtures_dir = Some(PathBuf::from("data"));
            let ctx = RunContext::new("test", config).with_config_dir("suite/config");
            assert_eq!(ctx.fixtures().root(), Path::new("suite/config/data"));
        }
    }
}
