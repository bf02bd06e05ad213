//! Scenario manifests.
//!
//! A manifest lists scenario names with their environment restrictions so
//! the gate can be previewed without compiling a suite:
//!
//! ```yaml
//! scenarios:
//!   - name: book a room
//!   - name: contact form mocked
//!     only: [stage, production]
//!   - name: hack the intro
//!     except: [production]
//! ```

use crate::config::EnvironmentId;
use crate::gate::{EnvRestriction, EnvironmentGate, Gated, ScenarioDescriptor};
use crate::result::{WaymarkError, WaymarkResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default)]
    scenarios: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEntry {
    name: String,
    #[serde(default)]
    only: Option<Vec<String>>,
    #[serde(default)]
    except: Option<Vec<String>>,
}

/// Parsed scenario manifest
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScenarioManifest {
    /// Scenarios in file order
    pub scenarios: Vec<ScenarioDescriptor>,
}

/// Gate decision for one manifest entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    /// Scenario name
    pub name: String,
    /// Whether the scenario registers in the active environment
    pub registered: bool,
}

impl ScenarioManifest {
    /// Parse manifest YAML; `source` names the document in errors
    pub fn parse(yaml: &str, source: &Path) -> WaymarkResult<Self> {
        let invalid = |message: String| WaymarkError::ConfigInvalid {
            path: source.to_path_buf(),
            message,
        };
        let raw: RawManifest = serde_yaml_ng::from_str(yaml).map_err(|e| invalid(e.to_string()))?;

        let scenarios = raw
            .scenarios
            .into_iter()
            .map(|entry| {
                let restriction = match (entry.only, entry.except) {
                    (Some(_), Some(_)) => {
                        return Err(invalid(format!(
                            "scenario '{}' sets both only and except",
                            entry.name
                        )))
                    }
                    (Some(only), None) => EnvRestriction::only(only),
                    (None, Some(except)) => EnvRestriction::except(except),
                    (None, None) => EnvRestriction::Everywhere,
                };
                Ok(ScenarioDescriptor::new(entry.name).with_restriction(restriction))
            })
            .collect::<WaymarkResult<Vec<_>>>()?;

        Ok(Self { scenarios })
    }

    /// Read and parse a manifest file
    pub fn load(path: &Path) -> WaymarkResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::parse(&yaml, path)
    }

    /// Gate every entry for `environment`
    #[must_use]
    pub fn plan(&self, environment: &EnvironmentId) -> Vec<PlanEntry> {
        let gate = EnvironmentGate::for_environment(environment.clone());
        gate.partition(self.scenarios.iter(), |d| *d)
            .into_iter()
            .map(|gated| match gated {
                Gated::Registered(d) => PlanEntry {
                    name: d.name.clone(),
                    registered: true,
                },
                Gated::Skipped(d) => PlanEntry {
                    name: d.name,
                    registered: false,
                },
            })
            .collect()
    }
}
