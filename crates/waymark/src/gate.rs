//! Environment gating.
//!
//! Decides, once per scenario at collection time, whether the scenario
//! applies to the active environment. A skipped scenario never reaches the
//! runner, so none of its setup side effects happen.

use crate::config::{EnvironmentId, RunContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Environments a scenario is restricted to
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvRestriction {
    /// Runs in every environment
    #[default]
    Everywhere,
    /// Runs only in the listed environments (empty list = everywhere)
    Only(BTreeSet<EnvironmentId>),
    /// Runs everywhere except the listed environments
    Except(BTreeSet<EnvironmentId>),
}

impl EnvRestriction {
    /// Allow-list restriction
    #[must_use]
    pub fn only<I, E>(envs: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<EnvironmentId>,
    {
        Self::Only(envs.into_iter().map(Into::into).collect())
    }

    /// Deny-list restriction
    #[must_use]
    pub fn except<I, E>(envs: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<EnvironmentId>,
    {
        Self::Except(envs.into_iter().map(Into::into).collect())
    }

    /// Whether `env` is admitted
    #[must_use]
    pub fn admits(&self, env: &EnvironmentId) -> bool {
        match self {
            Self::Everywhere => true,
            Self::Only(set) => set.is_empty() || set.contains(env),
            Self::Except(set) => !set.contains(env),
        }
    }
}

/// A named scenario and the environments it applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioDescriptor {
    /// Scenario name
    pub name: String,
    /// Environment restriction
    #[serde(default)]
    pub restriction: EnvRestriction,
}

impl ScenarioDescriptor {
    /// Unrestricted descriptor
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            restriction: EnvRestriction::Everywhere,
        }
    }

    /// Set the restriction
    #[must_use]
    pub fn with_restriction(mut self, restriction: EnvRestriction) -> Self {
        self.restriction = restriction;
        self
    }
}

/// Pure registration predicate: true iff `scenario` applies to `active`
#[must_use]
pub fn should_register(scenario: &ScenarioDescriptor, active: &EnvironmentId) -> bool {
    scenario.restriction.admits(active)
}

/// Outcome of gating one item
#[derive(Debug)]
pub enum Gated<T> {
    /// Item applies to the active environment
    Registered(T),
    /// Item was skipped; only its descriptor is kept for reporting
    Skipped(ScenarioDescriptor),
}

/// Registration gate bound to the active environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentGate {
    active: EnvironmentId,
}

impl EnvironmentGate {
    /// Gate for the run's environment
    #[must_use]
    pub fn new(run: &RunContext) -> Self {
        Self::for_environment(run.environment().clone())
    }

    /// Gate for an explicit environment
    #[must_use]
    pub fn for_environment(active: impl Into<EnvironmentId>) -> Self {
        Self {
            active: active.into(),
        }
    }

    /// Active environment
    #[must_use]
    pub const fn active(&self) -> &EnvironmentId {
        &self.active
    }

    /// Evaluate the predicate for one scenario
    #[must_use]
    pub fn should_register(&self, scenario: &ScenarioDescriptor) -> bool {
        let registered = should_register(scenario, &self.active);
        if registered {
            tracing::debug!(scenario = %scenario.name, env = %self.active, "registered");
        } else {
            tracing::info!(
                scenario = %scenario.name,
                env = %self.active,
                "skipped: not authored for this environment"
            );
        }
        registered
    }

    /// Gate every item exactly once, preserving order
    pub fn partition<T, F>(&self, items: impl IntoIterator<Item = T>, descriptor: F) -> Vec<Gated<T>>
    where
        F: Fn(&T) -> &ScenarioDescriptor,
    {
        items
            .into_iter()
            .map(|item| {
                let d = descriptor(&item);
                if self.should_register(d) {
                    Gated::Registered(item)
                } else {
                    Gated::Skipped(d.clone())
                }
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn env(s: &str) -> EnvironmentId {
        EnvironmentId::from(s)
    }

    mod restriction_tests {
        use super::*;

        #[test]
        fn test_everywhere_admits_all() {
            assert!(EnvRestriction::Everywhere.admits(&env("test")));
            assert!(EnvRestriction::Everywhere.admits(&env("anything")));
        }

        #[test]
        fn test_empty_only_set_runs_everywhere() {
            let r = EnvRestriction::only(Vec::<&str>::new());
            assert!(r.admits(&env("production")));
        }

        #[test]
        fn test_only() {
            let r = EnvRestriction::only(["stage", "production"]);
            assert!(r.admits(&env("stage")));
            assert!(r.admits(&env("production")));
            assert!(!r.admits(&env("test")));
        }

        #[test]
        fn test_except() {
            let r = EnvRestriction::except(["production"]);
            assert!(r.admits(&env("stage")));
            assert!(!r.admits(&env("production")));
        }

        #[test]
        fn test_unknown_environment_fails_open_to_skip() {
            let r = EnvRestriction::only(["stage"]);
            assert!(!r.admits(&env("no-such-env")));
        }
    }

    mod gate_tests {
        use super::*;

        #[test]
        fn test_stage_example() {
            let gate = EnvironmentGate::for_environment("stage");
            let both = ScenarioDescriptor::new("a")
                .with_restriction(EnvRestriction::only(["stage", "production"]));
            let prod = ScenarioDescriptor::new("b")
                .with_restriction(EnvRestriction::only(["production"]));

            assert!(gate.should_register(&both));
            assert!(!gate.should_register(&prod));
        }

        #[test]
        fn test_partition_preserves_order() {
            let gate = EnvironmentGate::for_environment("test");
            let items = vec![
                ScenarioDescriptor::new("one"),
                ScenarioDescriptor::new("two")
                    .with_restriction(EnvRestriction::only(["production"])),
                ScenarioDescriptor::new("three"),
            ];

            let gated = gate.partition(items, |d| d);
            let shape: Vec<_> = gated
                .iter()
                .map(|g| match g {
                    Gated::Registered(d) => format!("+{}", d.name),
                    Gated::Skipped(d) => format!("-{}", d.name),
                })
                .collect();
            assert_eq!(shape, vec!["+one", "-two", "+three"]);
        }

        #[test]
        fn test_partition_evaluates_predicate_once_per_item() {
            use std::cell::Cell;

            let gate = EnvironmentGate::for_environment("test");
            let calls = Cell::new(0);
            let items = vec![
                ScenarioDescriptor::new("x"),
                ScenarioDescriptor::new("y").with_restriction(EnvRestriction::only(["production"])),
            ];
            let _ = gate.partition(items, |d| {
                calls.set(calls.get() + 1);
                d
            });
            assert_eq!(calls.get(), 2);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn env_name() -> impl Strategy<Value = String> {
            prop::sample::select(vec!["test", "stage", "production", "local", "qa"])
                .prop_map(str::to_string)
        }

        proptest! {
            #[test]
            fn prop_registered_iff_member(
                active in env_name(),
                allowed in prop::collection::btree_set(env_name(), 1..4),
            ) {
                let descriptor = ScenarioDescriptor::new("s")
                    .with_restriction(EnvRestriction::only(allowed.iter().cloned()));
                let active_id = EnvironmentId::from(active.clone());
                prop_assert_eq!(
                    should_register(&descriptor, &active_id),
                    allowed.contains(&active)
                );
            }

            #[test]
            fn prop_unrestricted_always_registered(active in "[a-z]{1,12}") {
                let descriptor = ScenarioDescriptor::new("s");
                prop_assert!(should_register(&descriptor, &EnvironmentId::from(active)));
            }

            #[test]
            fn prop_except_is_complement_of_only(
                active in env_name(),
                listed in prop::collection::btree_set(env_name(), 1..4),
            ) {
                let id = EnvironmentId::from(active);
                let only = EnvRestriction::only(listed.iter().cloned());
                let except = EnvRestriction::except(listed.iter().cloned());
                prop_assert_ne!(only.admits(&id), except.admits(&id));
            }
        }
    }
}
