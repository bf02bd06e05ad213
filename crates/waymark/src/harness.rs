//! Suites, scenarios and their reports.
//!
//! A [`Suite`] is an ordered list of named async scenario bodies. Collecting
//! it against a [`RunContext`] runs the environment gate once per scenario
//! and produces a [`CollectedSuite`] the runner executes. Skipped scenarios
//! keep only their descriptor, so nothing of their body can run.

use crate::config::RunContext;
use crate::context::ScenarioContext;
use crate::gate::{EnvRestriction, EnvironmentGate, Gated, ScenarioDescriptor};
use crate::result::WaymarkResult;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

/// Future returned by a scenario body or hook
pub type ScenarioFuture = BoxFuture<'static, WaymarkResult<()>>;

/// Type-erased scenario body or hook
pub type ScenarioBody = Arc<dyn Fn(ScenarioContext) -> ScenarioFuture + Send + Sync>;

/// Box an async closure into a [`ScenarioBody`]
pub fn boxed_body<F, Fut>(body: F) -> ScenarioBody
where
    F: Fn(ScenarioContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = WaymarkResult<()>> + Send + 'static,
{
    Arc::new(move |cx: ScenarioContext| -> ScenarioFuture { Box::pin(body(cx)) })
}

/// A single scenario
#[derive(Clone)]
pub struct Scenario {
    descriptor: ScenarioDescriptor,
    body: ScenarioBody,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl Scenario {
    /// Create an unrestricted scenario
    pub fn new<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(ScenarioContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = WaymarkResult<()>> + Send + 'static,
    {
        Self {
            descriptor: ScenarioDescriptor::new(name),
            body: boxed_body(body),
        }
    }

    /// Restrict to some environments
    #[must_use]
    pub fn with_restriction(mut self, restriction: EnvRestriction) -> Self {
        self.descriptor.restriction = restriction;
        self
    }

    /// Scenario name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Name and restriction
    #[must_use]
    pub const fn descriptor(&self) -> &ScenarioDescriptor {
        &self.descriptor
    }

    /// Start the body
    pub(crate) fn start(&self, cx: ScenarioContext) -> ScenarioFuture {
        (self.body)(cx)
    }
}

/// An ordered collection of scenarios
#[derive(Debug, Clone)]
pub struct Suite {
    /// Suite name
    pub name: String,
    scenarios: Vec<Scenario>,
}

impl Suite {
    /// Create an empty suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scenarios: Vec::new(),
        }
    }

    /// Add a prepared scenario
    #[must_use]
    pub fn add(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Add a scenario that runs in every environment
    #[must_use]
    pub fn scenario<F, Fut>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(ScenarioContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = WaymarkResult<()>> + Send + 'static,
    {
        self.add(Scenario::new(name, body))
    }

    /// Add a scenario restricted to some environments
    #[must_use]
    pub fn scenario_in<F, Fut>(self, name: impl Into<String>, restriction: EnvRestriction, body: F) -> Self
    where
        F: Fn(ScenarioContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = WaymarkResult<()>> + Send + 'static,
    {
        self.add(Scenario::new(name, body).with_restriction(restriction))
    }

    /// Add one independent scenario per row.
    ///
    /// Each row is named by `name` and runs `body` with its own context, so a
    /// failing row aborts only its own remaining steps.
    #[must_use]
    pub fn each<R, N, F, Fut>(mut self, rows: impl IntoIterator<Item = R>, name: N, body: F) -> Self
    where
        R: Clone + Send + Sync + 'static,
        N: Fn(&R) -> String,
        F: Fn(ScenarioContext, R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = WaymarkResult<()>> + Send + 'static,
    {
        let body = Arc::new(body);
        for row in rows {
            let row_name = name(&row);
            let body = Arc::clone(&body);
            self.scenarios.push(Scenario::new(row_name, move |cx| body(cx, row.clone())));
        }
        self
    }

    /// Number of scenarios
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether the suite has no scenarios
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Scenario names in declaration order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.scenarios.iter().map(Scenario::name).collect()
    }

    /// Gate every scenario against the run's environment
    #[must_use]
    pub fn collect(self, run: &RunContext) -> CollectedSuite {
        let gate = EnvironmentGate::new(run);
        let entries = gate.partition(self.scenarios, Scenario::descriptor);
        CollectedSuite {
            name: self.name,
            environment: gate.active().to_string(),
            entries,
        }
    }
}

/// A suite after gating
#[derive(Debug)]
pub struct CollectedSuite {
    /// Suite name
    pub name: String,
    /// Environment the suite was gated for
    pub environment: String,
    /// Scenarios in declaration order
    pub entries: Vec<Gated<Scenario>>,
}

impl CollectedSuite {
    /// Number of scenarios that will run
    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, Gated::Registered(_)))
            .count()
    }

    /// Number of scenarios skipped by the gate
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.entries.len() - self.registered_count()
    }
}

/// Lifecycle state of one scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioState {
    /// Collected, not yet started
    Pending,
    /// Hooks or body executing
    Running,
    /// Body and teardown succeeded
    Passed,
    /// An assertion failed, a wait timed out or teardown failed
    Failed,
    /// Gated out before running
    Skipped,
}

impl ScenarioState {
    /// Whether no further transition can happen
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Skipped)
    }

    /// Lower-case state name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    /// Scenario name
    pub name: String,
    /// Terminal state
    pub state: ScenarioState,
    /// Every state the scenario passed through, in order
    pub transitions: Vec<ScenarioState>,
    /// Failure detail
    pub error: Option<String>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl ScenarioOutcome {
    /// Outcome of a gated-out scenario
    #[must_use]
    pub fn skipped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: ScenarioState::Skipped,
            transitions: vec![ScenarioState::Pending, ScenarioState::Skipped],
            error: None,
            duration_ms: 0,
        }
    }

    /// Whether the scenario passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.state == ScenarioState::Passed
    }
}

/// Report for a whole suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Unique id of this run
    pub run_id: Uuid,
    /// Suite name
    pub suite: String,
    /// Active environment
    pub environment: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Per-scenario outcomes in declaration order
    pub outcomes: Vec<ScenarioOutcome>,
    /// Total wall time in milliseconds
    pub duration_ms: u64,
}

impl SuiteReport {
    fn count(&self, state: ScenarioState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }

    /// Count passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.count(ScenarioState::Passed)
    }

    /// Count failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(ScenarioState::Failed)
    }

    /// Count skipped scenarios
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(ScenarioState::Skipped)
    }

    /// Whether nothing failed (skips do not count as failures)
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }

    /// Failed outcomes
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.state == ScenarioState::Failed)
            .collect()
    }

    /// Outcome by scenario name
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<&ScenarioOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {} passed, {} failed, {} skipped ({}ms)",
            self.suite,
            self.passed_count(),
            self.failed_count(),
            self.skipped_count(),
            self.duration_ms
        )
    }
}
