//! Scenario runner.
//!
//! Executes a collected suite one scenario at a time. For each registered
//! scenario the runner moves `Pending -> Running`, clears interceptions,
//! runs the `before_each` hooks and the body, then always tears down
//! (interceptions reset, browser storage cleared) before recording
//! `Passed` or `Failed`. Gated-out scenarios go straight to `Skipped`.

use crate::config::RunContext;
use crate::context::ScenarioContext;
use crate::driver::PageDriver;
use crate::gate::Gated;
use crate::harness::{
    boxed_body, CollectedSuite, Scenario, ScenarioBody, ScenarioOutcome, ScenarioState, Suite,
    SuiteReport,
};
use crate::intercept::InterceptionRegistry;
use crate::result::{WaymarkError, WaymarkResult};
use crate::synthetic::{PhoneConstraint, Seed, SyntheticDataFactory};
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Runs suites against one page and registry
pub struct ScenarioRunner {
    run: RunContext,
    page: Arc<dyn PageDriver>,
    intercepts: InterceptionRegistry,
    before_each: Vec<ScenarioBody>,
    seed: Option<Seed>,
    phone: PhoneConstraint,
}

impl std::fmt::Debug for ScenarioRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("environment", self.run.environment())
            .field("hooks", &self.before_each.len())
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

impl ScenarioRunner {
    /// Create a runner.
    ///
    /// `intercepts` must be the registry the page driver dispatches through.
    #[must_use]
    pub fn new(run: RunContext, page: Arc<dyn PageDriver>, intercepts: InterceptionRegistry) -> Self {
        Self {
            run,
            page,
            intercepts,
            before_each: Vec::new(),
            seed: None,
            phone: PhoneConstraint::default(),
        }
    }

    /// Add a hook run before every registered scenario body
    #[must_use]
    pub fn before_each<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(ScenarioContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = WaymarkResult<()>> + Send + 'static,
    {
        self.before_each.push(boxed_body(hook));
        self
    }

    /// Pin synthetic data; scenario `i` is seeded with `seed + i`
    #[must_use]
    pub const fn with_seed(mut self, seed: Seed) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Phone bounds for synthetic data
    #[must_use]
    pub const fn with_phone_constraint(mut self, phone: PhoneConstraint) -> Self {
        self.phone = phone;
        self
    }

    /// Run context
    #[must_use]
    pub const fn run_context(&self) -> &RunContext {
        &self.run
    }

    /// Registry scenarios register against
    #[must_use]
    pub const fn intercepts(&self) -> &InterceptionRegistry {
        &self.intercepts
    }

    /// Gate and run a suite
    pub async fn run_suite(&self, suite: Suite) -> SuiteReport {
        let collected = suite.collect(&self.run);
        self.run(collected).await
    }

    /// Run an already collected suite, strictly one scenario at a time
    pub async fn run(&self, collected: CollectedSuite) -> SuiteReport {
        let started_at = Utc::now();
        let start = Instant::now();
        let run_id = Uuid::new_v4();
        tracing::info!(
            %run_id,
            suite = %collected.name,
            env = %collected.environment,
            registered = collected.registered_count(),
            skipped = collected.skipped_count(),
            "suite started"
        );

        let mut outcomes = Vec::with_capacity(collected.entries.len());
        for (index, entry) in collected.entries.iter().enumerate() {
            let outcome = match entry {
                Gated::Registered(scenario) => self.run_scenario(scenario, index).await,
                Gated::Skipped(descriptor) => {
                    tracing::info!(scenario = %descriptor.name, "pending -> skipped");
                    ScenarioOutcome::skipped(descriptor.name.clone())
                }
            };
            outcomes.push(outcome);
        }

        let report = SuiteReport {
            run_id,
            suite: collected.name,
            environment: collected.environment,
            started_at,
            outcomes,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(%run_id, "{}", report.summary());
        report
    }

    fn factory_for(&self, index: usize) -> SyntheticDataFactory {
        let seed = self.seed.map_or_else(Seed::from_entropy, |s| {
            Seed::from_u64(s.value().wrapping_add(index as u64))
        });
        SyntheticDataFactory::new(seed).with_phone_constraint(self.phone)
    }

    async fn run_scenario(&self, scenario: &Scenario, index: usize) -> ScenarioOutcome {
        let start = Instant::now();
        let name = scenario.name();
        let mut transitions = vec![ScenarioState::Pending, ScenarioState::Running];
        tracing::info!(scenario = name, "pending -> running");

        // Nothing registered by an earlier scenario may leak into this one.
        self.intercepts.reset();
        let cx = ScenarioContext::new(
            name,
            self.run.clone(),
            Arc::clone(&self.page),
            self.intercepts.clone(),
            self.factory_for(index),
        );

        let body = async {
            for hook in &self.before_each {
                hook(cx.clone()).await?;
            }
            scenario.start(cx.clone()).await
        };
        let result = match AssertUnwindSafe(body).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(WaymarkError::assertion(panic_message(payload.as_ref()))),
        };

        let teardown = self.teardown().await;
        let (state, error) = match (result, teardown) {
            (Ok(()), Ok(())) => (ScenarioState::Passed, None),
            (Ok(()), Err(t)) => (ScenarioState::Failed, Some(format!("teardown failed: {t}"))),
            (Err(e), Ok(())) => (ScenarioState::Failed, Some(e.to_string())),
            (Err(e), Err(t)) => {
                tracing::warn!(scenario = name, error = %t, "teardown failed after failure");
                (ScenarioState::Failed, Some(e.to_string()))
            }
        };
        transitions.push(state);

        let duration_ms = start.elapsed().as_millis() as u64;
        match &error {
            Some(message) => {
                tracing::warn!(scenario = name, duration_ms, error = %message, "running -> failed");
            }
            None => tracing::info!(scenario = name, duration_ms, "running -> passed"),
        }

        ScenarioOutcome {
            name: name.to_string(),
            state,
            transitions,
            error,
            duration_ms,
        }
    }

    async fn teardown(&self) -> WaymarkResult<()> {
        self.intercepts.reset();
        self.page.clear_storage().await
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    format!("scenario panicked: {detail}")
}
