//! Per-scenario execution context.

use crate::assertion::AssertionResult;
use crate::config::{EnvironmentConfig, EnvironmentId, RunContext};
use crate::driver::{DomNode, PageDriver, Selector};
use crate::fixture::FixtureStore;
use crate::intercept::InterceptionRegistry;
use crate::network::{CannedResponse, HttpMethod, InterceptedExchange};
use crate::result::{WaymarkError, WaymarkResult};
use crate::synthetic::{SyntheticDataFactory, SyntheticKind, SyntheticRecord};
use crate::wait::{poll_until, WaitOptions};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Handles a scenario body works with.
///
/// Every field is an owned, shareable handle, so the context can be cloned
/// into `async move` blocks freely. A fresh synthetic data factory is built
/// for every scenario; the registry and page are the runner's.
#[derive(Clone)]
pub struct ScenarioContext {
    scenario: Arc<str>,
    run: RunContext,
    page: Arc<dyn PageDriver>,
    intercepts: InterceptionRegistry,
    data: Arc<Mutex<SyntheticDataFactory>>,
    fixtures: FixtureStore,
}

impl std::fmt::Debug for ScenarioContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("scenario", &self.scenario)
            .field("environment", self.run.environment())
            .field("aliases", &self.intercepts.aliases())
            .finish_non_exhaustive()
    }
}

impl ScenarioContext {
    /// Build a context for one scenario
    #[must_use]
    pub fn new(
        scenario: &str,
        run: RunContext,
        page: Arc<dyn PageDriver>,
        intercepts: InterceptionRegistry,
        data: SyntheticDataFactory,
    ) -> Self {
        let fixtures = run.fixtures();
        Self {
            scenario: Arc::from(scenario),
            run,
            page,
            intercepts,
            data: Arc::new(Mutex::new(data)),
            fixtures,
        }
    }

    /// Name of the running scenario
    #[must_use]
    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    /// Run context
    #[must_use]
    pub const fn run(&self) -> &RunContext {
        &self.run
    }

    /// Active environment
    #[must_use]
    pub const fn environment(&self) -> &EnvironmentId {
        self.run.environment()
    }

    /// Resolved configuration
    #[must_use]
    pub fn config(&self) -> &EnvironmentConfig {
        self.run.config()
    }

    /// Page under test
    #[must_use]
    pub fn page(&self) -> &dyn PageDriver {
        self.page.as_ref()
    }

    /// Interception registry
    #[must_use]
    pub const fn intercepts(&self) -> &InterceptionRegistry {
        &self.intercepts
    }

    /// Fixture store
    #[must_use]
    pub const fn fixtures(&self) -> &FixtureStore {
        &self.fixtures
    }

    /// Observe calls matching `method` + `pattern` under `alias`
    pub fn intercept(&self, method: HttpMethod, pattern: &str, alias: &str) -> WaymarkResult<()> {
        self.intercepts.intercept(method, pattern, alias)
    }

    /// Answer calls matching `method` + `pattern` with `response`
    pub fn stub(
        &self,
        method: HttpMethod,
        pattern: &str,
        alias: &str,
        response: CannedResponse,
    ) -> WaymarkResult<()> {
        self.intercepts.stub(method, pattern, alias, response)
    }

    /// Answer calls with a fixture document as the body
    pub fn stub_fixture(
        &self,
        method: HttpMethod,
        pattern: &str,
        alias: &str,
        status: u16,
        fixture: &str,
    ) -> WaymarkResult<()> {
        let response = CannedResponse::from_fixture(&self.fixtures, fixture)?.with_status(status);
        self.stub(method, pattern, alias, response)
    }

    /// Await the next exchange for `alias` within the configured response timeout
    pub async fn wait(&self, alias: &str) -> WaymarkResult<InterceptedExchange> {
        self.wait_for(alias, self.config().response_timeout()).await
    }

    /// Await the next exchange for `alias` within `timeout`
    pub async fn wait_for(&self, alias: &str, timeout: Duration) -> WaymarkResult<InterceptedExchange> {
        let exchange = self.intercepts.wait(alias, timeout).await?;
        tracing::debug!(
            scenario = %self.scenario,
            alias = %exchange.alias,
            status = exchange.response.status,
            "exchange received"
        );
        Ok(exchange)
    }

    /// Generate one synthetic record
    pub fn generate(&self, kind: SyntheticKind) -> SyntheticRecord {
        self.data
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .generate(kind)
    }

    /// Load a fixture document
    pub fn fixture(&self, name: &str) -> WaymarkResult<serde_json::Value> {
        self.fixtures.load(name)
    }

    /// Scenario-tagged log line
    pub fn log(&self, message: &str) {
        tracing::info!(scenario = %self.scenario, "{message}");
    }

    /// Poll the elements matching `selector` until `check` passes.
    ///
    /// Bounded by the configured command timeout. On timeout the last
    /// failure message is reported as an assertion mismatch.
    pub async fn expect_dom<C>(&self, selector: &Selector, check: C) -> WaymarkResult<Vec<DomNode>>
    where
        C: Fn(&[DomNode]) -> AssertionResult + Send + Sync,
    {
        let options = WaitOptions::within(self.config().command_timeout());
        let last = Mutex::new((Vec::new(), String::new()));
        let description = format!("{selector}");

        let polled = poll_until(&description, options, || {
            let page = Arc::clone(&self.page);
            let check = &check;
            let last = &last;
            async move {
                let nodes = page.query(selector).await?;
                let result = check(&nodes);
                let mut slot = last.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                *slot = (nodes, result.message);
                Ok(result.passed)
            }
        })
        .await;

        let (nodes, message) = last
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match polled {
            Ok(_) => Ok(nodes),
            Err(WaymarkError::ConditionTimeout { ms, .. }) => Err(WaymarkError::assertion(
                format!("{description} after {ms}ms: {message}"),
            )),
            Err(other) => Err(other),
        }
    }
}
