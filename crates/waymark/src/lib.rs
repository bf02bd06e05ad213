//! Waymark: environment-aware scenario execution for web application tests.
//!
//! A run resolves one environment's configuration, gates every scenario
//! against that environment at collection time, and executes the survivors
//! one at a time. Scenarios synchronize with the application through
//! aliased network interceptions: trigger a UI action, await the exchange
//! it causes, assert on the payload and the resulting page.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐    ┌─────────────────┐    ┌──────────────────┐
//! │ ConfigResolver │───►│ EnvironmentGate │───►│ ScenarioRunner   │
//! │ {env}-env.json │    │ collect once    │    │ hooks/body/      │
//! └────────────────┘    └─────────────────┘    │ teardown         │
//!                                              └────────┬─────────┘
//!                        ┌──────────────────────┐       │
//!                        │ InterceptionRegistry │◄──────┤ ScenarioContext
//!                        │ alias -> channel     │       │
//!                        └──────────┬───────────┘       │
//!                                   │ dispatch          ▼
//!                        ┌──────────▼───────────┐  ┌──────────┐
//!                        │ Backend (or canned)  │◄─│PageDriver│
//!                        └──────────────────────┘  └──────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! let run = ConfigResolver::new("config").resolve(&EnvironmentId::from_process_env())?;
//! let suite = Suite::new("booking").scenario("rejects malformed data", |cx| async move {
//!     cx.intercept(HttpMethod::Post, "/booking/", "bookingRequest")?;
//!     cx.page().click(&Selector::with_text("button", "Book")).await?;
//!     let exchange = cx.wait("@bookingRequest").await?;
//!     expect_json_includes(
//!         &exchange.response.body,
//!         &json!({"error": "BAD_REQUEST", "errorCode": 400}),
//!     )
//! });
//! let report = ScenarioRunner::new(run, page, intercepts).run_suite(suite).await;
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod assertion;
mod config;
mod context;
mod driver;
mod fixture;
mod gate;
mod harness;
mod intercept;
mod manifest;
mod network;
mod result;
mod runner;
mod synthetic;
mod wait;

pub use assertion::{
    expect_eq, expect_json_includes, expect_not_contains, expect_true, Assertion,
    AssertionResult,
};
pub use config::{
    ConfigResolver, EnvironmentConfig, EnvironmentId, RunContext, DEFAULT_COMMAND_TIMEOUT_MS,
    DEFAULT_ENVIRONMENT, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_RESPONSE_TIMEOUT_MS,
    DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH, ENVIRONMENT_VAR,
};
pub use context::ScenarioContext;
pub use driver::{Backend, DomNode, PageDriver, Selector};
pub use fixture::FixtureStore;
pub use gate::{should_register, EnvRestriction, EnvironmentGate, Gated, ScenarioDescriptor};
pub use harness::{
    boxed_body, CollectedSuite, Scenario, ScenarioBody, ScenarioFuture, ScenarioOutcome,
    ScenarioState, Suite, SuiteReport,
};
pub use intercept::{InterceptionRegistry, InterceptionRule};
pub use manifest::{PlanEntry, ScenarioManifest};
pub use network::{
    pathname, CannedResponse, HttpMethod, InterceptedExchange, InterceptedRequest,
    InterceptedResponse, PathPattern,
};
pub use result::{WaymarkError, WaymarkResult};
pub use runner::ScenarioRunner;
pub use synthetic::{
    is_valid_email, PhoneConstraint, Seed, SyntheticDataFactory, SyntheticKind, SyntheticRecord,
    MAX_PHONE_LEN,
};
pub use wait::{poll_until, WaitOptions, WaitResult, DEFAULT_POLL_INTERVAL_MS};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        expect_eq, expect_json_includes, expect_not_contains, expect_true, Assertion,
        AssertionResult, Backend, CannedResponse, ConfigResolver, DomNode, EnvRestriction,
        EnvironmentConfig, EnvironmentId, HttpMethod, InterceptedExchange, InterceptedRequest,
        InterceptedResponse, InterceptionRegistry, PageDriver, RunContext, ScenarioContext,
        ScenarioRunner, ScenarioState, Seed, Selector, Suite, SuiteReport, SyntheticKind,
        WaymarkError, WaymarkResult,
    };
}
