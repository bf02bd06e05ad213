//! Interception registry.
//!
//! Scenarios declare the outbound calls they expect, each under an alias.
//! Every alias owns a channel: a matching call publishes its exchange to the
//! channel and [`InterceptionRegistry::wait`] is a bounded receive on it.
//!
//! ```text
//!  scenario                 registry                      page / backend
//!  ────────                 ────────                      ──────────────
//!  register(@booking) ──►   rule + channel
//!  click("Book")      ─────────────────────────────────►  POST /booking/
//!                           dispatch(): first rule wins ◄─┘
//!                           canned? stub : forward ─────► backend
//!                           publish exchange ──┐
//!  wait(@booking)     ◄────────────────────────┘ (or WaitTimeout)
//! ```

use crate::driver::Backend;
use crate::network::{
    CannedResponse, HttpMethod, InterceptedExchange, InterceptedRequest, InterceptedResponse,
    PathPattern,
};
use crate::result::{WaymarkError, WaymarkResult};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;

/// Declared expectation for an outbound call
#[derive(Debug, Clone, PartialEq)]
pub struct InterceptionRule {
    /// HTTP method, matched exactly
    pub method: HttpMethod,
    /// Pathname pattern
    pub pattern: PathPattern,
    /// Stub returned instead of contacting the backend
    pub canned: Option<CannedResponse>,
    /// Maximum number of calls this rule binds (None = unlimited)
    pub times: Option<usize>,
}

impl InterceptionRule {
    /// Observe-only rule
    #[must_use]
    pub const fn new(method: HttpMethod, pattern: PathPattern) -> Self {
        Self {
            method,
            pattern,
            canned: None,
            times: None,
        }
    }

    /// Parse method and pattern from text
    pub fn parse(method: &str, pattern: &str) -> WaymarkResult<Self> {
        Ok(Self::new(method.parse()?, PathPattern::parse(pattern)?))
    }

    /// Substitute a canned response for the real call
    #[must_use]
    pub fn with_canned(mut self, response: CannedResponse) -> Self {
        self.canned = Some(response);
        self
    }

    /// Bind at most `n` calls
    #[must_use]
    pub const fn times(mut self, n: usize) -> Self {
        self.times = Some(n);
        self
    }

    /// Check if this rule matches a request
    #[must_use]
    pub fn matches(&self, request: &InterceptedRequest) -> bool {
        self.method == request.method && self.pattern.matches(&request.url)
    }
}

/// What a matched call publishes: its exchange, or the backend failure
type Published = WaymarkResult<InterceptedExchange>;

type ExchangeReceiver = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Published>>>;

#[derive(Debug)]
struct Binding {
    alias: String,
    rule: InterceptionRule,
    match_count: usize,
    sender: mpsc::UnboundedSender<Published>,
    receiver: ExchangeReceiver,
}

impl Binding {
    fn new(alias: String, rule: InterceptionRule) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            alias,
            rule,
            match_count: 0,
            sender,
            receiver: Arc::new(tokio::sync::Mutex::new(receiver)),
        }
    }

    fn is_exhausted(&self) -> bool {
        self.rule.times.is_some_and(|max| self.match_count >= max)
    }
}

/// Outcome of matching a request against the registered rules
struct Matched {
    alias: String,
    canned: Option<CannedResponse>,
    sender: mpsc::UnboundedSender<Published>,
}

/// Alias-keyed interception registry.
///
/// Cheap to clone; clones share state, so the page driver that observes
/// outbound calls and the scenario that awaits them hold the same registry.
#[derive(Debug, Clone, Default)]
pub struct InterceptionRegistry {
    bindings: Arc<Mutex<Vec<Binding>>>,
}

/// Accept both `bookingRequest` and `@bookingRequest`
fn normalize_alias(alias: &str) -> &str {
    alias.strip_prefix('@').unwrap_or(alias)
}

impl InterceptionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Binding>> {
        // A poisoned lock only means a panicking scenario held it; the
        // bindings themselves are still consistent.
        self.bindings
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Declare an expectation under `alias`.
    ///
    /// Re-registering an alias replaces its rule in place (keeping its
    /// precedence) and discards exchanges the old rule queued but nobody read.
    pub fn register(&self, alias: &str, rule: InterceptionRule) {
        let alias = normalize_alias(alias).to_string();
        tracing::debug!(
            alias = %alias,
            method = %rule.method,
            pattern = %rule.pattern,
            stubbed = rule.canned.is_some(),
            "register interception"
        );

        let mut bindings = self.lock();
        let binding = Binding::new(alias, rule);
        match bindings.iter_mut().find(|b| b.alias == binding.alias) {
            Some(existing) => *existing = binding,
            None => bindings.push(binding),
        }
    }

    /// Observe calls matching `method` + `pattern` under `alias`
    pub fn intercept(&self, method: HttpMethod, pattern: &str, alias: &str) -> WaymarkResult<()> {
        self.register(
            alias,
            InterceptionRule::new(method, PathPattern::parse(pattern)?),
        );
        Ok(())
    }

    /// Stub calls matching `method` + `pattern` with `response` under `alias`
    pub fn stub(
        &self,
        method: HttpMethod,
        pattern: &str,
        alias: &str,
        response: CannedResponse,
    ) -> WaymarkResult<()> {
        self.register(
            alias,
            InterceptionRule::new(method, PathPattern::parse(pattern)?).with_canned(response),
        );
        Ok(())
    }

    /// Registered aliases, in precedence order
    #[must_use]
    pub fn aliases(&self) -> Vec<String> {
        self.lock().iter().map(|b| b.alias.clone()).collect()
    }

    /// Whether `alias` is registered
    #[must_use]
    pub fn is_registered(&self, alias: &str) -> bool {
        let alias = normalize_alias(alias);
        self.lock().iter().any(|b| b.alias == alias)
    }

    /// Number of calls bound to `alias` so far
    #[must_use]
    pub fn match_count(&self, alias: &str) -> usize {
        let alias = normalize_alias(alias);
        self.lock()
            .iter()
            .find(|b| b.alias == alias)
            .map_or(0, |b| b.match_count)
    }

    /// Drop every rule and queued exchange
    pub fn reset(&self) {
        let mut bindings = self.lock();
        if !bindings.is_empty() {
            tracing::debug!(count = bindings.len(), "reset interceptions");
        }
        bindings.clear();
    }

    fn match_request(&self, request: &InterceptedRequest) -> Option<Matched> {
        let mut bindings = self.lock();
        let binding = bindings
            .iter_mut()
            .find(|b| !b.is_exhausted() && b.rule.matches(request))?;
        binding.match_count += 1;
        Some(Matched {
            alias: binding.alias.clone(),
            canned: binding.rule.canned.clone(),
            sender: binding.sender.clone(),
        })
    }

    /// Route one outbound call.
    ///
    /// The first registered, non-exhausted rule matching the request wins. A
    /// stubbed rule answers without contacting `backend`; an observe-only rule
    /// forwards to `backend`. Either way the exchange is published to the
    /// rule's alias. Calls no rule matches go straight to `backend` and are
    /// not recorded.
    pub async fn dispatch(
        &self,
        request: InterceptedRequest,
        backend: &dyn Backend,
    ) -> WaymarkResult<InterceptedResponse> {
        let Some(matched) = self.match_request(&request) else {
            return backend.send(&request).await;
        };

        let (response, stubbed) = match &matched.canned {
            Some(canned) => {
                if canned.delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(canned.delay_ms)).await;
                }
                (canned.to_response(), true)
            }
            None => match backend.send(&request).await {
                Ok(response) => (response, false),
                Err(e) => {
                    tracing::warn!(
                        alias = %matched.alias,
                        error = %e,
                        "backend failed for intercepted call"
                    );
                    let failure = WaymarkError::backend(format!(
                        "{} {} bound to @{} failed: {e}",
                        request.method,
                        request.path(),
                        matched.alias
                    ));
                    if matched.sender.send(Err(failure)).is_err() {
                        tracing::debug!(alias = %matched.alias, "alias reset before failure was published");
                    }
                    return Err(e);
                }
            },
        };

        tracing::debug!(
            alias = %matched.alias,
            method = %request.method,
            path = request.path(),
            status = response.status,
            stubbed,
            "intercepted"
        );

        let exchange = InterceptedExchange {
            alias: matched.alias.clone(),
            request,
            response: response.clone(),
            stubbed,
        };
        if matched.sender.send(Ok(exchange)).is_err() {
            tracing::debug!(alias = %matched.alias, "alias reset before exchange was published");
        }
        Ok(response)
    }

    /// Suspend until the next exchange bound to `alias` arrives.
    ///
    /// Exchanges are consumed in the order the calls completed. A call whose
    /// backend failed is consumed as [`WaymarkError::Backend`]. Fails with
    /// [`WaymarkError::AliasNotRegistered`] if the alias was never declared
    /// and with [`WaymarkError::WaitTimeout`] once `timeout` elapses.
    pub async fn wait(&self, alias: &str, timeout: Duration) -> WaymarkResult<InterceptedExchange> {
        let alias = normalize_alias(alias);
        let receiver = self
            .lock()
            .iter()
            .find(|b| b.alias == alias)
            .map(|b| Arc::clone(&b.receiver))
            .ok_or_else(|| WaymarkError::AliasNotRegistered {
                alias: alias.to_string(),
            })?;

        let ms = timeout.as_millis() as u64;
        tracing::debug!(alias, timeout_ms = ms, "waiting for exchange");

        let outcome = tokio::time::timeout(timeout, async {
            let mut rx = receiver.lock().await;
            rx.recv().await
        })
        .await;

        match outcome {
            Ok(Some(published)) => published,
            // Every sender is gone: the alias was re-registered or reset
            // while we were waiting.
            Ok(None) => Err(WaymarkError::AliasNotRegistered {
                alias: alias.to_string(),
            }),
            Err(_) => {
                tracing::warn!(alias, timeout_ms = ms, "wait timed out");
                Err(WaymarkError::WaitTimeout {
                    alias: alias.to_string(),
                    ms,
                })
            }
        }
    }
}
