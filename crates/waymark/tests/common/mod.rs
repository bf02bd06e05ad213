//! Simulated room-booking application for integration tests.
//!
//! `BookingApp` plays the browser page and `BookingBackend` the HTTP API.
//! Every call the page makes goes through the shared interception registry,
//! the same way a real driver would route network traffic.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use waymark::{
    is_valid_email, Backend, ConfigResolver, DomNode, EnvironmentId, HttpMethod,
    InterceptedRequest, InterceptedResponse, InterceptionRegistry, PageDriver, RunContext,
    ScenarioRunner, Selector, WaymarkError, WaymarkResult,
};

pub const INTRO: &str = "Welcome to Restful Booker Platform";
pub const ROOM_INPUTS: &str = "[class*='hotel-room-info'] input";
pub const ALERTS: &str = "[class*='alert-danger'] p";
pub const TOOLBAR_LABEL: &str = ".rbc-toolbar span";
pub const FIELDS: [&str; 4] = ["firstname", "lastname", "email", "phone"];

pub fn config_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("config")
}

pub fn resolve(env: &str) -> RunContext {
    ConfigResolver::new(config_dir())
        .resolve(&EnvironmentId::from(env))
        .expect("test config exists")
}

/// Backend validating bookings like the real API
#[derive(Debug, Default)]
pub struct BookingBackend {
    calls: Mutex<BTreeMap<String, usize>>,
}

impl BookingBackend {
    pub fn calls_to(&self, path: &str) -> usize {
        self.calls.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    fn booking_errors(body: &Value) -> Vec<String> {
        let field = |name: &str| body.get(name).and_then(Value::as_str).unwrap_or("");
        let mut errors = Vec::new();
        if field("firstname").trim().is_empty() {
            errors.push("Firstname should not be blank".to_string());
        }
        if field("lastname").trim().is_empty() {
            errors.push("Lastname should not be blank".to_string());
        }
        if !is_valid_email(field("email")) {
            errors.push("must be a well-formed email address".to_string());
        }
        let phone_len = field("phone").chars().count();
        if !(11..=21).contains(&phone_len) {
            errors.push("size must be between 11 and 21".to_string());
        }
        errors
    }
}

#[async_trait]
impl Backend for BookingBackend {
    async fn send(&self, request: &InterceptedRequest) -> WaymarkResult<InterceptedResponse> {
        let path = request.path().to_string();
        *self.calls.lock().unwrap().entry(path.clone()).or_default() += 1;

        let response = match (request.method, path.as_str()) {
            (HttpMethod::Post, "/booking/") => {
                let body = request.body.clone().unwrap_or(Value::Null);
                let errors = Self::booking_errors(&body);
                if errors.is_empty() {
                    InterceptedResponse::new(201, json!({"bookingid": 7, "booking": body}))
                } else {
                    InterceptedResponse::new(
                        400,
                        json!({
                            "error": "BAD_REQUEST",
                            "errorCode": 400,
                            "errorMessage": "Validation Failed.",
                            "fieldErrors": errors,
                        }),
                    )
                }
            }
            (HttpMethod::Get, p) if p.starts_with("/report/room/") => {
                InterceptedResponse::new(200, json!({"report": []}))
            }
            (HttpMethod::Post, "/message/") => {
                InterceptedResponse::new(201, json!({"messageid": 1}))
            }
            _ => InterceptedResponse::new(404, json!({"error": "NOT_FOUND"})),
        };
        Ok(response)
    }
}

#[derive(Debug, Default)]
struct PageState {
    path: Option<String>,
    intro_visible: bool,
    form_open: bool,
    fields: BTreeMap<String, String>,
    alerts: Vec<String>,
    booked: bool,
}

impl PageState {
    fn load(&mut self, path: &str) {
        *self = Self {
            path: Some(path.to_string()),
            intro_visible: true,
            ..Self::default()
        };
    }

    fn input(&self, name: &str) -> DomNode {
        let node = DomNode::new("input").with_attr("name", name);
        match self.fields.get(name) {
            Some(value) => node.with_value(value.clone()),
            None => node,
        }
    }
}

/// Page of the booking site
pub struct BookingApp {
    state: Arc<Mutex<PageState>>,
    intercepts: InterceptionRegistry,
    backend: Arc<BookingBackend>,
    visits: Mutex<Vec<String>>,
    storage_clears: AtomicUsize,
}

impl BookingApp {
    pub fn new(intercepts: InterceptionRegistry, backend: Arc<BookingBackend>) -> Self {
        Self {
            state: Arc::new(Mutex::new(PageState::default())),
            intercepts,
            backend,
            visits: Mutex::new(Vec::new()),
            storage_clears: AtomicUsize::new(0),
        }
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }

    pub fn storage_clears(&self) -> usize {
        self.storage_clears.load(Ordering::SeqCst)
    }

    fn require_page(&self) -> WaymarkResult<()> {
        if self.state.lock().unwrap().path.is_some() {
            Ok(())
        } else {
            Err(WaymarkError::driver("no page loaded"))
        }
    }

    /// Issue a call from the page without blocking the click
    fn fire<F>(&self, request: InterceptedRequest, on_response: F)
    where
        F: FnOnce(&mut PageState, &InterceptedResponse) + Send + 'static,
    {
        let intercepts = self.intercepts.clone();
        let backend = Arc::clone(&self.backend);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            if let Ok(response) = intercepts.dispatch(request, backend.as_ref()).await {
                on_response(&mut state.lock().unwrap(), &response);
            }
        });
    }

    fn submit_booking(&self) {
        let body = {
            let state = self.state.lock().unwrap();
            let field = |name: &str| state.fields.get(name).cloned().unwrap_or_default();
            json!({
                "roomid": 1,
                "firstname": field("firstname"),
                "lastname": field("lastname"),
                "email": field("email"),
                "phone": field("phone"),
                "depositpaid": false,
            })
        };
        let request = InterceptedRequest::new(HttpMethod::Post, "/booking/")
            .with_header("content-type", "application/json")
            .with_body(body);
        self.fire(request, |state, response| {
            if response.status == 201 {
                state.booked = true;
                state.form_open = false;
                state.fields.clear();
                state.alerts.clear();
            } else {
                state.alerts = response
                    .body
                    .get("fieldErrors")
                    .and_then(Value::as_array)
                    .map(|errors| {
                        errors
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
            }
        });
    }

    fn submit_contact(&self) {
        let request = InterceptedRequest::new(HttpMethod::Post, "/message/").with_body(json!({
            "name": "Anny Smith",
            "email": "anny_smith@hotmail.com",
            "subject": "Hi",
            "description": "Is the room available next week?",
        }));
        self.fire(request, |state, response| {
            if response.status >= 400 {
                state.alerts = response
                    .body
                    .get("fieldErrors")
                    .and_then(Value::as_array)
                    .map(|e| e.iter().filter_map(Value::as_str).map(str::to_string).collect())
                    .unwrap_or_default();
            }
        });
    }
}

#[async_trait]
impl PageDriver for BookingApp {
    async fn visit(&self, path: &str) -> WaymarkResult<()> {
        self.visits.lock().unwrap().push(path.to_string());
        self.state.lock().unwrap().load(path);
        Ok(())
    }

    async fn reload(&self) -> WaymarkResult<()> {
        let mut state = self.state.lock().unwrap();
        let path = state
            .path
            .clone()
            .ok_or_else(|| WaymarkError::driver("nothing to reload"))?;
        state.load(&path);
        Ok(())
    }

    async fn query(&self, selector: &Selector) -> WaymarkResult<Vec<DomNode>> {
        let state = self.state.lock().unwrap();
        let nodes = match selector {
            Selector::CssWithText { css, text } if css == "button" => {
                let mut labels = vec!["Let me hack!", "Book this room", "Submit"];
                if state.form_open {
                    labels.extend(["Book", "Cancel"]);
                }
                labels
                    .into_iter()
                    .filter(|label| label.contains(text.as_str()))
                    .map(|label| DomNode::new("button").with_text(label))
                    .collect()
            }
            Selector::CssWithText { text, .. } if text == INTRO => {
                if state.intro_visible {
                    vec![DomNode::new("h1").with_text(INTRO)]
                } else {
                    Vec::new()
                }
            }
            Selector::Css(css) if css == ROOM_INPUTS => {
                if state.form_open {
                    FIELDS.iter().map(|f| state.input(f)).collect()
                } else {
                    Vec::new()
                }
            }
            Selector::Css(css) if css == ALERTS => state
                .alerts
                .iter()
                .map(|a| DomNode::new("p").with_text(a.clone()))
                .collect(),
            Selector::Css(css) if css == TOOLBAR_LABEL => {
                if state.form_open {
                    let label = chrono::Utc::now().format("%B %Y").to_string();
                    vec![DomNode::new("span").with_text(label)]
                } else {
                    Vec::new()
                }
            }
            other => {
                let field = FIELDS
                    .iter()
                    .find(|f| *other == Selector::input_named(f));
                match field {
                    Some(f) if state.form_open => vec![state.input(f)],
                    _ => Vec::new(),
                }
            }
        };
        Ok(nodes)
    }

    async fn type_text(&self, selector: &Selector, text: &str) -> WaymarkResult<()> {
        self.require_page()?;
        let mut state = self.state.lock().unwrap();
        let field = FIELDS
            .iter()
            .find(|f| *selector == Selector::input_named(f))
            .filter(|_| state.form_open)
            .ok_or_else(|| WaymarkError::driver(format!("element not found: {selector}")))?;
        state
            .fields
            .entry((*field).to_string())
            .or_default()
            .push_str(text);
        Ok(())
    }

    async fn click(&self, selector: &Selector) -> WaymarkResult<()> {
        self.require_page()?;
        let Selector::CssWithText { text, .. } = selector else {
            return Err(WaymarkError::driver(format!("not clickable: {selector}")));
        };
        let form_open = self.state.lock().unwrap().form_open;
        match (text.as_str(), form_open) {
            ("Let me hack!", _) => self.state.lock().unwrap().intro_visible = false,
            ("Book this room", _) => {
                self.state.lock().unwrap().form_open = true;
                self.fire(
                    InterceptedRequest::new(HttpMethod::Get, "/report/room/1"),
                    |_, _| {},
                );
            }
            ("Book", true) => self.submit_booking(),
            ("Cancel", true) => {
                let mut state = self.state.lock().unwrap();
                state.form_open = false;
                state.fields.clear();
                state.alerts.clear();
            }
            ("Submit", _) => self.submit_contact(),
            _ => return Err(WaymarkError::driver(format!("element not found: {selector}"))),
        }
        Ok(())
    }

    async fn clear_storage(&self) -> WaymarkResult<()> {
        self.storage_clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Page, backend and a runner wired to the same registry
pub struct Harness {
    pub app: Arc<BookingApp>,
    pub backend: Arc<BookingBackend>,
    pub intercepts: InterceptionRegistry,
}

impl Harness {
    pub fn new() -> Self {
        let intercepts = InterceptionRegistry::new();
        let backend = Arc::new(BookingBackend::default());
        let app = Arc::new(BookingApp::new(intercepts.clone(), Arc::clone(&backend)));
        Self {
            app,
            backend,
            intercepts,
        }
    }

    /// Runner whose `before_each` visits the home page
    pub fn runner(&self, run: RunContext) -> ScenarioRunner {
        let page: Arc<dyn PageDriver> = Arc::clone(&self.app) as Arc<dyn PageDriver>;
        ScenarioRunner::new(run, page, self.intercepts.clone())
            .before_each(|cx| async move { cx.page().visit("/").await })
    }
}
