//! Application-under-test boundary.
//!
//! The engine sees the target application only as a DOM it can act on
//! ([`PageDriver`]) and a set of HTTP endpoints it can observe or stub
//! ([`Backend`]). Browser automation itself lives behind these traits.
//!
//! A driver implementation routes every outbound call the page makes through
//! [`InterceptionRegistry::dispatch`](crate::InterceptionRegistry::dispatch)
//! so registered aliases see it.

use crate::network::{InterceptedRequest, InterceptedResponse};
use crate::result::WaymarkResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., "input[name='email']")
    Css(String),
    /// CSS selector narrowed to elements containing text
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
    /// The `index`-th element (zero-based) matching a CSS selector
    Nth {
        /// Base CSS selector
        css: String,
        /// Zero-based index
        index: usize,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a CSS selector filtered by text content
    #[must_use]
    pub fn with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssWithText {
            css: css.into(),
            text: text.into(),
        }
    }

    /// Create an indexed CSS selector
    #[must_use]
    pub fn nth(css: impl Into<String>, index: usize) -> Self {
        Self::Nth {
            css: css.into(),
            index,
        }
    }

    /// Input addressed by its `name` attribute
    #[must_use]
    pub fn input_named(name: &str) -> Self {
        Self::Css(format!("input[name='{}']", name))
    }

    /// Base CSS part of the selector
    #[must_use]
    pub fn base(&self) -> &str {
        match self {
            Self::Css(css) | Self::CssWithText { css, .. } | Self::Nth { css, .. } => css,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => f.write_str(css),
            Self::CssWithText { css, text } => write!(f, "{}:contains(\"{}\")", css, text),
            Self::Nth { css, index } => write!(f, "{}:eq({})", css, index),
        }
    }
}

/// Snapshot of one DOM element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomNode {
    /// Element tag name
    pub tag: String,
    /// Text content
    pub text: String,
    /// Current value for form controls
    pub value: Option<String>,
    /// Attributes
    pub attributes: BTreeMap<String, String>,
    /// Whether the element is disabled
    pub disabled: bool,
}

impl DomNode {
    /// Create a node
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set form value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    /// Mark as disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Attribute value
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Whether a form control holds no value
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.as_deref().map_or(true, str::is_empty)
    }
}

/// Browser automation primitives the engine drives.
///
/// Methods take `&self`; implementations hold their page handle behind
/// interior mutability so a driver can be shared with the scenario context.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to a path relative to the configured base URL
    async fn visit(&self, path: &str) -> WaymarkResult<()>;

    /// Reload the current page
    async fn reload(&self) -> WaymarkResult<()>;

    /// Query every element matching a selector
    async fn query(&self, selector: &Selector) -> WaymarkResult<Vec<DomNode>>;

    /// Type text into the element matching a selector
    async fn type_text(&self, selector: &Selector, text: &str) -> WaymarkResult<()>;

    /// Click the element matching a selector
    async fn click(&self, selector: &Selector) -> WaymarkResult<()>;

    /// Clear cookies and local/session storage
    async fn clear_storage(&self) -> WaymarkResult<()>;
}

/// The real backend unstubbed calls are forwarded to
#[async_trait]
pub trait Backend: Send + Sync {
    /// Issue the request and return the backend's response
    async fn send(&self, request: &InterceptedRequest) -> WaymarkResult<InterceptedResponse>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_display() {
        assert_eq!(Selector::css("button").to_string(), "button");
        assert_eq!(
            Selector::with_text("button", "Book").to_string(),
            "button:contains(\"Book\")"
        );
        assert_eq!(
            Selector::nth("[class*='hotel-room-info']", 1).to_string(),
            "[class*='hotel-room-info']:eq(1)"
        );
    }

    #[test]
    fn test_input_named() {
        assert_eq!(
            Selector::input_named("email"),
            Selector::Css("input[name='email']".to_string())
        );
        assert_eq!(Selector::input_named("email").base(), "input[name='email']");
    }

    #[test]
    fn test_dom_node_empty() {
        assert!(DomNode::new("input").is_empty());
        assert!(DomNode::new("input").with_value("").is_empty());
        assert!(!DomNode::new("input").with_value("Anny").is_empty());
    }

    #[test]
    fn test_dom_node_attrs() {
        let node = DomNode::new("input").with_attr("name", "phone").disabled();
        assert_eq!(node.attr("name"), Some("phone"));
        assert!(node.disabled);
    }
}
