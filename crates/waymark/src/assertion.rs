//! Assertions over intercepted payloads and page state.
//!
//! Each check returns an [`AssertionResult`]; scenarios turn it into a
//! [`WaymarkResult`] with `?` via [`AssertionResult::into_result`].

use crate::driver::DomNode;
use crate::result::{WaymarkError, WaymarkResult};
use serde_json::Value;
use std::fmt::Debug;

/// Result of an assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub passed: bool,
    /// Human-readable message
    pub message: String,
}

impl AssertionResult {
    /// Create a passing assertion result
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            message: String::new(),
        }
    }

    /// Create a failing assertion result
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }

    /// Convert into a result, failing with [`WaymarkError::AssertionMismatch`]
    pub fn into_result(self) -> WaymarkResult<()> {
        if self.passed {
            Ok(())
        } else {
            Err(WaymarkError::assertion(self.message))
        }
    }
}

/// Assertion helpers
#[derive(Debug, Clone, Copy)]
pub struct Assertion;

impl Assertion {
    /// Assert two values are equal
    #[must_use]
    pub fn equals<T: PartialEq + Debug>(expected: &T, actual: &T) -> AssertionResult {
        if expected == actual {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected {expected:?}, got {actual:?}"))
        }
    }

    /// Assert a condition is true
    #[must_use]
    pub fn is_true(condition: bool, message: &str) -> AssertionResult {
        if condition {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(message)
        }
    }

    /// Assert `actual` includes every key/value of `expected`.
    ///
    /// Objects match recursively as subsets; every other value must be equal.
    #[must_use]
    pub fn json_includes(actual: &Value, expected: &Value) -> AssertionResult {
        match first_difference(actual, expected, String::new()) {
            None => AssertionResult::pass(),
            Some(path) => AssertionResult::fail(format!(
                "expected {actual} to include {expected} (mismatch at {})",
                if path.is_empty() { "/" } else { path.as_str() }
            )),
        }
    }

    /// Assert a string or array value does not contain `needle`.
    ///
    /// Arrays are searched element-wise (string elements by substring),
    /// strings by substring. Null and absent values pass.
    #[must_use]
    pub fn not_contains(haystack: &Value, needle: &str) -> AssertionResult {
        let found = match haystack {
            Value::String(s) => s.contains(needle),
            Value::Array(items) => items.iter().any(|item| match item {
                Value::String(s) => s.contains(needle),
                other => other.to_string().contains(needle),
            }),
            Value::Null => false,
            other => other.to_string().contains(needle),
        };
        if found {
            AssertionResult::fail(format!("expected {haystack} not to contain '{needle}'"))
        } else {
            AssertionResult::pass()
        }
    }

    /// Assert no node's text contains `needle`
    #[must_use]
    pub fn texts_exclude(nodes: &[DomNode], needle: &str) -> AssertionResult {
        match nodes.iter().find(|n| n.text.contains(needle)) {
            Some(node) => AssertionResult::fail(format!(
                "expected no element to contain '{needle}', found '{}'",
                node.text
            )),
            None => AssertionResult::pass(),
        }
    }

    /// Assert every node's text contains one of `needles`, and every needle is shown
    #[must_use]
    pub fn texts_match_exactly(nodes: &[DomNode], needles: &[&str]) -> AssertionResult {
        for needle in needles {
            if !nodes.iter().any(|n| n.text.contains(needle)) {
                return AssertionResult::fail(format!("expected an element containing '{needle}'"));
            }
        }
        if nodes.len() != needles.len() {
            return AssertionResult::fail(format!(
                "expected {} elements, found {}",
                needles.len(),
                nodes.len()
            ));
        }
        AssertionResult::pass()
    }

    /// Assert every form control is empty
    #[must_use]
    pub fn all_empty(nodes: &[DomNode]) -> AssertionResult {
        match nodes.iter().find(|n| !n.is_empty()) {
            Some(node) => AssertionResult::fail(format!(
                "expected empty {}, found value {:?}",
                node.attr("name").unwrap_or(&node.tag),
                node.value
            )),
            None => AssertionResult::pass(),
        }
    }
}

/// Fail unless `actual` includes every key/value of `expected`
pub fn expect_json_includes(actual: &Value, expected: &Value) -> WaymarkResult<()> {
    Assertion::json_includes(actual, expected).into_result()
}

/// Fail if `haystack` contains `needle`
pub fn expect_not_contains(haystack: &Value, needle: &str) -> WaymarkResult<()> {
    Assertion::not_contains(haystack, needle).into_result()
}

/// Fail unless `expected == actual`
pub fn expect_eq<T: PartialEq + Debug>(expected: &T, actual: &T) -> WaymarkResult<()> {
    Assertion::equals(expected, actual).into_result()
}

/// Fail with `message` unless `condition` holds
pub fn expect_true(condition: bool, message: &str) -> WaymarkResult<()> {
    Assertion::is_true(condition, message).into_result()
}

fn first_difference(actual: &Value, expected: &Value, path: String) -> Option<String> {
    match (actual, expected) {
        (Value::Object(actual), Value::Object(expected)) => {
            expected.iter().find_map(|(key, want)| {
                let child = format!("{path}/{key}");
                match actual.get(key) {
                    Some(got) => first_difference(got, want, child),
                    None => Some(child),
                }
            })
        }
        _ if actual == expected => None,
        _ => Some(path),
    }
}
