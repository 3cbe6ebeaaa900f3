//! Recover a [`ClassificationResult`] from a free-form oracle response.
//!
//! The oracle is asked for a single JSON object but regularly wraps it in
//! commentary or code fences, or uses a different key for the decision.
//! Extraction is an ordered fallback chain; every path ends in a well-formed
//! result and nothing here returns an error.
//!
//! 1. strict parse of the whole text
//! 2. brace-delimited substring (widest span first, then the first flat object)
//! 3. code fences stripped, strict parse again
//! 4. default reject

use crate::models::ClassificationResult;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

static FLAT_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{[^{}]*\}").unwrap());
static WIDE_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());
static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[A-Za-z]*").unwrap());

/// Where the keep/reject decision may be found, in priority order.
#[derive(Debug, Clone, Copy)]
enum KeepRule {
    /// `"keep": true`
    KeepFlag,
    /// `"decision": "keep"`
    Decision,
    /// `"is_relevant": true`
    RelevanceFlag,
}

const KEEP_RULES: &[KeepRule] = &[KeepRule::KeepFlag, KeepRule::Decision, KeepRule::RelevanceFlag];

impl KeepRule {
    /// `None` when the key is absent or has an unusable type.
    fn apply(self, obj: &Map<String, Value>) -> Option<bool> {
        match self {
            KeepRule::KeepFlag => match obj.get("keep")? {
                Value::Bool(b) => Some(*b),
                Value::String(s) => parse_bool(s),
                _ => None,
            },
            KeepRule::Decision => obj
                .get("decision")?
                .as_str()
                .map(|d| d.trim().eq_ignore_ascii_case("keep")),
            KeepRule::RelevanceFlag => match obj.get("is_relevant")? {
                Value::Bool(b) => Some(*b),
                Value::String(s) => parse_bool(s),
                _ => None,
            },
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Parse a raw oracle response. Never fails.
pub fn parse_response(text: &str) -> ClassificationResult {
    match extract_object(text) {
        Some(obj) => from_object(&obj),
        None => {
            debug!(len = text.len(), "Oracle response held no JSON object; rejecting");
            ClassificationResult::reject()
        }
    }
}

fn strict(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text.trim()).ok()
}

fn extract_object(text: &str) -> Option<Map<String, Value>> {
    let value = strict(text)
        .or_else(|| {
            [&*WIDE_OBJECT, &*FLAT_OBJECT]
                .into_iter()
                .filter_map(|re| re.find(text))
                .find_map(|m| strict(m.as_str()))
        })
        .or_else(|| strict(&CODE_FENCE.replace_all(text, "")))?;

    match value {
        Value::Object(obj) => Some(obj),
        _ => None,
    }
}

fn from_object(obj: &Map<String, Value>) -> ClassificationResult {
    let keep = KEEP_RULES
        .iter()
        .find_map(|rule| rule.apply(obj))
        .unwrap_or(false);

    let score = match obj.get("score") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    let score = if score.is_finite() { score } else { 0.0 };

    let category = obj
        .get("category")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let region = obj
        .get("region")
        .and_then(Value::as_str)
        .unwrap_or("Global")
        .to_string();

    ClassificationResult {
        keep,
        category,
        region,
        score,
    }
}
