//! Body inspection: structure, size, denylist patterns and numeric fields.
//!
//! # Design Decisions
//! - Patterns run against the lowercased JSON rendering of the whole body
//! - Categories are checked in order and the first match decides; the
//!   category is logged but never returned to the caller
//! - Numeric coercion is parse-then-range-check with a tagged result, so a
//!   bad string and an out-of-range number are distinct failures

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::config::ValidationConfig;
use crate::error::ValidationFailure;

/// Built-in denylist categories, in evaluation order.
pub const BUILTIN_PATTERNS: [(&str, &str); 4] = [
    (
        "sql_injection",
        r"(\bunion\b[\s\S]*\bselect\b|\bselect\b[\s\S]*\bfrom\b|\binsert\s+into\b|\bdelete\s+from\b|\bdrop\s+(table|database)\b|\bupdate\b[\s\S]*\bset\b|\bexec(ute)?\s|--|/\*|'\s*(or|and)\s|\bor\s+\d+\s*=\s*\d+)",
    ),
    (
        "xss",
        r"(<\s*script|javascript\s*:|vbscript\s*:|\bon[a-z]+\s*=|<\s*iframe|<\s*object|<\s*embed|<\s*svg|<\s*img[^>]*\bsrc|document\.cookie|\beval\s*\()",
    ),
    ("path_traversal", r"(\.\./|\.\.\\|%2e%2e|%252e%252e)"),
    ("command_injection", r"([;&|`]|\$\(|\$\{)"),
];

/// Compile a denylist pattern. Matching is case-insensitive.
pub fn build_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

#[derive(Debug, Clone)]
struct NamedPattern {
    name: String,
    regex: Regex,
}

/// Ordered list of named matchers.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<NamedPattern>,
}

impl PatternSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The four built-in categories.
    pub fn builtin() -> Result<Self, regex::Error> {
        let mut set = Self::empty();
        for (name, pattern) in BUILTIN_PATTERNS {
            set.push(name, pattern)?;
        }
        Ok(set)
    }

    /// Append a matcher after the existing ones.
    pub fn push(&mut self, name: impl Into<String>, pattern: &str) -> Result<(), regex::Error> {
        self.patterns.push(NamedPattern {
            name: name.into(),
            regex: build_pattern(pattern)?,
        });
        Ok(())
    }

    /// Drop every matcher with the given name.
    pub fn remove(&mut self, name: &str) {
        self.patterns.retain(|p| p.name != name);
    }

    /// Name of the first matcher that fires.
    pub fn first_match(&self, haystack: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.regex.is_match(haystack))
            .map(|p| p.name.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Result of a validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted,
    Rejected {
        reason: ValidationFailure,
        user_message: &'static str,
    },
}

impl ValidationOutcome {
    pub fn rejected(reason: ValidationFailure) -> Self {
        ValidationOutcome::Rejected {
            reason,
            user_message: reason.user_message(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted)
    }

    pub fn into_result(self) -> Result<(), ValidationFailure> {
        match self {
            ValidationOutcome::Accepted => Ok(()),
            ValidationOutcome::Rejected { reason, .. } => Err(reason),
        }
    }
}

/// A coerced numeric field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Integer(i64),
    Real(f64),
}

impl Numeric {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Numeric::Integer(i) => i as f64,
            Numeric::Real(r) => r,
        }
    }

    /// Whole part, rounding toward zero.
    pub fn truncated(&self) -> i64 {
        match *self {
            Numeric::Integer(i) => i,
            Numeric::Real(r) => r.trunc() as i64,
        }
    }
}

/// Coerce a JSON value to a number. Integers and integer-looking strings
/// stay integral; anything else numeric becomes a finite real.
pub fn coerce_numeric(value: &Value) -> Option<Numeric> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Numeric::Integer(i)),
            None => n.as_f64().filter(|f| f.is_finite()).map(Numeric::Real),
        },
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Some(Numeric::Integer(i));
            }
            s.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Numeric::Real)
        }
        _ => None,
    }
}

/// Coerce `value` and require it to fall inside `[min, max]`.
pub fn checked_numeric(value: &Value, min: i64, max: i64) -> Result<Numeric, ValidationFailure> {
    let number = coerce_numeric(value).ok_or(ValidationFailure::InvalidNumeric)?;
    let n = number.as_f64();
    if n < min as f64 || n > max as f64 {
        return Err(ValidationFailure::OutOfRange);
    }
    Ok(number)
}

/// Stateless body validator.
#[derive(Debug, Clone)]
pub struct InputValidator {
    patterns: PatternSet,
    max_payload_bytes: usize,
}

impl InputValidator {
    pub fn new(patterns: PatternSet, max_payload_bytes: usize) -> Self {
        Self {
            patterns,
            max_payload_bytes,
        }
    }

    /// Built-in categories followed by any configured extras.
    pub fn from_config(config: &ValidationConfig) -> Result<Self, regex::Error> {
        let mut patterns = PatternSet::builtin()?;
        for extra in &config.extra_patterns {
            patterns.push(extra.name.clone(), &extra.pattern)?;
        }
        Ok(Self::new(patterns, config.max_payload_bytes))
    }

    pub fn max_payload_bytes(&self) -> usize {
        self.max_payload_bytes
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Check that `body` is an object no larger than `max_size` once
    /// serialized, and that no denylist pattern matches it.
    pub fn validate_structured(&self, body: &Value, max_size: usize) -> ValidationOutcome {
        if !body.is_object() {
            return ValidationOutcome::rejected(ValidationFailure::MalformedStructure);
        }

        let rendered = match serde_json::to_string(body) {
            Ok(s) => s,
            Err(_) => return ValidationOutcome::rejected(ValidationFailure::MalformedStructure),
        };
        if rendered.len() > max_size {
            tracing::debug!(size = rendered.len(), max_size, "Body exceeds size limit");
            return ValidationOutcome::rejected(ValidationFailure::SizeExceeded);
        }

        let lowered = rendered.to_lowercase();
        if let Some(category) = self.patterns.first_match(&lowered) {
            tracing::warn!(category, "Denylisted pattern in request body");
            return ValidationOutcome::rejected(ValidationFailure::PatternMatch);
        }

        ValidationOutcome::Accepted
    }
}

/// Accept `value` if it coerces to a number inside `[min, max]`.
pub fn validate_numeric_range(value: &Value, min: i64, max: i64) -> ValidationOutcome {
    match checked_numeric(value, min, max) {
        Ok(_) => ValidationOutcome::Accepted,
        Err(reason) => ValidationOutcome::rejected(reason),
    }
}
