//! Scoring weight configuration.
//!
//! Weights arrive from loosely-typed sources (a JSON settings file, command
//! line flags, a settings form). [`RawWeights`] keeps them as raw JSON values
//! and [`RawWeights::resolve`] turns them into a validated [`WeightConfig`],
//! substituting the default for any field that is absent, non-numeric or out
//! of range. Resolution never fails.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default weight of one keyword occurrence in the subject.
pub const DEFAULT_SUBJECT_WEIGHT: f64 = 10.0;
/// Default weight of one keyword occurrence in the body.
pub const DEFAULT_BODY_WEIGHT: f64 = 1.0;
/// Default per-segment recency multiplier.
pub const DEFAULT_RECENCY_MULTIPLIER: f64 = 1.5;
/// Default minimum score for a category to be applied.
pub const DEFAULT_SCORE_THRESHOLD: f64 = 10.0;

/// Validated weights for one classification run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightConfig {
    /// Weight per keyword occurrence in the subject. Always positive.
    pub subject_weight: f64,
    /// Weight per keyword occurrence in the body. Always positive.
    pub body_weight: f64,
    /// Base of the recency weight applied per thread segment. At least 1.
    pub recency_multiplier: f64,
    /// Minimum score (inclusive) required to apply a category.
    pub score_threshold: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            subject_weight: DEFAULT_SUBJECT_WEIGHT,
            body_weight: DEFAULT_BODY_WEIGHT,
            recency_multiplier: DEFAULT_RECENCY_MULTIPLIER,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        }
    }
}

/// Unvalidated weight values as supplied by a settings source.
///
/// Each field accepts a JSON number or a numeric string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawWeights {
    /// Raw subject weight.
    #[serde(alias = "subjectWeight", skip_serializing_if = "Option::is_none")]
    pub subject_weight: Option<Value>,
    /// Raw body weight.
    #[serde(alias = "bodyWeight", skip_serializing_if = "Option::is_none")]
    pub body_weight: Option<Value>,
    /// Raw recency multiplier.
    #[serde(alias = "recencyMultiplier", skip_serializing_if = "Option::is_none")]
    pub recency_multiplier: Option<Value>,
    /// Raw score threshold.
    #[serde(alias = "scoreThreshold", skip_serializing_if = "Option::is_none")]
    pub score_threshold: Option<Value>,
}

impl RawWeights {
    /// Overlays `overrides` on top of `self`; fields set in `overrides` win.
    #[must_use]
    pub fn merged_with(self, overrides: Self) -> Self {
        Self {
            subject_weight: overrides.subject_weight.or(self.subject_weight),
            body_weight: overrides.body_weight.or(self.body_weight),
            recency_multiplier: overrides.recency_multiplier.or(self.recency_multiplier),
            score_threshold: overrides.score_threshold.or(self.score_threshold),
        }
    }

    /// Resolves the raw values into a [`WeightConfig`].
    ///
    /// Absent, non-numeric and non-positive values fall back to the defaults.
    /// A recency multiplier below 1 also falls back.
    #[must_use]
    pub fn resolve(&self) -> WeightConfig {
        WeightConfig {
            subject_weight: resolve_field(
                "subject_weight",
                self.subject_weight.as_ref(),
                DEFAULT_SUBJECT_WEIGHT,
                0.0,
            ),
            body_weight: resolve_field(
                "body_weight",
                self.body_weight.as_ref(),
                DEFAULT_BODY_WEIGHT,
                0.0,
            ),
            recency_multiplier: resolve_field(
                "recency_multiplier",
                self.recency_multiplier.as_ref(),
                DEFAULT_RECENCY_MULTIPLIER,
                1.0,
            ),
            score_threshold: resolve_field(
                "score_threshold",
                self.score_threshold.as_ref(),
                DEFAULT_SCORE_THRESHOLD,
                0.0,
            ),
        }
    }
}

/// Reads a number from a JSON value, accepting numeric strings.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn resolve_field(name: &str, value: Option<&Value>, default: f64, minimum: f64) -> f64 {
    let Some(value) = value else {
        return default;
    };

    match numeric(value) {
        Some(v) if v.is_finite() && v > 0.0 && v >= minimum => v,
        _ => {
            tracing::debug!(field = name, %value, default, "Invalid weight, using default");
            default
        }
    }
}
