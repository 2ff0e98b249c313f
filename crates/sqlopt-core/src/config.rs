//! Optimizer configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::expr::EvalContext;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Rule names the pipeline skips (e.g. `"eval_filter"`).
    pub disabled_rules: Vec<String>,

    /// Keep rule notes in the analyzer state in addition to emitting them as
    /// tracing events.
    pub debug: bool,

    /// Division or modulo by zero folds to NULL instead of failing.
    pub division_by_zero_is_null: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            disabled_rules: Vec::new(),
            debug: false,
            division_by_zero_is_null: true,
        }
    }
}

impl OptimizerConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `SQLOPT_DISABLED_RULES`: comma separated rule names
    /// - `SQLOPT_DEBUG`: `true`/`1` to record rule notes
    /// - `SQLOPT_DIV_ZERO_NULL`: `false`/`0` to make division by zero an error
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(s) = lookup("SQLOPT_DISABLED_RULES") {
            cfg.disabled_rules = s
                .split(',')
                .map(|r| r.trim())
                .filter(|r| !r.is_empty())
                .map(|r| r.to_string())
                .collect();
        }

        if let Some(v) = lookup("SQLOPT_DEBUG").as_deref().and_then(parse_flag) {
            cfg.debug = v;
        }

        if let Some(v) = lookup("SQLOPT_DIV_ZERO_NULL").as_deref().and_then(parse_flag) {
            cfg.division_by_zero_is_null = v;
        }

        cfg
    }

    pub fn is_disabled(&self, rule: &str) -> bool {
        self.disabled_rules.iter().any(|r| r == rule)
    }

    /// Evaluation settings used by constant folding.
    pub fn eval_context(&self) -> EvalContext {
        EvalContext {
            division_by_zero_is_null: self.division_by_zero_is_null,
        }
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
