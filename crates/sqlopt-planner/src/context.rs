//! Per-query context handed to every rule.

use sqlopt_core::config::OptimizerConfig;
use sqlopt_core::expr::EvalContext;
use tracing::span::EnteredSpan;

#[derive(Debug, Clone, Default)]
pub struct OptimizerContext {
    eval: EvalContext,
}

impl OptimizerContext {
    pub fn new(eval: EvalContext) -> Self {
        Self { eval }
    }

    pub fn from_config(cfg: &OptimizerConfig) -> Self {
        Self::new(cfg.eval_context())
    }

    pub fn eval_context(&self) -> &EvalContext {
        &self.eval
    }

    /// Enter a span named after `rule`. The span closes when the guard drops,
    /// which covers early returns and `?` alike.
    pub fn span(&self, rule: &'static str) -> EnteredSpan {
        tracing::debug_span!("optimizer_rule", rule).entered()
    }
}
