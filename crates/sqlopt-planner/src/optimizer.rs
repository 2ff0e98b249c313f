//! Runs the rule pipeline over a plan.

use std::sync::Arc;

use sqlopt_core::config::OptimizerConfig;
use sqlopt_core::plan::PlanRef;

use crate::context::OptimizerContext;
use crate::error::{OptimizeError, Result};
use crate::rules::{default_rules, Rule};
use crate::scope::Scope;
use crate::state::AnalyzerState;

#[derive(Debug, Clone)]
pub struct Optimizer {
    rules: Vec<Rule>,
    config: OptimizerConfig,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}

impl Optimizer {
    /// The default rules under `config`.
    pub fn new(config: OptimizerConfig) -> Self {
        Self::with_rules(default_rules(), config)
    }

    pub fn with_rules(rules: Vec<Rule>, config: OptimizerConfig) -> Self {
        Self { rules, config }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// A fresh context carrying the configured evaluation settings.
    pub fn context(&self) -> OptimizerContext {
        OptimizerContext::from_config(&self.config)
    }

    /// A fresh diagnostics sink honouring the configured debug flag.
    pub fn state(&self) -> AnalyzerState {
        AnalyzerState::new(self.config.debug)
    }

    /// Thread `plan` through every enabled rule in order.
    ///
    /// The first failing rule aborts the run; no partially rewritten plan is
    /// returned.
    pub fn optimize(
        &self,
        ctx: &OptimizerContext,
        state: &mut AnalyzerState,
        plan: &PlanRef,
        scope: &Scope,
    ) -> Result<PlanRef> {
        let mut current = Arc::clone(plan);
        for rule in &self.rules {
            if self.config.is_disabled(rule.name) {
                state.log(format!("rule {} disabled", rule.name));
                continue;
            }
            let next = (rule.apply)(ctx, state, &current, scope).map_err(|source| {
                tracing::debug!(rule = rule.name, error = %source, "optimizer rule failed");
                OptimizeError::Rule {
                    rule: rule.name,
                    source,
                }
            })?;
            if !Arc::ptr_eq(&next, &current) {
                tracing::trace!(rule = rule.name, plan = %next, "plan rewritten");
            }
            current = next;
        }
        Ok(current)
    }

    /// [`optimize`](Self::optimize) with a fresh context and state and no
    /// enclosing scope.
    pub fn optimize_plan(&self, plan: &PlanRef) -> Result<PlanRef> {
        let mut state = self.state();
        self.optimize(&self.context(), &mut state, plan, &Scope::new())
    }
}
