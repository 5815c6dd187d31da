//! Per-step observation hook for the elimination loop.
//!
//! The engine reports every elimination step to a `StepObserver`.
//! Callers that want no instrumentation pass `NoopObserver`.

use tracing::debug;

/// Everything known about one elimination step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EliminationStep {
    /// Number of sellers removed before this step was evaluated.
    pub step: usize,
    /// Index, in the caller's table, of the least profitable seller still
    /// retained at this step (the next one to be removed).
    pub marginal_seller: usize,
    pub n_sellers_remaining: usize,
    pub n_items_remaining: u64,
    /// Sum of profits over retained sellers, before IT costs.
    pub gross_profit: f64,
    pub it_costs: f64,
    pub net_profit: f64,
}

#[cfg_attr(test, mockall::automock)]
pub trait StepObserver {
    fn on_step(&mut self, step: &EliminationStep);
}

/// Discards every step.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StepObserver for NoopObserver {
    fn on_step(&mut self, _step: &EliminationStep) {}
}

/// Emits one `debug` event per step.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl StepObserver for TracingObserver {
    fn on_step(&mut self, step: &EliminationStep) {
        debug!(
            step = step.step,
            marginal_seller = step.marginal_seller,
            sellers = step.n_sellers_remaining,
            items = step.n_items_remaining,
            gross_profit = format!("${:.2}", step.gross_profit),
            it_costs = format!("${:.2}", step.it_costs),
            net_profit = format!("${:.2}", step.net_profit),
            "Elimination step"
        );
    }
}
