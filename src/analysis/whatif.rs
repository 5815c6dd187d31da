//! What-if seller elimination analysis.
//!
//! Simulates removing the least profitable sellers one at a time and
//! recomputes platform profit net of IT costs after each removal. The
//! full trade-off curve is returned; picking the optimum is up to the
//! caller (see `ScenarioResult::optimum`).

use serde::{Deserialize, Serialize};
use tracing::info;

use super::cost::{CostModel, DEFAULT_ALPHA, DEFAULT_BETA};
use super::observer::{EliminationStep, StepObserver, TracingObserver};
use crate::types::{AnalysisError, ScenarioResult, SellerEconomics, TradeoffPoint};

/// Default baseline IT budget.
pub const DEFAULT_INITIAL_IT_COSTS: f64 = 500_000.0;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What-if analysis configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WhatIfConfig {
    /// IT cost coefficient per sqrt(seller).
    pub alpha: f64,
    /// IT cost coefficient per sqrt(item).
    pub beta: f64,
    /// Baseline IT budget of the platform. Carried through to reports;
    /// the elimination loop does not charge it.
    pub initial_it_costs: f64,
}

impl Default for WhatIfConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
            initial_it_costs: DEFAULT_INITIAL_IT_COSTS,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// A validated seller, tagged with its position in the caller's table.
#[derive(Debug, Clone, Copy)]
struct RankedSeller {
    index: usize,
    profits: f64,
    items: u64,
}

pub struct WhatIfAnalysis {
    config: WhatIfConfig,
}

impl WhatIfAnalysis {
    pub fn new(config: WhatIfConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WhatIfConfig {
        &self.config
    }

    pub fn initial_it_costs(&self) -> f64 {
        self.config.initial_it_costs
    }

    /// Run the elimination scenario, logging each step at `debug` level.
    pub fn perform_analysis<S: SellerEconomics>(
        &self,
        sellers: &[S],
    ) -> Result<ScenarioResult, AnalysisError> {
        self.perform_analysis_with(sellers, &mut TracingObserver)
    }

    /// Run the elimination scenario, reporting each step to `observer`.
    ///
    /// Step `i` keeps every seller except the `i` least profitable ones.
    /// Sellers with equal profits keep their input order. Configuration
    /// is checked before any row, and any bad row fails the whole call.
    pub fn perform_analysis_with<S, O>(
        &self,
        sellers: &[S],
        observer: &mut O,
    ) -> Result<ScenarioResult, AnalysisError>
    where
        S: SellerEconomics,
        O: StepObserver + ?Sized,
    {
        let cost_model = CostModel::new(self.config.alpha, self.config.beta)?;

        let mut ranked = sellers
            .iter()
            .enumerate()
            .map(|(index, seller)| validate(index, seller))
            .collect::<Result<Vec<_>, _>>()?;

        // Least profitable first. `sort_by` is stable, so ties keep input order.
        ranked.sort_by(|a, b| {
            a.profits
                .partial_cmp(&b.profits)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let total = ranked.len();
        info!(
            sellers = total,
            alpha = cost_model.alpha(),
            beta = cost_model.beta(),
            "What-if analysis starting"
        );

        // suffix_*[i] covers ranked[i..]; one reverse pass keeps the run linear.
        let mut suffix_profit = vec![0.0_f64; total + 1];
        let mut suffix_items = vec![0_u64; total + 1];
        for i in (0..total).rev() {
            suffix_profit[i] = suffix_profit[i + 1] + ranked[i].profits;
            suffix_items[i] = suffix_items[i + 1].saturating_add(ranked[i].items);
        }

        let mut points = Vec::with_capacity(total);
        for (i, marginal) in ranked.iter().enumerate() {
            let n_sellers_remaining = total - i;
            let n_items_remaining = suffix_items[i];
            let gross_profit = suffix_profit[i];
            let it_costs = cost_model.update_it_costs(n_sellers_remaining as u64, n_items_remaining);
            let net_profit = gross_profit - it_costs;

            observer.on_step(&EliminationStep {
                step: i,
                marginal_seller: marginal.index,
                n_sellers_remaining,
                n_items_remaining,
                gross_profit,
                it_costs,
                net_profit,
            });

            points.push(TradeoffPoint {
                n_sellers_remaining,
                net_profit,
            });
        }

        let result = ScenarioResult::new(points);
        if let Some(best) = result.optimum() {
            info!(
                steps = result.len(),
                best_sellers = best.n_sellers_remaining,
                best_net_profit = format!("${:.2}", best.net_profit),
                "What-if analysis complete"
            );
        } else {
            info!("What-if analysis complete: no sellers");
        }

        Ok(result)
    }
}

fn validate<S: SellerEconomics>(index: usize, seller: &S) -> Result<RankedSeller, AnalysisError> {
    let malformed = |reason: String| AnalysisError::MalformedInput {
        seller_id: seller.seller_id().to_string(),
        reason,
    };

    let profits = seller
        .profits()
        .ok_or_else(|| malformed("profits is missing or not a number".into()))?;
    if !profits.is_finite() {
        return Err(malformed(format!("profits must be finite, got {profits}")));
    }

    let items = seller.number_of_items().ok_or_else(|| {
        malformed("number_of_items is missing or not a non-negative integer".into())
    })?;

    Ok(RankedSeller {
        index,
        profits,
        items,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
