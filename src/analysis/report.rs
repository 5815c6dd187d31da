//! Summary of a what-if run for logs and JSON output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::whatif::WhatIfConfig;
use crate::types::{ScenarioResult, TradeoffPoint};

/// Complete what-if report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatIfReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub config: WhatIfConfig,
    pub total_sellers: usize,
    /// Net profit with every seller kept.
    pub baseline_net_profit: Option<f64>,
    /// Most profitable point of the curve.
    pub optimum: Option<TradeoffPoint>,
    /// Sellers removed to reach the optimum.
    pub sellers_removed: usize,
    /// Optimum net profit minus baseline net profit.
    pub profit_uplift: f64,
    pub curve: ScenarioResult,
}

impl WhatIfReport {
    pub fn new(config: WhatIfConfig, result: ScenarioResult) -> Self {
        let total_sellers = result.len();
        let baseline_net_profit = result.points().first().map(|p| p.net_profit);
        let optimum = result.optimum().copied();

        let (sellers_removed, profit_uplift) = match (optimum, baseline_net_profit) {
            (Some(best), Some(baseline)) => (
                total_sellers - best.n_sellers_remaining,
                best.net_profit - baseline,
            ),
            _ => (0, 0.0),
        };

        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            config,
            total_sellers,
            baseline_net_profit,
            optimum,
            sellers_removed,
            profit_uplift,
            curve: result,
        }
    }
}

impl fmt::Display for WhatIfReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.optimum, self.baseline_net_profit) {
            (Some(best), Some(baseline)) => write!(
                f,
                "What-if {}: {} sellers, baseline ${:.2} → keep {} (remove {}) for ${:.2} (uplift ${:.2})",
                self.run_id,
                self.total_sellers,
                baseline,
                best.n_sellers_remaining,
                self.sellers_removed,
                best.net_profit,
                self.profit_uplift,
            ),
            _ => write!(f, "What-if {}: no sellers", self.run_id),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
