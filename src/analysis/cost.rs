//! IT infrastructure cost model.
//!
//! Platform IT cost grows with the square root of active sellers and
//! active items: `alpha * sqrt(n_sellers) + beta * sqrt(n_items)`.

use crate::types::AnalysisError;

/// Default cost coefficient per sqrt(seller).
pub const DEFAULT_ALPHA: f64 = 3157.27;
/// Default cost coefficient per sqrt(item).
pub const DEFAULT_BETA: f64 = 978.23;

/// Square-root IT cost model. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    alpha: f64,
    beta: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
        }
    }
}

impl CostModel {
    /// Build a cost model, rejecting negative or non-finite coefficients.
    pub fn new(alpha: f64, beta: f64) -> Result<Self, AnalysisError> {
        check_coefficient("alpha", alpha)?;
        check_coefficient("beta", beta)?;
        Ok(Self { alpha, beta })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Estimated IT cost of running the platform with `n_sellers` sellers
    /// selling `n_items` items in total.
    pub fn update_it_costs(&self, n_sellers: u64, n_items: u64) -> f64 {
        self.alpha * (n_sellers as f64).sqrt() + self.beta * (n_items as f64).sqrt()
    }
}

fn check_coefficient(name: &str, value: f64) -> Result<(), AnalysisError> {
    if !value.is_finite() {
        return Err(AnalysisError::InvalidConfiguration(format!(
            "{name} must be a finite number, got {value}"
        )));
    }
    if value < 0.0 {
        return Err(AnalysisError::InvalidConfiguration(format!(
            "{name} must be >= 0, got {value}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
