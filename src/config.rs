//! Configuration loading from TOML.
//!
//! Reads `config.toml` into strongly-typed sections. Every section has
//! defaults, so a partial file only overrides what it names.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::analysis::WhatIfConfig;
use crate::data::FeeSchedule;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub fees: FeesConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisConfig {
    pub alpha: f64,
    pub beta: f64,
    pub initial_it_costs: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let defaults = WhatIfConfig::default();
        Self {
            alpha: defaults.alpha,
            beta: defaults.beta,
            initial_it_costs: defaults.initial_it_costs,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeesConfig {
    pub sales_fee_rate: Decimal,
    pub subscription_fee_per_month: Decimal,
    /// Cost of a review with 1..=5 stars.
    pub review_costs: [Decimal; 5],
}

impl Default for FeesConfig {
    fn default() -> Self {
        let defaults = FeeSchedule::default();
        Self {
            sales_fee_rate: defaults.sales_fee_rate,
            subscription_fee_per_month: defaults.subscription_fee_per_month,
            review_costs: defaults.review_costs,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub report_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: "whatif_report.json".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load configuration, falling back to defaults when the file is absent.
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            warn!(path, "Config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn whatif_config(&self) -> WhatIfConfig {
        WhatIfConfig {
            alpha: self.analysis.alpha,
            beta: self.analysis.beta,
            initial_it_costs: self.analysis.initial_it_costs,
        }
    }

    pub fn fee_schedule(&self) -> FeeSchedule {
        FeeSchedule {
            sales_fee_rate: self.fees.sales_fee_rate,
            subscription_fee_per_month: self.fees.subscription_fee_per_month,
            review_costs: self.fees.review_costs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_load_config() {
        // Needs config.toml in the working directory; cargo test runs from
        // the crate root where it ships.
        let result = AppConfig::load("config.toml");
        if let Ok(cfg) = result {
            assert_eq!(cfg.analysis.alpha, 3157.27);
            assert_eq!(cfg.analysis.beta, 978.23);
            assert_eq!(cfg.analysis.initial_it_costs, 500_000.0);
            assert_eq!(cfg.fees.sales_fee_rate, dec!(0.1));
            assert_eq!(cfg.fees.review_costs[0], dec!(100));
            assert_eq!(cfg.output.report_path, "whatif_report.json");
        }
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let cfg = AppConfig::parse("").unwrap();
        assert_eq!(cfg.whatif_config(), WhatIfConfig::default());
        assert_eq!(cfg.fee_schedule(), FeeSchedule::default());
    }

    #[test]
    fn test_partial_override() {
        let cfg = AppConfig::parse(
            r#"
            [analysis]
            alpha = 0.0

            [fees]
            review_costs = [200.0, 50.0, 40.0, 0.0, 0.0]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.analysis.alpha, 0.0);
        assert_eq!(cfg.analysis.beta, 978.23);
        assert_eq!(cfg.fee_schedule().review_cost(1), dec!(200));
        assert_eq!(cfg.fee_schedule().sales_fee_rate, dec!(0.1));
    }

    #[test]
    fn test_negative_alpha_parses() {
        // Coefficients are validated by the engine, not the loader.
        let cfg = AppConfig::parse("[analysis]\nalpha = -1.0\n").unwrap();
        assert_eq!(cfg.whatif_config().alpha, -1.0);
    }

    #[test]
    fn test_bad_toml_errors() {
        assert!(AppConfig::parse("[analysis\nalpha = ").is_err());
        assert!(AppConfig::parse("[analysis]\nalpha = \"high\"\n").is_err());
    }

    #[test]
    fn test_missing_file_defaults() {
        let cfg = AppConfig::load_or_default("/tmp/olist_whatif_no_such_config.toml").unwrap();
        assert_eq!(cfg.output.report_path, "whatif_report.json");
        assert!(AppConfig::load("/tmp/olist_whatif_no_such_config.toml").is_err());
    }
}
