//! Shared types for the what-if analysis.
//!
//! The seller contract consumed by the scenario engine, the trade-off
//! curve it produces, and the domain error type. Feature pipelines and
//! the engine both depend on these without depending on each other.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Seller contract
// ---------------------------------------------------------------------------

/// The view of a seller the scenario engine needs.
///
/// Accessors return `None` when the underlying value is missing or not a
/// number, so that a bad row can be reported instead of silently dropped.
pub trait SellerEconomics {
    fn seller_id(&self) -> &str;

    /// Net profit contribution before any platform IT cost allocation.
    fn profits(&self) -> Option<f64>;

    /// Total items sold by this seller.
    fn number_of_items(&self) -> Option<u64>;
}

/// A fully typed seller row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerRecord {
    pub seller_id: String,
    pub profits: f64,
    pub number_of_items: u64,
}

impl SellerRecord {
    pub fn new(seller_id: impl Into<String>, profits: f64, number_of_items: u64) -> Self {
        Self {
            seller_id: seller_id.into(),
            profits,
            number_of_items,
        }
    }
}

impl SellerEconomics for SellerRecord {
    fn seller_id(&self) -> &str {
        &self.seller_id
    }

    fn profits(&self) -> Option<f64> {
        Some(self.profits)
    }

    fn number_of_items(&self) -> Option<u64> {
        Some(self.number_of_items)
    }
}

impl fmt::Display for SellerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} profits=${:.2} items={}",
            self.seller_id, self.profits, self.number_of_items,
        )
    }
}

/// A seller row as read from a loosely typed JSON table.
///
/// Values are kept as raw JSON until the engine asks for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSellerRow {
    pub seller_id: String,
    #[serde(default)]
    pub profits: Option<serde_json::Value>,
    #[serde(default)]
    pub number_of_items: Option<serde_json::Value>,
}

impl SellerEconomics for RawSellerRow {
    fn seller_id(&self) -> &str {
        &self.seller_id
    }

    fn profits(&self) -> Option<f64> {
        self.profits.as_ref().and_then(serde_json::Value::as_f64)
    }

    fn number_of_items(&self) -> Option<u64> {
        let value = self.number_of_items.as_ref()?;
        if let Some(n) = value.as_u64() {
            return Some(n);
        }
        // Aggregators sometimes emit integral counts as floats ("5.0").
        let x = value.as_f64()?;
        if x >= 0.0 && x.fract() == 0.0 && x <= u64::MAX as f64 {
            Some(x as u64)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Trade-off curve
// ---------------------------------------------------------------------------

/// One point of the trade-off curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeoffPoint {
    pub n_sellers_remaining: usize,
    pub net_profit: f64,
}

impl fmt::Display for TradeoffPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sellers={} net_profit=${:.2}",
            self.n_sellers_remaining, self.net_profit,
        )
    }
}

/// The full trade-off curve of one analysis run, ordered by decreasing
/// `n_sellers_remaining`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioResult {
    points: Vec<TradeoffPoint>,
}

impl ScenarioResult {
    pub fn new(points: Vec<TradeoffPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[TradeoffPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TradeoffPoint> {
        self.points.iter()
    }

    /// The point with the highest net profit.
    ///
    /// Ties go to the earlier point, i.e. the one keeping more sellers.
    pub fn optimum(&self) -> Option<&TradeoffPoint> {
        self.points.iter().fold(None, |best, p| match best {
            Some(b) if b.net_profit >= p.net_profit => Some(b),
            _ => Some(p),
        })
    }

    /// The curve as plain `(n_sellers_remaining, net_profit)` pairs.
    pub fn to_pairs(&self) -> Vec<(usize, f64)> {
        self.points
            .iter()
            .map(|p| (p.n_sellers_remaining, p.net_profit))
            .collect()
    }

    pub fn into_points(self) -> Vec<TradeoffPoint> {
        self.points
    }
}

impl<'a> IntoIterator for &'a ScenarioResult {
    type Item = &'a TradeoffPoint;
    type IntoIter = std::slice::Iter<'a, TradeoffPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain errors raised by the scenario engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Malformed seller record ({seller_id}): {reason}")]
    MalformedInput { seller_id: String, reason: String },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(profits: Option<serde_json::Value>, items: Option<serde_json::Value>) -> RawSellerRow {
        RawSellerRow {
            seller_id: "s1".into(),
            profits,
            number_of_items: items,
        }
    }

    fn curve(values: &[(usize, f64)]) -> ScenarioResult {
        ScenarioResult::new(
            values
                .iter()
                .map(|&(n, p)| TradeoffPoint { n_sellers_remaining: n, net_profit: p })
                .collect(),
        )
    }

    #[test]
    fn test_seller_record_exposes_fields() {
        let s = SellerRecord::new("abc", -12.5, 3);
        assert_eq!(s.seller_id(), "abc");
        assert_eq!(SellerEconomics::profits(&s), Some(-12.5));
        assert_eq!(SellerEconomics::number_of_items(&s), Some(3));
    }

    #[test]
    fn test_raw_row_numeric_values() {
        let row = raw(Some(json!(42.5)), Some(json!(7)));
        assert_eq!(SellerEconomics::profits(&row), Some(42.5));
        assert_eq!(SellerEconomics::number_of_items(&row), Some(7));
    }

    #[test]
    fn test_raw_row_integral_float_items() {
        let row = raw(Some(json!(1)), Some(json!(5.0)));
        assert_eq!(SellerEconomics::number_of_items(&row), Some(5));
    }

    #[test]
    fn test_raw_row_rejects_bad_values() {
        assert_eq!(SellerEconomics::profits(&raw(None, Some(json!(1)))), None);
        assert_eq!(SellerEconomics::profits(&raw(Some(json!("abc")), None)), None);
        assert_eq!(SellerEconomics::number_of_items(&raw(None, Some(json!(-1)))), None);
        assert_eq!(SellerEconomics::number_of_items(&raw(None, Some(json!(2.5)))), None);
        assert_eq!(SellerEconomics::number_of_items(&raw(None, Some(json!("3")))), None);
        assert_eq!(SellerEconomics::number_of_items(&raw(None, None)), None);
    }

    #[test]
    fn test_raw_row_deserialize_missing_fields() {
        let row: RawSellerRow = serde_json::from_str(r#"{"seller_id": "x"}"#).unwrap();
        assert!(row.profits.is_none());
        assert!(row.number_of_items.is_none());
    }

    #[test]
    fn test_optimum_picks_max() {
        let result = curve(&[(3, 10.0), (2, 30.0), (1, 20.0)]);
        assert_eq!(result.optimum().unwrap().n_sellers_remaining, 2);
    }

    #[test]
    fn test_optimum_tie_keeps_more_sellers() {
        let result = curve(&[(3, 30.0), (2, 30.0), (1, 5.0)]);
        assert_eq!(result.optimum().unwrap().n_sellers_remaining, 3);
    }

    #[test]
    fn test_optimum_empty() {
        assert!(ScenarioResult::default().optimum().is_none());
    }

    #[test]
    fn test_to_pairs() {
        let result = curve(&[(2, 50.0), (1, 100.0)]);
        assert_eq!(result.to_pairs(), vec![(2, 50.0), (1, 100.0)]);
        assert_eq!(result.len(), 2);
        assert!(!result.is_empty());
    }

    #[test]
    fn test_scenario_result_serializes_as_list() {
        let result = curve(&[(1, 8.0)]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, json!([{"n_sellers_remaining": 1, "net_profit": 8.0}]));
    }

    #[test]
    fn test_error_display() {
        let e = AnalysisError::MalformedInput {
            seller_id: "s9".into(),
            reason: "profits is missing or not a number".into(),
        };
        assert_eq!(
            e.to_string(),
            "Malformed seller record (s9): profits is missing or not a number"
        );
        let e = AnalysisError::InvalidConfiguration("alpha must be >= 0".into());
        assert_eq!(e.to_string(), "Invalid configuration: alpha must be >= 0");
    }
}
