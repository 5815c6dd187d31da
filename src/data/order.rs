//! Per-order features: wait times, review flags, basket size, value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::{whole_days, Dataset};

/// Delivery timing of one order, in whole days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWaitTime {
    pub order_id: String,
    /// Purchase to customer delivery. `None` until delivered.
    pub wait_time: Option<i64>,
    /// Purchase to estimated delivery.
    pub expected_wait_time: Option<i64>,
    /// Days late against the estimate, never negative.
    pub delay_vs_expected: Option<i64>,
    pub order_status: String,
}

/// One review of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReviewScore {
    pub order_id: String,
    pub dim_is_five_star: bool,
    pub dim_is_one_star: bool,
    pub review_score: u8,
}

/// Order sums of item price and freight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPriceFreight {
    pub price: Decimal,
    pub freight_value: Decimal,
}

/// Joined per-order feature row, one per review of a complete order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderTrainingRow {
    pub order_id: String,
    pub wait_time: i64,
    pub expected_wait_time: i64,
    pub delay_vs_expected: i64,
    pub order_status: String,
    pub dim_is_five_star: bool,
    pub dim_is_one_star: bool,
    pub review_score: u8,
    pub number_of_items: usize,
    pub number_of_sellers: usize,
    pub price: Decimal,
    pub freight_value: Decimal,
}

pub struct OrderFeatures<'a> {
    data: &'a Dataset,
}

impl<'a> OrderFeatures<'a> {
    pub fn new(data: &'a Dataset) -> Self {
        Self { data }
    }

    /// Wait times for every order, or only delivered ones when `is_delivered`.
    pub fn wait_times(&self, is_delivered: bool) -> Vec<OrderWaitTime> {
        self.data
            .orders
            .iter()
            .filter(|o| !is_delivered || o.is_delivered())
            .map(|o| {
                let purchase = o.order_purchase_timestamp;
                let wait_time = o.order_delivered_customer_date.map(|d| whole_days(d, purchase));
                let expected_wait_time =
                    o.order_estimated_delivery_date.map(|d| whole_days(d, purchase));
                let delay_vs_expected = wait_time
                    .zip(expected_wait_time)
                    .map(|(wait, expected)| (wait - expected).max(0));
                OrderWaitTime {
                    order_id: o.order_id.clone(),
                    wait_time,
                    expected_wait_time,
                    delay_vs_expected,
                    order_status: o.order_status.clone(),
                }
            })
            .collect()
    }

    /// One row per review.
    pub fn review_scores(&self) -> Vec<OrderReviewScore> {
        self.data
            .order_reviews
            .iter()
            .map(|r| OrderReviewScore {
                order_id: r.order_id.clone(),
                dim_is_five_star: r.review_score == 5,
                dim_is_one_star: r.review_score == 1,
                review_score: r.review_score,
            })
            .collect()
    }

    /// Number of item lines per order.
    pub fn number_of_items(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for item in &self.data.order_items {
            *counts.entry(item.order_id.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of distinct sellers per order.
    pub fn number_of_sellers(&self) -> BTreeMap<String, usize> {
        let mut sellers: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
        for item in &self.data.order_items {
            sellers
                .entry(item.order_id.clone())
                .or_default()
                .insert(item.seller_id.as_str());
        }
        sellers.into_iter().map(|(id, s)| (id, s.len())).collect()
    }

    /// Summed item price and freight per order.
    pub fn price_and_freight(&self) -> BTreeMap<String, OrderPriceFreight> {
        let mut totals: BTreeMap<String, OrderPriceFreight> = BTreeMap::new();
        for item in &self.data.order_items {
            let entry = totals
                .entry(item.order_id.clone())
                .or_insert(OrderPriceFreight {
                    price: Decimal::ZERO,
                    freight_value: Decimal::ZERO,
                });
            entry.price += item.price;
            entry.freight_value += item.freight_value;
        }
        totals
    }

    /// Inner join of all order features. Orders with any missing value
    /// are dropped.
    pub fn training_data(&self, is_delivered: bool) -> Vec<OrderTrainingRow> {
        let wait_times = self.wait_times(is_delivered);
        let reviews = self.review_scores();
        let items = self.number_of_items();
        let sellers = self.number_of_sellers();
        let values = self.price_and_freight();

        let mut reviews_by_order: BTreeMap<&str, Vec<&OrderReviewScore>> = BTreeMap::new();
        for review in &reviews {
            reviews_by_order.entry(review.order_id.as_str()).or_default().push(review);
        }

        let mut rows = Vec::new();
        for wt in &wait_times {
            let (Some(wait_time), Some(expected_wait_time), Some(delay_vs_expected)) =
                (wt.wait_time, wt.expected_wait_time, wt.delay_vs_expected)
            else {
                continue;
            };
            let id = wt.order_id.as_str();
            let (Some(order_reviews), Some(&n_items), Some(&n_sellers), Some(value)) = (
                reviews_by_order.get(id),
                items.get(id),
                sellers.get(id),
                values.get(id),
            ) else {
                continue;
            };

            for review in order_reviews {
                rows.push(OrderTrainingRow {
                    order_id: wt.order_id.clone(),
                    wait_time,
                    expected_wait_time,
                    delay_vs_expected,
                    order_status: wt.order_status.clone(),
                    dim_is_five_star: review.dim_is_five_star,
                    dim_is_one_star: review.dim_is_one_star,
                    review_score: review.review_score,
                    number_of_items: n_items,
                    number_of_sellers: n_sellers,
                    price: value.price,
                    freight_value: value.freight_value,
                });
            }
        }

        debug!(orders = wait_times.len(), rows = rows.len(), "Order training data built");
        rows
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;
    use rust_decimal_macros::dec;

    #[test]
    fn test_wait_times_delivered_only() {
        let data = fixtures::dataset();
        let waits = OrderFeatures::new(&data).wait_times(true);
        let ids: Vec<&str> = waits.iter().map(|w| w.order_id.as_str()).collect();
        assert_eq!(ids, vec!["o1", "o2", "o4"]);

        assert_eq!(waits[0].wait_time, Some(10));
        assert_eq!(waits[0].expected_wait_time, Some(12));
        assert_eq!(waits[0].delay_vs_expected, Some(0));

        assert_eq!(waits[1].wait_time, Some(20));
        assert_eq!(waits[1].expected_wait_time, Some(15));
        assert_eq!(waits[1].delay_vs_expected, Some(5));
    }

    #[test]
    fn test_wait_times_all_orders() {
        let data = fixtures::dataset();
        let waits = OrderFeatures::new(&data).wait_times(false);
        assert_eq!(waits.len(), 5);
        let shipped = waits.iter().find(|w| w.order_id == "o3").unwrap();
        assert_eq!(shipped.wait_time, None);
        assert_eq!(shipped.expected_wait_time, Some(19));
        assert_eq!(shipped.delay_vs_expected, None);
    }

    #[test]
    fn test_review_flags() {
        let data = fixtures::dataset();
        let reviews = OrderFeatures::new(&data).review_scores();
        assert_eq!(reviews.len(), 4);
        assert!(reviews[0].dim_is_five_star && !reviews[0].dim_is_one_star);
        assert!(reviews[1].dim_is_one_star && !reviews[1].dim_is_five_star);
        assert!(!reviews[2].dim_is_one_star && !reviews[2].dim_is_five_star);
    }

    #[test]
    fn test_items_and_sellers_per_order() {
        let data = fixtures::dataset();
        let features = OrderFeatures::new(&data);
        let items = features.number_of_items();
        assert_eq!(items["o1"], 3);
        assert_eq!(items["o2"], 1);

        let sellers = features.number_of_sellers();
        assert_eq!(sellers["o1"], 2);
        assert_eq!(sellers["o4"], 1);
    }

    #[test]
    fn test_price_and_freight() {
        let data = fixtures::dataset();
        let values = OrderFeatures::new(&data).price_and_freight();
        assert_eq!(values["o1"].price, dec!(250));
        assert_eq!(values["o1"].freight_value, dec!(25));
        assert_eq!(values["o5"].price, dec!(30));
    }

    #[test]
    fn test_training_data_joins_complete_orders() {
        let data = fixtures::dataset();
        let rows = OrderFeatures::new(&data).training_data(true);
        let ids: Vec<&str> = rows.iter().map(|r| r.order_id.as_str()).collect();
        assert_eq!(ids, vec!["o1", "o2", "o4"]);

        let o1 = &rows[0];
        assert_eq!(o1.wait_time, 10);
        assert_eq!(o1.review_score, 5);
        assert!(o1.dim_is_five_star);
        assert_eq!(o1.number_of_items, 3);
        assert_eq!(o1.number_of_sellers, 2);
        assert_eq!(o1.price, dec!(250));
        assert_eq!(o1.order_status, "delivered");
    }

    #[test]
    fn test_training_data_one_row_per_review() {
        let mut data = fixtures::dataset();
        data.order_reviews.push(crate::data::OrderReview {
            review_id: "r5".into(),
            order_id: "o1".into(),
            review_score: 4,
        });
        let rows = OrderFeatures::new(&data).training_data(true);
        assert_eq!(rows.iter().filter(|r| r.order_id == "o1").count(), 2);
    }

    #[test]
    fn test_training_data_empty_dataset() {
        let data = Dataset::default();
        assert!(OrderFeatures::new(&data).training_data(true).is_empty());
    }
}
