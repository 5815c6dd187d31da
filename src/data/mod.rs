//! Marketplace dataset and feature pipelines.
//!
//! `Dataset` holds the raw tables. It is loaded once and then only
//! borrowed: every feature builder takes `&Dataset` and returns freshly
//! owned rows. Groupby-style outputs are keyed by id in a `BTreeMap`, so
//! iteration order is stable across runs.

pub mod order;
pub mod product;
pub mod seller;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use order::OrderFeatures;
pub use product::ProductFeatures;
pub use seller::{SellerFeatures, SellerTrainingRow};

/// Status of an order that reached its customer.
pub const DELIVERED: &str = "delivered";

/// Mean length of a Gregorian month in days.
pub const AVG_MONTH_DAYS: f64 = 30.436875;

// ---------------------------------------------------------------------------
// Raw tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub customer_id: String,
    pub order_status: String,
    pub order_purchase_timestamp: NaiveDateTime,
    pub order_approved_at: Option<NaiveDateTime>,
    pub order_delivered_carrier_date: Option<NaiveDateTime>,
    pub order_delivered_customer_date: Option<NaiveDateTime>,
    pub order_estimated_delivery_date: Option<NaiveDateTime>,
}

impl Order {
    pub fn is_delivered(&self) -> bool {
        self.order_status == DELIVERED
    }
}

/// One line of an order. `order_item_id` is the line number within the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: String,
    pub order_item_id: u32,
    pub product_id: String,
    pub seller_id: String,
    pub shipping_limit_date: NaiveDateTime,
    pub price: Decimal,
    pub freight_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReview {
    pub review_id: String,
    pub order_id: String,
    /// 1 to 5 stars.
    pub review_score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    pub seller_id: String,
    pub seller_zip_code_prefix: String,
    pub seller_city: String,
    pub seller_state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub product_category_name: Option<String>,
    pub product_name_length: Option<u32>,
    pub product_description_length: Option<u32>,
    pub product_photos_qty: Option<u32>,
    pub product_weight_g: Option<f64>,
    pub product_length_cm: Option<f64>,
    pub product_height_cm: Option<f64>,
    pub product_width_cm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTranslation {
    pub product_category_name: String,
    pub product_category_name_english: String,
}

/// The full marketplace snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    #[serde(default)]
    pub order_reviews: Vec<OrderReview>,
    #[serde(default)]
    pub sellers: Vec<Seller>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub category_translations: Vec<CategoryTranslation>,
}

impl Dataset {
    /// Orders indexed by id.
    pub fn orders_by_id(&self) -> HashMap<&str, &Order> {
        self.orders.iter().map(|o| (o.order_id.as_str(), o)).collect()
    }

    /// Reviews grouped by order id, in table order.
    pub fn reviews_by_order(&self) -> HashMap<&str, Vec<&OrderReview>> {
        let mut by_order: HashMap<&str, Vec<&OrderReview>> = HashMap::new();
        for review in &self.order_reviews {
            by_order.entry(review.order_id.as_str()).or_default().push(review);
        }
        by_order
    }
}

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

/// Platform fee and review cost schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Share of every sale the platform keeps.
    pub sales_fee_rate: Decimal,
    /// Monthly subscription charged to each active seller.
    pub subscription_fee_per_month: Decimal,
    /// Cost of a review with 1..=5 stars.
    pub review_costs: [Decimal; 5],
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            sales_fee_rate: dec!(0.1),
            subscription_fee_per_month: dec!(80),
            review_costs: [dec!(100), dec!(50), dec!(40), dec!(0), dec!(0)],
        }
    }
}

impl FeeSchedule {
    /// Cost attributed to a review. Scores outside 1..=5 cost nothing.
    pub fn review_cost(&self, score: u8) -> Decimal {
        match score {
            1..=5 => self.review_costs[usize::from(score) - 1],
            _ => Decimal::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fractional days from `earlier` to `later` (negative if reversed).
pub(crate) fn fractional_days(later: NaiveDateTime, earlier: NaiveDateTime) -> f64 {
    (later - earlier).num_milliseconds() as f64 / 86_400_000.0
}

/// Whole days from `earlier` to `later`, rounded down.
pub(crate) fn whole_days(later: NaiveDateTime, earlier: NaiveDateTime) -> i64 {
    (later - earlier).num_seconds().div_euclid(86_400)
}

/// Arithmetic mean, `None` for an empty input.
pub(crate) fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0_f64, 0_usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Share of `true` values, `None` for an empty input.
pub(crate) fn share(flags: impl IntoIterator<Item = bool>) -> Option<f64> {
    mean(flags.into_iter().map(|b| if b { 1.0 } else { 0.0 }))
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! A tiny hand-checked marketplace used by the pipeline tests.
    //!
    //! Sellers: s1 (two delivered orders), s2 (one delivered, one shipped),
    //! s3 (approved order never delivered, no review).

    use super::*;
    use chrono::NaiveDate;

    pub fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, 0, 0))
            .unwrap()
    }

    fn order(
        id: &str,
        status: &str,
        purchase: NaiveDateTime,
        approved: Option<NaiveDateTime>,
        carrier: Option<NaiveDateTime>,
        customer: Option<NaiveDateTime>,
        estimated: NaiveDateTime,
    ) -> Order {
        Order {
            order_id: id.into(),
            customer_id: format!("c-{id}"),
            order_status: status.into(),
            order_purchase_timestamp: purchase,
            order_approved_at: approved,
            order_delivered_carrier_date: carrier,
            order_delivered_customer_date: customer,
            order_estimated_delivery_date: Some(estimated),
        }
    }

    fn item(order: &str, line: u32, product: &str, seller: &str, limit: NaiveDateTime, price: Decimal, freight: Decimal) -> OrderItem {
        OrderItem {
            order_id: order.into(),
            order_item_id: line,
            product_id: product.into(),
            seller_id: seller.into(),
            shipping_limit_date: limit,
            price,
            freight_value: freight,
        }
    }

    fn review(id: &str, order: &str, score: u8) -> OrderReview {
        OrderReview {
            review_id: id.into(),
            order_id: order.into(),
            review_score: score,
        }
    }

    fn product(id: &str, category: &str) -> Product {
        Product {
            product_id: id.into(),
            product_category_name: Some(category.into()),
            product_name_length: Some(40),
            product_description_length: Some(300),
            product_photos_qty: Some(2),
            product_weight_g: Some(500.0),
            product_length_cm: Some(20.0),
            product_height_cm: Some(10.0),
            product_width_cm: Some(15.0),
        }
    }

    pub fn dataset() -> Dataset {
        Dataset {
            orders: vec![
                // delivered in 10 days, estimated 12; carrier 1 day late
                order("o1", "delivered", ts(2017, 1, 1, 0), Some(ts(2017, 1, 1, 12)),
                      Some(ts(2017, 1, 4, 0)), Some(ts(2017, 1, 11, 0)), ts(2017, 1, 13, 0)),
                // delivered in 20 days, estimated 15; carrier early
                order("o2", "delivered", ts(2017, 3, 1, 0), Some(ts(2017, 3, 1, 6)),
                      Some(ts(2017, 3, 2, 0)), Some(ts(2017, 3, 21, 0)), ts(2017, 3, 16, 0)),
                // shipped, not delivered yet
                order("o3", "shipped", ts(2017, 4, 1, 0), Some(ts(2017, 4, 2, 0)),
                      Some(ts(2017, 4, 3, 0)), None, ts(2017, 4, 20, 0)),
                // delivered in 5 days, last sale of s1 (approved ~3 months after o1)
                order("o4", "delivered", ts(2017, 4, 1, 0), Some(ts(2017, 4, 1, 12)),
                      Some(ts(2017, 4, 2, 0)), Some(ts(2017, 4, 6, 0)), ts(2017, 4, 10, 0)),
                // approved, never delivered
                order("o5", "canceled", ts(2017, 5, 1, 0), Some(ts(2017, 5, 1, 1)),
                      None, None, ts(2017, 5, 20, 0)),
            ],
            order_items: vec![
                item("o1", 1, "p1", "s1", ts(2017, 1, 3, 0), dec!(100), dec!(10)),
                item("o1", 2, "p1", "s1", ts(2017, 1, 3, 0), dec!(100), dec!(10)),
                item("o1", 3, "p2", "s2", ts(2017, 1, 3, 0), dec!(50), dec!(5)),
                item("o2", 1, "p2", "s2", ts(2017, 3, 3, 0), dec!(60), dec!(6)),
                item("o3", 1, "p2", "s2", ts(2017, 4, 4, 0), dec!(40), dec!(4)),
                item("o4", 1, "p1", "s1", ts(2017, 4, 3, 0), dec!(200), dec!(20)),
                item("o5", 1, "p3", "s3", ts(2017, 5, 3, 0), dec!(30), dec!(3)),
            ],
            order_reviews: vec![
                review("r1", "o1", 5),
                review("r2", "o2", 1),
                review("r3", "o3", 3),
                review("r4", "o4", 2),
            ],
            sellers: vec![
                Seller { seller_id: "s1".into(), seller_zip_code_prefix: "01000".into(), seller_city: "sao paulo".into(), seller_state: "SP".into() },
                Seller { seller_id: "s2".into(), seller_zip_code_prefix: "20000".into(), seller_city: "rio de janeiro".into(), seller_state: "RJ".into() },
                Seller { seller_id: "s3".into(), seller_zip_code_prefix: "30000".into(), seller_city: "belo horizonte".into(), seller_state: "MG".into() },
            ],
            products: vec![
                product("p1", "relogios_presentes"),
                product("p2", "beleza_saude"),
                product("p3", "sem_traducao"),
            ],
            category_translations: vec![
                CategoryTranslation { product_category_name: "relogios_presentes".into(), product_category_name_english: "watches_gifts".into() },
                CategoryTranslation { product_category_name: "beleza_saude".into(), product_category_name_english: "health_beauty".into() },
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
