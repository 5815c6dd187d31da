//! Per-product features: catalogue attributes, pricing, reviews, profit.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use super::order::OrderFeatures;
use super::{mean, share, Dataset, FeeSchedule};

/// Catalogue entry with its English category name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub product_id: String,
    pub category: String,
    pub product_name_length: Option<u32>,
    pub product_description_length: Option<u32>,
    pub product_photos_qty: Option<u32>,
    pub product_weight_g: Option<f64>,
    pub product_length_cm: Option<f64>,
    pub product_height_cm: Option<f64>,
    pub product_width_cm: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub share_of_one_stars: f64,
    pub share_of_five_stars: f64,
    pub review_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuantity {
    /// Distinct orders containing the product.
    pub n_orders: usize,
    /// Item lines sold.
    pub quantity: usize,
}

/// Joined per-product feature row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductTrainingRow {
    #[serde(flatten)]
    pub details: ProductDetails,
    pub wait_time: f64,
    pub price: Decimal,
    #[serde(flatten)]
    pub reviews: ReviewSummary,
    #[serde(flatten)]
    pub quantity: ProductQuantity,
    pub sales: Decimal,
    pub revenues: Decimal,
    pub cost: Decimal,
    pub profits: Decimal,
}

pub struct ProductFeatures<'a> {
    data: &'a Dataset,
    fees: FeeSchedule,
}

impl<'a> ProductFeatures<'a> {
    pub fn new(data: &'a Dataset, fees: FeeSchedule) -> Self {
        Self { data, fees }
    }

    /// Catalogue joined with category translations. Products without a
    /// translated category are dropped.
    pub fn product_details(&self) -> Vec<ProductDetails> {
        let english: HashMap<&str, &str> = self
            .data
            .category_translations
            .iter()
            .map(|t| (t.product_category_name.as_str(), t.product_category_name_english.as_str()))
            .collect();

        self.data
            .products
            .iter()
            .filter_map(|p| {
                let category = english.get(p.product_category_name.as_deref()?)?;
                Some(ProductDetails {
                    product_id: p.product_id.clone(),
                    category: (*category).to_string(),
                    product_name_length: p.product_name_length,
                    product_description_length: p.product_description_length,
                    product_photos_qty: p.product_photos_qty,
                    product_weight_g: p.product_weight_g,
                    product_length_cm: p.product_length_cm,
                    product_height_cm: p.product_height_cm,
                    product_width_cm: p.product_width_cm,
                })
            })
            .collect()
    }

    /// Mean item price per product.
    pub fn price(&self) -> BTreeMap<String, Decimal> {
        let mut sums: BTreeMap<String, (Decimal, u32)> = BTreeMap::new();
        for item in &self.data.order_items {
            let entry = sums.entry(item.product_id.clone()).or_insert((Decimal::ZERO, 0));
            entry.0 += item.price;
            entry.1 += 1;
        }
        sums.into_iter()
            .map(|(id, (sum, n))| (id, sum / Decimal::from(n)))
            .collect()
    }

    /// Mean wait time of the delivered orders containing each product.
    pub fn wait_time(&self) -> BTreeMap<String, f64> {
        let waits: HashMap<String, i64> = OrderFeatures::new(self.data)
            .wait_times(true)
            .into_iter()
            .filter_map(|w| Some((w.order_id, w.wait_time?)))
            .collect();

        let mut per_product: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for (order_id, product_id) in self.order_product_pairs() {
            if let Some(&days) = waits.get(order_id) {
                per_product.entry(product_id.to_string()).or_default().push(days as f64);
            }
        }
        per_product
            .into_iter()
            .filter_map(|(id, days)| Some((id, mean(days)?)))
            .collect()
    }

    /// Review shares and mean score over the orders containing each product.
    pub fn review_score(&self) -> BTreeMap<String, ReviewSummary> {
        let reviews = self.data.reviews_by_order();

        let mut scores: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        for (order_id, product_id) in self.order_product_pairs() {
            for review in reviews.get(order_id).into_iter().flatten() {
                scores.entry(product_id.to_string()).or_default().push(review.review_score);
            }
        }
        scores
            .into_iter()
            .filter_map(|(id, s)| Some((id, summarise_reviews(&s)?)))
            .collect()
    }

    pub fn quantity(&self) -> BTreeMap<String, ProductQuantity> {
        let mut orders: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        let mut lines: BTreeMap<&str, usize> = BTreeMap::new();
        for item in &self.data.order_items {
            orders
                .entry(item.product_id.as_str())
                .or_default()
                .insert(item.order_id.as_str());
            *lines.entry(item.product_id.as_str()).or_insert(0) += 1;
        }
        lines
            .into_iter()
            .map(|(id, quantity)| {
                let n_orders = orders.get(id).map_or(0, BTreeSet::len);
                (id.to_string(), ProductQuantity { n_orders, quantity })
            })
            .collect()
    }

    /// Total item price per product.
    pub fn sales(&self) -> BTreeMap<String, Decimal> {
        let mut sales: BTreeMap<String, Decimal> = BTreeMap::new();
        for item in &self.data.order_items {
            *sales.entry(item.product_id.clone()).or_insert(Decimal::ZERO) += item.price;
        }
        sales
    }

    /// Sales fees collected per product.
    pub fn revenues(&self) -> BTreeMap<String, Decimal> {
        self.sales()
            .into_iter()
            .map(|(id, sales)| (id, sales * self.fees.sales_fee_rate))
            .collect()
    }

    /// Review cost attributed to each product, once per order it appears in.
    pub fn review_costs(&self) -> BTreeMap<String, Decimal> {
        let orders = self.data.orders_by_id();
        let reviews = self.data.reviews_by_order();

        let mut costs: BTreeMap<String, Decimal> = BTreeMap::new();
        for (order_id, product_id) in self.order_product_pairs() {
            if !orders.contains_key(order_id) {
                continue;
            }
            for review in reviews.get(order_id).into_iter().flatten() {
                *costs.entry(product_id.to_string()).or_insert(Decimal::ZERO) +=
                    self.fees.review_cost(review.review_score);
            }
        }
        costs
    }

    /// Inner join of every product feature, with `profits = revenues - cost`.
    pub fn training_data(&self) -> Vec<ProductTrainingRow> {
        let wait_time = self.wait_time();
        let price = self.price();
        let reviews = self.review_score();
        let quantity = self.quantity();
        let sales = self.sales();
        let revenues = self.revenues();
        let costs = self.review_costs();

        let rows: Vec<ProductTrainingRow> = self
            .product_details()
            .into_iter()
            .filter_map(|details| {
                let id = details.product_id.as_str();
                let wait_time = *wait_time.get(id)?;
                let price = *price.get(id)?;
                let reviews = *reviews.get(id)?;
                let quantity = *quantity.get(id)?;
                let sales = *sales.get(id)?;
                let revenues = *revenues.get(id)?;
                let cost = *costs.get(id)?;
                Some(ProductTrainingRow {
                    details,
                    wait_time,
                    price,
                    reviews,
                    quantity,
                    sales,
                    revenues,
                    cost,
                    profits: revenues - cost,
                })
            })
            .collect();

        debug!(products = rows.len(), "Product training data built");
        rows
    }

    /// Distinct (order, product) pairs.
    fn order_product_pairs(&self) -> BTreeSet<(&'a str, &'a str)> {
        self.data
            .order_items
            .iter()
            .map(|i| (i.order_id.as_str(), i.product_id.as_str()))
            .collect()
    }
}

/// Shares of one- and five-star reviews and the mean score.
pub(crate) fn summarise_reviews(scores: &[u8]) -> Option<ReviewSummary> {
    Some(ReviewSummary {
        share_of_one_stars: share(scores.iter().map(|&s| s == 1))?,
        share_of_five_stars: share(scores.iter().map(|&s| s == 5))?,
        review_score: mean(scores.iter().map(|&s| f64::from(s)))?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
