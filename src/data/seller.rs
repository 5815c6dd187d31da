//! Per-seller features and seller economics.
//!
//! `SellerFeatures::training_data` produces the seller table consumed by
//! the what-if engine: one row per seller with `profits` (fees earned
//! minus review costs) and `number_of_items`.

use chrono::NaiveDateTime;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info};

use super::product::{summarise_reviews, ReviewSummary};
use super::{fractional_days, mean, Dataset, FeeSchedule, AVG_MONTH_DAYS};
use crate::types::SellerEconomics;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerProfile {
    pub seller_id: String,
    pub seller_city: String,
    pub seller_state: String,
}

/// Shipping performance, in fractional days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SellerDelayWait {
    /// Mean lateness handing items to the carrier, floored at 0.
    pub delay_to_carrier: f64,
    /// Mean purchase-to-delivery time. `None` without delivery dates.
    pub wait_time: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SellerActiveDates {
    pub date_first_sale: NaiveDateTime,
    pub date_last_sale: NaiveDateTime,
    pub months_on_olist: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SellerQuantity {
    pub n_orders: usize,
    pub quantity: usize,
    pub quantity_per_order: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SellerRevenues {
    pub sales_fees: Decimal,
    pub subscription_fees: Decimal,
    pub revenues: Decimal,
}

/// Joined per-seller feature row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerTrainingRow {
    pub seller_id: String,
    pub seller_city: String,
    pub seller_state: String,
    #[serde(flatten)]
    pub delay: SellerDelayWait,
    #[serde(flatten)]
    pub active: SellerActiveDates,
    #[serde(flatten)]
    pub quantity: SellerQuantity,
    pub sales: Decimal,
    #[serde(flatten)]
    pub revenues: SellerRevenues,
    /// Review-driven cost.
    pub cost: Decimal,
    pub number_of_items: u64,
    pub profits: Decimal,
    #[serde(flatten)]
    pub reviews: ReviewSummary,
}

impl SellerEconomics for SellerTrainingRow {
    fn seller_id(&self) -> &str {
        &self.seller_id
    }

    fn profits(&self) -> Option<f64> {
        self.profits.to_f64()
    }

    fn number_of_items(&self) -> Option<u64> {
        Some(self.number_of_items)
    }
}

pub struct SellerFeatures<'a> {
    data: &'a Dataset,
    fees: FeeSchedule,
}

impl<'a> SellerFeatures<'a> {
    pub fn new(data: &'a Dataset, fees: FeeSchedule) -> Self {
        Self { data, fees }
    }

    /// Seller location, one row per seller id (first occurrence wins).
    pub fn seller_features(&self) -> BTreeMap<String, SellerProfile> {
        let mut profiles = BTreeMap::new();
        for s in &self.data.sellers {
            profiles.entry(s.seller_id.clone()).or_insert_with(|| SellerProfile {
                seller_id: s.seller_id.clone(),
                seller_city: s.seller_city.clone(),
                seller_state: s.seller_state.clone(),
            });
        }
        profiles
    }

    /// Carrier delay and customer wait over items of delivered orders.
    pub fn delay_wait_time(&self) -> BTreeMap<String, SellerDelayWait> {
        let orders = self.data.orders_by_id();

        let mut delays: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        let mut waits: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for item in &self.data.order_items {
            let Some(order) = orders.get(item.order_id.as_str()).filter(|o| o.is_delivered()) else {
                continue;
            };
            let seller = item.seller_id.as_str();
            let seller_delays = delays.entry(seller).or_default();
            if let Some(carrier) = order.order_delivered_carrier_date {
                seller_delays.push(fractional_days(carrier, item.shipping_limit_date));
            }
            let seller_waits = waits.entry(seller).or_default();
            if let Some(delivered) = order.order_delivered_customer_date {
                seller_waits.push(fractional_days(delivered, order.order_purchase_timestamp));
            }
        }

        delays
            .into_iter()
            .map(|(seller, d)| {
                let delay_to_carrier = mean(d).filter(|days| *days > 0.0).unwrap_or(0.0);
                let wait_time = waits.remove(seller).and_then(|w| mean(w));
                (
                    seller.to_string(),
                    SellerDelayWait {
                        delay_to_carrier,
                        wait_time,
                    },
                )
            })
            .collect()
    }

    /// First and last approved sale, and the months between them.
    pub fn active_dates(&self) -> BTreeMap<String, SellerActiveDates> {
        let orders = self.data.orders_by_id();

        let mut spans: BTreeMap<&str, (NaiveDateTime, NaiveDateTime)> = BTreeMap::new();
        for item in &self.data.order_items {
            let Some(approved) = orders
                .get(item.order_id.as_str())
                .and_then(|o| o.order_approved_at)
            else {
                continue;
            };
            spans
                .entry(item.seller_id.as_str())
                .and_modify(|(first, last)| {
                    *first = (*first).min(approved);
                    *last = (*last).max(approved);
                })
                .or_insert((approved, approved));
        }

        spans
            .into_iter()
            .map(|(seller, (first, last))| {
                let months = (fractional_days(last, first) / AVG_MONTH_DAYS).round_ties_even();
                (
                    seller.to_string(),
                    SellerActiveDates {
                        date_first_sale: first,
                        date_last_sale: last,
                        months_on_olist: months as u32,
                    },
                )
            })
            .collect()
    }

    pub fn quantity(&self) -> BTreeMap<String, SellerQuantity> {
        let mut orders: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        let mut lines: BTreeMap<&str, usize> = BTreeMap::new();
        for item in &self.data.order_items {
            orders
                .entry(item.seller_id.as_str())
                .or_default()
                .insert(item.order_id.as_str());
            *lines.entry(item.seller_id.as_str()).or_insert(0) += 1;
        }
        lines
            .into_iter()
            .map(|(seller, quantity)| {
                let n_orders = orders.get(seller).map_or(0, BTreeSet::len);
                let quantity_per_order = if n_orders > 0 {
                    quantity as f64 / n_orders as f64
                } else {
                    0.0
                };
                (
                    seller.to_string(),
                    SellerQuantity {
                        n_orders,
                        quantity,
                        quantity_per_order,
                    },
                )
            })
            .collect()
    }

    /// Items sold per seller.
    pub fn number_of_items(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for item in &self.data.order_items {
            *counts.entry(item.seller_id.clone()).or_insert(0_u64) += 1;
        }
        counts
    }

    /// Total item price per seller.
    pub fn sales(&self) -> BTreeMap<String, Decimal> {
        let mut sales: BTreeMap<String, Decimal> = BTreeMap::new();
        for item in &self.data.order_items {
            *sales.entry(item.seller_id.clone()).or_insert(Decimal::ZERO) += item.price;
        }
        sales
    }

    /// Sales fees plus monthly subscription fees, for sellers with at
    /// least one approved sale.
    pub fn revenues(&self) -> BTreeMap<String, SellerRevenues> {
        let orders = self.data.orders_by_id();
        let mut sold: BTreeMap<&str, Decimal> = BTreeMap::new();
        for item in &self.data.order_items {
            if orders.contains_key(item.order_id.as_str()) {
                *sold.entry(item.seller_id.as_str()).or_insert(Decimal::ZERO) += item.price;
            }
        }

        let active = self.active_dates();
        sold.into_iter()
            .filter_map(|(seller, price)| {
                let months = active.get(seller)?.months_on_olist;
                let sales_fees = price * self.fees.sales_fee_rate;
                let subscription_fees = Decimal::from(months) * self.fees.subscription_fee_per_month;
                Some((
                    seller.to_string(),
                    SellerRevenues {
                        sales_fees,
                        subscription_fees,
                        revenues: sales_fees + subscription_fees,
                    },
                ))
            })
            .collect()
    }

    /// Review cost per seller, counted once per (order, seller).
    pub fn cost_of_reviews(&self) -> BTreeMap<String, Decimal> {
        let orders = self.data.orders_by_id();
        let reviews = self.data.reviews_by_order();
        let pairs: BTreeSet<(&str, &str)> = self
            .data
            .order_items
            .iter()
            .map(|i| (i.order_id.as_str(), i.seller_id.as_str()))
            .collect();

        let mut costs: BTreeMap<String, Decimal> = BTreeMap::new();
        for (order_id, seller_id) in pairs {
            if !orders.contains_key(order_id) {
                continue;
            }
            for review in reviews.get(order_id).into_iter().flatten() {
                *costs.entry(seller_id.to_string()).or_insert(Decimal::ZERO) +=
                    self.fees.review_cost(review.review_score);
            }
        }
        costs
    }

    /// Review shares and mean score, weighted by item lines.
    pub fn review_score(&self) -> BTreeMap<String, ReviewSummary> {
        let orders = self.data.orders_by_id();
        let reviews = self.data.reviews_by_order();
        let known: HashSet<&str> = self.data.sellers.iter().map(|s| s.seller_id.as_str()).collect();

        let mut scores: BTreeMap<&str, Vec<u8>> = BTreeMap::new();
        for item in &self.data.order_items {
            let seller = item.seller_id.as_str();
            if !known.contains(seller) || !orders.contains_key(item.order_id.as_str()) {
                continue;
            }
            for review in reviews.get(item.order_id.as_str()).into_iter().flatten() {
                scores.entry(seller).or_default().push(review.review_score);
            }
        }
        scores
            .into_iter()
            .filter_map(|(seller, s)| Some((seller.to_string(), summarise_reviews(&s)?)))
            .collect()
    }

    /// Inner join of every seller feature, with `profits = revenues - cost`.
    pub fn training_data(&self) -> Vec<SellerTrainingRow> {
        let delay = self.delay_wait_time();
        let active = self.active_dates();
        let quantity = self.quantity();
        let sales = self.sales();
        let revenues = self.revenues();
        let costs = self.cost_of_reviews();
        let items = self.number_of_items();
        let reviews = self.review_score();

        let rows: Vec<SellerTrainingRow> = self
            .seller_features()
            .into_values()
            .filter_map(|profile| {
                let id = profile.seller_id.as_str();
                let delay = *delay.get(id)?;
                let active = *active.get(id)?;
                let quantity = *quantity.get(id)?;
                let sales = *sales.get(id)?;
                let revenues = *revenues.get(id)?;
                let cost = *costs.get(id)?;
                let number_of_items = *items.get(id)?;
                let reviews = *reviews.get(id)?;
                Some(SellerTrainingRow {
                    profits: revenues.revenues - cost,
                    seller_id: profile.seller_id,
                    seller_city: profile.seller_city,
                    seller_state: profile.seller_state,
                    delay,
                    active,
                    quantity,
                    sales,
                    revenues,
                    cost,
                    number_of_items,
                    reviews,
                })
            })
            .collect();

        info!(
            sellers_in = self.data.sellers.len(),
            sellers_out = rows.len(),
            "Seller training data built"
        );
        debug!(
            total_profits = %rows.iter().map(|r| r.profits).sum::<Decimal>(),
            "Seller profits aggregated"
        );
        rows
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
