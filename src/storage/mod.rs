//! Persistence layer.
//!
//! Reads dataset snapshots and seller tables from JSON files and writes
//! seller tables and what-if reports back out.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use crate::analysis::WhatIfReport;
use crate::data::{Dataset, SellerTrainingRow};
use crate::types::RawSellerRow;

/// Load a marketplace snapshot.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let dataset: Dataset = read_json(path)?;
    info!(
        path = %path.display(),
        orders = dataset.orders.len(),
        items = dataset.order_items.len(),
        reviews = dataset.order_reviews.len(),
        sellers = dataset.sellers.len(),
        products = dataset.products.len(),
        "Dataset loaded"
    );
    Ok(dataset)
}

/// Load a seller table. Rows are checked by the engine, not here.
pub fn load_seller_table(path: &Path) -> Result<Vec<RawSellerRow>> {
    let rows: Vec<RawSellerRow> = read_json(path)?;
    info!(path = %path.display(), sellers = rows.len(), "Seller table loaded");
    Ok(rows)
}

pub fn save_seller_table(rows: &[SellerTrainingRow], path: &Path) -> Result<()> {
    write_json(rows, path)?;
    info!(path = %path.display(), sellers = rows.len(), "Seller table saved");
    Ok(())
}

pub fn save_report(report: &WhatIfReport, path: &Path) -> Result<()> {
    write_json(report, path)?;
    info!(path = %path.display(), run_id = %report.run_id, "Report saved");
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
}

fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise JSON")?;
    std::fs::write(path, &json)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    debug!(path = %path.display(), bytes = json.len(), "JSON written");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
