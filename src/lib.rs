//! OLIST WHAT-IF: seller profit optimisation for the Olist marketplace
//!
//! Library crate exposing the feature pipelines, the what-if scenario
//! engine and persistence for use by integration tests and the binary
//! entry point.

pub mod analysis;
pub mod config;
pub mod data;
pub mod storage;
pub mod types;
