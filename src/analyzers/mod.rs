//! Country metrics computation and ranking.
//!
//! This module validates raw per-country series, derives normalized
//! vaccination totals, rolling cumulative incidence and the progress score,
//! and collects the results into a [`catalog::MetricsCatalog`].

pub mod analyzer;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod types;
pub mod utility;
