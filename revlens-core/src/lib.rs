//! revlens core library — sentiment classification, aggregation, storage,
//! and chart export.
//!
//! The main entry points are [`analyze::SentimentAnalyzer`], which turns a
//! batch of review texts into a [`types::SentimentCounts`] summary via a
//! [`classifier::SentimentClassifier`], and [`store::ProductStore`], which
//! owns the durable per-product collection.

pub mod analyze;
pub mod classifier;
pub mod config;
pub mod error;
pub mod render;
pub mod store;
pub mod types;
