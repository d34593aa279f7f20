//! # Balance Feature
//!
//! Per-category progress toward the host's dish targets.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod calculator;

pub use calculator::{
    calculate_balance, most_needed_category, needed_categories, total_servings, CategoryBalance,
};
