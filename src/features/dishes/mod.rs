//! # Dishes Feature
//!
//! Claims, requests, and admin edits of dishes.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod board;

pub use board::{ClaimRequest, DishBoard, DishUpdate, HostRequest, NewDish};
