//! # Guests Feature
//!
//! RSVP storage and lookup.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod book;

pub use book::{normalize_phone, GuestBook, GuestUpdate, NewGuest};
