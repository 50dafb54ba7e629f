//! Core types for Marigold Lane.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod state;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::to_paise;
pub use state::{DiscountType, OrderState, PaymentMethod, StatusParseError};
