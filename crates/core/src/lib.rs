//! `partsum-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, money, and the error model shared by the inventory domain and
//! the summary layer.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{LocationId, PartId, StockItemId};
pub use money::{CurrencyCode, Money};
pub use value_object::ValueObject;

/// Stock quantities are arbitrary-precision decimals (fractional units allowed).
pub type Quantity = rust_decimal::Decimal;
