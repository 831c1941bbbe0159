//! `opsdesk-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod date_range;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use date_range::DateRange;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{DeliveryId, LineId, OrderId};
pub use value_object::ValueObject;
