//! Infrastructure layer: order/delivery stores and database wiring.

pub mod db;
pub mod store;

pub use store::{
    CommittedExport, CsvRenderer, DeliveryStore, OrderStore, StoreError,
    in_memory::{InMemoryDeliveryStore, InMemoryOrderStore},
    postgres::{PostgresDeliveryStore, PostgresOrderStore},
};
