//! Read/write facade over the aggregated price state

pub mod price_service;

pub use price_service::PriceService;
