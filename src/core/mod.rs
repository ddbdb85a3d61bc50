pub mod aggregator;
pub mod demo;
pub mod export;
pub mod fpds_feed;
pub mod normalize;
pub mod query_builder;

pub use crate::domain::model::{
    FpdsContractRecord, FpdsFeedPage, FpdsQueryFilters, Platform, PlatformSolicitation,
    SearchFilters, SearchOutcome,
};
pub use crate::domain::ports::{SolicitationProvider, Storage};
pub use crate::utils::error::Result;
