pub mod error;
pub mod feature;
pub mod region;
pub mod query;
pub mod plan;
pub mod enrich;
pub mod export;
