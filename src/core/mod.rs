pub mod aggregator;
pub mod identify;
pub mod sanitizer;
pub mod set_codes;
pub mod worker_pool;

pub use crate::domain::model::{AggregateResponse, Candidate, LookupQuery, LookupResult};
pub use crate::domain::ports::{CardLookup, OcrGateway, StructuringGateway};
pub use crate::utils::error::Result;
