//! Fetch-Through Module
//!
//! Loads cache misses from an external source.

mod fetcher;
mod through;

pub use fetcher::Fetcher;
pub use through::FetchingCache;
