pub mod cache;
pub mod comparables;
pub mod http_client;
pub mod market_data;
pub mod mock;
pub mod oracle;
pub mod persistence;

pub use persistence::FileModelStore;
