// Asset and sale records
pub mod asset;

// Domain-specific error types
pub mod errors;

// Feature registry and vector
pub mod features;

// Market snapshot types
pub mod market;

// Port interfaces for external collaborators
pub mod ports;

// Valuation pipeline types
pub mod valuation;
