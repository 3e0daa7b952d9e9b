// Valuation pipeline stages
pub mod assembler;
pub mod calibrator;
pub mod combiner;
pub mod comparables;
pub mod explainer;
pub mod scaler;
pub mod uncertainty;

// Estimators and model lifecycle
pub mod estimators;
pub mod tracker;
pub mod training;

// Request orchestration
pub mod engine;
