pub mod controller;
pub mod detectors;
pub mod estimators;
pub mod filters;
pub mod metrics;
pub mod stress;
pub mod window;
