pub mod landmark;
pub mod metrics;
pub mod profile;
