pub mod capture;
pub mod classifier;
