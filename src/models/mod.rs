pub mod capture_types;
pub mod classify_types;
pub mod presentation_types;
