pub mod classifier;
pub mod exif_service;
pub mod image_source;
pub mod pipeline;
pub mod presentation;
pub mod spring;
