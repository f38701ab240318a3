//! Contains the types and functions for the high level pipeline builder API.

mod image_pipeline;

pub use image_pipeline::ImagePipeline;
