//! Core traits for animatch providers.

mod embedder;
mod image_generator;
mod recognizer;

pub use embedder::*;
pub use image_generator::*;
pub use recognizer::*;
