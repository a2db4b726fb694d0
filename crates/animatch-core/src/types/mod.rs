//! Core types for animatch.

mod analysis;
mod character;
mod image;
mod suggestions;

pub use analysis::*;
pub use character::*;
pub use image::{detect_mime_type, parse_data_uri, ImageInput, InlineImage, DEFAULT_MIME_TYPE};
pub use suggestions::*;
