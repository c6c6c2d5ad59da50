//! Image compositing module.

mod provider;
pub mod providers;
mod types;

pub use provider::{ImageProvider, ImageProviderExt};
pub use types::{
    CompositeRequest, GeneratedImage, GeneratedVariant, GenerationMetadata, ImageFormat,
    ImageProviderKind, UploadedImage, COMPOSITE_PROMPT,
};
