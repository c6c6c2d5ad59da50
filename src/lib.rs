#![warn(missing_docs)]
//! modelshot - put a product on a model with AI image generation.
//!
//! Upload a model photo and a product photo, let Gemini composite them
//! into an e-commerce shot, and keep the results in a local gallery.
//!
//! # Quick Start
//!
//! ```no_run
//! use modelshot::gallery::{FileBackend, GalleryStore};
//! use modelshot::{upload, GeminiProvider, Studio};
//!
//! #[tokio::main]
//! async fn main() -> modelshot::Result<()> {
//!     let provider = GeminiProvider::builder().build()?;
//!     let mut studio = Studio::open(GalleryStore::new(FileBackend::new(".modelshot")));
//!
//!     studio.upload_model(upload::read_image("model.jpg").await?);
//!     studio.upload_product(upload::read_image("bag.png").await?)?;
//!     let variant = studio.generate(&provider).await?;
//!     println!("{} bytes", variant.decode()?.len());
//!
//!     studio.save()?;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `gemini`: Gemini (Google) provider
//! - `cli`: Command-line interface

mod error;

pub mod gallery;
pub mod image;
pub mod studio;
pub mod upload;

// Re-export error types at crate root
pub use error::{FailureKind, ModelShotError, Result};

pub use gallery::{GalleryStore, Session};
pub use image::{
    CompositeRequest, GeneratedImage, GeneratedVariant, GenerationMetadata, ImageFormat,
    ImageProvider, ImageProviderExt, ImageProviderKind, UploadedImage,
};
pub use studio::Studio;

#[cfg(feature = "gemini")]
pub use image::providers::{GeminiModel, GeminiProvider, GeminiProviderBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{ModelShotError, Result};
    pub use crate::gallery::{FileBackend, GalleryStore, MemoryBackend, Session};
    pub use crate::image::{GeneratedVariant, ImageProvider, ImageProviderExt, UploadedImage};
    pub use crate::studio::Studio;

    #[cfg(feature = "gemini")]
    pub use crate::image::providers::GeminiProvider;
}
