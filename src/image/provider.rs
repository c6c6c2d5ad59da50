//! Image provider trait and utilities.

use crate::error::Result;
use crate::image::types::{
    CompositeRequest, GeneratedImage, GeneratedVariant, ImageProviderKind, UploadedImage,
};
use async_trait::async_trait;

/// Trait for image compositing providers.
///
/// Implementations hold no state across calls; concurrent calls issue
/// independent requests.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generates one composited image. Single attempt, no retry.
    async fn generate(&self, request: &CompositeRequest) -> Result<GeneratedImage>;

    /// Returns the kind of this provider.
    fn kind(&self) -> ImageProviderKind;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str {
        match self.kind() {
            ImageProviderKind::Gemini => "Gemini (Google)",
        }
    }

    /// Checks if the provider is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}

/// Convenience layer over [`ImageProvider`].
#[async_trait]
pub trait ImageProviderExt: ImageProvider {
    /// Composites `model_image` with `product_image` using the default
    /// instruction and returns the result as a gallery variant.
    async fn composite(
        &self,
        model_image: &UploadedImage,
        product_image: &UploadedImage,
    ) -> Result<GeneratedVariant> {
        let request = CompositeRequest::new(model_image.clone(), product_image.clone());
        let image = self.generate(&request).await?;
        tracing::debug!(
            provider = %self.kind(),
            size = image.size(),
            duration_ms = image.metadata.duration_ms,
            "composite generated"
        );
        Ok(GeneratedVariant::from(&image))
    }
}

impl<T: ImageProvider + ?Sized> ImageProviderExt for T {}
