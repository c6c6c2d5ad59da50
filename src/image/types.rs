//! Core types for image compositing.

use crate::error::{ModelShotError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Instruction sent ahead of the two images in every compositing request.
pub const COMPOSITE_PROMPT: &str = "The first image shows a model and the second image shows a \
product. Create a new photorealistic image in which the model from the first image is wearing \
or using the product from the second image. The final image must be a realistic photo of the \
model with the product on a clean background, suitable for e-commerce.";

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
    /// HEIC (HEVC-coded HEIF), as produced by phone cameras.
    Heic,
    /// Generic HEIF container.
    Heif,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Heic => "heic",
            Self::Heif => "heif",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Heic => "image/heic",
            Self::Heif => "image/heif",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "heic" => Some(Self::Heic),
            "heif" => Some(Self::Heif),
            _ => None,
        }
    }

    /// Maps a MIME type onto a known format.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            "image/heic" => Some(Self::Heic),
            "image/heif" => Some(Self::Heif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        // HEIF family: ....ftyp<brand>
        if &data[4..8] == b"ftyp" {
            match &data[8..12] {
                b"heic" | b"heix" | b"hevc" | b"hevx" | b"heim" | b"heis" => {
                    return Some(Self::Heic)
                }
                b"mif1" | b"msf1" | b"heif" => return Some(Self::Heif),
                _ => {}
            }
        }

        None
    }
}

/// Image provider kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageProviderKind {
    /// Google Gemini image models.
    Gemini,
}

impl std::fmt::Display for ImageProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
        }
    }
}

/// Metadata about the generation process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Seed used (if deterministic).
    pub seed: Option<u64>,
    /// Generation duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// One user-supplied image, base64-encoded and held in memory.
///
/// Field names on the wire match the browser gallery format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    /// Base64 payload (no data URI prefix).
    #[serde(rename = "base64")]
    pub data: String,
    /// Declared MIME type.
    pub mime_type: String,
    /// Original file name.
    pub name: String,
}

impl UploadedImage {
    /// Encodes raw file bytes.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            mime_type: mime_type.into(),
            name: name.into(),
        }
    }

    /// Decodes the payload back to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| ModelShotError::Decode(format!("{}: {e}", self.name)))
    }

    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// One generated result, embedded as a data URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedVariant {
    /// `data:<mime>;base64,<payload>`
    pub image_url: String,
}

impl GeneratedVariant {
    /// Wraps an existing data URI.
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
        }
    }

    /// Returns the MIME type declared in the data URI.
    pub fn mime_type(&self) -> Option<&str> {
        let rest = self.image_url.strip_prefix("data:")?;
        rest.split(';').next().filter(|m| !m.is_empty())
    }

    /// Decodes the embedded image bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let payload = self
            .image_url
            .find(";base64,")
            .map(|pos| &self.image_url[pos + 8..])
            .ok_or_else(|| ModelShotError::Decode("variant is not a base64 data URI".into()))?;
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| ModelShotError::Decode(e.to_string()))
    }
}

impl From<&GeneratedImage> for GeneratedVariant {
    fn from(image: &GeneratedImage) -> Self {
        Self::new(image.to_data_url())
    }
}

/// A request to composite a model image with a product image.
#[derive(Debug, Clone)]
pub struct CompositeRequest {
    /// Instruction text sent before the images.
    pub prompt: String,
    /// The person wearing or using the product.
    pub model_image: UploadedImage,
    /// The product to place on the model.
    pub product_image: UploadedImage,
    /// Seed for deterministic generation.
    pub seed: Option<u64>,
}

impl CompositeRequest {
    /// Creates a request with the default compositing instruction.
    pub fn new(model_image: UploadedImage, product_image: UploadedImage) -> Self {
        Self {
            prompt: COMPOSITE_PROMPT.to_string(),
            model_image,
            product_image,
            seed: None,
        }
    }

    /// Replaces the instruction text.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Sets the seed for deterministic generation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// A generated image with its data and metadata.
#[derive(Debug, Clone)]
#[must_use = "generated image should be saved or processed"]
pub struct GeneratedImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Image format.
    pub format: ImageFormat,
    /// Provider that generated this image.
    pub provider: ImageProviderKind,
    /// Generation metadata.
    pub metadata: GenerationMetadata,
}

impl GeneratedImage {
    /// Creates a new generated image.
    pub fn new(
        data: Vec<u8>,
        format: ImageFormat,
        provider: ImageProviderKind,
        metadata: GenerationMetadata,
    ) -> Self {
        Self {
            data,
            format,
            provider,
            metadata,
        }
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            self.to_base64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";
    const HEIC_MAGIC: [u8; 12] = *b"\x00\x00\x00\x18ftypheic";
    const HEIF_MAGIC: [u8; 12] = *b"\x00\x00\x00\x18ftypmif1";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&WEBP_MAGIC),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"short"), None);
    }

    #[test]
    fn test_heif_family_detection() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&HEIC_MAGIC),
            Some(ImageFormat::Heic)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&HEIF_MAGIC),
            Some(ImageFormat::Heif)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(b"\x00\x00\x00\x18ftypisom"),
            None
        );
        assert_eq!(ImageFormat::from_extension("HEIC"), Some(ImageFormat::Heic));
        assert_eq!(ImageFormat::Heif.mime_type(), "image/heif");
        assert_eq!(
            ImageFormat::from_mime_type("image/heic"),
            Some(ImageFormat::Heic)
        );
    }

    #[test]
    fn test_format_from_mime_type() {
        assert_eq!(
            ImageFormat::from_mime_type("image/JPEG"),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::from_mime_type("text/plain"), None);
    }

    #[test]
    fn test_uploaded_image_wire_names() {
        let image = UploadedImage::from_bytes(b"abc", "image/png", "a.png");
        let json = serde_json::to_value(&image).unwrap();
        assert_eq!(json["base64"], "YWJj");
        assert_eq!(json["mimeType"], "image/png");
        assert_eq!(json["name"], "a.png");
        assert_eq!(image.decode().unwrap(), b"abc");
        assert_eq!(image.to_data_url(), "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_variant_from_generated_image() {
        let image = GeneratedImage::new(
            PNG_MAGIC.to_vec(),
            ImageFormat::Png,
            ImageProviderKind::Gemini,
            GenerationMetadata::default(),
        );
        let variant = GeneratedVariant::from(&image);
        assert!(variant.image_url.starts_with("data:image/png;base64,"));
        assert_eq!(variant.mime_type(), Some("image/png"));
        assert_eq!(variant.decode().unwrap(), PNG_MAGIC.to_vec());

        let json = serde_json::to_value(&variant).unwrap();
        assert!(json.get("imageUrl").is_some());
    }

    #[test]
    fn test_variant_decode_rejects_plain_url() {
        let variant = GeneratedVariant::new("https://example.com/a.png");
        assert!(matches!(variant.decode(), Err(ModelShotError::Decode(_))));
        assert_eq!(variant.mime_type(), None);
    }

    #[test]
    fn test_composite_request_defaults() {
        let model = UploadedImage::from_bytes(b"m", "image/png", "m.png");
        let product = UploadedImage::from_bytes(b"p", "image/jpeg", "p.jpg");
        let req = CompositeRequest::new(model, product).with_seed(7);
        assert_eq!(req.prompt, COMPOSITE_PROMPT);
        assert_eq!(req.seed, Some(7));
        assert!(req.prompt.contains("e-commerce"));

        let req = req.with_prompt("Studio lighting, white backdrop");
        assert_eq!(req.prompt, "Studio lighting, white backdrop");
    }

    #[test]
    fn test_provider_kind_display() {
        assert_eq!(ImageProviderKind::Gemini.to_string(), "gemini");
    }
}
