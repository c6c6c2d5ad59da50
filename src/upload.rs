//! Upload boundary: local files in, base64 [`UploadedImage`]s out.

use crate::error::{ModelShotError, Result};
use crate::image::{ImageFormat, UploadedImage};
use std::path::Path;

/// Reads an image file from disk and encodes it for the core.
///
/// The MIME type comes from the extension, falling back to magic bytes.
/// Empty files and anything that is not a recognizable image are rejected.
pub async fn read_image(path: impl AsRef<Path>) -> Result<UploadedImage> {
    read_image_with_mime(path, None).await
}

/// Like [`read_image`], but trusts `declared_mime` when it is given.
///
/// Any `image/*` type is accepted as declared; other types are rejected.
pub async fn read_image_with_mime(
    path: impl AsRef<Path>,
    declared_mime: Option<&str>,
) -> Result<UploadedImage> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| upload_error(&name, e.to_string()))?;

    let image = encode_upload(&bytes, declared_mime, &name)?;
    tracing::debug!(
        name = %image.name,
        mime_type = %image.mime_type,
        bytes = bytes.len(),
        "image uploaded"
    );
    Ok(image)
}

/// Encodes raw upload bytes, honouring a declared MIME type when it names
/// an image.
pub fn encode_upload(bytes: &[u8], declared_mime: Option<&str>, name: &str) -> Result<UploadedImage> {
    if bytes.is_empty() {
        return Err(upload_error(name, "file is empty"));
    }

    let mime_type = match declared_mime {
        Some(mime) if mime.starts_with("image/") => mime.to_string(),
        Some(mime) => {
            return Err(upload_error(name, format!("'{mime}' is not an image type")));
        }
        None => infer_mime_type(name, bytes)
            .ok_or_else(|| upload_error(name, "not a recognised image format"))?
            .to_string(),
    };

    Ok(UploadedImage::from_bytes(bytes, mime_type, name))
}

/// Guesses the MIME type of an upload from its name, then its content.
pub fn infer_mime_type(name: &str, bytes: &[u8]) -> Option<&'static str> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .and_then(ImageFormat::from_extension)
        .or_else(|| ImageFormat::from_magic_bytes(bytes))
        .map(|f| f.mime_type())
}

fn upload_error(name: &str, reason: impl Into<String>) -> ModelShotError {
    ModelShotError::Upload {
        name: name.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_infer_mime_type() {
        assert_eq!(infer_mime_type("a.JPG", b"whatever"), Some("image/jpeg"));
        assert_eq!(infer_mime_type("noext", &PNG_MAGIC), Some("image/png"));
        assert_eq!(infer_mime_type("notes.txt", b"hello world!"), None);
    }

    #[test]
    fn test_encode_upload_declared_mime() {
        let image = encode_upload(b"abc", Some("image/gif"), "a.gif").unwrap();
        assert_eq!(image.mime_type, "image/gif");
        assert_eq!(image.data, "YWJj");

        let err = encode_upload(b"abc", Some("text/plain"), "a.txt").unwrap_err();
        assert_eq!(err.kind(), FailureKind::UploadDecode);
    }

    #[test]
    fn test_encode_upload_rejects_empty() {
        let err = encode_upload(&[], None, "empty.png").unwrap_err();
        assert!(matches!(err, ModelShotError::Upload { ref name, .. } if name == "empty.png"));
    }

    #[tokio::test]
    async fn test_read_image_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model");
        std::fs::write(&path, PNG_MAGIC).unwrap();

        let image = read_image(&path).await.unwrap();
        assert_eq!(image.name, "model");
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.decode().unwrap(), PNG_MAGIC.to_vec());
    }

    #[tokio::test]
    async fn test_read_heic_photo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.heic");
        std::fs::write(&path, b"\x00\x00\x00\x18ftypheic\x00\x00\x00\x00").unwrap();

        let image = read_image(&path).await.unwrap();
        assert_eq!(image.mime_type, "image/heic");

        let renamed = dir.path().join("photo");
        std::fs::rename(&path, &renamed).unwrap();
        let image = read_image(&renamed).await.unwrap();
        assert_eq!(image.mime_type, "image/heic");
    }

    #[tokio::test]
    async fn test_read_image_with_declared_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.avif");
        std::fs::write(&path, b"opaque avif bytes").unwrap();

        let err = read_image(&path).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::UploadDecode);

        let image = read_image_with_mime(&path, Some("image/avif")).await.unwrap();
        assert_eq!(image.mime_type, "image/avif");
        assert_eq!(image.name, "scan.avif");

        let err = read_image_with_mime(&path, Some("application/pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelShotError::Upload { ref reason, .. } if reason.contains("application/pdf")));
    }

    #[tokio::test]
    async fn test_read_image_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_image(dir.path().join("nope.png")).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::UploadDecode);
    }
}
