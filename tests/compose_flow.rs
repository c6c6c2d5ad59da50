//! End-to-end: upload two files, composite against a stub Gemini endpoint,
//! save, and reload the gallery from disk.

#![cfg(feature = "gemini")]

use modelshot::gallery::{FileBackend, GalleryStore, StorageBackend, GALLERY_KEY};
use modelshot::{upload, FailureKind, GeminiProvider, GeneratedVariant, Studio};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];

fn image_response(data: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "candidates": [{"content": {"parts": [
            {"inlineData": {"mimeType": "image/png", "data": data}}
        ]}, "finishReason": "STOP"}]
    }))
}

async fn stub_gemini(responses: &[&str]) -> MockServer {
    let server = MockServer::start().await;
    for data in responses {
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash-image:generateContent"))
            .respond_with(image_response(data))
            .up_to_n_times(1)
            .mount(&server)
            .await;
    }
    server
}

fn provider(server: &MockServer) -> GeminiProvider {
    GeminiProvider::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .build()
        .unwrap()
}

#[tokio::test]
async fn compose_save_and_append() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("model.jpg");
    let product_path = dir.path().join("product.png");
    std::fs::write(&model_path, JPEG_MAGIC).unwrap();
    std::fs::write(&product_path, PNG_MAGIC).unwrap();

    // "C" and "D" as two distinct results.
    let server = stub_gemini(&["iVBORw0KGgoAAAAB", "iVBORw0KGgoAAAAC"]).await;
    let provider = provider(&server);
    let store_dir = dir.path().join("store");

    let mut studio = Studio::open(GalleryStore::new(FileBackend::new(&store_dir)));
    let session_id = studio.upload_model(upload::read_image(&model_path).await.unwrap());
    studio
        .upload_product(upload::read_image(&product_path).await.unwrap())
        .unwrap();

    let first: GeneratedVariant = studio.generate(&provider).await.unwrap().clone();
    studio.save().unwrap();
    assert_eq!(studio.gallery().len(), 1);
    assert_eq!(studio.gallery()[0].variants, vec![first.clone()]);

    let second: GeneratedVariant = studio.generate(&provider).await.unwrap().clone();
    assert_ne!(first, second);
    studio.save().unwrap();

    let reloaded = GalleryStore::new(FileBackend::new(&store_dir)).load();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded[0].id, session_id);
    assert_eq!(reloaded[0].variants, vec![first, second]);
    assert_eq!(reloaded[0].model_image.mime_type, "image/jpeg");
    assert_eq!(reloaded[0].product_image.name, "product.png");
}

#[tokio::test]
async fn generation_failure_leaves_store_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": []
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let backend = FileBackend::new(dir.path());
    let mut studio = Studio::open(GalleryStore::new(backend.clone()));
    studio.upload_model(upload::encode_upload(&JPEG_MAGIC, None, "model.jpg").unwrap());
    studio
        .upload_product(upload::encode_upload(&PNG_MAGIC, None, "product.png").unwrap())
        .unwrap();

    let err = studio.generate(&provider(&server)).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Generation);
    assert_eq!(studio.save().unwrap_err().kind(), FailureKind::Input);
    assert!(backend.read(GALLERY_KEY).unwrap().is_none());
}

#[tokio::test]
async fn corrupt_gallery_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileBackend::new(dir.path());
    std::fs::write(backend.slot_path(GALLERY_KEY), "]]not json[[").unwrap();

    let studio = Studio::open(GalleryStore::new(backend));
    assert!(studio.gallery().is_empty());
}
