//! Saved sessions and the in-memory gallery operations.

use crate::image::{GeneratedVariant, UploadedImage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One model/product pair plus every variant saved for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Minted when the model image is uploaded.
    pub id: Uuid,
    /// The person wearing or using the product.
    #[serde(rename = "modelImageFile")]
    pub model_image: UploadedImage,
    /// The product.
    #[serde(rename = "productImageFile")]
    pub product_image: UploadedImage,
    /// Oldest first.
    #[serde(rename = "generatedImages")]
    pub variants: Vec<GeneratedVariant>,
    /// When the session was first saved.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Starts a session holding a single variant.
    pub fn new(
        id: Uuid,
        model_image: UploadedImage,
        product_image: UploadedImage,
        variant: GeneratedVariant,
    ) -> Self {
        Self {
            id,
            model_image,
            product_image,
            variants: vec![variant],
            created_at: Utc::now(),
        }
    }
}

/// Appends `variant` to the session with `session_id`, or prepends a new
/// session if none exists.
///
/// Matching is by id only; the images are used only when creating.
pub fn upsert_variant(
    mut sessions: Vec<Session>,
    session_id: Uuid,
    model_image: &UploadedImage,
    product_image: &UploadedImage,
    variant: GeneratedVariant,
) -> Vec<Session> {
    if let Some(existing) = sessions.iter_mut().find(|s| s.id == session_id) {
        existing.variants.push(variant);
        tracing::debug!(
            session_id = %session_id,
            variants = existing.variants.len(),
            "variant appended"
        );
        return sessions;
    }

    let session = Session::new(
        session_id,
        model_image.clone(),
        product_image.clone(),
        variant,
    );
    sessions.insert(0, session);
    tracing::debug!(session_id = %session_id, "session created");
    sessions
}

/// Drops the session with `session_id`; absent ids are ignored.
pub fn remove(mut sessions: Vec<Session>, session_id: Uuid) -> Vec<Session> {
    sessions.retain(|s| s.id != session_id);
    sessions
}

/// Looks up a session by id.
pub fn find(sessions: &[Session], session_id: Uuid) -> Option<&Session> {
    sessions.iter().find(|s| s.id == session_id)
}
