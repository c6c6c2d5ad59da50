//! Application state for one compositing session.
//!
//! A [`Studio`] holds what a user is working on (the current image pair,
//! the session id minted for it, the last generated variant) together
//! with the in-memory gallery and the store it is persisted to. Every
//! user action is a method; failures come back as [`ModelShotError`]s
//! whose [`kind`](ModelShotError::kind) tells the caller how to report
//! them.

use crate::error::{ModelShotError, Result};
use crate::gallery::{self, GalleryStore, Session};
use crate::image::{GeneratedVariant, ImageProvider, ImageProviderExt, UploadedImage};
use uuid::Uuid;

/// Current work plus the gallery.
pub struct Studio {
    store: GalleryStore,
    sessions: Vec<Session>,
    session_id: Option<Uuid>,
    model_image: Option<UploadedImage>,
    product_image: Option<UploadedImage>,
    last_variant: Option<GeneratedVariant>,
    saved: bool,
}

impl Studio {
    /// Loads the gallery from `store`.
    pub fn open(store: GalleryStore) -> Self {
        let sessions = store.load();
        tracing::info!(sessions = sessions.len(), "studio opened");
        Self {
            store,
            sessions,
            session_id: None,
            model_image: None,
            product_image: None,
            last_variant: None,
            saved: false,
        }
    }

    /// Saved sessions, newest first.
    pub fn gallery(&self) -> &[Session] {
        &self.sessions
    }

    /// Id of the session new variants are saved into.
    pub fn current_session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    /// Current model image.
    pub fn model_image(&self) -> Option<&UploadedImage> {
        self.model_image.as_ref()
    }

    /// Current product image.
    pub fn product_image(&self) -> Option<&UploadedImage> {
        self.product_image.as_ref()
    }

    /// Most recent generation result, saved or not.
    pub fn last_variant(&self) -> Option<&GeneratedVariant> {
        self.last_variant.as_ref()
    }

    /// Whether the last variant has been written to the gallery.
    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Starts a new session around `image`.
    ///
    /// Clears the product image and any result, and mints a fresh id.
    pub fn upload_model(&mut self, image: UploadedImage) -> Uuid {
        let id = Uuid::new_v4();
        tracing::info!(session_id = %id, name = %image.name, "model image set");
        self.session_id = Some(id);
        self.model_image = Some(image);
        self.product_image = None;
        self.last_variant = None;
        self.saved = false;
        id
    }

    /// Sets the product image. Requires a model image.
    pub fn upload_product(&mut self, image: UploadedImage) -> Result<()> {
        if self.model_image.is_none() {
            return Err(ModelShotError::MissingInput(
                "upload the model image first".into(),
            ));
        }
        tracing::info!(name = %image.name, "product image set");
        self.product_image = Some(image);
        Ok(())
    }

    /// Continues a saved session: its pair becomes current and later saves
    /// append to it.
    pub fn resume(&mut self, session_id: Uuid) -> Result<()> {
        let session = gallery::find(&self.sessions, session_id).ok_or_else(|| {
            ModelShotError::MissingInput(format!("no saved session {session_id}"))
        })?;
        self.model_image = Some(session.model_image.clone());
        self.product_image = Some(session.product_image.clone());
        self.session_id = Some(session_id);
        self.last_variant = None;
        self.saved = false;
        tracing::info!(session_id = %session_id, "session resumed");
        Ok(())
    }

    /// Composites the current pair with `provider`.
    ///
    /// The previous result is discarded before the call; nothing is kept if
    /// the call fails.
    pub async fn generate<P>(&mut self, provider: &P) -> Result<&GeneratedVariant>
    where
        P: ImageProvider + ?Sized,
    {
        let (Some(model), Some(product)) = (&self.model_image, &self.product_image) else {
            return Err(ModelShotError::MissingInput(
                "both a model image and a product image are required".into(),
            ));
        };

        self.last_variant = None;
        self.saved = false;

        let variant = provider.composite(model, product).await.inspect_err(|e| {
            tracing::warn!(provider = provider.name(), "generation failed: {e}");
        })?;
        Ok(self.last_variant.insert(variant))
    }

    /// Saves the last variant into the current session and persists the
    /// gallery.
    ///
    /// Saving the same result twice changes nothing: the second call returns
    /// the session id without appending. This is stricter than
    /// [`upsert_variant`](crate::gallery::upsert_variant), which appends on
    /// every call, and than a browser Save button, which appends on every
    /// click. Generate again to get a new result to save.
    pub fn save(&mut self) -> Result<Uuid> {
        let (Some(id), Some(model), Some(product), Some(variant)) = (
            self.session_id,
            &self.model_image,
            &self.product_image,
            &self.last_variant,
        ) else {
            return Err(ModelShotError::MissingInput(
                "nothing generated to save yet".into(),
            ));
        };

        if self.saved {
            tracing::debug!(session_id = %id, "result already saved");
            return Ok(id);
        }

        let sessions = std::mem::take(&mut self.sessions);
        self.sessions = gallery::upsert_variant(sessions, id, model, product, variant.clone());
        self.store.save(&self.sessions);
        self.saved = true;
        tracing::info!(session_id = %id, "result saved to gallery");
        Ok(id)
    }

    /// Deletes a session from the gallery and persists. Unknown ids are
    /// ignored.
    pub fn remove(&mut self, session_id: Uuid) {
        let sessions = std::mem::take(&mut self.sessions);
        self.sessions = gallery::remove(sessions, session_id);
        self.store.save(&self.sessions);
        tracing::info!(session_id = %session_id, "session removed");
    }
}
