//! Session gallery and its persistence.

mod backend;
mod session;
mod store;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use session::{find, remove, upsert_variant, Session};
pub use store::{GalleryStore, GALLERY_KEY};
