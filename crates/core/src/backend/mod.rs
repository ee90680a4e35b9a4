//! The boundary between the collection store and whatever persists photos.
//!
//! Transport, storage and AI tagging all live behind [`PhotoBackend`]; the
//! store only ever sees raw records coming back.

pub mod library;

use async_trait::async_trait;

use crate::domain::{PhotoUpload, RawPhotoRecord, Session};
use crate::error::BackendError;

pub use library::LibraryBackend;

#[async_trait]
pub trait PhotoBackend: Send + Sync {
    /// The authoritative list of a user's photos, most recent first.
    async fn fetch_photos(&self, session: &Session) -> Result<Vec<RawPhotoRecord>, BackendError>;

    /// Persist and process an uploaded file, returning the finished record.
    async fn upload_photo(
        &self,
        session: &Session,
        upload: PhotoUpload,
    ) -> Result<RawPhotoRecord, BackendError>;

    async fn delete_photo(&self, session: &Session, id: &str) -> Result<(), BackendError>;
}
