use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use super::PhotoBackend;
use crate::domain::{PhotoUpload, RawPhotoRecord, Session};
use crate::error::BackendError;
use crate::hasher::compute_sha256;

const LIBRARY_FILE: &str = "library.json";
const MEDIA_DIR: &str = "media";

/// user id → that user's records, most recent first.
type LibraryData = BTreeMap<String, Vec<RawPhotoRecord>>;

/// A photo library kept in a local directory:
///
/// ```text
/// <root>/library.json      records per user
/// <root>/media/<sha256>.*  uploaded payloads
/// ```
///
/// Uploads are content-addressed, so the same file cannot be added twice
/// for one user. No tagging or captioning is performed.
pub struct LibraryBackend {
    root: PathBuf,
    // serializes read-modify-write cycles on library.json
    write_lock: Mutex<()>,
}

impl LibraryBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn library_path(&self) -> PathBuf {
        self.root.join(LIBRARY_FILE)
    }

    async fn read_library(&self) -> Result<LibraryData, BackendError> {
        match tokio::fs::read(self.library_path()).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(LibraryData::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write via a temp file and rename so a crash never leaves a torn library.
    async fn write_library(&self, data: &LibraryData) -> Result<(), BackendError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let tmp = self.root.join(format!("{LIBRARY_FILE}.tmp"));
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(data)?).await?;
        tokio::fs::rename(&tmp, self.library_path()).await?;
        Ok(())
    }
}

fn check_session(session: &Session) -> Result<(), BackendError> {
    if session.user_id.trim().is_empty() {
        return Err(BackendError::Rejected("empty user id".to_string()));
    }
    Ok(())
}

/// Stored file name for an upload: `<id>.<ext>`, extension lower-cased.
fn media_file_name(id: &str, original: &str) -> String {
    match Path::new(original).extension() {
        Some(ext) => format!("{id}.{}", ext.to_string_lossy().to_lowercase()),
        None => id.to_string(),
    }
}

#[async_trait]
impl PhotoBackend for LibraryBackend {
    async fn fetch_photos(&self, session: &Session) -> Result<Vec<RawPhotoRecord>, BackendError> {
        check_session(session)?;
        let mut library = self.read_library().await?;
        Ok(library.remove(&session.user_id).unwrap_or_default())
    }

    async fn upload_photo(
        &self,
        session: &Session,
        upload: PhotoUpload,
    ) -> Result<RawPhotoRecord, BackendError> {
        check_session(session)?;
        let _guard = self.write_lock.lock().await;

        let mut library = self.read_library().await?;
        let records = library.entry(session.user_id.clone()).or_default();

        let id = compute_sha256(&upload.bytes);
        if records.iter().any(|r| r.id == id) {
            return Err(BackendError::DuplicateContent(upload.file_name));
        }

        let file_name = media_file_name(&id, &upload.file_name);
        let media_dir = self.root.join(MEDIA_DIR);
        tokio::fs::create_dir_all(&media_dir).await?;
        tokio::fs::write(media_dir.join(&file_name), &upload.bytes).await?;

        let title = Path::new(&upload.file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string());

        let record = RawPhotoRecord {
            id,
            url: format!("{MEDIA_DIR}/{file_name}"),
            title,
            description: upload.caption.filter(|c| !c.trim().is_empty()),
            tags: Vec::new(),
            // stored with whole-second precision
            upload_at: Utc::now().trunc_subsecs(0).into(),
            capture_info: upload.hints,
        };
        records.insert(0, record.clone());

        self.write_library(&library).await?;
        debug!(id = %record.id, user = %session.user_id, "stored upload");
        Ok(record)
    }

    async fn delete_photo(&self, session: &Session, id: &str) -> Result<(), BackendError> {
        check_session(session)?;
        let _guard = self.write_lock.lock().await;

        let mut library = self.read_library().await?;
        let records = library.entry(session.user_id.clone()).or_default();
        let pos = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| BackendError::NotFound(id.to_string()))?;
        let removed = records.remove(pos);
        self.write_library(&library).await?;

        // the url is relative to the library root
        match tokio::fs::remove_file(self.root.join(&removed.url)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}
