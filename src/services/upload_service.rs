use crate::api::error::AppError;
use crate::config::UploadConfig;
use crate::services::receiver::BoundedReceiver;
use crate::services::storage::LocalStorage;
use crate::utils::name_lock::NameLocks;
use crate::utils::validation::{SanitizedFilename, sanitize_filename};
use tokio::io::AsyncRead;
use tracing::info;

/// Outcome of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub filename: SanitizedFilename,
    pub bytes_written: u64,
}

/// Ties directory preparation, filename sanitation and the bounded receiver together.
#[derive(Debug, Clone)]
pub struct UploadService {
    storage: LocalStorage,
    receiver: BoundedReceiver,
    name_locks: NameLocks,
}

impl UploadService {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            storage: LocalStorage::new(config.upload_dir.clone()),
            receiver: BoundedReceiver::from_config(config),
            name_locks: NameLocks::default(),
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.receiver.max_bytes()
    }

    /// Stores one file under the upload directory.
    ///
    /// Uploads targeting the same sanitized name run one after another; the
    /// last one to finish owns the file.
    pub async fn store<R>(&self, raw_filename: &str, reader: R) -> Result<UploadResult, AppError>
    where
        R: AsyncRead + Unpin,
    {
        self.storage.prepare().await?;

        let filename = sanitize_filename(raw_filename)?;
        let destination = self.storage.destination(&filename);

        let bytes_written = {
            let _guard = self.name_locks.acquire(filename.as_str()).await;
            self.receiver.receive(reader, &destination).await?
        };
        info!("💾 Saved {} ({} bytes)", filename, bytes_written);

        Ok(UploadResult {
            filename,
            bytes_written,
        })
    }
}
