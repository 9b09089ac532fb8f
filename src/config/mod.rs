use std::env;
use std::path::PathBuf;

/// Configuration for the upload path
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Maximum accepted file size in bytes (default: 500 MB)
    pub max_file_size: u64,

    /// Bytes pulled from the request per read (default: 1 MB)
    pub chunk_size: usize,

    /// Directory every accepted file is written into (default: "/upload")
    pub upload_dir: PathBuf,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 500 * 1024 * 1024, // 500 MB
            chunk_size: 1024 * 1024,          // 1 MB
            upload_dir: PathBuf::from("/upload"),
        }
    }
}

impl UploadConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            chunk_size: env::var("CHUNK_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.chunk_size),

            upload_dir: env::var("UPLOAD_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.upload_dir),
        }
    }

    /// Same config with a different destination directory
    pub fn with_upload_dir(self, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            ..self
        }
    }

    /// Chunk size actually used by the receiver; never zero.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }

    /// Body limit handed to axum: the file ceiling plus room for multipart framing.
    pub fn body_limit(&self) -> usize {
        let framing = 10 * 1024 * 1024;
        usize::try_from(self.max_file_size)
            .unwrap_or(usize::MAX)
            .saturating_add(framing)
    }
}
