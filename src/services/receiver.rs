use crate::api::error::{AppError, BodyLimitExceeded};
use crate::config::UploadConfig;
use crate::services::storage::{PartialFile, remove_partial};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, warn};

/// Streams a request body to disk in fixed-size chunks, enforcing a byte ceiling.
///
/// The byte count observed here is the only authoritative size check: a
/// declared `Content-Length` can be absent or wrong.
#[derive(Debug, Clone, Copy)]
pub struct BoundedReceiver {
    max_bytes: u64,
    chunk_size: usize,
}

impl BoundedReceiver {
    pub fn new(max_bytes: u64, chunk_size: usize) -> Self {
        Self {
            max_bytes,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.max_file_size, config.effective_chunk_size())
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Writes everything `reader` yields to `destination`, truncating whatever was there.
    ///
    /// On any failure the destination is closed and removed before the error is
    /// returned. If this future is dropped before completing, the destination
    /// is removed as well. The reader is consumed and dropped on every path.
    pub async fn receive<R>(&self, reader: R, destination: &Path) -> Result<u64, AppError>
    where
        R: AsyncRead + Unpin,
    {
        let mut reader = reader;
        let partial = PartialFile::new(destination);

        let mut file = match File::create(destination).await {
            Ok(file) => file,
            Err(e) => {
                error!("Failed to open {}: {}", destination.display(), e);
                return Err(AppError::StorageFailure(e));
            }
        };

        let outcome = self.copy_bounded(&mut reader, &mut file).await;

        drop(reader);
        drop(file);

        match &outcome {
            Ok(_) => partial.keep(),
            Err(AppError::PayloadTooLarge { .. }) => {
                warn!(
                    "Upload to {} exceeded {} bytes, discarding partial file",
                    destination.display(),
                    self.max_bytes
                );
                remove_partial(destination).await;
            }
            Err(other) => {
                error!("Upload to {} failed: {}", destination.display(), other);
                remove_partial(destination).await;
            }
        }

        outcome
    }

    /// Chunked copy loop. Stops at the first chunk that pushes the total past the limit,
    /// without writing it and without draining the rest of the reader.
    pub async fn copy_bounded<R, W>(&self, reader: &mut R, writer: &mut W) -> Result<u64, AppError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buffer = vec![0u8; self.chunk_size];
        let mut total: u64 = 0;

        loop {
            let n = read_chunk(reader, &mut buffer)
                .await
                .map_err(|e| self.read_failure(e))?;
            if n == 0 {
                break;
            }

            total += n as u64;
            if total > self.max_bytes {
                return Err(AppError::PayloadTooLarge {
                    max_bytes: self.max_bytes,
                });
            }

            writer
                .write_all(&buffer[..n])
                .await
                .map_err(AppError::StorageFailure)?;
        }

        writer.flush().await.map_err(AppError::StorageFailure)?;
        Ok(total)
    }

    /// A read cut short by the transport's body limit is still a size rejection.
    fn read_failure(&self, e: std::io::Error) -> AppError {
        let over_body_limit = e
            .get_ref()
            .is_some_and(|inner| inner.is::<BodyLimitExceeded>());

        if over_body_limit {
            AppError::PayloadTooLarge {
                max_bytes: self.max_bytes,
            }
        } else {
            AppError::StorageFailure(e)
        }
    }
}

/// Fills `buffer` as far as the reader allows. Returns 0 only at end of stream.
async fn read_chunk<R>(reader: &mut R, buffer: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut n = 0;
    while n < buffer.len() {
        let read = reader.read(&mut buffer[n..]).await?;
        if read == 0 {
            break;
        }
        n += read;
    }
    Ok(n)
}
