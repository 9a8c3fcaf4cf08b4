//! Zip export of the whole gallery.
//!
//! The archive is assembled in an unnamed temporary file under the staging
//! directory and streamed from there, so memory stays bounded by the few
//! photos in flight rather than the size of the gallery.

use crate::gateway::{FetchError, StorageGateway};
use axum::body::Body;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use saycheese_core::{PhotoId, PhotoRecord};
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use tokio_util::io::ReaderStream;
use tracing::{info, instrument};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Photos downloaded concurrently while assembling an archive.
const FETCH_CONCURRENCY: usize = 4;

pub const ARCHIVE_FILE_NAME: &str = "photos.zip";

/// Failure to build an export archive.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to fetch photo {id}: {source}")]
    Fetch {
        id: PhotoId,
        #[source]
        source: FetchError,
    },

    #[error("failed to write archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to write archive: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for ExportError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

/// A finished archive, rewound and ready to be read.
///
/// The backing file has no name on disk; it disappears once dropped.
#[derive(Debug)]
pub struct ExportArchive {
    file: File,
    size: u64,
}

impl ExportArchive {
    /// Archive length in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn into_file(self) -> File {
        self.file
    }

    /// Stream the archive as a response body.
    pub fn into_body(self) -> Body {
        let file = tokio::fs::File::from_std(self.file);
        Body::from_stream(ReaderStream::new(file))
    }
}

/// Name of the `index`-th (zero based) archive entry.
pub fn entry_name(index: usize) -> String {
    format!("photo-{}.jpg", index + 1)
}

/// Fetch every photo and pack them into a deflate-compressed zip.
///
/// Nothing is returned until every photo has been written, so a single
/// failed fetch fails the whole export and no partial archive reaches the
/// caller.
#[instrument(skip(gateway, records), fields(photos = records.len()))]
pub async fn build_archive(
    gateway: &StorageGateway,
    records: &[PhotoRecord],
) -> Result<ExportArchive, ExportError> {
    let staging_dir = gateway.staging_dir().to_path_buf();
    let mut zip = tokio::task::spawn_blocking(move || -> Result<_, ExportError> {
        std::fs::create_dir_all(&staging_dir)?;
        Ok(ZipWriter::new(tempfile::tempfile_in(&staging_dir)?))
    })
    .await??;

    let photos = futures::stream::iter(0..records.len())
        .map(|index| {
            let record = &records[index];
            async move {
                gateway
                    .fetch(&record.url)
                    .await
                    .map(|data| (index, data))
                    .map_err(|source| ExportError::Fetch {
                        id: record.id.clone(),
                        source,
                    })
            }
        })
        .buffered(FETCH_CONCURRENCY);
    let mut photos = std::pin::pin!(photos);

    while let Some((index, data)) = photos.try_next().await? {
        zip = tokio::task::spawn_blocking(move || -> Result<_, ExportError> {
            write_entry(&mut zip, index, &data)?;
            Ok(zip)
        })
        .await??;
    }

    let archive = tokio::task::spawn_blocking(move || finish_archive(zip)).await??;
    info!(bytes = archive.size, "export archive built");
    Ok(archive)
}

fn write_entry(zip: &mut ZipWriter<File>, index: usize, data: &Bytes) -> Result<(), ExportError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(entry_name(index), options)?;
    zip.write_all(data)?;
    Ok(())
}

fn finish_archive(zip: ZipWriter<File>) -> Result<ExportArchive, ExportError> {
    let mut file = zip.finish()?;
    let size = file.seek(SeekFrom::End(0))?;
    file.rewind()?;
    Ok(ExportArchive { file, size })
}
