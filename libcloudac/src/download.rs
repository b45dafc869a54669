use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header;
use tokio::fs::{DirBuilder, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::Sender;
use tokio::time::Instant;
use url::Url;

use crate::errors::CdlError;
use crate::session::Transport;
use crate::Update::ProgressUpdate;
use crate::{Progress, Update};

const VIDEO_EXTENSION: &str = ".mp4";
const PROGRESS_UPDATE_INTERVAL: Duration = Duration::from_millis(1000);
#[cfg(unix)]
const DIRECTORY_MODE: u32 = 0o777;

/// Lowercases `title` and collapses every run of characters that are not
/// letters or digits into a single `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("lecture");
    }
    slug
}

/// `03-intro-setup.mp4` for the third lecture titled `Intro: Setup!`.
pub fn lecture_file_name(index: usize, title: &str) -> String {
    format!("{:02}-{}{}", index, slugify(title), VIDEO_EXTENSION)
}

/// Mirrors the course url path under `output_directory`.
pub fn course_directory(output_directory: &Path, course_url: &str) -> Result<PathBuf, CdlError> {
    let url = Url::parse(course_url).map_err(|_| CdlError::InvalidUrl(course_url.to_string()))?;
    let mut dir = output_directory.to_path_buf();
    if let Some(segments) = url.path_segments() {
        for segment in segments.filter(|s| !s.is_empty() && *s != "." && *s != "..") {
            dir.push(segment);
        }
    }
    Ok(dir)
}

/// Creates `dir` and its parents, readable and writable by everyone.
pub async fn create_course_directory(dir: &Path) -> Result<(), CdlError> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIRECTORY_MODE);
    builder.create(dir).await.map_err(|e| {
        tracing::error!(
            "Failed to create destination directory {}\nError : {}",
            dir.to_string_lossy(),
            e
        );
        CdlError::ErrorCreatingDestinationDirectory {
            dir: dir.to_string_lossy().to_string(),
            message: format!("{} | {}", e, e.kind()),
        }
    })
}

/// Streams `url` into `destination`, replacing any file already there.
/// Returns the number of bytes written.
#[tracing::instrument(skip(transport, update_tx))]
pub async fn download_file(
    transport: &Transport,
    url: &str,
    destination: &Path,
    update_tx: &Sender<Update>,
) -> Result<u64, CdlError> {
    let mut response = transport.get(url).await?;
    if !response.status().is_success() {
        tracing::error!("Error status code received : {} |{}|", response.status(), url);
        return Err(CdlError::ErrorStatusCode {
            status_code: response.status().to_string(),
            url: url.to_string(),
        });
    }

    let f_size = match response.headers().get(header::CONTENT_LENGTH) {
        None => 0u64,
        Some(s) => s
            .to_str()
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0u64),
    };
    let resource_name = destination.to_string_lossy().to_string();

    let mut dest_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(destination)
        .await
        .map_err(|e| {
            tracing::error!("Error opening/creating file {}", resource_name);
            tracing::error!("{} | {}", e, e.kind());
            CdlError::FileOperationError {
                file_name: resource_name.clone(),
                message: format!("{} | {}", e, e.kind()),
            }
        })?;

    let mut last_update_time = Instant::now() - PROGRESS_UPDATE_INTERVAL;
    let mut bytes_written = 0u64;

    while let Some(chunk) = response.chunk().await.map_err(|e| {
        tracing::error!("Error downloading resource from {}", url);
        tracing::error!("{}", e);
        CdlError::NetworkError(e.to_string())
    })? {
        if let Err(e) = dest_file.write_all(&chunk).await {
            tracing::error!("Error writing to destination file {}", resource_name);
            tracing::error!("{} | {}", e, e.kind());
            return Err(CdlError::FileOperationError {
                file_name: resource_name,
                message: format!("{} | {}", e, e.kind()),
            });
        }
        bytes_written += chunk.len() as u64;
        if Instant::now().duration_since(last_update_time) > PROGRESS_UPDATE_INTERVAL {
            // Progress is best effort, a slow reader must not stall the download.
            if update_tx
                .try_send(ProgressUpdate(Progress {
                    bytes_written,
                    file_size: f_size,
                    resource_name: resource_name.clone(),
                }))
                .is_ok()
            {
                last_update_time = Instant::now();
            }
        }
    }

    if let Err(e) = dest_file.flush().await {
        tracing::error!("Error flushing destination file {}", resource_name);
        return Err(CdlError::FileOperationError {
            file_name: resource_name,
            message: format!("{} | {}", e, e.kind()),
        });
    }

    tracing::debug!("Download completed for {}, file @ {}", url, resource_name);
    if update_tx
        .try_send(ProgressUpdate(Progress {
            bytes_written,
            file_size: if f_size == 0 { bytes_written } else { f_size },
            resource_name,
        }))
        .is_err()
    {
        tracing::debug!("Final progress update for {} dropped", url);
    }
    Ok(bytes_written)
}
