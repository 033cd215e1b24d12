use crate::http::HttpClient;
use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// Downloads `url` to `dest`, creating the parent directories once the server
/// has answered successfully. An existing file at `dest` is overwritten.
#[tracing::instrument(skip(runtime, dest, http_client))]
pub async fn download_file<R: Runtime>(
    runtime: &R,
    url: &str,
    dest: &Path,
    http_client: &HttpClient,
) -> Result<u64> {
    info!("Downloading {}...", url);

    let bytes = http_client
        .download_file(url, || {
            if let Some(parent) = dest.parent()
                && !runtime.is_dir(parent)
            {
                runtime
                    .create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {:?}", parent))?;
            }
            runtime
                .create_file(dest)
                .with_context(|| format!("Failed to create archive file at {:?}", dest))
        })
        .await?;

    info!("Download complete.");
    Ok(bytes)
}
