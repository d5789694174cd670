use std::io::Read;
use std::path::Path;
use std::time::{Duration, Instant};

use log::{debug, info};
use reportview_provider::{ProgressInfo, ProviderError};
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

/// Stream `url` into `dest`, reporting progress at most every
/// [`PROGRESS_INTERVAL`] plus once when the transfer completes.
pub(crate) async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    mut on_progress: impl FnMut(ProgressInfo),
) -> Result<u64, ProviderError> {
    use futures_util::StreamExt;

    let response = client
        .get(url)
        .header("User-Agent", "reportview")
        .send()
        .await
        .map_err(|error| ProviderError::network_request("download update", error))?;

    if !response.status().is_success() {
        return Err(ProviderError::HttpStatus {
            operation: "download update",
            status: response.status().as_u16(),
            body_snippet: String::new(),
        });
    }

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;
    let started = Instant::now();
    let mut last_report = started;

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|error| ProviderError::io("create installer file", &error))?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|error| ProviderError::network_stream("download update", error))?;
        file.write_all(&chunk)
            .await
            .map_err(|error| ProviderError::io("write installer file", &error))?;
        downloaded += chunk.len() as u64;

        if last_report.elapsed() >= PROGRESS_INTERVAL {
            last_report = Instant::now();
            on_progress(ProgressInfo::new(
                downloaded,
                total,
                bytes_per_second(downloaded, started.elapsed()),
            ));
        }
    }

    file.flush()
        .await
        .map_err(|error| ProviderError::io("flush installer file", &error))?;

    on_progress(ProgressInfo::new(
        downloaded,
        total.max(downloaded),
        bytes_per_second(downloaded, started.elapsed()),
    ));
    info!("Download complete: {downloaded} bytes");
    Ok(downloaded)
}

fn bytes_per_second(bytes: u64, elapsed: Duration) -> u64 {
    let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX).max(1);
    bytes.saturating_mul(1000) / millis
}

/// Compare the sha256 of `path` against `expected` (lowercase hex).
pub(crate) fn verify_checksum(
    path: &Path,
    asset_name: &str,
    expected: &str,
) -> Result<(), ProviderError> {
    let actual = sha256_file(path)?;
    if actual.eq_ignore_ascii_case(expected) {
        debug!("Installer checksum verified for {asset_name}");
        Ok(())
    } else {
        Err(ProviderError::ChecksumMismatch {
            asset: asset_name.to_string(),
        })
    }
}

fn sha256_file(path: &Path) -> Result<String, ProviderError> {
    let mut file = std::fs::File::open(path)
        .map_err(|error| ProviderError::io("open installer for checksum", &error))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0_u8; 8192];

    loop {
        let read = file
            .read(&mut buffer)
            .map_err(|error| ProviderError::io("read installer for checksum", &error))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
