use chrono::{DateTime, Utc};
use reportview_provider::{ProviderError, ReleaseFile, UpdateInfo};
use semver::Version;
use serde::Deserialize;

use crate::channel::ReleaseChannel;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GitHubAsset {
    pub name: String,
    pub browser_download_url: String,
    pub size: u64,
    #[serde(default)]
    pub digest: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GitHubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<GitHubAsset>,
}

/// Fetch the published releases of the channel's repository.
///
/// # Errors
/// Returns an error when the request fails, the API answers with a non-success
/// status, or the body cannot be parsed.
pub(crate) async fn fetch_releases(
    client: &reqwest::Client,
    channel: &ReleaseChannel,
) -> Result<Vec<GitHubRelease>, ProviderError> {
    let response = client
        .get(channel.releases_url())
        .header("User-Agent", "reportview")
        .header("Accept", "application/vnd.github+json")
        .send()
        .await
        .map_err(|error| ProviderError::network_request("check for update", error))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body_snippet = response
            .text()
            .await
            .ok()
            .map(|body| response_snippet(&body, 160))
            .unwrap_or_default();
        return Err(ProviderError::HttpStatus {
            operation: "check for update",
            status,
            body_snippet,
        });
    }

    response
        .json()
        .await
        .map_err(|error| ProviderError::network_parse("check for update", error))
}

/// Pick the newest release on `channel` that is newer than `current_version`.
pub(crate) fn select_update(
    releases: &[GitHubRelease],
    channel: &ReleaseChannel,
    current_version: &str,
) -> Option<UpdateInfo> {
    let current = current_version.strip_prefix('v').unwrap_or(current_version);

    let newest = releases
        .iter()
        .filter(|release| !release.draft)
        .filter(|release| channel.allow_prerelease || !release.prerelease)
        .filter_map(|release| {
            let version = channel.version_from_tag(&release.tag_name);
            let parsed = parse_semver(version)?;
            matches_channel(&parsed, &channel.channel).then_some((parsed, release))
        })
        .max_by(|(a, _), (b, _)| a.cmp(b))?;

    let (_, release) = newest;
    let latest = channel.version_from_tag(&release.tag_name);
    if !is_newer_version(latest, current) {
        return None;
    }

    Some(UpdateInfo {
        version: latest.to_string(),
        release_name: release.name.clone(),
        release_notes: release.body.clone(),
        release_date: release.published_at,
        files: release
            .assets
            .iter()
            .map(|asset| ReleaseFile {
                name: asset.name.clone(),
                url: asset.browser_download_url.clone(),
                size: Some(asset.size),
                sha256: asset.digest.as_deref().and_then(parse_sha256_digest),
            })
            .collect(),
    })
}

fn matches_channel(version: &Version, channel: &str) -> bool {
    if channel == "latest" {
        return true;
    }
    version
        .pre
        .as_str()
        .split('.')
        .next()
        .is_some_and(|tag| tag == channel)
}

fn response_snippet(body: &str, max_chars: usize) -> String {
    let snippet: String = body.chars().take(max_chars).collect();
    if snippet.is_empty() {
        String::new()
    } else {
        format!(": {snippet}")
    }
}

#[must_use]
pub fn is_newer_version(latest: &str, current: &str) -> bool {
    match (parse_semver(latest), parse_semver(current)) {
        (Some(latest), Some(current)) => latest > current,
        _ => latest != current,
    }
}

fn parse_semver(version: &str) -> Option<Version> {
    if let Ok(parsed) = Version::parse(version) {
        return Some(parsed);
    }

    let (core, suffix) = split_semver_core_and_suffix(version);
    let mut parts = core.split('.');
    let major = parts.next()?.parse::<u64>().ok()?;
    let minor = parts.next().and_then(|part| part.parse::<u64>().ok());
    let patch = parts.next().and_then(|part| part.parse::<u64>().ok());

    if parts.next().is_some() {
        return None;
    }

    let normalized = match (minor, patch) {
        (None, None) => format!("{major}.0.0{suffix}"),
        (Some(minor), None) => format!("{major}.{minor}.0{suffix}"),
        (Some(minor), Some(patch)) => format!("{major}.{minor}.{patch}{suffix}"),
        (None, Some(_)) => return None,
    };

    Version::parse(&normalized).ok()
}

fn split_semver_core_and_suffix(version: &str) -> (&str, &str) {
    let suffix_idx = version.find(['-', '+']).unwrap_or(version.len());
    (&version[..suffix_idx], &version[suffix_idx..])
}

fn parse_sha256_digest(digest: &str) -> Option<String> {
    let (algorithm, hash) = digest.split_once(':')?;
    if !algorithm.eq_ignore_ascii_case("sha256") {
        return None;
    }
    if hash.len() != 64 || !hash.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    Some(hash.to_ascii_lowercase())
}
