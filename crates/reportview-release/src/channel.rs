/// Where releases are published and how installer assets are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseChannel {
    pub owner: String,
    pub repo: String,
    pub channel: String,
    pub allow_prerelease: bool,
    pub v_prefixed_tags: bool,
}

impl Default for ReleaseChannel {
    fn default() -> Self {
        Self {
            owner: "ZIMkaRU".to_string(),
            repo: "bfx-report-electron".to_string(),
            channel: "latest".to_string(),
            allow_prerelease: true,
            v_prefixed_tags: true,
        }
    }
}

impl ReleaseChannel {
    #[must_use]
    pub fn releases_url(&self) -> String {
        format!(
            "https://api.github.com/repos/{}/{}/releases",
            self.owner, self.repo
        )
    }

    /// Installer asset published for `version` on this build's target.
    #[must_use]
    pub fn installer_asset_name(&self, version: &str) -> String {
        let os = if cfg!(target_os = "windows") {
            "win"
        } else if cfg!(target_os = "macos") {
            "mac"
        } else {
            "linux"
        };
        let ext = if cfg!(target_os = "windows") {
            "exe"
        } else if cfg!(target_os = "macos") {
            "dmg"
        } else {
            "AppImage"
        };
        format!("BitfinexReport-{version}-x64-{os}.{ext}")
    }

    /// Version encoded in a tag name, honoring the `v` prefix convention.
    #[must_use]
    pub fn version_from_tag<'a>(&self, tag: &'a str) -> &'a str {
        if self.v_prefixed_tags {
            tag.strip_prefix('v').unwrap_or(tag)
        } else {
            tag
        }
    }
}
