//! GitHub release-channel update provider.
//!
//! Checks the configured repository's releases for a newer installer,
//! downloads it into the updater cache directory and launches it on request.

mod channel;
mod download;
mod provider;
mod release;

pub use channel::ReleaseChannel;
pub use provider::{QuitHook, ReleaseProvider};
pub use release::is_newer_version;
