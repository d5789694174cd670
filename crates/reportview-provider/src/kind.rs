use reportview_platform::Platform;

/// The closed set of provider variants the selector can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Downloads and runs a platform installer.
    Installer,
    /// Stand-in for platforms where self-update is not offered.
    Unsupported,
}

/// Pick the provider variant for a platform.
///
/// Only Windows builds ship an installer-based updater; macOS and Linux
/// packages are updated out of band.
#[must_use]
pub fn provider_kind_for(platform: Platform) -> ProviderKind {
    match platform {
        Platform::Windows => ProviderKind::Installer,
        Platform::MacOs | Platform::Linux | Platform::Other(_) => ProviderKind::Unsupported,
    }
}
