use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Network error during {operation} ({stage}): {details}")]
    Network {
        operation: &'static str,
        stage: NetworkStage,
        details: String,
    },

    #[error("Release channel returned HTTP {status} during {operation}{body_snippet}")]
    HttpStatus {
        operation: &'static str,
        status: u16,
        body_snippet: String,
    },

    #[error("Invalid release metadata: {details}")]
    InvalidRelease { details: String },

    #[error("No installer asset named {asset} in release {version}")]
    MissingAsset { asset: String, version: String },

    #[error("Checksum mismatch for {asset}. Refusing to install unverified update.")]
    ChecksumMismatch { asset: String },

    #[error("No update has been checked for yet")]
    NoUpdateAvailable,

    #[error("No downloaded update to install")]
    NoUpdateDownloaded,

    #[error("Failed to launch installer: {details}")]
    InstallLaunch { details: String },

    #[error("IO error during {context} ({kind}): {message}")]
    Io {
        context: &'static str,
        kind: std::io::ErrorKind,
        message: String,
    },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStage {
    #[error("request")]
    Request,
    #[error("response parse")]
    ResponseParse,
    #[error("stream")]
    Stream,
}

impl ProviderError {
    pub fn network_request<E>(operation: &'static str, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::Network {
            operation,
            stage: NetworkStage::Request,
            details: error.to_string(),
        }
    }

    pub fn network_parse<E>(operation: &'static str, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::Network {
            operation,
            stage: NetworkStage::ResponseParse,
            details: error.to_string(),
        }
    }

    pub fn network_stream<E>(operation: &'static str, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::Network {
            operation,
            stage: NetworkStage::Stream,
            details: error.to_string(),
        }
    }

    pub fn invalid_release(details: impl Into<String>) -> Self {
        Self::InvalidRelease {
            details: details.into(),
        }
    }

    pub fn io(context: &'static str, error: &std::io::Error) -> Self {
        Self::Io {
            context,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}
