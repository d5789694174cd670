//! Update provider contract shared by the orchestration engine and the
//! concrete providers.
//!
//! A provider performs the actual check/download/install against a release
//! channel and reports its lifecycle through [`UpdateEvent`]s delivered to the
//! [`EventSink`]s subscribed to it.

mod error;
mod events;
mod kind;
mod noop;
mod traits;
mod types;

pub use error::{NetworkStage, ProviderError};
pub use events::{EventHub, EventSink};
pub use kind::{ProviderKind, provider_kind_for};
pub use noop::NoopProvider;
pub use traits::{ProviderConfig, UpdateProvider};
pub use types::{ProgressInfo, ReleaseFile, UpdateEvent, UpdateInfo};
