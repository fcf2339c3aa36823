//! Publishing built artifacts: release host upload and registry upload.

mod host;
mod publisher;
mod registry;

pub use host::{NewRelease, ReleaseHost, RemoteAsset, RemoteRelease};
pub use publisher::{PublishOptions, PublishReport, Publisher};
pub use registry::run_registry_upload;
