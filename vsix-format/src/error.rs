use std::path::PathBuf;

use crate::archive::ArchiveError;
use crate::manifest::ManifestError;

#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("Staging directory already exists. Path: '{}'", .0.display())]
    StagingExists(PathBuf),

    #[error("Checking for staging directory failed. Path: '{}'", .1.display())]
    InspectStaging(#[source] std::io::Error, PathBuf),

    #[error("Removing stale staging directory failed. Path: '{}'", .1.display())]
    RemoveStaging(#[source] std::io::Error, PathBuf),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}
