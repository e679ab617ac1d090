use std::path::PathBuf;

use miette::Diagnostic;
use vsix_format::{ArchiveError, ManifestError, VersionError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum Error {
    #[error("Input extension file is not valid: `{}`", .path.display())]
    #[diagnostic(help("Pass the path of an existing .vsix file"))]
    InvalidInput { path: PathBuf },

    #[error("Desired version number is not valid: `{version}`")]
    #[diagnostic(help("Use a version such as 6.1"))]
    InvalidVersion {
        version: String,
        #[source]
        source: VersionError,
    },

    #[error("Staging directory already exists: `{}`", .path.display())]
    #[diagnostic(help("Use -f/--force to replace it"))]
    StagingExists { path: PathBuf },

    #[error("Cannot access staging directory `{}`", .path.display())]
    InspectStaging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot remove staging directory `{}`", .path.display())]
    RemoveStaging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot extract archive `{}`", .path.display())]
    #[diagnostic(help("Is this a valid .vsix file?"))]
    ExtractArchive {
        path: PathBuf,
        #[source]
        source: ArchiveError,
    },

    #[error("Cannot patch manifest `{}`", .path.display())]
    #[diagnostic(help("Is this a Visual Studio 2010 extension manifest?"))]
    PatchManifest {
        path: PathBuf,
        #[source]
        source: ManifestError,
    },

    #[error("Cannot create archive `{}`", .path.display())]
    CreateArchive {
        path: PathBuf,
        #[source]
        source: ArchiveError,
    },
}
