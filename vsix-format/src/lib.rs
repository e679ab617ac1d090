//! Patch the manifest of a `.vsix` extension archive so the extension claims
//! compatibility with a different host product.
//!
//! The work is a straight line: [extract][archive::extract] the archive into a
//! staging directory, [patch][manifest::patch] `extension.vsixmanifest`, then
//! [repack][archive::repack] the staging directory into a new archive.
//! [Patcher] runs the whole sequence.

pub mod archive;
mod error;
pub mod manifest;
mod options;
mod pipeline;
mod version;

pub use archive::ArchiveError;
pub use error::PatchError;
pub use manifest::{Document, Element, ManifestError, Node, SupportedProduct};
pub use options::{PatchOptions, VSIX_NAMESPACE};
pub use pipeline::{PatchPaths, PatchReport, Patcher};
pub use version::{ProductVersion, VersionError};
