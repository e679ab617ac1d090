use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::PatchError;
use crate::manifest::{self, Document, SupportedProduct};
use crate::{PatchOptions, ProductVersion, archive};

/// Where a run stages its work and writes its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchPaths {
    /// `<stem>_temp`
    pub staging: PathBuf,
    /// The manifest inside `staging`.
    pub manifest: PathBuf,
    /// `<stem>_AtmelStudio<version>.vsix`
    pub output: PathBuf,
}

impl PatchPaths {
    pub fn derive(
        input: &Path,
        version: &ProductVersion,
        options: &PatchOptions,
        base_dir: &Path,
    ) -> Self {
        let stem = input.file_stem().unwrap_or_default();

        let mut staging = OsString::from(stem);
        staging.push("_temp");
        let staging = base_dir.join(staging);

        let mut output = OsString::from(stem);
        output.push(format!("_{}{}.vsix", options.output_tag, version));
        let output = base_dir.join(output);

        let manifest = staging.join(&options.manifest_entry);

        PatchPaths {
            staging,
            manifest,
            output,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchReport {
    pub staging: PathBuf,
    pub output: PathBuf,
    pub entries_extracted: usize,
    pub entries_written: usize,
    pub references_removed: usize,
}

/// Runs extract, patch and repack for one archive.
///
/// Nothing is rolled back on failure: the staging directory is left in
/// whatever state the failing step found it.
#[derive(Debug, Clone)]
pub struct Patcher {
    options: PatchOptions,
    base_dir: PathBuf,
}

impl Patcher {
    /// A patcher that stages and writes relative to the current directory.
    pub fn new(options: PatchOptions) -> Self {
        Patcher {
            options,
            base_dir: PathBuf::new(),
        }
    }

    /// Stage and write below `dir` instead of the current directory.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn options(&self) -> &PatchOptions {
        &self.options
    }

    pub fn paths(&self, input: &Path, version: &ProductVersion) -> PatchPaths {
        PatchPaths::derive(input, version, &self.options, &self.base_dir)
    }

    pub fn run(&self, input: &Path, version: &ProductVersion) -> Result<PatchReport, PatchError> {
        let paths = self.paths(input, version);
        tracing::debug!(
            input = %input.display(),
            staging = %paths.staging.display(),
            output = %paths.output.display(),
            "patching"
        );

        self.prepare_staging(&paths.staging)?;
        let entries_extracted = archive::extract(input, &paths.staging)?;

        tracing::debug!(manifest = %paths.manifest.display(), "reading manifest");
        let mut doc = Document::read_from(&paths.manifest)?;
        let product = SupportedProduct {
            kind: &self.options.product_kind,
            version: version.as_str(),
            name: &self.options.product_name,
        };
        let references_removed = manifest::patch(&mut doc, &self.options.namespace, &product)?;
        doc.write_to(&paths.manifest)?;

        let entries_written = archive::repack(&paths.staging, &paths.output)?;

        Ok(PatchReport {
            staging: paths.staging,
            output: paths.output,
            entries_extracted,
            entries_written,
            references_removed,
        })
    }

    fn prepare_staging(&self, staging: &Path) -> Result<(), PatchError> {
        let meta = match std::fs::symlink_metadata(staging) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(PatchError::InspectStaging(e, staging.to_path_buf())),
        };

        if !self.options.force {
            return Err(PatchError::StagingExists(staging.to_path_buf()));
        }

        tracing::warn!(staging = %staging.display(), "removing existing staging directory");
        let result = if meta.is_dir() {
            std::fs::remove_dir_all(staging)
        } else {
            std::fs::remove_file(staging)
        };
        result.map_err(|e| PatchError::RemoveStaging(e, staging.to_path_buf()))
    }
}
