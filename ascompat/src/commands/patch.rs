use vsix_format::{ArchiveError, PatchError, PatchOptions, PatchPaths, Patcher, ProductVersion};

use crate::cli::Cli;
use crate::error::{Error, Result};

pub fn run(args: Cli) -> Result<()> {
    if !args.input.is_file() {
        return Err(Error::InvalidInput { path: args.input });
    }

    let version =
        ProductVersion::parse(&args.product_version).map_err(|source| Error::InvalidVersion {
            version: args.product_version.clone(),
            source,
        })?;

    let patcher = Patcher::new(PatchOptions::default().force(args.force));
    let paths = patcher.paths(&args.input, &version);

    let report = patcher
        .run(&args.input, &version)
        .map_err(|e| into_error(e, &args, &paths))?;

    tracing::info!(
        output = %report.output.display(),
        staging = %report.staging.display(),
        entries = report.entries_written,
        references_removed = report.references_removed,
        "patched"
    );

    if !args.quiet {
        println!("Extension compatibility forced to Atmel Studio {}.", version);
    }

    Ok(())
}

fn into_error(error: PatchError, args: &Cli, paths: &PatchPaths) -> Error {
    match error {
        PatchError::StagingExists(path) => Error::StagingExists { path },
        PatchError::InspectStaging(source, path) => Error::InspectStaging { path, source },
        PatchError::RemoveStaging(source, path) => Error::RemoveStaging { path, source },
        PatchError::Manifest(source) => Error::PatchManifest {
            path: paths.manifest.clone(),
            source,
        },
        PatchError::Archive(
            source @ (ArchiveError::Open(..) | ArchiveError::Format(..) | ArchiveError::Extract(..)),
        ) => Error::ExtractArchive {
            path: args.input.clone(),
            source,
        },
        PatchError::Archive(source) => Error::CreateArchive {
            path: paths.output.clone(),
            source,
        },
    }
}
