//! Moving a `.vsix` (a plain zip) to and from a staging directory.

use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use chrono::{Datelike, Local, Timelike};
use jwalk::WalkDir;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Opening archive failed. Path: '{}'", .1.display())]
    Open(#[source] std::io::Error, PathBuf),

    #[error("Not a valid zip archive. Path: '{}'", .1.display())]
    Format(#[source] ZipError, PathBuf),

    #[error("Extracting archive failed. Path: '{}'", .1.display())]
    Extract(#[source] ZipError, PathBuf),

    #[error("Creating archive failed. Path: '{}'", .1.display())]
    Create(#[source] std::io::Error, PathBuf),

    #[error("Walking staging directory failed. Path: '{}'", .1.display())]
    Walk(#[source] jwalk::Error, PathBuf),

    #[error("Path cannot be stored in a zip archive. Path: '{}'", .0.display())]
    EntryName(PathBuf),

    #[error("Adding file to archive failed. Path: '{}'", .1.display())]
    AddFile(#[source] ZipError, PathBuf),

    #[error("Finishing archive failed. Path: '{}'", .1.display())]
    Finish(#[source] ZipError, PathBuf),
}

/// Unpacks every entry of `archive` below `staging`, creating directories as
/// needed. Returns the number of entries in the archive.
///
/// Entry names that would land outside `staging` are refused by the zip
/// reader.
pub fn extract(archive: &Path, staging: &Path) -> Result<usize, ArchiveError> {
    let file = File::open(archive).map_err(|e| ArchiveError::Open(e, archive.to_path_buf()))?;
    let mut zip = ZipArchive::new(BufReader::new(file))
        .map_err(|e| ArchiveError::Format(e, archive.to_path_buf()))?;

    let entries = zip.len();
    tracing::debug!(entries, archive = %archive.display(), staging = %staging.display(), "extracting");

    zip.extract(staging)
        .map_err(|e| ArchiveError::Extract(e, staging.to_path_buf()))?;
    Ok(entries)
}

/// Writes every file below `staging` into a new zip at `output`, named by its
/// path relative to `staging`. Directories are not stored as entries of their
/// own. Returns the number of files written.
pub fn repack(staging: &Path, output: &Path) -> Result<usize, ArchiveError> {
    let file = File::create(output).map_err(|e| ArchiveError::Create(e, output.to_path_buf()))?;
    let mut zip = ZipWriter::new(file);
    let mut written = 0;

    for entry in WalkDir::new(staging).sort(true).skip_hidden(false) {
        let entry = entry.map_err(|e| ArchiveError::Walk(e, staging.to_path_buf()))?;
        if entry.depth == 0 || entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        if path.is_dir() {
            tracing::warn!(path = %path.display(), "skipping symlink to directory");
            continue;
        }

        let name = entry_name(staging, &path)?;
        tracing::trace!(name = %name, "adding");

        zip.start_file(name.as_str(), file_options(&path)?)
            .map_err(|e| ArchiveError::AddFile(e, path.clone()))?;
        let mut source =
            File::open(&path).map_err(|e| ArchiveError::AddFile(ZipError::Io(e), path.clone()))?;
        std::io::copy(&mut source, &mut zip)
            .map_err(|e| ArchiveError::AddFile(ZipError::Io(e), path.clone()))?;
        written += 1;
    }

    zip.finish()
        .map_err(|e| ArchiveError::Finish(e, output.to_path_buf()))?;
    tracing::debug!(written, output = %output.display(), "repacked");
    Ok(written)
}

/// `/`-separated path of `path` relative to `root`.
fn entry_name(root: &Path, path: &Path) -> Result<String, ArchiveError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| ArchiveError::EntryName(path.to_path_buf()))?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => match part.to_str() {
                Some(part) => parts.push(part),
                None => return Err(ArchiveError::EntryName(path.to_path_buf())),
            },
            _ => return Err(ArchiveError::EntryName(path.to_path_buf())),
        }
    }

    if parts.is_empty() {
        return Err(ArchiveError::EntryName(path.to_path_buf()));
    }
    Ok(parts.join("/"))
}

fn file_options(path: &Path) -> Result<SimpleFileOptions, ArchiveError> {
    let meta = std::fs::metadata(path)
        .map_err(|e| ArchiveError::AddFile(ZipError::Io(e), path.to_path_buf()))?;

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .large_file(meta.len() >= u32::MAX as u64);

    let options = match modified_time(&meta) {
        Some(time) => options.last_modified_time(time),
        None => {
            tracing::debug!(path = %path.display(), "modification time out of range");
            options
        }
    };

    #[cfg(unix)]
    let options = {
        use std::os::unix::fs::PermissionsExt;
        options.unix_permissions(meta.permissions().mode() & 0o777)
    };

    Ok(options)
}

/// Local modification time of a file, if it fits the DOS range zip stores
/// (1980 to 2107, two second resolution).
fn modified_time(meta: &std::fs::Metadata) -> Option<zip::DateTime> {
    let modified: chrono::DateTime<Local> = meta.modified().ok()?.into();
    zip::DateTime::from_date_and_time(
        u16::try_from(modified.year()).ok()?,
        modified.month() as u8,
        modified.day() as u8,
        modified.hour() as u8,
        modified.minute() as u8,
        modified.second() as u8,
    )
    .ok()
}
