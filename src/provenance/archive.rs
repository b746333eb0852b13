//! Provenance Archiver
//!
//! Packages the provenance directory written by the execution engine into a
//! single deflate-compressed ZIP archive.
//!
//! Entry names are paths relative to the provenance root, always separated
//! by `/`. Directories are implicit. Entry order follows directory traversal
//! and is not sorted.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::monitoring::{Reporter, Severity};
use crate::staging::ArchiveError;

const OPERATION: &str = "provenance";

/// Writes provenance archives.
pub struct ProvenanceArchiver {
    reporter: Arc<dyn Reporter>,
}

impl ProvenanceArchiver {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self { reporter }
    }

    /// Archives every regular file under `provenance_dir` into `target`.
    ///
    /// An existing archive at `target` is replaced. When `target` lies
    /// inside `provenance_dir` it is never stored in itself.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The archive exists at `target`
    /// * `Err(ArchiveError::Missing)` - Fatal: the archive is absent after
    ///   writing. Callers must terminate the run.
    /// * `Err(_)` - I/O or compression failure
    pub fn archive(&self, target: &Path, provenance_dir: &Path) -> Result<(), ArchiveError> {
        let result = self
            .write_archive(target, provenance_dir)
            .and_then(|count| verify_archive(target).map(|_| count));

        self.conclude(target, result)
    }

    /// Reports the outcome of one archiving attempt.
    fn conclude(&self, target: &Path, result: Result<usize, ArchiveError>) -> Result<(), ArchiveError> {
        match result {
            Ok(count) => {
                self.reporter.report(
                    Severity::Debug,
                    OPERATION,
                    &format!("Provenance data {} created ({} files)", target.display(), count),
                );
                Ok(())
            }
            Err(err) => {
                self.reporter.report(
                    Severity::Fatal,
                    OPERATION,
                    &format!("Unable to create provenance data {}: {}", target.display(), err),
                );
                Err(err)
            }
        }
    }

    fn write_archive(&self, target: &Path, provenance_dir: &Path) -> Result<usize, ArchiveError> {
        let root = fs::canonicalize(provenance_dir)
            .map_err(|e| ArchiveError::io(provenance_dir, e))?;

        let mut files = Vec::new();
        collect_files(&root, &mut files)?;

        let archive_file = File::create(target).map_err(|e| ArchiveError::io(target, e))?;
        let target_canonical =
            fs::canonicalize(target).map_err(|e| ArchiveError::io(target, e))?;

        let zip_err = |source| ArchiveError::Zip {
            path: target.to_path_buf(),
            source,
        };

        let mut zip = ZipWriter::new(archive_file);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut count = 0;
        for path in files {
            if path == target_canonical {
                continue;
            }

            let name = entry_name(&root, &path)?;
            self.reporter
                .report(Severity::Debug, OPERATION, &format!("adding {}", name));

            zip.start_file(name, options).map_err(zip_err)?;
            let mut source = File::open(&path).map_err(|e| ArchiveError::io(&path, e))?;
            io::copy(&mut source, &mut zip).map_err(|e| ArchiveError::io(&path, e))?;
            count += 1;
        }

        zip.finish().map_err(zip_err)?;
        Ok(count)
    }
}

/// Checks that the archive exists after writing.
///
/// A missing archive is the fatal [`ArchiveError::Missing`].
pub fn verify_archive(target: &Path) -> Result<(), ArchiveError> {
    if target.is_file() {
        Ok(())
    } else {
        Err(ArchiveError::Missing {
            path: target.to_path_buf(),
        })
    }
}

/// Recursively collects regular files below `dir`.
fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), ArchiveError> {
    let entries = fs::read_dir(dir).map_err(|e| ArchiveError::io(dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| ArchiveError::io(dir, e))?;
        let path = entry.path();
        let ty = entry.file_type().map_err(|e| ArchiveError::io(&path, e))?;

        if ty.is_dir() {
            collect_files(&path, files)?;
        } else if path.is_file() {
            files.push(path);
        }
    }

    Ok(())
}

/// Builds the `/`-separated entry name of `path` relative to `root`.
fn entry_name(root: &Path, path: &Path) -> Result<String, ArchiveError> {
    let relative = path.strip_prefix(root).map_err(|_| {
        ArchiveError::io(
            path,
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not under provenance root {}", root.display()),
            ),
        )
    })?;

    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    Ok(parts.join("/"))
}
