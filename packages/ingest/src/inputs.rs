//! Resolving command-line inputs into a list of PDF documents.
//!
//! An input may be a PDF file, a directory (its `*.pdf` files, not
//! recursive) or a `.zip` archive whose PDF members are extracted to a
//! scratch directory. Scratch directories are removed when the
//! [`Inputs`] is dropped.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::IngestError;

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> IngestError + '_ {
    move |source| IngestError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Documents gathered from all inputs.
#[derive(Debug, Default)]
pub struct Inputs {
    documents: Vec<PathBuf>,
    scratch: Vec<PathBuf>,
}

impl Inputs {
    /// Resolves every path in `paths`, in order.
    ///
    /// # Errors
    ///
    /// * [`IngestError::NotFound`] if a path does not exist
    /// * [`IngestError::Io`] if a directory cannot be listed
    /// * [`IngestError::Zip`] if an archive cannot be opened
    pub fn collect(paths: &[PathBuf]) -> Result<Self, IngestError> {
        let mut inputs = Self::default();

        for path in paths {
            if !path.exists() {
                return Err(IngestError::NotFound(path.display().to_string()));
            }

            if path.is_dir() {
                inputs.documents.extend(pdfs_in_dir(path)?);
            } else if has_extension(path, "zip") {
                let scratch = scratch_dir();
                inputs.scratch.push(scratch.clone());
                inputs.documents.extend(extract_zip(path, &scratch)?);
            } else if has_extension(path, "pdf") {
                inputs.documents.push(path.clone());
            } else {
                log::warn!("Skipping {}: not a PDF, directory or ZIP archive", path.display());
            }
        }

        log::info!("Found {} document(s)", inputs.documents.len());

        Ok(inputs)
    }

    /// The resolved PDF paths.
    #[must_use]
    pub fn documents(&self) -> &[PathBuf] {
        &self.documents
    }

    /// Whether no document was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl Drop for Inputs {
    fn drop(&mut self) {
        for dir in &self.scratch {
            if let Err(e) = std::fs::remove_dir_all(dir) {
                log::debug!("Could not remove {}: {e}", dir.display());
            }
        }
    }
}

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("monthly_report_{}", uuid::Uuid::new_v4()))
}

/// Lists `*.pdf` files directly under `dir`, sorted by path.
fn pdfs_in_dir(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir).map_err(io_error(dir))? {
        let path = entry.map_err(io_error(dir))?.path();
        if path.is_file() && has_extension(&path, "pdf") {
            files.push(path);
        }
    }

    files.sort();
    log::debug!("{}: {} PDF(s)", dir.display(), files.len());

    Ok(files)
}

/// Extracts the PDF members of `archive_path` into `dest`. Corrupt or
/// unreadable members are skipped.
fn extract_zip(archive_path: &Path, dest: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let zip_error = |source| IngestError::Zip {
        path: archive_path.display().to_string(),
        source,
    };

    let file = File::open(archive_path).map_err(io_error(archive_path))?;
    let mut archive = zip::ZipArchive::new(file).map_err(zip_error)?;
    std::fs::create_dir_all(dest).map_err(io_error(dest))?;

    let mut extracted = Vec::new();

    for i in 0..archive.len() {
        let mut entry = match archive.by_index(i) {
            Ok(e) => e,
            Err(e) => {
                log::warn!("  skipping corrupt zip entry {i}: {e}");
                continue;
            }
        };

        if entry.is_dir() {
            continue;
        }

        let entry_name = entry.name().to_string();
        let Some(file_name) = Path::new(&entry_name).file_name() else {
            continue;
        };
        if !has_extension(Path::new(file_name), "pdf") {
            continue;
        }

        // Prefix with the index so same-named members in different
        // folders don't collide.
        let target = dest.join(format!("{i:04}_{}", file_name.to_string_lossy()));
        let copied = File::create(&target).and_then(|mut out| std::io::copy(&mut entry, &mut out));

        match copied {
            Ok(bytes) => {
                log::debug!("  extracted {entry_name} ({bytes} bytes)");
                extracted.push(target);
            }
            Err(e) => {
                log::warn!("  skipping {entry_name}: {e}");
                std::fs::remove_file(&target).ok();
            }
        }
    }

    log::info!(
        "{}: extracted {} PDF(s)",
        archive_path.display(),
        extracted.len()
    );

    Ok(extracted)
}
