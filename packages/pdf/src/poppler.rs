//! [`PageSource`] backed by `pdf-extract` and the Poppler utilities.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::layout::{self, Block};
use crate::{PageSource, PdfError, RenderedPage, tool};

/// Native PDF resolution in dots per inch.
const NATIVE_DPI: f32 = 72.0;

/// Locations of the Poppler command-line tools.
#[derive(Debug, Clone)]
pub struct PopplerTools {
    /// `pdftotext` executable, used for the bbox layout.
    pub pdftotext: PathBuf,
    /// `pdftoppm` executable, used for rendering.
    pub pdftoppm: PathBuf,
}

impl Default for PopplerTools {
    fn default() -> Self {
        Self {
            pdftotext: PathBuf::from("pdftotext"),
            pdftoppm: PathBuf::from("pdftoppm"),
        }
    }
}

/// The first page of a PDF on disk.
///
/// Plain text is extracted eagerly in [`PopplerPage::open`] so that an
/// unreadable document is rejected before any other work happens. Layout
/// and rendering shell out to Poppler on demand.
#[derive(Debug)]
pub struct PopplerPage {
    path: PathBuf,
    text: String,
    tools: PopplerTools,
}

impl PopplerPage {
    /// Opens `path` and extracts its first page's text.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::Open`] if the file cannot be read, or
    /// [`PdfError::Extraction`] if it is not a readable PDF or has no pages.
    pub fn open(path: &Path, tools: PopplerTools) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path).map_err(|e| PdfError::Open {
            path: path.display().to_string(),
            source: e,
        })?;

        log::debug!("Read {} bytes from {}", bytes.len(), path.display());

        let pages = extract_pages(&bytes).map_err(|message| {
            PdfError::Extraction(format!(
                "failed to extract text from {}: {message}",
                path.display()
            ))
        })?;

        let text = pages.into_iter().next().ok_or_else(|| {
            PdfError::Extraction(format!("{} has no pages", path.display()))
        })?;

        log::debug!(
            "Extracted {} characters of first-page text from {}",
            text.len(),
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            text,
            tools,
        })
    }
}

/// Runs `pdf-extract` over `bytes`. The library panics on some malformed
/// documents (e.g. a font without `/Subtype`), so a panic is turned into
/// an error like any other extraction failure.
fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, String> {
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes)) {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown cause".to_owned());
            Err(format!("PDF parser panicked: {reason}"))
        }
    }
}

/// Converts a linear scale factor into a render resolution.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn dpi_for_scale(scale: f32) -> u32 {
    (NATIVE_DPI * scale.max(0.1)).round() as u32
}

impl PageSource for PopplerPage {
    fn plain_text(&self) -> Result<String, PdfError> {
        Ok(self.text.clone())
    }

    fn layout(&self) -> Result<Vec<Block>, PdfError> {
        let stdout = tool::run(
            &self.tools.pdftotext,
            &[
                OsStr::new("-f"),
                OsStr::new("1"),
                OsStr::new("-l"),
                OsStr::new("1"),
                OsStr::new("-bbox-layout"),
                self.path.as_os_str(),
                OsStr::new("-"),
            ],
        )?;

        layout::parse_bbox_layout(&String::from_utf8_lossy(&stdout))
    }

    fn render(&self, scale: f32) -> Result<RenderedPage, PdfError> {
        let prefix = tool::temp_prefix();
        let dpi = dpi_for_scale(scale).to_string();

        tool::run(
            &self.tools.pdftoppm,
            &[
                OsStr::new("-png"),
                OsStr::new("-singlefile"),
                OsStr::new("-r"),
                OsStr::new(&dpi),
                OsStr::new("-f"),
                OsStr::new("1"),
                OsStr::new("-l"),
                OsStr::new("1"),
                self.path.as_os_str(),
                prefix.as_os_str(),
            ],
        )?;

        let image_path = prefix.with_extension("png");
        let png = std::fs::read(&image_path);
        std::fs::remove_file(&image_path).ok();
        let png = png?;

        log::debug!(
            "Rendered {} at {dpi} DPI ({} bytes)",
            self.path.display(),
            png.len()
        );

        Ok(RenderedPage { png, scale })
    }
}
