//! External process helpers shared by the Poppler and Tesseract adapters.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::PdfError;

/// Runs `program` with `args` and returns its stdout.
///
/// A spawn failure (typically "not installed") and a non-zero exit both
/// map to [`PdfError::Tool`].
pub fn run(program: &Path, args: &[&std::ffi::OsStr]) -> Result<Vec<u8>, PdfError> {
    let tool = program.display().to_string();

    log::debug!("Running {tool} with {} argument(s)", args.len());

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| PdfError::Tool {
            tool: tool.clone(),
            message: format!("could not start: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PdfError::Tool {
            tool,
            message: format!("{}: {}", output.status, stderr.trim()),
        });
    }

    Ok(output.stdout)
}

/// Returns a unique path under the system temp directory.
pub fn temp_path(extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "monthly_report_{}.{extension}",
        uuid::Uuid::new_v4()
    ))
}

/// Like [`temp_path`] but without an extension, for tools that append
/// their own.
pub fn temp_prefix() -> PathBuf {
    std::env::temp_dir().join(format!("monthly_report_{}", uuid::Uuid::new_v4()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_paths_are_unique() {
        let a = temp_path("png");
        let b = temp_path("png");
        assert_ne!(a, b);
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("png"));
    }

    #[test]
    fn missing_program_is_a_tool_error() {
        let result = run(Path::new("monthly-report-no-such-tool"), &[]);
        assert!(matches!(result, Err(PdfError::Tool { .. })));
    }
}
