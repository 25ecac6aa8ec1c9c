//! Reads imaging frames from disk.

use std::path::Path;

use cardiregen_core::error::{AnalysisError, Result};
use cardiregen_core::session::FrameBlob;

/// Loads a frame file (typically `.nii.gz`) into a `FrameBlob` named after
/// the file.
///
/// # Errors
///
/// - `Io` if the file cannot be read
/// - `Validation` if the file is empty
pub async fn load_frame(path: impl AsRef<Path>) -> Result<FrameBlob> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| AnalysisError::io(format!("Failed to read frame {}: {err}", path.display())))?;

    if bytes.is_empty() {
        return Err(AnalysisError::validation(format!(
            "Frame file {} is empty",
            path.display()
        )));
    }

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if !is_nifti_name(&name) {
        tracing::warn!(file = %name, "Frame does not look like a NIfTI volume (.nii / .nii.gz)");
    }

    Ok(FrameBlob::new(name, bytes))
}

fn is_nifti_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".nii") || lower.ends_with(".nii.gz")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_frame_uses_file_name() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("patient001_frame01.nii.gz");
        std::fs::write(&path, b"\x1f\x8b\x08\x00").unwrap();

        let blob = load_frame(&path).await.unwrap();

        assert_eq!(blob.name, "patient001_frame01.nii.gz");
        assert_eq!(blob.len(), 4);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_frame(temp_dir.path().join("missing.nii.gz")).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Io { .. }));
    }

    #[tokio::test]
    async fn test_empty_file_is_validation_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.nii");
        std::fs::write(&path, b"").unwrap();

        assert!(load_frame(&path).await.unwrap_err().is_validation());
    }

    #[test]
    fn test_nifti_names() {
        assert!(is_nifti_name("a.nii.gz"));
        assert!(is_nifti_name("A.NII"));
        assert!(!is_nifti_name("a.dcm"));
    }
}
