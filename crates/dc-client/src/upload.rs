//! Reading local files for upload

use std::path::Path;

use dc_core::{DcError, DcResult};
use dc_models::UploadFile;
use tracing::debug;

/// Read `path` into an [`UploadFile`], guessing the content type from the
/// extension.
pub async fn load_file(path: impl AsRef<Path>) -> DcResult<UploadFile> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| DcError::Internal(format!("not a file path: {}", path.display())))?;
    let data = tokio::fs::read(path).await?;
    debug!(file = %file_name, bytes = data.len(), "Loaded upload");
    Ok(UploadFile::from_bytes(file_name, data))
}

/// Write a downloaded file into `dir`, returning the written path
pub async fn save_file(
    dir: impl AsRef<Path>,
    file: &crate::api::DownloadedFile,
) -> DcResult<std::path::PathBuf> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await?;
    let name = Path::new(&file.file_name)
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "download".into());
    let target = dir.join(name);
    tokio::fs::write(&target, &file.data).await?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DownloadedFile;

    #[tokio::test]
    async fn test_load_guesses_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("license.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let file = load_file(&path).await.unwrap();
        assert_eq!(file.file_name, "license.pdf");
        assert_eq!(file.content_type, "application/pdf");
        assert_eq!(file.len(), 8);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = load_file("/definitely/not/here.pdf").await.unwrap_err();
        assert!(matches!(err, DcError::Io(_)));
    }

    #[tokio::test]
    async fn test_save_strips_directories_from_name() {
        let dir = tempfile::tempdir().unwrap();
        let file = DownloadedFile {
            file_name: "../../etc/plan.pdf".into(),
            content_type: "application/pdf".into(),
            data: bytes::Bytes::from_static(b"%PDF"),
        };
        let written = save_file(dir.path(), &file).await.unwrap();
        assert_eq!(written, dir.path().join("plan.pdf"));
    }
}
