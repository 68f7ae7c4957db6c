//! In-memory file payload for multipart uploads

use bytes::Bytes;

/// A file ready to be sent as one multipart part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl Default for UploadFile {
    fn default() -> Self {
        Self {
            file_name: String::new(),
            content_type: "application/octet-stream".to_string(),
            data: Bytes::new(),
        }
    }
}

impl UploadFile {
    /// Build from raw bytes, guessing the content type from the file name
    pub fn from_bytes(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name,
            content_type,
            data: data.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type == "application/pdf" || crate::document::is_pdf_name(&self.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_guess() {
        let pdf = UploadFile::from_bytes("plan.pdf", &b"%PDF-1.7"[..]);
        assert_eq!(pdf.content_type, "application/pdf");
        assert!(pdf.is_pdf());
        assert_eq!(pdf.len(), 8);

        let unknown = UploadFile::from_bytes("blob", Vec::new());
        assert_eq!(unknown.content_type, "application/octet-stream");
        assert!(unknown.is_empty());
    }
}
