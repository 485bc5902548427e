//! Structured-document (DOCX) artifact production.
//!
//! Turns final document text into a paragraph-oriented DOCX file in the
//! artifact store. The transform is lossy and one-directional: paragraphs
//! are split on blank lines, written justified, and any markup characters in
//! the text are kept as literal text.

use std::fs;
use std::path::PathBuf;

use docx_rs::{AlignmentType, Docx, Paragraph, Run};

use crate::storage::ArtifactStorage;

use super::PipelineError;

pub struct DocumentBuilder {
    storage: ArtifactStorage,
}

impl DocumentBuilder {
    pub fn new(storage: ArtifactStorage) -> Self {
        Self { storage }
    }

    /// Write `text` as a DOCX artifact named after `name`, returning its
    /// path in the artifact store.
    pub fn build(&self, text: &str, name: &str) -> Result<PathBuf, PipelineError> {
        let mut docx = Docx::new();
        for paragraph in split_paragraphs(text) {
            docx = docx.add_paragraph(
                Paragraph::new()
                    .align(AlignmentType::Justified)
                    .add_run(Run::new().add_text(paragraph)),
            );
        }

        let path = self.storage.artifact_path(name, "docx");
        let file = fs::File::create(&path).map_err(|e| PipelineError::Storage(e.to_string()))?;
        docx.build()
            .pack(file)
            .map_err(|e| PipelineError::Storage(e.to_string()))?;
        Ok(path)
    }
}

/// Split text on blank-line boundaries, dropping empty paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_paragraphs_drops_empties() {
        let paragraphs = split_paragraphs("First paragraph.\n\n\n\nSecond.\n\n   \n\nThird.");
        assert_eq!(paragraphs, vec!["First paragraph.", "Second.", "Third."]);
    }

    #[test]
    fn test_split_paragraphs_normalizes_crlf() {
        let paragraphs = split_paragraphs("one\r\n\r\ntwo");
        assert_eq!(paragraphs, vec!["one", "two"]);
    }

    #[test]
    fn test_single_paragraph_keeps_inner_newlines() {
        let paragraphs = split_paragraphs("Client: Acme\nTotal: 150€");
        assert_eq!(paragraphs, vec!["Client: Acme\nTotal: 150€"]);
    }

    #[test]
    fn test_build_writes_docx_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ArtifactStorage::new(dir.path()).unwrap();
        let builder = DocumentBuilder::new(storage);

        let path = builder
            .build("Hello world.\n\nSecond paragraph.", "document_1")
            .unwrap();

        assert_eq!(path, dir.path().join("document_1.docx"));
        // DOCX artifacts are zip containers; check the magic bytes.
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
