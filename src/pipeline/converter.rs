//! Two-stage conversion from structured (DOCX) artifacts to fixed-layout
//! (PDF) artifacts.
//!
//! Stage 1 decodes the DOCX into an intermediate markup string preserving
//! paragraph structure; stage 2 renders that markup into a paginated A4 PDF
//! written alongside the source with a `.pdf` extension. The stages are
//! trait objects so either can be replaced in tests, and a failure carries
//! the stage name so callers can retry just the failed half.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use docx_rs::{read_docx, DocumentChild};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use pulldown_cmark::{Event, Parser, TagEnd};
use tempfile::NamedTempFile;

use super::PipelineError;

/// Wrap width in characters for the fixed-layout body text.
const WRAP_COLUMNS: usize = 88;

/// Decode a structured artifact into intermediate markup.
pub trait DecodeStage: Send + Sync {
    fn decode(&self, artifact: &Path) -> Result<String, PipelineError>;
}

/// Render intermediate markup into a fixed-layout artifact at `destination`.
pub trait RenderStage: Send + Sync {
    fn render(&self, markup: &str, destination: &Path) -> Result<(), PipelineError>;
}

/// Production decode stage: DOCX paragraphs to markdown-flavored markup,
/// one paragraph per blank-line-separated block.
pub struct DocxDecoder;

impl DecodeStage for DocxDecoder {
    fn decode(&self, artifact: &Path) -> Result<String, PipelineError> {
        let bytes = fs::read(artifact).map_err(|e| PipelineError::decode(e.to_string()))?;
        let docx = read_docx(&bytes).map_err(|e| PipelineError::decode(e.to_string()))?;

        let mut paragraphs = Vec::new();
        for child in &docx.document.children {
            if let DocumentChild::Paragraph(paragraph) = child {
                let text = paragraph.raw_text();
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    paragraphs.push(trimmed.to_string());
                }
            }
        }
        Ok(paragraphs.join("\n\n"))
    }
}

/// Production render stage: markup to a paginated A4 PDF. Output goes to a
/// temporary file first and is moved into place only on success, so a failed
/// render never leaves a partial artifact at the destination.
pub struct MarkupPdfRenderer;

impl RenderStage for MarkupPdfRenderer {
    fn render(&self, markup: &str, destination: &Path) -> Result<(), PipelineError> {
        let paragraphs = markup_paragraphs(markup);

        let (doc, first_page, first_layer) =
            PdfDocument::new("document", Mm(210.0), Mm(297.0), "body");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| PipelineError::render(e.to_string()))?;

        let mut layer = doc.get_page(first_page).get_layer(first_layer);
        let mut y = 277.0;
        for paragraph in &paragraphs {
            for line in wrap_text(paragraph, WRAP_COLUMNS) {
                if y < 20.0 {
                    let (page, layer_index) = doc.add_page(Mm(210.0), Mm(297.0), "body");
                    layer = doc.get_page(page).get_layer(layer_index);
                    y = 277.0;
                }
                layer.use_text(line, 11.0, Mm(20.0), Mm(y), &font);
                y -= 6.0;
            }
            y -= 4.0;
        }

        let parent = destination.parent().unwrap_or_else(|| Path::new("."));
        let staged =
            NamedTempFile::new_in(parent).map_err(|e| PipelineError::render(e.to_string()))?;
        let mut writer = BufWriter::new(staged);
        doc.save(&mut writer)
            .map_err(|e| PipelineError::render(e.to_string()))?;
        let staged = writer
            .into_inner()
            .map_err(|e| PipelineError::render(e.to_string()))?;
        staged
            .persist(destination)
            .map_err(|e| PipelineError::render(e.to_string()))?;
        Ok(())
    }
}

/// Ordered two-stage converter. [`FormatConverter::new`] wires the
/// production stages; [`FormatConverter::with_stages`] lets tests inject
/// mock decoders/renderers.
pub struct FormatConverter {
    decoder: Box<dyn DecodeStage>,
    renderer: Box<dyn RenderStage>,
}

impl Default for FormatConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatConverter {
    pub fn new() -> Self {
        Self::with_stages(Box::new(DocxDecoder), Box::new(MarkupPdfRenderer))
    }

    pub fn with_stages(decoder: Box<dyn DecodeStage>, renderer: Box<dyn RenderStage>) -> Self {
        Self { decoder, renderer }
    }

    /// Convert a structured artifact to its fixed-layout sibling. The
    /// returned path only exists on full success of both stages.
    pub fn to_fixed_layout(&self, structured: &Path) -> Result<PathBuf, PipelineError> {
        let markup = self.decoder.decode(structured)?;
        let destination = structured.with_extension("pdf");
        self.renderer.render(&markup, &destination)?;
        Ok(destination)
    }
}

/// Flatten markup into plain-text paragraphs for layout.
fn markup_paragraphs(markup: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();

    for event in Parser::new(markup) {
        match event {
            Event::Text(text) => current.push_str(&text),
            Event::Code(code) => current.push_str(&code),
            Event::SoftBreak | Event::HardBreak => current.push(' '),
            Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::Heading(_))
            | Event::End(TagEnd::Item) => {
                let trimmed = current.trim();
                if !trimmed.is_empty() {
                    paragraphs.push(trimmed.to_string());
                }
                current.clear();
            }
            _ => {}
        }
    }

    let trailing = current.trim();
    if !trailing.is_empty() {
        paragraphs.push(trailing.to_string());
    }
    paragraphs
}

/// Greedy word wrap; words longer than the limit are hard-split.
fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let mut word = word;
        while word.chars().count() > columns {
            let split_at = word
                .char_indices()
                .nth(columns)
                .map(|(index, _)| index)
                .unwrap_or(word.len());
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            lines.push(word[..split_at].to_string());
            word = &word[split_at..];
        }

        if line.is_empty() {
            line.push_str(word);
        } else if line.chars().count() + 1 + word.chars().count() <= columns {
            line.push(' ');
            line.push_str(word);
        } else {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ConversionStage, DocumentBuilder};
    use crate::storage::ArtifactStorage;

    #[test]
    fn test_wrap_text_respects_columns() {
        let lines = wrap_text("alpha beta gamma delta", 11);
        assert_eq!(lines, vec!["alpha beta", "gamma delta"]);
        for line in &lines {
            assert!(line.chars().count() <= 11);
        }
    }

    #[test]
    fn test_wrap_text_hard_splits_long_words() {
        let lines = wrap_text("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_markup_paragraphs_preserves_blocks() {
        let paragraphs = markup_paragraphs("First block.\n\nSecond block.");
        assert_eq!(paragraphs, vec!["First block.", "Second block."]);
    }

    #[test]
    fn test_decode_rejects_non_document_input() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("not-a-document.docx");
        fs::write(&bogus, b"definitely not a zip container").unwrap();

        let err = DocxDecoder.decode(&bogus).unwrap_err();
        match err {
            PipelineError::ConversionFailed { stage, .. } => {
                assert_eq!(stage, ConversionStage::Decode);
            }
            other => panic!("expected ConversionFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_roundtrips_builder_output() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ArtifactStorage::new(dir.path()).unwrap();
        let builder = DocumentBuilder::new(storage);

        let docx = builder
            .build("First paragraph.\n\nSecond paragraph.", "roundtrip")
            .unwrap();
        let markup = DocxDecoder.decode(&docx).unwrap();
        assert_eq!(markup, "First paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn test_full_conversion_produces_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ArtifactStorage::new(dir.path()).unwrap();
        let builder = DocumentBuilder::new(storage);

        let docx = builder.build("Some exportable content.", "convert").unwrap();
        let pdf = FormatConverter::new().to_fixed_layout(&docx).unwrap();

        assert_eq!(pdf, dir.path().join("convert.pdf"));
        let bytes = fs::read(&pdf).unwrap();
        assert_eq!(&bytes[..4], b"%PDF");
    }

    struct FailingRenderer;

    impl RenderStage for FailingRenderer {
        fn render(&self, _markup: &str, _destination: &Path) -> Result<(), PipelineError> {
            Err(PipelineError::render("disk on fire"))
        }
    }

    #[test]
    fn test_render_failure_names_stage_and_leaves_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ArtifactStorage::new(dir.path()).unwrap();
        let builder = DocumentBuilder::new(storage);

        let docx = builder.build("content", "failing").unwrap();
        let converter =
            FormatConverter::with_stages(Box::new(DocxDecoder), Box::new(FailingRenderer));

        let err = converter.to_fixed_layout(&docx).unwrap_err();
        match err {
            PipelineError::ConversionFailed { stage, .. } => {
                assert_eq!(stage, ConversionStage::Render);
            }
            other => panic!("expected ConversionFailed, got {other:?}"),
        }
        assert!(!dir.path().join("failing.pdf").exists());
    }
}
