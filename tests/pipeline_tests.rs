//! End-to-end pipeline properties: build, convert, export chains.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use docforge_server::pipeline::synthesizer::CompletionOptions;
use docforge_server::pipeline::{
    ContentSynthesizer, ConversionStage, DocumentBuilder, DocxDecoder, ExportFormat,
    FormatConverter, GenerationOrchestrator, PipelineError, TextGenerator,
};
use docforge_server::storage::ArtifactStorage;

struct UnusedProvider;

#[async_trait]
impl TextGenerator for UnusedProvider {
    async fn complete(
        &self,
        _system: &str,
        _user: &str,
        _options: CompletionOptions,
    ) -> Result<String, PipelineError> {
        panic!("provider must not be called by export paths");
    }
}

fn orchestrator_in(dir: &Path) -> GenerationOrchestrator {
    let storage = ArtifactStorage::new(dir).unwrap();
    let synthesizer = Arc::new(ContentSynthesizer::new(Arc::new(UnusedProvider)));
    GenerationOrchestrator::new(synthesizer, storage)
}

#[test]
fn test_structured_export_produces_docx() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = orchestrator_in(dir.path());

    let path = orchestrator
        .export(
            Some("Quarterly report.\n\nAll targets met."),
            "document_1",
            ExportFormat::Structured,
        )
        .unwrap();

    assert_eq!(path, dir.path().join("document_1.docx"));
    assert!(path.exists());
}

#[test]
fn test_fixed_layout_export_chains_through_structured() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = orchestrator_in(dir.path());

    let path = orchestrator
        .export(
            Some("Client: Acme\nTotal: 150€"),
            "document_2",
            ExportFormat::FixedLayout,
        )
        .unwrap();

    assert_eq!(path, dir.path().join("document_2.pdf"));
    // The intermediate structured artifact is produced alongside; the
    // fixed-layout artifact is never derived from raw text directly.
    assert!(dir.path().join("document_2.docx").exists());
    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[..4], b"%PDF");
}

#[test]
fn test_sequential_exports_yield_distinct_paths() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = orchestrator_in(dir.path());

    let first = orchestrator
        .export(Some("content"), "document_3", ExportFormat::Structured)
        .unwrap();
    let second = orchestrator
        .export(Some("content"), "document_3", ExportFormat::FixedLayout)
        .unwrap();

    assert_ne!(first, second);
    // Prior artifacts are not deleted.
    assert!(first.exists());
    assert!(second.exists());
}

#[test]
fn test_export_without_content_fails_before_any_file_io() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = orchestrator_in(dir.path());

    for content in [None, Some(""), Some("   \n\t ")] {
        let err = orchestrator
            .export(content, "document_4", ExportFormat::FixedLayout)
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoContent));
    }

    let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert!(leftovers.is_empty(), "no artifact files may be created");
}

#[test]
fn test_converter_accepts_every_builder_output() {
    let dir = tempfile::tempdir().unwrap();
    let storage = ArtifactStorage::new(dir.path()).unwrap();
    let builder = DocumentBuilder::new(storage);
    let converter = FormatConverter::new();

    let long_text = "word ".repeat(2000);
    let samples = [
        "short",
        "Multi paragraph.\n\nWith a second block.\n\nAnd a third.",
        "unicode: éàü€ 日本語",
        long_text.as_str(),
    ];
    for (index, text) in samples.iter().enumerate() {
        let docx = builder.build(text, &format!("sample_{index}")).unwrap();
        let pdf = converter.to_fixed_layout(&docx).unwrap();
        assert!(pdf.exists());
    }
}

#[test]
fn test_corrupted_structured_artifact_fails_decode_stage() {
    let dir = tempfile::tempdir().unwrap();
    let corrupted = dir.path().join("corrupted.docx");
    fs::write(&corrupted, b"\x00\x01garbage").unwrap();

    let err = FormatConverter::new()
        .to_fixed_layout(&corrupted)
        .unwrap_err();
    match err {
        PipelineError::ConversionFailed { stage, .. } => {
            assert_eq!(stage, ConversionStage::Decode);
        }
        other => panic!("expected ConversionFailed, got {other:?}"),
    }
    assert!(!dir.path().join("corrupted.pdf").exists());
}

#[test]
fn test_decode_preserves_paragraph_structure() {
    let dir = tempfile::tempdir().unwrap();
    let storage = ArtifactStorage::new(dir.path()).unwrap();
    let builder = DocumentBuilder::new(storage);

    let docx = builder
        .build("# Heading kept literal\n\n**bold kept literal**", "literal")
        .unwrap();
    let markup = docforge_server::pipeline::DecodeStage::decode(&DocxDecoder, &docx).unwrap();

    // Markup characters pass through the builder as literal text.
    assert!(markup.contains("# Heading kept literal"));
    assert!(markup.contains("**bold kept literal**"));
    assert_eq!(markup.split("\n\n").count(), 2);
}
