//! Document generation pipeline - template rendering, AI content synthesis,
//! and binary artifact production.
//!
//! The pipeline is composed of four stateless components tied together by the
//! [`orchestrator::GenerationOrchestrator`]:
//! - `renderer` - deterministic template binding
//! - `synthesizer` - content synthesis via an external text provider
//! - `builder` - text to structured (DOCX) artifact
//! - `converter` - structured artifact to fixed-layout (PDF) artifact

pub mod builder;
pub mod converter;
pub mod orchestrator;
pub mod renderer;
pub mod synthesizer;

pub use builder::DocumentBuilder;
pub use converter::{DecodeStage, DocxDecoder, FormatConverter, MarkupPdfRenderer, RenderStage};
pub use orchestrator::{ExportFormat, GenerationOrchestrator};
pub use renderer::TemplateRenderer;
pub use synthesizer::{
    ContentSynthesizer, DocumentFeedback, FailurePolicy, OpenAiClient, SynthesisOperation,
    TextGenerator,
};

use std::fmt;
use thiserror::Error;

/// Conversion stage that failed, carried by [`PipelineError::ConversionFailed`]
/// so callers can retry a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStage {
    Decode,
    Render,
}

impl ConversionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decode => "decode",
            Self::Render => "render",
        }
    }
}

impl fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the pipeline. These are typed so the routing layer can
/// map them to transport status codes uniformly.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("required input is missing: {0}")]
    MissingInput(&'static str),
    #[error("template references an unbound variable: {0}")]
    MissingVariable(String),
    #[error("template syntax error: {0}")]
    TemplateSyntax(String),
    #[error("text generation service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("invalid response from text generation service: {0}")]
    InvalidResponse(String),
    #[error("format conversion failed at {stage} stage: {detail}")]
    ConversionFailed {
        stage: ConversionStage,
        detail: String,
    },
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),
    #[error("document has no content to export")]
    NoContent,
    #[error("artifact store error: {0}")]
    Storage(String),
}

impl PipelineError {
    pub fn decode(detail: impl Into<String>) -> Self {
        Self::ConversionFailed {
            stage: ConversionStage::Decode,
            detail: detail.into(),
        }
    }

    pub fn render(detail: impl Into<String>) -> Self {
        Self::ConversionFailed {
            stage: ConversionStage::Render,
            detail: detail.into(),
        }
    }
}
