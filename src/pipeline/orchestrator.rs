//! Per-document coordination of the pipeline components.
//!
//! The orchestrator owns no persistent state; it is invoked per request and
//! decides which template text applies, which generation path runs, and
//! which export chain to execute. Document records themselves are read and
//! written by the caller.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;

use crate::document::models::DocumentType;
use crate::metrics;
use crate::storage::ArtifactStorage;
use crate::template::defaults::builtin_template;
use crate::template::models::Template;

use super::builder::DocumentBuilder;
use super::converter::FormatConverter;
use super::renderer::TemplateRenderer;
use super::synthesizer::ContentSynthesizer;
use super::PipelineError;

/// Export target. `Structured` is a DOCX artifact; `FixedLayout` a PDF
/// derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Structured,
    FixedLayout,
}

impl ExportFormat {
    /// Parse a wire-format value. `docx`/`pdf` are the primary spellings,
    /// `structured`/`fixed-layout` are accepted aliases.
    pub fn parse(value: &str) -> Result<Self, PipelineError> {
        match value {
            "docx" | "structured" => Ok(Self::Structured),
            "pdf" | "fixed-layout" => Ok(Self::FixedLayout),
            other => Err(PipelineError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Structured => "docx",
            Self::FixedLayout => "pdf",
        }
    }
}

pub struct GenerationOrchestrator {
    synthesizer: Arc<ContentSynthesizer>,
    renderer: TemplateRenderer,
    builder: DocumentBuilder,
    converter: FormatConverter,
}

impl GenerationOrchestrator {
    pub fn new(synthesizer: Arc<ContentSynthesizer>, storage: ArtifactStorage) -> Self {
        Self {
            synthesizer,
            renderer: TemplateRenderer::new(),
            builder: DocumentBuilder::new(storage),
            converter: FormatConverter::new(),
        }
    }

    /// Template text for a generation request: the explicit template when
    /// one is attached, else the built-in default for the document type,
    /// else empty (the synthesizer works from data alone).
    pub fn resolve_template(
        &self,
        document_type: DocumentType,
        explicit: Option<&Template>,
    ) -> String {
        if let Some(template) = explicit {
            return template.template_content.clone();
        }
        builtin_template(document_type)
            .map(str::to_string)
            .unwrap_or_default()
    }

    /// Synthesis path: produce content through the text provider. Requires
    /// a data mapping.
    pub async fn synthesize(
        &self,
        document_type: DocumentType,
        template_text: &str,
        data: Option<&Value>,
        context: Option<&str>,
    ) -> Result<String, PipelineError> {
        let data = data.ok_or(PipelineError::MissingInput("template_data"))?;
        let content = self
            .synthesizer
            .generate(document_type.as_str(), template_text, data, context)
            .await?;
        metrics::DOCUMENTS_GENERATED.inc();
        Ok(content)
    }

    /// Deterministic path: bind the data mapping into the template without
    /// calling the provider. Requires both a template and a data mapping.
    pub fn render(
        &self,
        template_text: &str,
        data: Option<&Value>,
    ) -> Result<String, PipelineError> {
        let data = data.ok_or(PipelineError::MissingInput("template_data"))?;
        if template_text.trim().is_empty() {
            return Err(PipelineError::MissingInput("template"));
        }
        let content = self.renderer.render(template_text, data)?;
        metrics::DOCUMENTS_GENERATED.inc();
        Ok(content)
    }

    /// Export chain. Content is validated before any file I/O happens;
    /// `FixedLayout` chains the structured artifact into the converter.
    /// Blocking - run off the async dispatch path.
    pub fn export(
        &self,
        content: Option<&str>,
        name: &str,
        format: ExportFormat,
    ) -> Result<PathBuf, PipelineError> {
        let content = content
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or(PipelineError::NoContent)?;

        let structured = self.builder.build(content, name)?;
        let path = match format {
            ExportFormat::Structured => structured,
            ExportFormat::FixedLayout => self.converter.to_fixed_layout(&structured)?,
        };
        metrics::DOCUMENTS_EXPORTED
            .with_label_values(&[format.extension()])
            .inc();
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_parsing() {
        assert_eq!(
            ExportFormat::parse("docx").unwrap(),
            ExportFormat::Structured
        );
        assert_eq!(
            ExportFormat::parse("structured").unwrap(),
            ExportFormat::Structured
        );
        assert_eq!(
            ExportFormat::parse("pdf").unwrap(),
            ExportFormat::FixedLayout
        );
        assert_eq!(
            ExportFormat::parse("fixed-layout").unwrap(),
            ExportFormat::FixedLayout
        );
        assert!(matches!(
            ExportFormat::parse("odt"),
            Err(PipelineError::UnsupportedFormat(f)) if f == "odt"
        ));
    }
}
