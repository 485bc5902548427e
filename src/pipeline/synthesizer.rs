//! Content synthesis via an external generative text provider.
//!
//! The provider sits behind [`TextGenerator`] so tests substitute a fake; the
//! production implementation is an OpenAI-compatible chat-completions client.
//! Each operation makes at most one outbound call and performs no retries -
//! retry policy, if wanted, belongs to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AiSettings;

use super::PipelineError;

const GENERATE_SYSTEM_PROMPT: &str =
    "You are an expert writer of professional business documents.";
const IMPROVE_SYSTEM_PROMPT: &str = "You are an expert editor of professional documents.";
const CRITIQUE_SYSTEM_PROMPT: &str = "You are an expert reviewer of professional documents.";

/// Message shown for every feedback category when critique degrades.
pub const FEEDBACK_UNAVAILABLE: &str = "Analysis unavailable";

/// Per-invocation provider limits.
#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Outbound text provider contract. One call per `complete` invocation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        options: CompletionOptions,
    ) -> Result<String, PipelineError>;
}

/// What a synthesis operation does with a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Surface the failure to the caller.
    Propagate,
    /// Swallow the failure and answer with a fixed placeholder result.
    DegradeWithDefault,
}

/// The three synthesis operations, each with an explicit failure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisOperation {
    Generate,
    Improve,
    Critique,
}

impl SynthesisOperation {
    /// `generate` and `improve` propagate provider failures; `critique`
    /// degrades to placeholder feedback instead of failing its caller.
    pub fn failure_policy(self) -> FailurePolicy {
        match self {
            Self::Generate | Self::Improve => FailurePolicy::Propagate,
            Self::Critique => FailurePolicy::DegradeWithDefault,
        }
    }
}

/// Structured feedback returned by [`ContentSynthesizer::critique`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFeedback {
    pub grammar: String,
    pub style: String,
    pub structure: String,
    pub content: String,
}

impl DocumentFeedback {
    pub fn unavailable() -> Self {
        Self {
            grammar: FEEDBACK_UNAVAILABLE.to_string(),
            style: FEEDBACK_UNAVAILABLE.to_string(),
            structure: FEEDBACK_UNAVAILABLE.to_string(),
            content: FEEDBACK_UNAVAILABLE.to_string(),
        }
    }
}

/// OpenAI-compatible chat-completions client. Model and limits are injected
/// through [`AiSettings`] rather than read from ambient globals.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, settings: &AiSettings) -> Self {
        Self {
            http,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        options: CompletionOptions,
    ) -> Result<String, PipelineError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::ServiceUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::ServiceUnavailable(format!(
                "provider returned status {}",
                response.status()
            )));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| PipelineError::InvalidResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PipelineError::InvalidResponse("completion had no choices".into()))
    }
}

/// Builds prompts and runs the three synthesis operations against the
/// injected provider.
pub struct ContentSynthesizer {
    provider: Arc<dyn TextGenerator>,
}

impl ContentSynthesizer {
    pub fn new(provider: Arc<dyn TextGenerator>) -> Self {
        Self { provider }
    }

    /// Synthesize document text from a (possibly empty) template, a data
    /// mapping and optional free-text context.
    pub async fn generate(
        &self,
        document_type: &str,
        template_text: &str,
        data: &Value,
        context: Option<&str>,
    ) -> Result<String, PipelineError> {
        let prompt = build_generation_prompt(document_type, template_text, data, context);
        let reply = self
            .provider
            .complete(
                GENERATE_SYSTEM_PROMPT,
                &prompt,
                CompletionOptions {
                    max_tokens: 2000,
                    temperature: 0.3,
                },
            )
            .await?;

        let trimmed = reply.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::InvalidResponse("empty completion".into()));
        }
        Ok(trimmed.to_string())
    }

    /// Rewrite `text` according to an improvement kind. Unknown kinds are
    /// passed through verbatim as a freeform instruction.
    pub async fn improve(
        &self,
        text: &str,
        improvement_kind: &str,
        context: Option<&str>,
    ) -> Result<String, PipelineError> {
        let prompt = build_improvement_prompt(text, improvement_kind, context);
        let reply = self
            .provider
            .complete(
                IMPROVE_SYSTEM_PROMPT,
                &prompt,
                CompletionOptions {
                    max_tokens: 2000,
                    temperature: 0.2,
                },
            )
            .await?;

        let trimmed = reply.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::InvalidResponse("empty completion".into()));
        }
        Ok(trimmed.to_string())
    }

    /// Request structured feedback on `text`. Never fails: per
    /// [`SynthesisOperation::failure_policy`] this is the one degrading
    /// operation - provider failures and unparsable replies yield
    /// placeholder feedback instead of an error.
    pub async fn critique(&self, text: &str) -> DocumentFeedback {
        match self.try_critique(text).await {
            Ok(feedback) => feedback,
            Err(e) => {
                log::warn!("critique degraded to placeholder feedback: {e}");
                DocumentFeedback::unavailable()
            }
        }
    }

    async fn try_critique(&self, text: &str) -> Result<DocumentFeedback, PipelineError> {
        let prompt = build_critique_prompt(text);
        let reply = self
            .provider
            .complete(
                CRITIQUE_SYSTEM_PROMPT,
                &prompt,
                CompletionOptions {
                    max_tokens: 1000,
                    temperature: 0.3,
                },
            )
            .await?;

        parse_feedback(&reply)
            .ok_or_else(|| PipelineError::InvalidResponse("feedback was not valid JSON".into()))
    }
}

fn build_generation_prompt(
    document_type: &str,
    template_text: &str,
    data: &Value,
    context: Option<&str>,
) -> String {
    let serialized = serde_json::to_string_pretty(data).unwrap_or_default();
    let context_section = context
        .map(|c| format!("Additional context: {c}\n\n"))
        .unwrap_or_default();

    format!(
        "Document type: {document_type}\n\n\
         Template to follow:\n{template_text}\n\n\
         Data to integrate:\n{serialized}\n\n\
         {context_section}\
         Instructions:\n\
         1. Write the document content following the template\n\
         2. Integrate all provided data\n\
         3. Match the tone to the document type (professional, formal)\n\
         4. Make sure the document is coherent and complete\n\
         5. Return only the final content, without commentary\n\n\
         Document content:"
    )
}

fn build_improvement_prompt(text: &str, improvement_kind: &str, context: Option<&str>) -> String {
    let instruction = improvement_instruction(improvement_kind);
    let context_section = context
        .map(|c| format!("Context: {c}\n\n"))
        .unwrap_or_default();

    format!(
        "Document to improve:\n{text}\n\n\
         Requested improvement: {instruction}\n\n\
         {context_section}\
         Instructions:\n\
         1. Apply the requested improvement\n\
         2. Preserve the meaning and the structure\n\
         3. Return the improved document only"
    )
}

/// Fixed vocabulary of improvement kinds; anything else passes through as a
/// freeform instruction.
fn improvement_instruction(kind: &str) -> &str {
    match kind {
        "grammar" => "Fix grammar and spelling",
        "style" => "Improve style and flow",
        "professional" => "Make the tone more professional",
        "concise" => "Make the text more concise",
        "detailed" => "Add more detail",
        other => other,
    }
}

fn build_critique_prompt(text: &str) -> String {
    format!(
        "Analyze this document and suggest improvements:\n\n{text}\n\n\
         Return your suggestions as JSON with the keys:\n\
         - grammar: grammar corrections\n\
         - style: style improvements\n\
         - structure: structure improvements\n\
         - content: content suggestions"
    )
}

/// Extract a `DocumentFeedback` from a provider reply, tolerating code fences
/// and prose around the JSON object.
fn parse_feedback(reply: &str) -> Option<DocumentFeedback> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&reply[start..=end]).ok()
}
