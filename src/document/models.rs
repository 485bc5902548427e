use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Kind of business document being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Quote,
    Invoice,
    Contract,
    Letter,
    Terms,
    Other,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Invoice => "invoice",
            Self::Contract => "contract",
            Self::Letter => "letter",
            Self::Terms => "terms",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "quote" => Some(Self::Quote),
            "invoice" => Some(Self::Invoice),
            "contract" => Some(Self::Contract),
            "letter" => Some(Self::Letter),
            "terms" => Some(Self::Terms),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Lifecycle status. Stored as-is; transitions are not guarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Draft,
    Finalized,
    Sent,
    Archived,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Finalized => "finalized",
            Self::Sent => "sent",
            Self::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "finalized" => Some(Self::Finalized),
            "sent" => Some(Self::Sent),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// Document record as stored and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub document_type: DocumentType,
    pub status: DocumentStatus,
    /// Generated or rendered body. Derived data: produced by the pipeline,
    /// though free-text edits through the update endpoint are accepted.
    pub content: Option<String>,
    /// Input variables the content was produced from.
    #[schema(value_type = Option<Object>)]
    pub template_data: Option<serde_json::Value>,
    /// Path of the last exported artifact; overwritten on re-export.
    pub file_path: Option<String>,
    pub user_id: i64,
    pub template_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Document plus the resolved template name, for detail responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentWithTemplate {
    #[serde(flatten)]
    pub document: Document,
    pub template_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDocumentRequest {
    pub title: String,
    pub document_type: DocumentType,
    pub status: Option<DocumentStatus>,
    #[schema(value_type = Option<Object>)]
    pub template_data: Option<serde_json::Value>,
    pub template_id: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDocumentRequest {
    pub title: Option<String>,
    pub status: Option<DocumentStatus>,
    pub content: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub template_data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DocumentListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    /// Filter by document type (e.g. `invoice`).
    pub document_type: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct GenerateRequest {
    /// Optional free-text context forwarded to the synthesizer.
    pub context: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GenerateResponse {
    pub content: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ExportQuery {
    /// Target format: `docx` (alias `structured`) or `pdf` (alias
    /// `fixed-layout`). Defaults to `docx`.
    pub format: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExportResponse {
    pub file_path: String,
    pub mime_type: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub message: String,
}
