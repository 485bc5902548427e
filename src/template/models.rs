use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    Freelance,
    Agency,
    Legal,
    Accounting,
    Hr,
    Other,
}

impl TemplateCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Freelance => "freelance",
            Self::Agency => "agency",
            Self::Legal => "legal",
            Self::Accounting => "accounting",
            Self::Hr => "hr",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "freelance" => Some(Self::Freelance),
            "agency" => Some(Self::Agency),
            "legal" => Some(Self::Legal),
            "accounting" => Some(Self::Accounting),
            "hr" => Some(Self::Hr),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn all() -> [Self; 6] {
        [
            Self::Freelance,
            Self::Agency,
            Self::Legal,
            Self::Accounting,
            Self::Hr,
            Self::Other,
        ]
    }
}

/// Reusable text pattern with named placeholders. A public template has no
/// effective owner for access control; a private one is visible only to its
/// owner.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: TemplateCategory,
    pub template_content: String,
    /// Advisory description of expected variables; not enforced at render
    /// time.
    #[schema(value_type = Option<Object>)]
    pub variables_schema: Option<serde_json::Value>,
    pub is_public: bool,
    pub is_active: bool,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Template {
    /// Whether `viewer` may read this template.
    pub fn visible_to(&self, viewer_id: i64) -> bool {
        self.is_public || self.user_id == Some(viewer_id)
    }

    /// Whether `viewer` may modify or delete this template.
    pub fn owned_by(&self, viewer_id: i64) -> bool {
        self.user_id == Some(viewer_id)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: TemplateCategory,
    pub template_content: String,
    #[schema(value_type = Option<Object>)]
    pub variables_schema: Option<serde_json::Value>,
    pub is_public: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTemplateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<TemplateCategory>,
    pub template_content: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub variables_schema: Option<serde_json::Value>,
    pub is_public: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TemplateListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    /// Filter by category (e.g. `freelance`).
    pub category: Option<String>,
    /// When true, list only public templates.
    pub public_only: Option<bool>,
}
