//! Persistence collaborator interfaces and application state.
//!
//! The pipeline core treats record storage as an external collaborator, so
//! the stores are trait objects: a Postgres implementation for production
//! and an in-memory implementation used by the test harness and when no
//! database is configured.

mod memory;
mod postgres;

pub use memory::MemoryStores;
pub use postgres::PgStores;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use thiserror::Error;

use crate::auth::model::User;
use crate::config::Settings;
use crate::document::models::{Document, DocumentStatus, DocumentType};
use crate::pipeline::{ContentSynthesizer, GenerationOrchestrator, OpenAiClient, TextGenerator};
use crate::storage::ArtifactStorage;
use crate::template::models::{Template, TemplateCategory};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Insertable document payload; ids and timestamps come from the store.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub document_type: DocumentType,
    pub status: DocumentStatus,
    pub content: Option<String>,
    pub template_data: Option<serde_json::Value>,
    pub user_id: i64,
    pub template_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub name: String,
    pub description: Option<String>,
    pub category: TemplateCategory,
    pub template_content: String,
    pub variables_schema: Option<serde_json::Value>,
    pub is_public: bool,
    pub is_active: bool,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list(
        &self,
        owner_id: i64,
        document_type: Option<DocumentType>,
        skip: i64,
        limit: i64,
    ) -> StoreResult<Vec<Document>>;
    async fn get(&self, id: i64) -> StoreResult<Option<Document>>;
    async fn insert(&self, new_document: NewDocument) -> StoreResult<Document>;
    async fn update(&self, document: &Document) -> StoreResult<()>;
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Templates visible to `viewer_id`: its own plus public ones, or only
    /// public ones when `public_only` is set.
    async fn list(
        &self,
        viewer_id: i64,
        category: Option<TemplateCategory>,
        public_only: bool,
        skip: i64,
        limit: i64,
    ) -> StoreResult<Vec<Template>>;
    async fn get(&self, id: i64) -> StoreResult<Option<Template>>;
    async fn insert(&self, new_template: NewTemplate) -> StoreResult<Template>;
    async fn update(&self, template: &Template) -> StoreResult<()>;
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: i64) -> StoreResult<Option<User>>;
    async fn get_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn insert(&self, new_user: NewUser) -> StoreResult<User>;
    async fn update(&self, user: &User) -> StoreResult<()>;
    async fn list(&self, skip: i64, limit: i64) -> StoreResult<Vec<User>>;
}

#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<dyn DocumentStore>,
    pub templates: Arc<dyn TemplateStore>,
    pub users: Arc<dyn UserStore>,
    pub template_cache: Cache<i64, Template>,
    pub orchestrator: Arc<GenerationOrchestrator>,
    pub synthesizer: Arc<ContentSynthesizer>,
    pub artifacts: ArtifactStorage,
}

impl AppState {
    /// Production wiring: Postgres stores when a database URL is
    /// configured, otherwise the in-memory stores (dev mode).
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(900))
            .user_agent("docforge-server/0.1")
            .build()?;
        let provider: Arc<dyn TextGenerator> =
            Arc::new(OpenAiClient::new(http_client, &settings.ai));
        let artifacts = ArtifactStorage::new(&settings.artifacts_dir)?;

        match &settings.database_url {
            Some(url) => {
                let stores = Arc::new(PgStores::connect(url).await?);
                Ok(Self::with_stores(
                    stores.clone(),
                    stores.clone(),
                    stores,
                    provider,
                    artifacts,
                ))
            }
            None => {
                log::warn!("DATABASE_URL not set, falling back to in-memory stores");
                Ok(Self::with_memory_stores(provider, artifacts))
            }
        }
    }

    /// In-memory wiring, also used directly by the test harness with a fake
    /// provider.
    pub fn with_memory_stores(
        provider: Arc<dyn TextGenerator>,
        artifacts: ArtifactStorage,
    ) -> Self {
        let stores = Arc::new(MemoryStores::new());
        Self::with_stores(stores.clone(), stores.clone(), stores, provider, artifacts)
    }

    pub fn with_stores(
        documents: Arc<dyn DocumentStore>,
        templates: Arc<dyn TemplateStore>,
        users: Arc<dyn UserStore>,
        provider: Arc<dyn TextGenerator>,
        artifacts: ArtifactStorage,
    ) -> Self {
        let synthesizer = Arc::new(ContentSynthesizer::new(provider));
        let orchestrator = Arc::new(GenerationOrchestrator::new(
            synthesizer.clone(),
            artifacts.clone(),
        ));
        let template_cache = Cache::builder()
            .time_to_live(Duration::from_secs(10 * 60))
            .max_capacity(100)
            .build();

        Self {
            documents,
            templates,
            users,
            template_cache,
            orchestrator,
            synthesizer,
            artifacts,
        }
    }

    /// Template fetch through the read cache. Mutating endpoints must call
    /// [`AppState::invalidate_template`].
    pub async fn get_template_cached(&self, id: i64) -> StoreResult<Option<Template>> {
        if let Some(template) = self.template_cache.get(&id).await {
            return Ok(Some(template));
        }
        let template = self.templates.get(id).await?;
        if let Some(template) = &template {
            self.template_cache.insert(id, template.clone()).await;
        }
        Ok(template)
    }

    pub async fn invalidate_template(&self, id: i64) {
        self.template_cache.invalidate(&id).await;
    }
}
