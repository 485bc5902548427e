//! Postgres store implementation (sqlx, runtime queries).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use std::time::Duration;

use crate::auth::model::User;
use crate::document::models::{Document, DocumentStatus, DocumentType};
use crate::template::models::{Template, TemplateCategory};

use super::{
    DocumentStore, NewDocument, NewTemplate, NewUser, StoreResult, TemplateStore, UserStore,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    hashed_password TEXT NOT NULL,
    full_name TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ
);
CREATE TABLE IF NOT EXISTS templates (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    category TEXT NOT NULL,
    template_content TEXT NOT NULL,
    variables_schema JSONB,
    is_public BOOLEAN NOT NULL DEFAULT FALSE,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    user_id BIGINT REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ
);
CREATE TABLE IF NOT EXISTS documents (
    id BIGSERIAL PRIMARY KEY,
    title TEXT NOT NULL,
    document_type TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'draft',
    content TEXT,
    template_data JSONB,
    file_path TEXT,
    user_id BIGINT NOT NULL REFERENCES users(id),
    template_id BIGINT REFERENCES templates(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ
);
"#;

const DOCUMENT_COLUMNS: &str = "id, title, document_type, status, content, template_data, \
                                file_path, user_id, template_id, created_at, updated_at";
const TEMPLATE_COLUMNS: &str = "id, name, description, category, template_content, \
                                variables_schema, is_public, is_active, user_id, created_at, \
                                updated_at";
const USER_COLUMNS: &str = "id, email, hashed_password, full_name, is_active, is_superuser, \
                            created_at, updated_at";

pub struct PgStores {
    pool: PgPool,
}

impl PgStores {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(900))
            .connect(database_url)
            .await?;

        // Schema bootstrap; every statement is idempotent.
        for statement in SCHEMA.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement).execute(&pool).await?;
        }

        Ok(Self { pool })
    }
}

// Enum columns are stored as text; unknown values degrade to the catch-all
// variants rather than failing reads.

#[derive(FromRow)]
struct DocumentRow {
    id: i64,
    title: String,
    document_type: String,
    status: String,
    content: Option<String>,
    template_data: Option<serde_json::Value>,
    file_path: Option<String>,
    user_id: i64,
    template_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            document_type: DocumentType::parse(&row.document_type).unwrap_or(DocumentType::Other),
            status: DocumentStatus::parse(&row.status).unwrap_or(DocumentStatus::Draft),
            content: row.content,
            template_data: row.template_data,
            file_path: row.file_path,
            user_id: row.user_id,
            template_id: row.template_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct TemplateRow {
    id: i64,
    name: String,
    description: Option<String>,
    category: String,
    template_content: String,
    variables_schema: Option<serde_json::Value>,
    is_public: bool,
    is_active: bool,
    user_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<TemplateRow> for Template {
    fn from(row: TemplateRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            category: TemplateCategory::parse(&row.category).unwrap_or(TemplateCategory::Other),
            template_content: row.template_content,
            variables_schema: row.variables_schema,
            is_public: row.is_public,
            is_active: row.is_active,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    email: String,
    hashed_password: String,
    full_name: Option<String>,
    is_active: bool,
    is_superuser: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            hashed_password: row.hashed_password,
            full_name: row.full_name,
            is_active: row.is_active,
            is_superuser: row.is_superuser,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl DocumentStore for PgStores {
    async fn list(
        &self,
        owner_id: i64,
        document_type: Option<DocumentType>,
        skip: i64,
        limit: i64,
    ) -> StoreResult<Vec<Document>> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents \
             WHERE user_id = $1 AND ($2::text IS NULL OR document_type = $2) \
             ORDER BY id OFFSET $3 LIMIT $4"
        );
        let rows: Vec<DocumentRow> = sqlx::query_as(&sql)
            .bind(owner_id)
            .bind(document_type.map(|t| t.as_str()))
            .bind(skip.max(0))
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Document>> {
        let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1");
        let row: Option<DocumentRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Document::from))
    }

    async fn insert(&self, new_document: NewDocument) -> StoreResult<Document> {
        let sql = format!(
            "INSERT INTO documents \
             (title, document_type, status, content, template_data, user_id, template_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {DOCUMENT_COLUMNS}"
        );
        let row: DocumentRow = sqlx::query_as(&sql)
            .bind(&new_document.title)
            .bind(new_document.document_type.as_str())
            .bind(new_document.status.as_str())
            .bind(&new_document.content)
            .bind(&new_document.template_data)
            .bind(new_document.user_id)
            .bind(new_document.template_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update(&self, document: &Document) -> StoreResult<()> {
        sqlx::query(
            "UPDATE documents SET title = $2, document_type = $3, status = $4, content = $5, \
             template_data = $6, file_path = $7, template_id = $8, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(document.id)
        .bind(&document.title)
        .bind(document.document_type.as_str())
        .bind(document.status.as_str())
        .bind(&document.content)
        .bind(&document.template_data)
        .bind(&document.file_path)
        .bind(document.template_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TemplateStore for PgStores {
    async fn list(
        &self,
        viewer_id: i64,
        category: Option<TemplateCategory>,
        public_only: bool,
        skip: i64,
        limit: i64,
    ) -> StoreResult<Vec<Template>> {
        let sql = format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates \
             WHERE (is_public OR user_id = $1) AND (NOT $2 OR is_public) \
             AND ($3::text IS NULL OR category = $3) \
             ORDER BY id OFFSET $4 LIMIT $5"
        );
        let rows: Vec<TemplateRow> = sqlx::query_as(&sql)
            .bind(viewer_id)
            .bind(public_only)
            .bind(category.map(|c| c.as_str()))
            .bind(skip.max(0))
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Template::from).collect())
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Template>> {
        let sql = format!("SELECT {TEMPLATE_COLUMNS} FROM templates WHERE id = $1");
        let row: Option<TemplateRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Template::from))
    }

    async fn insert(&self, new_template: NewTemplate) -> StoreResult<Template> {
        let sql = format!(
            "INSERT INTO templates \
             (name, description, category, template_content, variables_schema, is_public, \
              is_active, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {TEMPLATE_COLUMNS}"
        );
        let row: TemplateRow = sqlx::query_as(&sql)
            .bind(&new_template.name)
            .bind(&new_template.description)
            .bind(new_template.category.as_str())
            .bind(&new_template.template_content)
            .bind(&new_template.variables_schema)
            .bind(new_template.is_public)
            .bind(new_template.is_active)
            .bind(new_template.user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update(&self, template: &Template) -> StoreResult<()> {
        sqlx::query(
            "UPDATE templates SET name = $2, description = $3, category = $4, \
             template_content = $5, variables_schema = $6, is_public = $7, is_active = $8, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(template.id)
        .bind(&template.name)
        .bind(&template.description)
        .bind(template.category.as_str())
        .bind(&template.template_content)
        .bind(&template.variables_schema)
        .bind(template.is_public)
        .bind(template.is_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PgStores {
    async fn get(&self, id: i64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn insert(&self, new_user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (email, hashed_password, full_name, is_active, is_superuser) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(&new_user.email)
            .bind(&new_user.hashed_password)
            .bind(&new_user.full_name)
            .bind(new_user.is_active)
            .bind(new_user.is_superuser)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            "UPDATE users SET email = $2, hashed_password = $3, full_name = $4, \
             is_active = $5, is_superuser = $6, updated_at = NOW() WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(&user.full_name)
        .bind(user.is_active)
        .bind(user.is_superuser)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self, skip: i64, limit: i64) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id OFFSET $1 LIMIT $2");
        let rows: Vec<UserRow> = sqlx::query_as(&sql)
            .bind(skip.max(0))
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }
}
