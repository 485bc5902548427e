//! In-memory store implementation.
//!
//! Backs the test harness and database-less dev runs. Semantics mirror the
//! Postgres implementation: integer ids, insertion order listing,
//! skip/limit pagination.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::auth::model::User;
use crate::document::models::{Document, DocumentType};
use crate::template::models::{Template, TemplateCategory};

use super::{
    DocumentStore, NewDocument, NewTemplate, NewUser, StoreResult, TemplateStore, UserStore,
};

#[derive(Default)]
pub struct MemoryStores {
    documents: RwLock<HashMap<i64, Document>>,
    templates: RwLock<HashMap<i64, Template>>,
    users: RwLock<HashMap<i64, User>>,
    next_id: AtomicI64,
}

impl MemoryStores {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Self::default()
        }
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

fn paginate<T>(mut items: Vec<T>, skip: i64, limit: i64) -> Vec<T> {
    let skip = skip.max(0) as usize;
    let limit = limit.max(0) as usize;
    if skip >= items.len() {
        return Vec::new();
    }
    items.drain(..skip);
    items.truncate(limit);
    items
}

#[async_trait]
impl DocumentStore for MemoryStores {
    async fn list(
        &self,
        owner_id: i64,
        document_type: Option<DocumentType>,
        skip: i64,
        limit: i64,
    ) -> StoreResult<Vec<Document>> {
        let documents = self.documents.read();
        let mut matching: Vec<Document> = documents
            .values()
            .filter(|doc| doc.user_id == owner_id)
            .filter(|doc| document_type.map_or(true, |t| doc.document_type == t))
            .cloned()
            .collect();
        matching.sort_by_key(|doc| doc.id);
        Ok(paginate(matching, skip, limit))
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Document>> {
        Ok(self.documents.read().get(&id).cloned())
    }

    async fn insert(&self, new_document: NewDocument) -> StoreResult<Document> {
        let document = Document {
            id: self.allocate_id(),
            title: new_document.title,
            document_type: new_document.document_type,
            status: new_document.status,
            content: new_document.content,
            template_data: new_document.template_data,
            file_path: None,
            user_id: new_document.user_id,
            template_id: new_document.template_id,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.documents.write().insert(document.id, document.clone());
        Ok(document)
    }

    async fn update(&self, document: &Document) -> StoreResult<()> {
        let mut updated = document.clone();
        updated.updated_at = Some(Utc::now());
        self.documents.write().insert(updated.id, updated);
        Ok(())
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        Ok(self.documents.write().remove(&id).is_some())
    }
}

#[async_trait]
impl TemplateStore for MemoryStores {
    async fn list(
        &self,
        viewer_id: i64,
        category: Option<TemplateCategory>,
        public_only: bool,
        skip: i64,
        limit: i64,
    ) -> StoreResult<Vec<Template>> {
        let templates = self.templates.read();
        let mut matching: Vec<Template> = templates
            .values()
            .filter(|template| {
                if public_only {
                    template.is_public
                } else {
                    template.is_public || template.user_id == Some(viewer_id)
                }
            })
            .filter(|template| category.map_or(true, |c| template.category == c))
            .cloned()
            .collect();
        matching.sort_by_key(|template| template.id);
        Ok(paginate(matching, skip, limit))
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Template>> {
        Ok(self.templates.read().get(&id).cloned())
    }

    async fn insert(&self, new_template: NewTemplate) -> StoreResult<Template> {
        let template = Template {
            id: self.allocate_id(),
            name: new_template.name,
            description: new_template.description,
            category: new_template.category,
            template_content: new_template.template_content,
            variables_schema: new_template.variables_schema,
            is_public: new_template.is_public,
            is_active: new_template.is_active,
            user_id: new_template.user_id,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.templates.write().insert(template.id, template.clone());
        Ok(template)
    }

    async fn update(&self, template: &Template) -> StoreResult<()> {
        let mut updated = template.clone();
        updated.updated_at = Some(Utc::now());
        self.templates.write().insert(updated.id, updated);
        Ok(())
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        Ok(self.templates.write().remove(&id).is_some())
    }
}

#[async_trait]
impl UserStore for MemoryStores {
    async fn get(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn insert(&self, new_user: NewUser) -> StoreResult<User> {
        let user = User {
            id: self.allocate_id(),
            email: new_user.email,
            hashed_password: new_user.hashed_password,
            full_name: new_user.full_name,
            is_active: new_user.is_active,
            is_superuser: new_user.is_superuser,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.users.write().insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> StoreResult<()> {
        let mut updated = user.clone();
        updated.updated_at = Some(Utc::now());
        self.users.write().insert(updated.id, updated);
        Ok(())
    }

    async fn list(&self, skip: i64, limit: i64) -> StoreResult<Vec<User>> {
        let users = self.users.read();
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by_key(|user| user.id);
        Ok(paginate(all, skip, limit))
    }
}
