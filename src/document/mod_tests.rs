use serde_json::json;

use crate::document::models::{Document, DocumentStatus, DocumentType};

#[test]
fn test_document_type_wire_names() {
    assert_eq!(DocumentType::Quote.as_str(), "quote");
    assert_eq!(DocumentType::parse("invoice"), Some(DocumentType::Invoice));
    assert_eq!(DocumentType::parse("spreadsheet"), None);

    let serialized = serde_json::to_string(&DocumentType::Contract).unwrap();
    assert_eq!(serialized, "\"contract\"");
}

#[test]
fn test_document_status_roundtrip() {
    for status in [
        DocumentStatus::Draft,
        DocumentStatus::Finalized,
        DocumentStatus::Sent,
        DocumentStatus::Archived,
    ] {
        assert_eq!(DocumentStatus::parse(status.as_str()), Some(status));
    }
}

#[test]
fn test_document_serialization_shape() {
    let document = Document {
        id: 3,
        title: "March invoice".to_string(),
        document_type: DocumentType::Invoice,
        status: DocumentStatus::Draft,
        content: None,
        template_data: Some(json!({"client": "Acme"})),
        file_path: None,
        user_id: 1,
        template_id: None,
        created_at: chrono::Utc::now(),
        updated_at: None,
    };

    let value = serde_json::to_value(&document).unwrap();
    assert_eq!(value["document_type"], "invoice");
    assert_eq!(value["status"], "draft");
    assert_eq!(value["template_data"]["client"], "Acme");
    assert!(value["content"].is_null());
}
