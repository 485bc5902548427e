//! Pipeline counters, exported alongside the request metrics middleware.

use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

lazy_static! {
    pub static ref DOCUMENTS_GENERATED: IntCounter = register_int_counter!(
        "docforge_documents_generated_total",
        "Documents whose content was produced by the generation pipeline"
    )
    .expect("register documents_generated counter");
    pub static ref DOCUMENTS_EXPORTED: IntCounterVec = register_int_counter_vec!(
        "docforge_documents_exported_total",
        "Documents exported to a binary artifact, by format",
        &["format"]
    )
    .expect("register documents_exported counter");
}
