pub mod defaults;
pub mod handlers;
pub mod models;
